// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Builds syntactically valid captures in memory so the end-to-end tests can
//! exercise the real decode path in both byte orders.

use byteorder::ByteOrder;
use datadog_mprof::mprof::MAGIC;
use std::marker::PhantomData;

const TYPE_MALLOC: u32 = 0;
const TYPE_FREE: u32 = 1;
const TYPE_REALLOC: u32 = 2;
const TYPE_OTHER: u32 = 3;

const SUBTYPE_END_OF_STREAM: u32 = 0;
const SUBTYPE_END_OF_FILE: u32 = 1;
const SUBTYPE_SNAPSHOT_MARKER: u32 = 2;

pub struct CaptureWriter<E> {
    version: u32,
    platform: u32,
    symbols_embedded: bool,
    executable_name: String,
    names: Vec<String>,
    addresses: Vec<(u64, i32, i32, i32)>,
    call_stacks: Vec<(Vec<i32>, bool)>,
    tokens: Vec<u8>,
    _endian: PhantomData<E>,
}

impl<E: ByteOrder> CaptureWriter<E> {
    pub fn new() -> Self {
        Self {
            version: 4,
            platform: 0x8,
            symbols_embedded: true,
            executable_name: "game.elf".to_string(),
            names: Vec::new(),
            addresses: Vec::new(),
            call_stacks: Vec::new(),
            tokens: Vec::new(),
            _endian: PhantomData,
        }
    }

    pub fn symbols_embedded(&mut self, embedded: bool) -> &mut Self {
        self.symbols_embedded = embedded;
        self
    }

    pub fn name(&mut self, name: &str) -> i32 {
        self.names.push(name.to_string());
        (self.names.len() - 1) as i32
    }

    pub fn address(&mut self, pc: u64, function: i32, filename: i32, line: i32) -> i32 {
        self.addresses.push((pc, function, filename, line));
        (self.addresses.len() - 1) as i32
    }

    /// Takes frames root first (the order consumers see) and writes them
    /// leaf first, the way producers serialize a stack walk.
    pub fn call_stack(&mut self, root_first: &[i32], truncated: bool) -> i32 {
        let mut leaf_first: Vec<i32> = root_first.to_vec();
        leaf_first.reverse();
        self.call_stacks.push((leaf_first, truncated));
        (self.call_stacks.len() - 1) as i32
    }

    pub fn malloc(&mut self, pointer: u32, call_stack: i32, size: u32) -> &mut Self {
        assert_eq!(0, pointer % 4, "token pointers are 4-byte aligned");
        Self::push_u32(&mut self.tokens, pointer | TYPE_MALLOC);
        Self::push_u32(&mut self.tokens, call_stack as u32);
        Self::push_u32(&mut self.tokens, size);
        self
    }

    pub fn free(&mut self, pointer: u32) -> &mut Self {
        assert_eq!(0, pointer % 4, "token pointers are 4-byte aligned");
        Self::push_u32(&mut self.tokens, pointer | TYPE_FREE);
        self
    }

    pub fn realloc(&mut self, old: u32, new: u32, call_stack: i32, size: u32) -> &mut Self {
        assert_eq!(0, old % 4, "token pointers are 4-byte aligned");
        Self::push_u32(&mut self.tokens, old | TYPE_REALLOC);
        Self::push_u32(&mut self.tokens, new);
        Self::push_u32(&mut self.tokens, call_stack as u32);
        Self::push_u32(&mut self.tokens, size);
        self
    }

    pub fn snapshot_marker(&mut self) -> &mut Self {
        self.other(SUBTYPE_SNAPSHOT_MARKER, 0)
    }

    pub fn end_of_file_marker(&mut self) -> &mut Self {
        self.other(SUBTYPE_END_OF_FILE, 0)
    }

    pub fn other(&mut self, subtype: u32, payload: u32) -> &mut Self {
        Self::push_u32(&mut self.tokens, TYPE_OTHER);
        Self::push_u32(&mut self.tokens, subtype);
        Self::push_u32(&mut self.tokens, payload);
        self
    }

    /// Assembles the capture: header, token region (terminated), then the
    /// three tables.
    pub fn finish(mut self) -> Vec<u8> {
        let tokens = std::mem::take(&mut self.tokens);
        self.assemble(tokens, true)
    }

    /// Like [CaptureWriter::finish] but the token region just stops, as if
    /// the producer died mid-write.
    pub fn finish_truncated(mut self) -> Vec<u8> {
        let tokens = std::mem::take(&mut self.tokens);
        self.assemble(tokens, false)
    }

    fn assemble(self, mut tokens: Vec<u8>, end_of_stream: bool) -> Vec<u8> {
        if end_of_stream {
            Self::push_u32(&mut tokens, TYPE_OTHER);
            Self::push_u32(&mut tokens, SUBTYPE_END_OF_STREAM);
            Self::push_u32(&mut tokens, 0);
        }

        // Eleven fixed words plus the length-prefixed, NUL-terminated
        // executable name.
        let header_len = 11 * 4 + 4 + self.executable_name.len() + 1;

        let mut name_table = Vec::new();
        for name in &self.names {
            Self::push_u32(&mut name_table, name.len() as u32);
            name_table.extend_from_slice(name.as_bytes());
        }

        let mut address_table = Vec::new();
        for &(pc, function, filename, line) in &self.addresses {
            Self::push_u64(&mut address_table, pc);
            Self::push_u32(&mut address_table, function as u32);
            Self::push_u32(&mut address_table, filename as u32);
            Self::push_u32(&mut address_table, line as u32);
        }

        let mut call_stack_table = Vec::new();
        for (leaf_first, truncated) in &self.call_stacks {
            Self::push_u32(&mut call_stack_table, 0xc0dec0de); // unchecked CRC
            for &index in leaf_first {
                Self::push_u32(&mut call_stack_table, index as u32);
            }
            let terminator: i32 = if *truncated { -2 } else { -1 };
            Self::push_u32(&mut call_stack_table, terminator as u32);
        }

        let name_table_offset = header_len + tokens.len();
        let address_table_offset = name_table_offset + name_table.len();
        let call_stack_table_offset = address_table_offset + address_table.len();

        let mut capture = Vec::new();
        for word in [
            MAGIC,
            self.version,
            self.platform,
            u32::from(self.symbols_embedded),
            name_table_offset as u32,
            self.names.len() as u32,
            address_table_offset as u32,
            self.addresses.len() as u32,
            call_stack_table_offset as u32,
            self.call_stacks.len() as u32,
            1, // data files
        ] {
            Self::push_u32(&mut capture, word);
        }
        Self::push_u32(&mut capture, self.executable_name.len() as u32 + 1);
        capture.extend_from_slice(self.executable_name.as_bytes());
        capture.push(0);
        assert_eq!(header_len, capture.len());

        capture.extend_from_slice(&tokens);
        capture.extend_from_slice(&name_table);
        capture.extend_from_slice(&address_table);
        capture.extend_from_slice(&call_stack_table);
        capture
    }

    fn push_u32(bytes: &mut Vec<u8>, value: u32) {
        let mut word = [0u8; 4];
        E::write_u32(&mut word, value);
        bytes.extend_from_slice(&word);
    }

    fn push_u64(bytes: &mut Vec<u8>, value: u64) {
        let mut word = [0u8; 8];
        E::write_u64(&mut word, value);
        bytes.extend_from_slice(&word);
    }
}
