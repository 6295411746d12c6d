// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{Endian, Header};
use crate::collections::identifiable::{AddressId, Id, NameId};
use crate::collections::name_table::NameTable;
use crate::error::CaptureError;
use std::io::{Read, Seek, SeekFrom};

/// Callstack record terminator for a complete stack walk.
pub const COMPLETE_STACK: i32 = -1;
/// Callstack record terminator for a walk the producer cut short.
pub const TRUNCATED_STACK: i32 = -2;

/// One entry of the address table: a raw program counter plus its symbol
/// fields. The symbol fields hold whatever the producer wrote; they only
/// mean something once symbols are embedded or the resolution pass has
/// rewritten them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AddressRecord {
    pub program_counter: u64,
    pub function: NameId,
    pub filename: NameId,
    pub line: i32,
}

/// One entry of the callstack table. Address indices are stored root frame
/// first (the wire stores them leaf first; the loader reverses).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallStack {
    pub address_indices: Vec<AddressId>,
    pub is_truncated: bool,
    /// Producer checksum. Parsed for layout compatibility, never validated.
    pub crc: u32,
}

pub fn load_name_table<R: Read + Seek>(
    reader: &mut R,
    endian: Endian,
    header: &Header,
) -> Result<NameTable, CaptureError> {
    reader.seek(SeekFrom::Start(u64::from(header.name_table_offset)))?;
    let count = header.name_table_count as usize;
    let mut names = NameTable::with_capacity(count);
    for _ in 0..count {
        let name = endian.read_string(reader)?;
        names.push(&name);
    }
    Ok(names)
}

pub fn load_address_table<R: Read + Seek>(
    reader: &mut R,
    endian: Endian,
    header: &Header,
) -> Result<Vec<AddressRecord>, CaptureError> {
    reader.seek(SeekFrom::Start(u64::from(header.address_table_offset)))?;
    let count = header.address_table_count as usize;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let program_counter = endian.read_u64(reader)?;
        // The symbol fields are reinterpreted as indices as-is; the parser
        // validates them (symbols embedded) or rewrites them (resolution)
        // before anything reads them.
        let function = NameId::from_offset(endian.read_i32(reader)? as u32 as usize);
        let filename = NameId::from_offset(endian.read_i32(reader)? as u32 as usize);
        let line = endian.read_i32(reader)?;
        records.push(AddressRecord {
            program_counter,
            function,
            filename,
            line,
        });
    }
    Ok(records)
}

pub fn load_call_stack_table<R: Read + Seek>(
    reader: &mut R,
    endian: Endian,
    header: &Header,
    address_count: usize,
) -> Result<Vec<CallStack>, CaptureError> {
    reader.seek(SeekFrom::Start(u64::from(header.call_stack_table_offset)))?;
    let count = header.call_stack_table_count as usize;
    let mut call_stacks = Vec::with_capacity(count);
    for _ in 0..count {
        let crc = endian.read_u32(reader)?;
        let mut address_indices = Vec::new();
        let is_truncated = loop {
            let index = endian.read_i32(reader)?;
            match index {
                COMPLETE_STACK => break false,
                TRUNCATED_STACK => break true,
                index if index >= 0 && (index as usize) < address_count => {
                    address_indices.push(AddressId::from_offset(index as usize));
                }
                index => {
                    return Err(CaptureError::AddressIndexOutOfRange {
                        index: i64::from(index),
                        count: address_count,
                    })
                }
            }
        };
        // Producers write the walk leaf first; consumers want the root
        // frame first.
        address_indices.reverse();
        call_stacks.push(CallStack {
            address_indices,
            is_truncated,
            crc,
        });
    }
    Ok(call_stacks)
}
