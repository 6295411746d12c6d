// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Wire-level decoding of mprof captures: the fixed header, the three
//! tables (names, addresses, callstacks), and the variable-shaped token
//! stream. Everything here is plain decoding; replay semantics live in
//! [crate::internal].

mod header;
mod tables;
mod token;

pub use header::*;
pub use tables::*;
pub use token::*;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{self, Read};

/// Byte order of a capture, detected from the header magic. Every multi-byte
/// field after the magic is read with the same order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub(crate) fn read_u32<R: Read>(self, reader: &mut R) -> io::Result<u32> {
        match self {
            Endian::Little => reader.read_u32::<LittleEndian>(),
            Endian::Big => reader.read_u32::<BigEndian>(),
        }
    }

    pub(crate) fn read_i32<R: Read>(self, reader: &mut R) -> io::Result<i32> {
        match self {
            Endian::Little => reader.read_i32::<LittleEndian>(),
            Endian::Big => reader.read_i32::<BigEndian>(),
        }
    }

    pub(crate) fn read_u64<R: Read>(self, reader: &mut R) -> io::Result<u64> {
        match self {
            Endian::Little => reader.read_u64::<LittleEndian>(),
            Endian::Big => reader.read_u64::<BigEndian>(),
        }
    }

    /// Reads a length-prefixed string. Producers NUL-terminate some of these
    /// (the terminator is counted by the prefix), so trailing NULs are
    /// trimmed.
    pub(crate) fn read_string<R: Read>(self, reader: &mut R) -> io::Result<String> {
        let length = self.read_u32(reader)? as usize;
        let mut bytes = vec![0u8; length];
        reader.read_exact(&mut bytes)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.trim_end_matches('\0').to_string())
    }
}
