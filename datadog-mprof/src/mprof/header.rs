// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::Endian;
use crate::error::CaptureError;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};

/// First four bytes of every capture, in the capture's own byte order.
pub const MAGIC: u32 = 0xDA15_F7D8;

/// Raw target-platform identifier from the capture header. The engine never
/// interprets it beyond selecting a symbol resolver backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Platform(pub u32);

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "platform {:#010x}", self.0)
    }
}

/// Fixed-layout capture header. Read once up front; immutable afterward.
///
/// The token stream begins immediately after the header, while the three
/// tables live wherever the offsets point (producers append them after the
/// last token).
#[derive(Clone, Debug)]
pub struct Header {
    pub version: u32,
    pub platform: Platform,
    /// Whether the producer already filled the address table's symbol
    /// fields. When false, a resolver backend must run before the table is
    /// usable.
    pub symbols_embedded: bool,
    pub name_table_offset: u32,
    pub name_table_count: u32,
    pub address_table_offset: u32,
    pub address_table_count: u32,
    pub call_stack_table_offset: u32,
    pub call_stack_table_count: u32,
    /// Parsed for layout compatibility; this build reads single-file
    /// captures only.
    pub num_data_files: u32,
    pub executable_name: String,
}

impl Header {
    /// Decodes the header, trying little-endian first and re-reading the
    /// whole header big-endian when the magic does not match. Leaves the
    /// reader positioned at the first token.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<(Self, Endian), CaptureError> {
        match Self::read_with(reader, Endian::Little) {
            Ok(header) => Ok((header, Endian::Little)),
            Err(CaptureError::BadMagic { found }) => {
                reader.seek(SeekFrom::Start(0))?;
                match Self::read_with(reader, Endian::Big) {
                    Ok(header) => Ok((header, Endian::Big)),
                    // Report the bytes as first read, not their swap.
                    Err(CaptureError::BadMagic { .. }) => Err(CaptureError::BadMagic { found }),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    fn read_with<R: Read>(reader: &mut R, endian: Endian) -> Result<Self, CaptureError> {
        let magic = endian.read_u32(reader)?;
        if magic != MAGIC {
            return Err(CaptureError::BadMagic { found: magic });
        }
        let version = endian.read_u32(reader)?;
        let platform = Platform(endian.read_u32(reader)?);
        let symbols_embedded = endian.read_u32(reader)? != 0;
        let name_table_offset = endian.read_u32(reader)?;
        let name_table_count = endian.read_u32(reader)?;
        let address_table_offset = endian.read_u32(reader)?;
        let address_table_count = endian.read_u32(reader)?;
        let call_stack_table_offset = endian.read_u32(reader)?;
        let call_stack_table_count = endian.read_u32(reader)?;
        let num_data_files = endian.read_u32(reader)?;
        let executable_name = endian.read_string(reader)?;

        Ok(Self {
            version,
            platform,
            symbols_embedded,
            name_table_offset,
            name_table_count,
            address_table_offset,
            address_table_count,
            call_stack_table_offset,
            call_stack_table_count,
            num_data_files,
            executable_name,
        })
    }
}
