// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::collections::identifiable::Id;
use crate::internal::{AllocationInfo, CaptureInfo};
use std::io::{self, Write};

/// Writes one line per aggregate with a positive count:
/// `size,count,frame,frame,...,` with the root frame first. Frames render
/// as `function @ file:line`, or the literal `Unknown` when the resolver
/// produced neither a function nor a file. No header row, and each frame
/// cell keeps its trailing comma; spreadsheet importers of these files
/// expect that exact shape.
pub fn write_aggregates<W: Write>(
    writer: &mut W,
    info: &CaptureInfo,
    entries: &[AllocationInfo],
) -> io::Result<()> {
    for entry in entries {
        if entry.count <= 0 {
            continue;
        }
        write!(writer, "{},{},", entry.size, entry.count)?;
        let call_stack = &info.call_stacks[entry.call_stack.to_offset()];
        for &address in &call_stack.address_indices {
            let record = &info.addresses[address.to_offset()];
            let function = info.names.get(record.function).unwrap_or("");
            let filename = info.names.get(record.filename).unwrap_or("");
            if function.is_empty() && filename.is_empty() {
                write!(writer, "Unknown,")?;
            } else {
                write!(writer, "{} @ {}:{},", function, filename, record.line)?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}
