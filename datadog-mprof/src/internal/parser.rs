// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{Capture, CaptureInfo, Snapshot};
use crate::collections::identifiable::Id;
use crate::error::CaptureError;
use crate::mprof::{
    load_address_table, load_call_stack_table, load_name_table, Header, Token, TokenDecoder,
    SUBTYPE_END_OF_FILE,
};
use crate::status::StatusSink;
use crate::symbols::ResolverRegistry;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;
use tracing::debug;

/// Decodes a capture and replays its token stream into snapshots.
///
/// Single pass: header, then the three tables (resolving symbols on the way
/// if the producer did not embed them), then the tokens from right after the
/// header through the end-of-stream marker. Any error aborts the whole
/// parse; there is no partial snapshot list.
pub fn parse<R: Read + Seek>(
    mut reader: R,
    resolvers: &dyn ResolverRegistry,
    status: &mut dyn StatusSink,
) -> Result<Capture, CaptureError> {
    status.report("Loading header information");
    let (header, endian) = Header::read(&mut reader)?;
    debug!(
        version = header.version,
        platform = %header.platform,
        endian = ?endian,
        executable = %header.executable_name,
        "Decoded capture header"
    );

    // Tokens start right here; remember the spot while we chase the table
    // offsets around the file.
    let first_token = reader.stream_position()?;

    status.report("Loading tables");
    let mut names = load_name_table(&mut reader, endian, &header)?;
    let mut addresses = load_address_table(&mut reader, endian, &header)?;
    let call_stacks = load_call_stack_table(&mut reader, endian, &header, addresses.len())?;
    debug!(
        names = names.len(),
        addresses = addresses.len(),
        call_stacks = call_stacks.len(),
        "Loaded capture tables"
    );

    if header.symbols_embedded {
        for record in &addresses {
            for name in [record.function, record.filename] {
                if name.to_offset() >= names.len() {
                    return Err(CaptureError::NameIndexOutOfRange {
                        index: name.to_offset() as i64,
                        count: names.len(),
                    });
                }
            }
        }
    } else {
        status.report(&format!(
            "Looking up symbols for {}",
            header.executable_name
        ));
        let mut resolver = resolvers.load(header.platform, &header.executable_name)?;
        for record in &mut addresses {
            let symbol = resolver.resolve_address(record.program_counter);
            record.function = names.intern(&symbol.function);
            record.filename = names.intern(&symbol.filename);
            record.line = symbol.line;
        }
        debug!(names = names.len(), "Resolved symbols");
    }

    status.report("Replaying allocation stream");
    reader.seek(SeekFrom::Start(first_token))?;
    let info = Arc::new(CaptureInfo {
        header,
        names,
        addresses,
        call_stacks,
    });
    let mut live = Snapshot::new("End", Arc::clone(&info));
    let mut snapshots = Vec::new();
    for token in TokenDecoder::new(&mut reader, endian) {
        match token? {
            Token::Malloc {
                pointer,
                call_stack_index,
                size,
            } => live.record_malloc(pointer, call_stack_index, size)?,
            Token::Free { pointer } => live.record_free(pointer),
            Token::Realloc {
                old_pointer,
                new_pointer,
                call_stack_index,
                size,
            } => {
                live.record_free(old_pointer);
                live.record_malloc(new_pointer, call_stack_index, size)?;
            }
            Token::SnapshotMarker => {
                let label = format!("Snapshot {}", snapshots.len());
                snapshots.push(live.deep_copy(&label));
            }
            Token::EndOfFile => {
                return Err(CaptureError::UnexpectedControlToken {
                    subtype: SUBTYPE_END_OF_FILE,
                })
            }
        }
    }
    snapshots.push(live);

    status.report("Finalizing snapshots");
    for snapshot in &mut snapshots {
        snapshot.finalize();
    }
    debug!(snapshots = snapshots.len(), "Replay complete");

    Ok(Capture { info, snapshots })
}

/// [parse] over an in-memory capture.
pub fn parse_bytes(
    bytes: &[u8],
    resolvers: &dyn ResolverRegistry,
    status: &mut dyn StatusSink,
) -> Result<Capture, CaptureError> {
    parse(Cursor::new(bytes), resolvers, status)
}
