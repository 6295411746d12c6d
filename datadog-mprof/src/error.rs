// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::mprof::Platform;
use std::io;

/// Errors produced while decoding or replaying a capture.
///
/// All of these are fatal for the capture being processed: decode and replay
/// are single-pass with no resumption, so a failed parse yields no partial
/// snapshot list. Frees and reallocs of pointers the capture never recorded
/// are not errors at all; the producer emits those and the engine tolerates
/// them silently.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The magic did not match in either byte order; this is not a capture.
    #[error("unrecognized capture magic {found:#010x} in either byte order")]
    BadMagic { found: u32 },
    /// Short reads, truncated tables, a token stream that hits end of file
    /// before its end-of-stream token, and plain I/O failures.
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unknown control token subtype {subtype}")]
    UnknownTokenSubtype { subtype: u32 },
    /// The token decoded fine but has no replay semantics, e.g. an
    /// end-of-file marker in the middle of the stream.
    #[error("control token subtype {subtype} has no replay semantics here")]
    UnexpectedControlToken { subtype: u32 },
    #[error("callstack index {index} out of range for a table of {count}")]
    CallStackIndexOutOfRange { index: i64, count: usize },
    #[error("address index {index} out of range for a table of {count}")]
    AddressIndexOutOfRange { index: i64, count: usize },
    #[error("name index {index} out of range for a table of {count}")]
    NameIndexOutOfRange { index: i64, count: usize },
    /// The capture carries no embedded symbols and no resolver backend is
    /// registered for its platform.
    #[error("no symbol resolver available for {platform} (executable {executable:?})")]
    ResolverUnavailable {
        platform: Platform,
        executable: String,
    },
    /// Diffing snapshots that do not share a capture is a caller bug.
    #[error("cannot diff snapshots taken from different captures")]
    SnapshotsFromDifferentCaptures,
}
