// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::Snapshot;
use crate::collections::identifiable::{AddressId, Id};
use crate::collections::name_table::NameTable;
use crate::mprof::{AddressRecord, CallStack, Header};
use std::sync::Arc;

/// Everything about a capture that is not snapshot state: the header and the
/// three tables. Shared behind an [Arc] by every snapshot taken from the
/// capture; that pointer identity is what makes cross-capture diffs
/// detectable.
pub struct CaptureInfo {
    pub header: Header,
    pub names: NameTable,
    pub addresses: Vec<AddressRecord>,
    pub call_stacks: Vec<CallStack>,
}

impl CaptureInfo {
    /// Function name attributed to an address, empty when unresolved.
    pub fn function_name(&self, address: AddressId) -> &str {
        self.addresses
            .get(address.to_offset())
            .and_then(|record| self.names.get(record.function))
            .unwrap_or("")
    }
}

/// A fully parsed capture: the shared tables plus every snapshot the replay
/// produced, in stream order, the implicit "End" snapshot last. Always holds
/// at least one snapshot.
pub struct Capture {
    pub info: Arc<CaptureInfo>,
    pub snapshots: Vec<Snapshot>,
}

impl Capture {
    pub fn snapshot(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// The state at end-of-stream.
    pub fn end_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }
}
