// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::collections::identifiable::CallStackId;

/// Bytes and allocation count attributed to one callstack. Doubles as a
/// single live allocation (count == 1, keyed by pointer in the snapshot) and
/// as an aggregated per-callstack total. Size and count go negative in
/// diffed snapshots.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AllocationInfo {
    pub size: i64,
    pub call_stack: CallStackId,
    pub count: i32,
}

impl AllocationInfo {
    pub fn new(size: i64, call_stack: CallStackId, count: i32) -> Self {
        Self {
            size,
            call_stack,
            count,
        }
    }

    pub fn add(&mut self, size: i64, count: i32) {
        self.size += size;
        self.count += count;
    }

    /// `new - old` for a pair attributed to the same callstack.
    pub(crate) fn diff(new: &Self, old: &Self) -> Self {
        debug_assert_eq!(new.call_stack, old.call_stack);
        Self {
            size: new.size - old.size,
            call_stack: new.call_stack,
            count: new.count - old.count,
        }
    }

    pub(crate) fn negated(&self) -> Self {
        Self {
            size: -self.size,
            count: -self.count,
            ..*self
        }
    }
}

/// Ordering key shared by the ranked exclusive view and call-graph children.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortBy {
    Size,
    Count,
}
