// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{AllocationInfo, CaptureInfo};
use crate::collections::identifiable::{CallStackId, FxHashMap, FxIndexMap, Id};
use crate::error::CaptureError;
use std::sync::Arc;

/// One point-in-time view of the target's heap.
///
/// `pointer_to_info` tracks exactly the live allocations (each pointer key at
/// most once). `lifetime` is index-aligned with the callstack table and
/// accumulates every allocation ever attributed to a callstack, freed or
/// not; it never shrinks and keeps its full length even in diffs. `active`
/// is derived from the pointer map by [Snapshot::finalize] and is only
/// meaningful after it ran.
pub struct Snapshot {
    info: Arc<CaptureInfo>,
    label: Box<str>,
    pointer_to_info: FxHashMap<u64, AllocationInfo>,
    active: Vec<AllocationInfo>,
    lifetime: Vec<AllocationInfo>,
}

impl Snapshot {
    pub(crate) fn new(label: &str, info: Arc<CaptureInfo>) -> Self {
        let lifetime = (0..info.call_stacks.len())
            .map(|offset| AllocationInfo::new(0, CallStackId::from_offset(offset), 0))
            .collect();
        Self {
            info,
            label: Box::from(label),
            pointer_to_info: FxHashMap::default(),
            active: Vec::new(),
            lifetime,
        }
    }

    /// Duplicates the live state under a new label. Every [AllocationInfo]
    /// is copied; nothing is shared with `self` except the capture tables.
    /// The copy's active list starts empty until it is finalized.
    pub fn deep_copy(&self, label: &str) -> Self {
        Self {
            info: Arc::clone(&self.info),
            label: Box::from(label),
            pointer_to_info: self.pointer_to_info.clone(),
            active: Vec::new(),
            lifetime: self.lifetime.clone(),
        }
    }

    /// Records an allocation event. A null pointer or non-positive size is
    /// the producer's convention for a failed allocation and is ignored
    /// without touching the callstack index, so junk indices on ignored
    /// events never fail the parse.
    pub(crate) fn record_malloc(
        &mut self,
        pointer: u64,
        call_stack_index: i32,
        size: i64,
    ) -> Result<(), CaptureError> {
        if pointer == 0 || size <= 0 {
            return Ok(());
        }
        let call_stack = self.validate_call_stack_index(call_stack_index)?;
        // A stale entry under the same pointer is replaced; the map keys
        // stay unique.
        self.pointer_to_info
            .insert(pointer, AllocationInfo::new(size, call_stack, 1));
        self.lifetime[call_stack.to_offset()].add(size, 1);
        Ok(())
    }

    /// Removes a live allocation. No-op if the pointer is not tracked; the
    /// producer emits frees for pointers it never reported.
    pub(crate) fn record_free(&mut self, pointer: u64) {
        self.pointer_to_info.remove(&pointer);
    }

    fn validate_call_stack_index(&self, index: i32) -> Result<CallStackId, CaptureError> {
        let count = self.info.call_stacks.len();
        match usize::try_from(index) {
            Ok(offset) if offset < count => Ok(CallStackId::from_offset(offset)),
            _ => Err(CaptureError::CallStackIndexOutOfRange {
                index: i64::from(index),
                count,
            }),
        }
    }

    fn active_by_call_stack(&self) -> FxIndexMap<CallStackId, AllocationInfo> {
        let mut grouped: FxIndexMap<CallStackId, AllocationInfo> = FxIndexMap::default();
        for info in self.pointer_to_info.values() {
            grouped
                .entry(info.call_stack)
                .and_modify(|total| total.add(info.size, info.count))
                .or_insert(*info);
        }
        grouped
    }

    /// Rebuilds the active list from the live pointer map: one entry per
    /// callstack with the summed size and count. Pure over the pointer map
    /// and idempotent.
    pub fn finalize(&mut self) {
        self.active = self.active_by_call_stack().into_values().collect();
    }

    /// Synthetic "what changed" snapshot between two snapshots of the same
    /// capture. Per callstack the active entry is `new - old`; entries only
    /// in `old` come out negated; entries netting a count of exactly zero
    /// are dropped. The lifetime list is diffed index by index and keeps its
    /// full length. The result has no live pointers of its own.
    pub fn diff(old: &Snapshot, new: &Snapshot) -> Result<Snapshot, CaptureError> {
        if !Arc::ptr_eq(&old.info, &new.info) {
            return Err(CaptureError::SnapshotsFromDifferentCaptures);
        }

        let old_active = old.active_by_call_stack();
        let new_active = new.active_by_call_stack();

        let mut active = Vec::new();
        for (call_stack, new_info) in &new_active {
            let diffed = match old_active.get(call_stack) {
                Some(old_info) => AllocationInfo::diff(new_info, old_info),
                None => *new_info,
            };
            if diffed.count != 0 {
                active.push(diffed);
            }
        }
        for (call_stack, old_info) in &old_active {
            if !new_active.contains_key(call_stack) {
                let negated = old_info.negated();
                if negated.count != 0 {
                    active.push(negated);
                }
            }
        }

        let lifetime = new
            .lifetime
            .iter()
            .zip(&old.lifetime)
            .map(|(new_info, old_info)| AllocationInfo::diff(new_info, old_info))
            .collect();

        Ok(Snapshot {
            info: Arc::clone(&new.info),
            label: Box::from("Diff"),
            pointer_to_info: FxHashMap::default(),
            active,
            lifetime,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn info(&self) -> &Arc<CaptureInfo> {
        &self.info
    }

    pub fn active_list(&self) -> &[AllocationInfo] {
        &self.active
    }

    pub fn lifetime_list(&self) -> &[AllocationInfo] {
        &self.lifetime
    }

    pub fn live_allocation_count(&self) -> usize {
        self.pointer_to_info.len()
    }
}
