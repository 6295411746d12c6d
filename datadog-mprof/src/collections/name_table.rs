// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::identifiable::{FxHashMap, Id, NameId};

/// Index-addressed storage for the capture's name table.
///
/// The positional array is the source of truth: ids handed out by the loader
/// refer to positions in the capture file, so duplicates coming off the wire
/// are preserved rather than collapsed. The lookup map exists for the late
/// symbol-resolution pass, which interns strings it has not seen before and
/// reuses indices for ones it has. For a duplicated string the first
/// occurrence wins the lookup slot.
pub struct NameTable {
    names: Vec<Box<str>>,
    lookup: FxHashMap<Box<str>, NameId>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            names: Vec::with_capacity(capacity),
            lookup: FxHashMap::default(),
        }
    }

    /// Appends a name at the next position, regardless of whether it is
    /// already present. This is how the loader materializes the table.
    pub fn push(&mut self, name: &str) -> NameId {
        let id = NameId::from_offset(self.names.len());
        self.names.push(Box::from(name));
        self.lookup.entry(Box::from(name)).or_insert(id);
        id
    }

    /// Returns the id of an existing name, or appends it and returns the new
    /// id. Resolution uses this so that every distinct symbol string is
    /// stored once even when thousands of addresses share it.
    pub fn intern(&mut self, name: &str) -> NameId {
        match self.lookup.get(name) {
            Some(id) => *id,
            None => self.push(name),
        }
    }

    pub fn get(&self, id: NameId) -> Option<&str> {
        self.names.get(id.to_offset()).map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}
