// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::hash::{BuildHasherDefault, Hash};

pub type FxHashMap<K, V> =
    std::collections::HashMap<K, V, BuildHasherDefault<rustc_hash::FxHasher>>;
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<rustc_hash::FxHasher>>;

/// A typed index into one of the capture tables. Ids are more than offsets:
/// using distinct types for name, address, and callstack indices keeps a
/// callstack index from ever being used to fetch a name.
pub trait Id: Copy + Eq + Hash {
    type RawId;

    /// Convert from a usize offset into an Id. This should be loss-less
    /// except for certain edges.
    /// # Panics
    /// Panics if the usize cannot be represented in the Id, for instance if
    /// the offset cannot fit in the underlying integer type. This is expected
    /// to be ultra-rare (more than u32::MAX items in one table?!).
    fn from_offset(inner: usize) -> Self;

    fn to_raw_id(&self) -> Self::RawId;

    /// The offset this Id was created from, for indexing back into the table.
    fn to_offset(&self) -> usize;
}

/// Creates a 32-bit id from the offset, guarding against usize values which
/// do not fit. Table counts on the wire are u32, so in-bounds offsets always
/// convert.
#[inline]
pub fn small_table_id(offset: usize) -> Option<u32> {
    offset.try_into().ok()
}

macro_rules! table_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl Id for $name {
            type RawId = u32;

            fn from_offset(offset: usize) -> Self {
                #[allow(clippy::expect_used)]
                Self(small_table_id(offset).expect(concat!(
                    stringify!($name),
                    " to fit into a u32"
                )))
            }

            fn to_raw_id(&self) -> Self::RawId {
                self.0
            }

            fn to_offset(&self) -> usize {
                self.0 as usize
            }
        }
    };
}

table_id! {
    /// Index into the capture's name table.
    NameId
}

table_id! {
    /// Index into the capture's address table.
    AddressId
}

table_id! {
    /// Index into the capture's callstack table.
    CallStackId
}
