// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The "exclusive" view: aggregates ranked by size or count, capped to the
//! heaviest entries, each annotated with its share of the whole list.

use crate::internal::{AllocationInfo, SortBy};

/// Entries surviving the cut. Anything past this is noise in practice.
pub const MAX_RANKED_ENTRIES: usize = 100;

#[derive(Copy, Clone, Debug)]
pub struct RankedAllocation {
    pub info: AllocationInfo,
    /// Share of the entire input's total size, in percent. Computed before
    /// the cap, so the ranked entries' shares do not sum to 100 unless they
    /// are the whole list.
    pub size_percent: f64,
    /// Share of the entire input's total count, in percent.
    pub count_percent: f64,
}

/// Sorts a copy of the aggregates descending by the given key, keeps the top
/// [MAX_RANKED_ENTRIES], and annotates each with percentage-of-total. Ties
/// land in no particular order.
pub fn rank(entries: &[AllocationInfo], by: SortBy) -> Vec<RankedAllocation> {
    let total_size: i64 = entries.iter().map(|e| e.size).sum();
    let total_count: i64 = entries.iter().map(|e| i64::from(e.count)).sum();

    let mut sorted = entries.to_vec();
    match by {
        SortBy::Size => sorted.sort_unstable_by(|a, b| b.size.cmp(&a.size)),
        SortBy::Count => sorted.sort_unstable_by(|a, b| b.count.cmp(&a.count)),
    }
    sorted.truncate(MAX_RANKED_ENTRIES);

    sorted
        .into_iter()
        .map(|info| RankedAllocation {
            size_percent: percent(info.size, total_size),
            count_percent: percent(i64::from(info.count), total_count),
            info,
        })
        .collect()
}

fn percent(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}
