// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use anyhow::Context;
use clap::{command, Arg, ArgAction};
use datadog_mprof::callgraph::{CallGraph, FULL_ROOT, TRUNCATED_ROOT};
use datadog_mprof::collections::identifiable::Id;
use datadog_mprof::exclusive;
use datadog_mprof::export::csv;
use datadog_mprof::internal::{parse_bytes, AllocationInfo, CaptureInfo, Snapshot, SortBy};
use datadog_mprof::symbols::NoResolvers;
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Median of a sorted slice.
fn median(sorted: &[usize]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) as f64 / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

/// Finds the Q1, Q2, Q3 values. Assumes the slice is sorted. Q1 and Q3 are
/// the medians of the lower and upper halves, excluding the middle element
/// when the length is odd.
fn quartiles(sorted: &[usize]) -> Option<[f64; 3]> {
    if sorted.len() < 4 {
        return None;
    }
    let q2 = median(sorted)?;
    let half = sorted.len() / 2;
    let q1 = median(&sorted[..half])?;
    let q3 = median(&sorted[sorted.len() - half..])?;
    Some([q1, q2, q3])
}

/// Function at the top of an aggregate's callstack, for one-line summaries.
fn leaf_function<'a>(info: &'a CaptureInfo, entry: &AllocationInfo) -> &'a str {
    let name = info
        .call_stacks
        .get(entry.call_stack.to_offset())
        .and_then(|call_stack| call_stack.address_indices.last())
        .map(|&address| info.function_name(address))
        .unwrap_or("");
    if name.is_empty() {
        "Unknown"
    } else {
        name
    }
}

fn print_tree(graph: &CallGraph, info: &CaptureInfo, index: usize, depth: usize) {
    println!("{}{}", "  ".repeat(depth), graph.label(info, index));
    for &child in graph.children(index) {
        print_tree(graph, info, child, depth + 1);
    }
}

#[allow(clippy::unwrap_used)]
fn main() -> anyhow::Result<()> {
    let matches = command!()
        .arg(
            Arg::new("input")
                .short('i')
                .help("the mprof capture to replay")
                .required(true),
        )
        .arg(
            Arg::new("snapshot")
                .long("snapshot")
                .help("snapshot to inspect, by index (defaults to the end state)")
                .required(false),
        )
        .arg(
            Arg::new("diff-from")
                .long("diff-from")
                .help("diff the inspected snapshot against this earlier snapshot index")
                .required(false),
        )
        .arg(
            Arg::new("lifetime")
                .long("lifetime")
                .action(ArgAction::SetTrue)
                .help("aggregate every allocation ever made instead of the live ones")
                .required(false),
        )
        .arg(
            Arg::new("sort")
                .long("sort")
                .help("rank aggregates by 'size' or 'count'")
                .required(false),
        )
        .arg(
            Arg::new("top")
                .long("top")
                .help("how many ranked aggregates to print")
                .required(false),
        )
        .arg(
            Arg::new("tree")
                .long("tree")
                .action(ArgAction::SetTrue)
                .help("print the merged call graph")
                .required(false),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .help("the path to save aggregate CSV rows to")
                .required(false),
        )
        .get_matches();

    let log_level = env::var("DD_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("warn".to_string());
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(&log_level).context("could not parse DD_LOG_LEVEL")?,
        )
        .with_level(true)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    debug!("Logging subsystem enabled");

    let input = matches.get_one::<String>("input").unwrap();
    let output = matches.get_one::<String>("output");
    let snapshot_index = matches
        .get_one::<String>("snapshot")
        .map(|value| value.parse::<usize>())
        .transpose()
        .context("--snapshot takes a snapshot index")?;
    let diff_from = matches
        .get_one::<String>("diff-from")
        .map(|value| value.parse::<usize>())
        .transpose()
        .context("--diff-from takes a snapshot index")?;
    let top = matches
        .get_one::<String>("top")
        .map(|value| value.parse::<usize>())
        .transpose()
        .context("--top takes a number of entries")?
        .unwrap_or(10);
    let sort = match matches.get_one::<String>("sort").map(String::as_str) {
        None | Some("size") => SortBy::Size,
        Some("count") => SortBy::Count,
        Some(other) => anyhow::bail!("unknown sort key {other:?}, expected 'size' or 'count'"),
    };

    let source = {
        println!("Reading capture from file '{input}'");
        std::fs::read(input)?
    };

    let mut status = |phase: &str| println!("{phase}");
    let before = Instant::now();
    let capture = parse_bytes(&source, &NoResolvers, &mut status)?;
    let duration = before.elapsed();

    let info = &capture.info;
    println!(
        "Replayed {} snapshots in {} ms",
        capture.snapshots.len(),
        duration.as_millis()
    );
    println!(
        "Capture of '{}' (version {}, {}): {} names, {} addresses, {} callstacks",
        info.header.executable_name,
        info.header.version,
        info.header.platform,
        info.names.len(),
        info.addresses.len(),
        info.call_stacks.len()
    );
    for (index, snapshot) in capture.snapshots.iter().enumerate() {
        println!(
            "  {index}: {} ({} live allocations)",
            snapshot.label(),
            snapshot.live_allocation_count()
        );
    }

    let mut depths: Vec<usize> = info
        .call_stacks
        .iter()
        .map(|call_stack| call_stack.address_indices.len())
        .collect();
    depths.sort_unstable();
    if let (Some(min), Some([q1, q2, q3]), Some(max)) =
        (depths.first(), quartiles(&depths), depths.last())
    {
        println!("Min stack depth is {min}.");
        println!("Q1 = {q1}, Q2 = {q2}, Q3 = {q3}.");
        println!("Max stack depth is {max}.");
    }

    let snapshot = match snapshot_index {
        Some(index) => capture
            .snapshot(index)
            .with_context(|| format!("capture has no snapshot {index}"))?,
        None => capture.end_snapshot().context("capture has no snapshots")?,
    };
    let diffed;
    let selected = match diff_from {
        Some(index) => {
            let earlier = capture
                .snapshot(index)
                .with_context(|| format!("capture has no snapshot {index}"))?;
            diffed = Snapshot::diff(earlier, snapshot)?;
            &diffed
        }
        None => snapshot,
    };
    let entries = if matches.get_flag("lifetime") {
        selected.lifetime_list()
    } else {
        selected.active_list()
    };

    let sort_label = match sort {
        SortBy::Size => "size",
        SortBy::Count => "count",
    };
    let ranked = exclusive::rank(entries, sort);
    println!();
    println!(
        "Top {} of {} aggregates in '{}' by {}:",
        ranked.len().min(top),
        entries.len(),
        selected.label(),
        sort_label
    );
    for (position, entry) in ranked.iter().take(top).enumerate() {
        println!(
            "{:>3}. {} bytes ({:.1}% of size) in {} allocations ({:.1}% of count) at {}",
            position + 1,
            entry.info.size,
            entry.size_percent,
            entry.info.count,
            entry.count_percent,
            leaf_function(info, &entry.info)
        );
    }

    if matches.get_flag("tree") {
        let mut graph = CallGraph::build(info, entries);
        graph.sort_children_by(sort);
        println!();
        println!("Full callstacks:");
        print_tree(&graph, info, FULL_ROOT, 1);
        println!("Truncated callstacks:");
        print_tree(&graph, info, TRUNCATED_ROOT, 1);
    }

    if let Some(file) = output {
        println!("Writing aggregate CSV to file {file}");
        let mut writer = BufWriter::new(File::create(file)?);
        csv::write_aggregates(&mut writer, info, entries)?;
        writer.flush()?;
    }

    Ok(())
}
