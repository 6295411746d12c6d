// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Folds per-callstack aggregates into a call-graph tree: callstacks sharing
//! a prefix of functions share nodes, so "who allocates under main -> Render"
//! reads off the tree directly.

use crate::collections::identifiable::{AddressId, Id, NameId};
use crate::internal::{AllocationInfo, CaptureInfo, SortBy};
use std::cmp::Ordering;

/// Arena index of the root for complete callstacks.
pub const FULL_ROOT: usize = 0;
/// Arena index of the root for callstacks the producer truncated.
pub const TRUNCATED_ROOT: usize = 1;

/// One merged frame. Size and count are cumulative over every aggregate
/// whose callstack passes through this node.
pub struct CallGraphNode {
    /// Address payload. The two roots carry none.
    pub address: Option<AddressId>,
    pub size: i64,
    pub count: i64,
    children: Vec<usize>,
}

impl CallGraphNode {
    fn root() -> Self {
        Self {
            address: None,
            size: 0,
            count: 0,
            children: Vec::new(),
        }
    }
}

/// The merged tree. Nodes live in one arena and reference their children by
/// index, so no cell is shared or aliased while totals accumulate.
pub struct CallGraph {
    nodes: Vec<CallGraphNode>,
}

impl CallGraph {
    /// Folds every aggregate with a non-zero count into the tree. Complete
    /// and truncated callstacks get separate roots, so a truncated stack
    /// never pollutes the real hierarchy under a caller it may not have.
    pub fn build(info: &CaptureInfo, entries: &[AllocationInfo]) -> Self {
        let mut graph = CallGraph {
            nodes: vec![CallGraphNode::root(), CallGraphNode::root()],
        };
        for entry in entries {
            if entry.count == 0 {
                continue;
            }
            let call_stack = &info.call_stacks[entry.call_stack.to_offset()];
            let root = if call_stack.is_truncated {
                TRUNCATED_ROOT
            } else {
                FULL_ROOT
            };
            graph.accumulate(root, entry);
            let mut current = root;
            for &address in &call_stack.address_indices {
                let function = info.addresses[address.to_offset()].function;
                let child = graph.find_or_insert_child(info, current, function, address);
                graph.accumulate(child, entry);
                current = child;
            }
        }
        graph
    }

    fn accumulate(&mut self, index: usize, entry: &AllocationInfo) {
        let node = &mut self.nodes[index];
        node.size += entry.size;
        node.count += i64::from(entry.count);
    }

    /// Children merge by the function of their address rather than the
    /// address itself, so two call sites inside one function fold together.
    /// The first address seen for a function stays as the node's payload.
    fn find_or_insert_child(
        &mut self,
        info: &CaptureInfo,
        parent: usize,
        function: NameId,
        address: AddressId,
    ) -> usize {
        for &child in &self.nodes[parent].children {
            if let Some(child_address) = self.nodes[child].address {
                if info.addresses[child_address.to_offset()].function == function {
                    return child;
                }
            }
        }
        let index = self.nodes.len();
        self.nodes.push(CallGraphNode {
            address: Some(address),
            size: 0,
            count: 0,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(index);
        index
    }

    /// Reorders every node's children, largest first. Nodes without payload
    /// (the roots) never take part in a comparison.
    pub fn sort_children_by(&mut self, by: SortBy) {
        for index in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[index].children);
            children.sort_unstable_by(|&a, &b| Self::order(&self.nodes[a], &self.nodes[b], by));
            self.nodes[index].children = children;
        }
    }

    fn order(a: &CallGraphNode, b: &CallGraphNode, by: SortBy) -> Ordering {
        if a.address.is_none() || b.address.is_none() {
            return Ordering::Equal;
        }
        match by {
            SortBy::Size => b.size.cmp(&a.size),
            SortBy::Count => b.count.cmp(&a.count),
        }
    }

    pub fn node(&self, index: usize) -> &CallGraphNode {
        &self.nodes[index]
    }

    pub fn children(&self, index: usize) -> &[usize] {
        &self.nodes[index].children
    }

    /// Display label: cumulative KiB (integer division), cumulative count,
    /// and the function name for payload nodes.
    pub fn label(&self, info: &CaptureInfo, index: usize) -> String {
        let node = &self.nodes[index];
        let kib = node.size / 1024;
        match node.address {
            Some(address) => format!(
                "{} KiB ({} allocs) {}",
                kib,
                node.count,
                info.function_name(address)
            ),
            None => format!("{} KiB ({} allocs)", kib, node.count),
        }
    }
}
