// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Receives coarse progress strings ("Loading tables", ...) during a parse.
/// Reports are synchronous, fire-and-forget, and never affect control flow;
/// a tool front-end typically routes them to its status line.
pub trait StatusSink {
    fn report(&mut self, phase: &str);
}

impl<F: FnMut(&str)> StatusSink for F {
    fn report(&mut self, phase: &str) {
        self(phase)
    }
}

/// Discards every report.
pub struct NullStatusSink;

impl StatusSink for NullStatusSink {
    fn report(&mut self, _phase: &str) {}
}
