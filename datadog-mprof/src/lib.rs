// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

pub mod callgraph;
pub mod collections;
pub mod error;
pub mod exclusive;
pub mod export;
pub mod internal;
pub mod mprof;
pub mod status;
pub mod symbols;
