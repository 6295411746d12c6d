// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod allocation;
mod capture;
mod parser;
mod snapshot;

pub use allocation::*;
pub use capture::*;
pub use parser::*;
pub use snapshot::*;
