// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::CaptureError;
use crate::mprof::Platform;

/// Symbol fields for one program counter. Addresses the backend cannot place
/// come back with empty strings, which downstream consumers render as
/// "Unknown"; resolution itself never fails.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolInfo {
    pub function: String,
    pub filename: String,
    pub line: i32,
}

/// A loaded symbol backend for one executable. Implementations live outside
/// this crate (PDB, ELF, map-file readers); the engine only drives the
/// one-time resolution pass with it.
pub trait SymbolResolver {
    fn resolve_address(&mut self, program_counter: u64) -> SymbolInfo;
}

/// Picks a [SymbolResolver] for a capture that carries no embedded symbols,
/// keyed by the capture's platform identifier. Not having a backend for a
/// platform is the typed [CaptureError::ResolverUnavailable] outcome, and it
/// is fatal for that capture.
pub trait ResolverRegistry {
    fn load(
        &self,
        platform: Platform,
        executable: &str,
    ) -> Result<Box<dyn SymbolResolver>, CaptureError>;
}

/// The registry with no backends at all. Captures with embedded symbols
/// parse fine; everything else is unavailable.
pub struct NoResolvers;

impl ResolverRegistry for NoResolvers {
    fn load(
        &self,
        platform: Platform,
        executable: &str,
    ) -> Result<Box<dyn SymbolResolver>, CaptureError> {
        Err(CaptureError::ResolverUnavailable {
            platform,
            executable: executable.to_string(),
        })
    }
}
