// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # sprayer-observability
//!
//! Observability infrastructure shared by the sprayer crates.
//!
//! - [`init`]: console + rolling JSON file logging through `tracing`
//! - [`cli`]: per-crate debug flags (`--debug-sprayer-controller`, `SPRAYER_DEBUG`)
//! - [`audit`]: the append-only, human-readable spray audit log

pub mod audit;
pub mod cli;
pub mod init;

pub use audit::{FileLineLogger, LineLogger, MemoryLineLogger};
pub use cli::*;
pub use init::*;

/// Known sprayer crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "sprayer-config",
    "sprayer-hal",
    "sprayer-controller",
    "sprayer-daemon",
];
