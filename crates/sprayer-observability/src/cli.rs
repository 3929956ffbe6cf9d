// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-crate debug switches
//!
//! `--debug-sprayer-hal` on the command line or `SPRAYER_DEBUG=sprayer-hal`
//! in the environment raises that crate to `debug` while everything else
//! stays at the configured level. `all` names every crate in [`KNOWN_CRATES`].

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

const ARG_PREFIX: &str = "--debug-";
const ENV_VAR: &str = "SPRAYER_DEBUG";

/// Crates whose log level is raised to `debug`
///
/// ```rust
/// use sprayer_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(["sprayer", "--debug-sprayer-hal"]);
/// assert!(flags.is_enabled("sprayer-hal"));
/// assert_eq!(flags.to_filter_string("info"), "sprayer_hal=debug,info");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Collect every `--debug-<crate>` argument; other arguments are ignored
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::default();
        for arg in args {
            if let Some(name) = arg.as_ref().strip_prefix(ARG_PREFIX) {
                flags.enable(name);
            }
        }
        flags
    }

    /// Add the crates named in a comma-separated list such as `SPRAYER_DEBUG`
    pub fn extend_from_list(&mut self, list: &str) {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .for_each(|name| self.enable(name));
    }

    /// Raise `name` to debug; `all` raises every known crate
    pub fn enable(&mut self, name: &str) {
        if name == "all" {
            self.crates.extend(KNOWN_CRATES.iter().map(|c| c.to_string()));
        } else {
            self.crates.insert(name.to_string());
        }
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.crates.contains(crate_name)
    }

    /// `EnvFilter` directives: one `<target>=debug` per crate, then `base_level`
    ///
    /// Targets use the module-path spelling (`sprayer_hal`), which is what
    /// `tracing` records by default.
    pub fn to_filter_string(&self, base_level: &str) -> String {
        self.crates
            .iter()
            .map(|name| format!("{}=debug", name.replace('-', "_")))
            .chain(std::iter::once(normalize_level(base_level).to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Map user-facing level names onto `EnvFilter` directives
fn normalize_level(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Debug flags from the process arguments merged with `SPRAYER_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(list) = env::var(ENV_VAR) {
        flags.extend_from_list(&list);
    }
    flags
}

/// Help section appended to the daemon's `--help`
pub fn debug_flags_help() -> String {
    format!(
        "Per-crate debug logging:\n  \
         {prefix}<crate>   raise one crate to debug (repeatable)\n  \
         {prefix}all       raise every crate\n  \
         {env}=<crate>[,<crate>...] | all\n\n\
         Crates: {crates}\n",
        prefix = ARG_PREFIX,
        env = ENV_VAR,
        crates = KNOWN_CRATES.join(", ")
    )
}
