// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output plus a JSON run log with retention of old runs.

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Keeps the non-blocking file writer alive; logs are flushed on drop
pub struct LoggingGuard {
    _file_guard: tracing_appender::non_blocking::WorkerGuard,
    run_dir: PathBuf,
}

impl LoggingGuard {
    /// Directory holding this run's log files
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }
}

/// Retention policy for old run folders
#[derive(Debug, Clone, Copy)]
pub struct Retention {
    pub days: u64,
    pub runs: usize,
}

impl Default for Retention {
    fn default() -> Self {
        Self { days: 30, runs: 10 }
    }
}

/// Initialize logging with file output and console output
///
/// Creates a timestamped folder structure:
/// ```text
/// ./logs/
///   ├── spray_log.txt          (audit log, written by FileLineLogger)
///   └── run_20250101_120000/
///       └── sprayer.log        (JSON, all crates)
/// ```
///
/// # Arguments
/// * `debug_flags` - Per-crate debug flags for filtering
/// * `base_level` - Level for crates without a debug flag
/// * `log_dir` - Base directory for logs
/// * `retention` - Age/count limits for old run folders
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    base_level: &str,
    log_dir: &Path,
    retention: Retention,
) -> Result<LoggingGuard> {
    let timestamp = Utc::now().format(RUN_TIMESTAMP_FORMAT);
    let run_dir = log_dir.join(format!("{}{}", RUN_PREFIX, timestamp));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create log directory: {}", run_dir.display()))?;

    cleanup_old_logs(log_dir, retention)?;

    let filter = debug_flags.to_filter_string(base_level);
    let env_filter = EnvFilter::try_new(&filter)
        .with_context(|| format!("Invalid log filter: {}", filter))?;

    // Console layer (human-readable)
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_names(true)
        .with_filter(env_filter.clone())
        .boxed();

    let file_appender = rolling::daily(&run_dir, "sprayer.log");
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .json()
        .with_filter(env_filter)
        .boxed();

    Registry::default()
        .with(vec![console_layer, file_layer])
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        run_dir,
    })
}

/// Console-only logging, for tools and tests that must not create files
pub fn init_console_logging(debug_flags: &CrateDebugFlags, base_level: &str) -> Result<()> {
    let filter = debug_flags.to_filter_string(base_level);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter)?)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

/// Clean up old run directories based on retention policy
fn cleanup_old_logs(base_log_dir: &Path, retention: Retention) -> Result<()> {
    if !base_log_dir.exists() {
        return Ok(());
    }

    let cutoff = Utc::now().naive_utc() - chrono::Duration::days(retention.days as i64);

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let started = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(RUN_PREFIX))
            .and_then(|ts| NaiveDateTime::parse_from_str(ts, RUN_TIMESTAMP_FORMAT).ok());
        if let Some(started) = started {
            runs.push((path, started));
        }
    }

    // Oldest first
    runs.sort_by_key(|(_, started)| *started);

    let excess = runs.len().saturating_sub(retention.runs);
    for (index, (path, started)) in runs.iter().enumerate() {
        if index < excess || *started < cutoff {
            if let Err(e) = std::fs::remove_dir_all(path) {
                eprintln!(
                    "Warning: Failed to remove old log directory {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cleanup_keeps_most_recent_runs() {
        let dir = tempdir().unwrap();
        let now = Utc::now();
        for minutes in 0..4 {
            let ts = (now - chrono::Duration::minutes(minutes)).format(RUN_TIMESTAMP_FORMAT);
            std::fs::create_dir_all(dir.path().join(format!("run_{}", ts))).unwrap();
        }
        std::fs::create_dir_all(dir.path().join("not_a_run")).unwrap();

        cleanup_old_logs(dir.path(), Retention { days: 30, runs: 2 }).unwrap();

        let remaining: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|n| n.starts_with(RUN_PREFIX))
            .collect();
        assert_eq!(remaining.len(), 2);
        assert!(dir.path().join("not_a_run").exists());
    }

    #[test]
    fn test_cleanup_removes_expired_runs() {
        let dir = tempdir().unwrap();
        let old = (Utc::now() - chrono::Duration::days(40)).format(RUN_TIMESTAMP_FORMAT);
        let old_dir = dir.path().join(format!("run_{}", old));
        std::fs::create_dir_all(&old_dir).unwrap();

        cleanup_old_logs(dir.path(), Retention::default()).unwrap();

        assert!(!old_dir.exists());
    }
}
