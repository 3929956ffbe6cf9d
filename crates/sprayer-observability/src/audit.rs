// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Append-only audit log
//!
//! One free-text line per enqueued job and per actuation timing decision.
//! Lines are meant for people reading a field log afterwards, not for parsing.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sink for audit lines, shared by the dispatcher and every channel worker
pub trait LineLogger: Send + Sync {
    /// Append one line. Implementations must not panic on I/O failure.
    fn log_line(&self, line: &str);
}

/// Audit log backed by a file
///
/// Each line is prefixed with an RFC 3339 UTC timestamp and flushed
/// before `log_line` returns.
pub struct FileLineLogger {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileLineLogger {
    /// Open (or create) `path` for appending, creating its directory if needed
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create audit log directory: {}", dir.display())
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open audit log: {}", path.display()))?;

        tracing::info!("[AUDIT] Writing spray audit log to {}", path.display());

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineLogger for FileLineLogger {
    fn log_line(&self, line: &str) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut writer = self.writer.lock();
        let result = writeln!(writer, "{} {}", timestamp, line).and_then(|_| writer.flush());
        if let Err(e) = result {
            tracing::warn!("[AUDIT] Failed to append to {}: {}", self.path.display(), e);
        }
    }
}

impl std::fmt::Debug for FileLineLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLineLogger").field("path", &self.path).finish()
    }
}

/// In-memory audit log
#[derive(Debug, Default)]
pub struct MemoryLineLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryLineLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line logged so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Number of lines containing `needle`
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines.lock().iter().filter(|l| l.contains(needle)).count()
    }
}

impl LineLogger for MemoryLineLogger {
    fn log_line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_logger_creates_directory_and_appends() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        {
            let logger = FileLineLogger::open(log_dir.join("spray_log.txt")).unwrap();
            logger.log_line("channel: 0 | first");
        }
        {
            let logger = FileLineLogger::open(log_dir.join("spray_log.txt")).unwrap();
            logger.log_line("channel: 0 | second");
        }

        let content = std::fs::read_to_string(log_dir.join("spray_log.txt")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("channel: 0 | first"));
        assert!(lines[1].ends_with("channel: 0 | second"));
    }

    #[test]
    fn test_memory_logger_counts() {
        let logger = MemoryLineLogger::new();
        logger.log_line("[INFO] a");
        logger.log_line("[ERROR] b");
        logger.log_line("[INFO] c");

        assert_eq!(logger.lines().len(), 3);
        assert_eq!(logger.count_containing("[INFO]"), 2);
    }
}
