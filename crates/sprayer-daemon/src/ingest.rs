// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use sprayer_config::DispatchConfig;
use sprayer_controller::Dispatcher;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

use crate::event::DetectionEvent;

/// Line counts for one ingestion run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// Queued on a channel
    pub accepted: u64,
    /// Well-formed but naming an unknown channel
    pub rejected: u64,
    /// Not a valid detection event
    pub malformed: u64,
}

/// Feed detection events from `reader` to `dispatcher` until EOF or until
/// `running` is cleared
///
/// Bad lines are logged and counted, never fatal. Only a read error ends
/// ingestion early with `Err`.
pub fn ingest<R: BufRead>(
    mut reader: R,
    dispatcher: &Dispatcher,
    defaults: &DispatchConfig,
    running: &AtomicBool,
) -> std::io::Result<IngestStats> {
    let mut stats = IngestStats::default();
    let mut buf = Vec::new();
    let mut line_number = 0u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;
        let received_at = Instant::now();
        if !running.load(Ordering::Relaxed) {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!("[INGEST] Line {}: not UTF-8: {}", line_number, e);
                stats.malformed += 1;
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let event = match DetectionEvent::parse(line) {
            Ok(event) => event,
            Err(e) => {
                warn!("[INGEST] Line {}: malformed event: {}", line_number, e);
                stats.malformed += 1;
                continue;
            }
        };

        match dispatcher.receive(event.into_job(received_at, defaults)) {
            Ok(()) => stats.accepted += 1,
            Err(e) => {
                warn!("[INGEST] Line {}: {}", line_number, e);
                stats.rejected += 1;
            }
        }
    }

    debug!(
        "[INGEST] Input done: {} accepted, {} rejected, {} malformed",
        stats.accepted, stats.rejected, stats.malformed
    );
    Ok(stats)
}
