// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Detection events as they arrive on the wire
//!
//! One JSON object per line:
//! ```json
//! {"channel": 0, "age_ms": 40, "delay_ms": 0, "duration_ms": 1000, "location": [52.1, 4.3]}
//! ```
//! Only `channel` is required. `age_ms` is how long before the line was
//! read the detection happened; it is turned back into a monotonic instant.

use serde::Deserialize;
use serde_json::Value;
use sprayer_config::DispatchConfig;
use sprayer_controller::SprayJob;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetectionEvent {
    pub channel: u8,
    #[serde(default)]
    pub age_ms: u64,
    pub delay_ms: Option<u64>,
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub location: Value,
}

impl DetectionEvent {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Build the job, filling unset fields from `defaults`
    ///
    /// An age reaching back before the monotonic clock's origin is treated
    /// as "detected at `received_at`".
    pub fn into_job(self, received_at: Instant, defaults: &DispatchConfig) -> SprayJob {
        let detected_at = received_at
            .checked_sub(Duration::from_millis(self.age_ms))
            .unwrap_or(received_at);

        SprayJob::new(self.channel, detected_at)
            .with_delay(
                self.delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| defaults.default_delay()),
            )
            .with_duration(
                self.duration_ms
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| defaults.default_duration()),
            )
            .with_location(self.location)
    }
}
