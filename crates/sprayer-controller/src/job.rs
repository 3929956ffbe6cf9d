// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use serde_json::Value;
use sprayer_hal::ChannelId;
use std::time::{Duration, Instant};

/// Default requested on-time, measured from detection
pub const DEFAULT_DURATION: Duration = Duration::from_secs(1);

/// One requested activation of a channel
///
/// `delay` and `duration` are both measured from `detected_at`, not from the
/// moment the worker picks the job up. `location` is carried through to the
/// audit log and never interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct SprayJob {
    pub channel: ChannelId,
    pub detected_at: Instant,
    pub delay: Duration,
    pub duration: Duration,
    pub location: Value,
}

impl SprayJob {
    /// Job with no delay, a 1 s duration and a null location
    pub fn new(channel: impl Into<ChannelId>, detected_at: Instant) -> Self {
        Self {
            channel: channel.into(),
            detected_at,
            delay: Duration::ZERO,
            duration: DEFAULT_DURATION,
            location: Value::Null,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_location(mut self, location: Value) -> Self {
        self.location = location;
        self
    }
}
