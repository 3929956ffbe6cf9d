// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Channel worker loop (runs in a dedicated thread per channel)
//!
//! ```text
//!   Idle ──job──▶ Draining ──queue empty──▶ off() ──▶ Idle
//!                   │  ▲
//!                   └──┘ next job: stays energized, no second on()
//! ```

use sprayer_hal::{Actuator, ChannelId};
use sprayer_observability::LineLogger;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::channel::{ChannelSlot, WaitOutcome};
use crate::job::SprayJob;
use crate::timing;

pub(crate) struct ChannelWorker {
    channel: ChannelId,
    slot: Arc<ChannelSlot>,
    actuator: Arc<dyn Actuator>,
    audit: Arc<dyn LineLogger>,
    active: bool,
}

impl ChannelWorker {
    pub(crate) fn new(
        channel: ChannelId,
        slot: Arc<ChannelSlot>,
        actuator: Arc<dyn Actuator>,
        audit: Arc<dyn LineLogger>,
    ) -> Self {
        Self {
            channel,
            slot,
            actuator,
            audit,
            active: false,
        }
    }

    /// Consume jobs until the slot is shut down
    pub(crate) fn run(mut self) {
        debug!("[SPRAY-CH{}] Worker started", self.channel);

        while let Some(first) = self.slot.pop_blocking() {
            let mut next = Some(first);
            while let Some(job) = next.take() {
                if self.process(&job) == WaitOutcome::Shutdown {
                    break;
                }
                next = self.slot.try_pop();
            }
            self.deactivate();
        }

        self.deactivate();
        let discarded = self.slot.discard_pending();
        if discarded > 0 {
            info!(
                "[SPRAY-CH{}] Shutdown discarded {} pending job(s)",
                self.channel, discarded
            );
        }
        debug!("[SPRAY-CH{}] Worker stopped", self.channel);
    }

    fn process(&mut self, job: &SprayJob) -> WaitOutcome {
        let correction = timing::correct(job, Instant::now());

        if !self.active {
            if self.slot.sleep(correction.delay) == WaitOutcome::Shutdown {
                return WaitOutcome::Shutdown;
            }
            if let Err(e) = self.actuator.on(self.channel) {
                error!("[SPRAY-CH{}] Failed to switch on: {}", self.channel, e);
            }
            self.active = true;
        }

        if self.slot.sleep(correction.on_duration) == WaitOutcome::Shutdown {
            return WaitOutcome::Shutdown;
        }

        match correction.on_shortfall {
            None => {
                self.audit.log_line(&format!(
                    "[INFO] on-duration {:.3}s applied for channel {}",
                    correction.on_duration.as_secs_f64(),
                    self.channel
                ));
            }
            Some(shortfall) => {
                error!(
                    "[SPRAY-CH{}] Job arrived {:.3}s after its window closed (elapsed {:.3}s)",
                    self.channel,
                    shortfall.as_secs_f64(),
                    correction.elapsed.as_secs_f64()
                );
                self.audit.log_line(&format!(
                    "[ERROR] negative on-duration -{:.3}s for channel {}; activating for 0s",
                    shortfall.as_secs_f64(),
                    self.channel
                ));
            }
        }
        WaitOutcome::Elapsed
    }

    fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = self.actuator.off(self.channel) {
            error!("[SPRAY-CH{}] Failed to switch off: {}", self.channel, e);
        }
        self.active = false;
    }
}
