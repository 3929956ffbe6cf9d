// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::time::Duration;

/// Logical actuator channel (one nozzle / relay)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u8);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for ChannelId {
    fn from(value: u8) -> Self {
        ChannelId(value)
    }
}

/// Buzzer signal: `repeats` cycles of `on_time` high followed by `off_time` low
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeepPattern {
    /// Time the buzzer sounds per cycle
    pub on_time: Duration,
    /// Silence between cycles
    pub off_time: Duration,
    /// Number of cycles
    pub repeats: u32,
}

impl BeepPattern {
    /// Pattern with the off-time set to half the on-time
    pub fn new(duration: Duration, repeats: u32) -> Self {
        Self {
            on_time: duration,
            off_time: duration / 2,
            repeats,
        }
    }
}

impl Default for BeepPattern {
    fn default() -> Self {
        Self::new(Duration::from_millis(200), 2)
    }
}

/// Errors raised by actuator backends
#[derive(Debug, thiserror::Error)]
pub enum HalError {
    /// The channel has no pin binding (never configured, removed or cleared)
    #[error("No actuator bound to channel {0}")]
    UnknownChannel(ChannelId),

    /// The pin driver rejected a state change
    #[error("Pin error on {target}: {message}")]
    Pin {
        /// `channel N` or `buzzer`
        target: String,
        /// Driver error, formatted
        message: String,
    },

    /// GPIO line setup failed
    #[error("Failed to set up GPIO {line}: {source}")]
    Setup {
        /// Kernel GPIO line number
        line: u32,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Actuator bank driven by the channel workers
///
/// All methods take `&self`: one instance is shared by every worker thread,
/// so implementations synchronize internally.
///
/// The administrative methods (`all_on`, `all_off`, `remove`, `clear`, `stop`)
/// mutate the live channel mapping. They are best-effort with respect to a
/// worker that is actuating the same channel at that moment.
pub trait Actuator: Send + Sync {
    /// Energize a channel
    ///
    /// # Arguments
    /// * `channel` - Channel to switch on
    ///
    /// # Returns
    /// Ok(()) or `HalError::UnknownChannel` / `HalError::Pin`
    fn on(&self, channel: ChannelId) -> Result<(), HalError>;

    /// De-energize a channel
    ///
    /// # Arguments
    /// * `channel` - Channel to switch off
    fn off(&self, channel: ChannelId) -> Result<(), HalError>;

    /// Sound the buzzer (blocks for the length of the pattern)
    fn beep(&self, pattern: BeepPattern) -> Result<(), HalError>;

    /// Energize every bound channel
    fn all_on(&self) -> Result<(), HalError>;

    /// De-energize every bound channel
    fn all_off(&self) -> Result<(), HalError>;

    /// Drop a channel's binding; returns false if it was not bound
    fn remove(&self, channel: ChannelId) -> bool;

    /// Drop every channel binding
    fn clear(&self);

    /// Currently bound channels, ascending
    fn channels(&self) -> Vec<ChannelId>;

    /// Switch everything off, then drop every binding
    fn stop(&self) -> Result<(), HalError> {
        let result = self.all_off();
        self.clear();
        result
    }
}
