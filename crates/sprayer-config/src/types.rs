// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `sprayer.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SprayerConfig {
    pub system: SystemConfig,
    pub channels: Vec<ChannelConfig>,
    pub queue: QueueConfig,
    pub buzzer: BuzzerConfig,
    pub logging: LoggingConfig,
    pub dispatch: DispatchConfig,
}

impl Default for SprayerConfig {
    fn default() -> Self {
        Self {
            system: SystemConfig::default(),
            channels: default_channels(),
            queue: QueueConfig::default(),
            buzzer: BuzzerConfig::default(),
            logging: LoggingConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

/// Actuator backend selection
///
/// Chosen once at startup. `Simulation` never touches hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorBackend {
    Hardware,
    #[default]
    Simulation,
}

impl std::str::FromStr for ActuatorBackend {
    type Err = crate::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hardware" | "gpio" => Ok(ActuatorBackend::Hardware),
            "simulation" | "sim" | "test" => Ok(ActuatorBackend::Simulation),
            other => Err(crate::ConfigError::InvalidValue(format!(
                "unknown actuator backend '{}' (expected 'hardware' or 'simulation')",
                other
            ))),
        }
    }
}

/// System-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    pub backend: ActuatorBackend,
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            backend: ActuatorBackend::Simulation,
            log_level: "info".to_string(),
        }
    }
}

/// One actuator channel and the GPIO line that drives it
///
/// `pin` is the kernel GPIO line number (BCM numbering on a Raspberry Pi),
/// not the physical header position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChannelConfig {
    pub id: u8,
    pub pin: u32,
}

/// Four nozzles on header pins 13, 15, 16 and 18
pub fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig { id: 0, pin: 27 },
        ChannelConfig { id: 1, pin: 22 },
        ChannelConfig { id: 2, pin: 23 },
        ChannelConfig { id: 3, pin: 24 },
    ]
}

/// Per-channel job queue settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum pending jobs per channel; the oldest is dropped on overflow
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { capacity: 5 }
    }
}

/// Buzzer wiring and startup confirmation signal
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BuzzerConfig {
    /// GPIO line for the buzzer (`None` = no buzzer fitted)
    pub pin: Option<u32>,
    pub startup_beep: bool,
    pub beep_ms: u64,
    pub repeats: u32,
}

impl Default for BuzzerConfig {
    fn default() -> Self {
        Self {
            pin: Some(4),
            startup_beep: true,
            beep_ms: 500,
            repeats: 2,
        }
    }
}

impl BuzzerConfig {
    /// On-time of a single beep
    pub fn on_time(&self) -> Duration {
        Duration::from_millis(self.beep_ms)
    }

    /// Off-time between beeps (half the on-time)
    pub fn off_time(&self) -> Duration {
        Duration::from_millis(self.beep_ms / 2)
    }
}

/// Operational and audit logging
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base directory for run logs and the audit file
    pub dir: PathBuf,
    /// Append-only audit file name (inside `dir`)
    pub audit_file: String,
    pub retention_days: u64,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            audit_file: "spray_log.txt".to_string(),
            retention_days: 30,
            retention_runs: 10,
        }
    }
}

impl LoggingConfig {
    /// Full path of the audit file
    pub fn audit_path(&self) -> PathBuf {
        self.dir.join(&self.audit_file)
    }
}

/// Defaults applied to detection events that omit timing fields
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub default_delay_ms: u64,
    pub default_duration_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: 0,
            default_duration_ms: 1000,
        }
    }
}

impl DispatchConfig {
    pub fn default_delay(&self) -> Duration {
        Duration::from_millis(self.default_delay_ms)
    }

    pub fn default_duration(&self) -> Duration {
        Duration::from_millis(self.default_duration_ms)
    }
}

impl SprayerConfig {
    /// Channel ids paired with their GPIO lines, in configuration order
    pub fn channel_pins(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.channels.iter().map(|c| (c.id, c.pin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("hardware".parse::<ActuatorBackend>().unwrap(), ActuatorBackend::Hardware);
        assert_eq!("SIM".parse::<ActuatorBackend>().unwrap(), ActuatorBackend::Simulation);
        assert!("pwm".parse::<ActuatorBackend>().is_err());
    }

    #[test]
    fn test_buzzer_off_time_is_half_on_time() {
        let buzzer = BuzzerConfig::default();
        assert_eq!(buzzer.on_time(), Duration::from_millis(500));
        assert_eq!(buzzer.off_time(), Duration::from_millis(250));
    }

    #[test]
    fn test_missing_channels_section_uses_defaults() {
        let config: SprayerConfig = toml::from_str("[queue]\ncapacity = 3\n").unwrap();
        assert_eq!(config.channels, default_channels());
        assert_eq!(config.queue.capacity, 3);
    }

    #[test]
    fn test_audit_path_joins_dir_and_file() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.audit_path(), PathBuf::from("logs").join("spray_log.txt"));
    }
}
