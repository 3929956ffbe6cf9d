// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures the channel map is consistent and that queue and logging values
//! are usable before any worker thread or GPIO line is touched.

use crate::{ConfigError, ConfigResult, SprayerConfig};
use std::collections::HashMap;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "warning", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    DuplicateChannel { id: u8 },
    PinConflict { owner1: String, owner2: String, pin: u32 },
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateChannel { id } => {
                write!(f, "Channel {} is configured more than once", id)
            }
            Self::PinConflict { owner1, owner2, pin } => {
                write!(
                    f,
                    "Pin conflict: {} and {} both use GPIO {}",
                    owner1, owner2, pin
                )
            }
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - At least one channel, no duplicate channel ids
/// - Pin conflicts (channels and buzzer)
/// - Queue capacity and logging values
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &SprayerConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_channels(config, &mut errors);
    validate_pin_conflicts(config, &mut errors);
    validate_value_ranges(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_channels(config: &SprayerConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.channels.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "channels".to_string(),
        });
        return;
    }

    let mut seen = HashMap::new();
    for channel in &config.channels {
        let count = seen.entry(channel.id).or_insert(0usize);
        *count += 1;
        if *count == 2 {
            errors.push(ConfigValidationError::DuplicateChannel { id: channel.id });
        }
    }
}

/// Every GPIO line may drive exactly one output
fn validate_pin_conflicts(config: &SprayerConfig, errors: &mut Vec<ConfigValidationError>) {
    let mut owners: Vec<(String, u32)> = config
        .channels
        .iter()
        .map(|c| (format!("channels[{}]", c.id), c.pin))
        .collect();
    if let Some(pin) = config.buzzer.pin {
        owners.push(("buzzer.pin".to_string(), pin));
    }

    for i in 0..owners.len() {
        for j in i + 1..owners.len() {
            if owners[i].1 == owners[j].1 {
                errors.push(ConfigValidationError::PinConflict {
                    owner1: owners[i].0.clone(),
                    owner2: owners[j].0.clone(),
                    pin: owners[i].1,
                });
            }
        }
    }
}

fn validate_value_ranges(config: &SprayerConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.queue.capacity == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "queue.capacity".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    if config.logging.audit_file.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "logging.audit_file".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.system.log_level.to_lowercase().as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "system.log_level".to_string(),
            reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
        });
    }

    if config.buzzer.startup_beep && config.buzzer.repeats == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "buzzer.repeats".to_string(),
            reason: "must be positive when startup_beep is enabled".to_string(),
        });
    }
}
