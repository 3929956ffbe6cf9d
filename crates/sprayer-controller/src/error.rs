// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use sprayer_config::ConfigError;
use sprayer_hal::{ChannelId, HalError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    /// No queue/worker is configured for the channel (or it was removed)
    #[error("Unknown channel: {0}")]
    UnknownChannel(ChannelId),

    /// The same channel is listed more than once
    #[error("Channel {0} configured more than once")]
    DuplicateChannel(ChannelId),

    #[error("Failed to spawn worker for channel {channel}: {source}")]
    Spawn {
        channel: ChannelId,
        #[source]
        source: std::io::Error,
    },

    #[error("Actuator error: {0}")]
    Hal(#[from] HalError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Audit log error: {0}")]
    Audit(String),
}

pub type ControllerResult<T> = Result<T, ControllerError>;
