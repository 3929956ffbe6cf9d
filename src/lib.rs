// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Sprayer - per-channel timed actuator control
//!
//! Drives a bank of spray nozzles (or any on/off actuators) from detection
//! events that arrive some time after the detection itself. Each channel has
//! its own bounded job queue and worker thread; the worker subtracts the time
//! a job spent in transit from its requested delay and on-time.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! sprayer = "0.1"  # Default: controller
//! ```
//!
//! ## Feature Flags
//!
//! - **`controller`** (default): job queues, workers, dispatcher
//! - **`daemon`**: stdin event decoding used by the `sprayer` binary
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sprayer::prelude::*;
//! use std::time::{Duration, Instant};
//!
//! let config = SprayerConfig::default();
//! let controller = Controller::from_config(&config)?;
//!
//! let job = SprayJob::new(0u8, Instant::now()).with_duration(Duration::from_millis(300));
//! controller.receive(job)?;
//! # Ok::<(), sprayer::controller::ControllerError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! detection ──▶ Dispatcher ──▶ ChannelSlot[n] ──▶ worker spray-ch<n> ──▶ Actuator
//!                   │              (queue)           (timing)          (RelayBoard)
//!                   └──────────────▶ audit log ◀────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use sprayer_config as config;
pub use sprayer_hal as hal;
pub use sprayer_observability as observability;

#[cfg(feature = "controller")]
pub use sprayer_controller as controller;

#[cfg(feature = "daemon")]
pub use sprayer_daemon as daemon;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, validate_config, ActuatorBackend, SprayerConfig};
    pub use crate::hal::{Actuator, BeepPattern, ChannelId, RelayBoard};
    pub use crate::observability::{FileLineLogger, LineLogger, MemoryLineLogger};

    #[cfg(feature = "controller")]
    pub use crate::controller::{Controller, ControllerConfig, Dispatcher, SprayJob};
}
