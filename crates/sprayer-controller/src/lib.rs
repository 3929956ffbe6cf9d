// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # sprayer-controller
//!
//! Per-channel job queues and actuator workers with latency compensation.
//!
//! Each detection becomes a [`SprayJob`] naming a channel, the instant of
//! detection and a requested delay and on-time, both measured from that
//! instant. The [`Dispatcher`] queues it on its channel (bounded, oldest job
//! dropped on overflow) and wakes the channel's worker thread. The worker
//! subtracts the time already elapsed, waits out what is left of the delay,
//! energizes the channel and keeps it on for the remaining duration. Jobs
//! that queue up while a channel is on extend the activation without a second
//! switch-on.
//!
//! ```rust,no_run
//! use sprayer_controller::{Controller, ControllerConfig, SprayJob};
//! use sprayer_hal::{ChannelId, RelayBoard};
//! use sprayer_observability::MemoryLineLogger;
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//!
//! let board = RelayBoard::simulated([(ChannelId(0), 27), (ChannelId(1), 22)], Some(4));
//! let controller = Controller::start(
//!     ControllerConfig::new([ChannelId(0), ChannelId(1)]),
//!     Arc::new(board),
//!     Arc::new(MemoryLineLogger::new()),
//! )?;
//!
//! let detected = Instant::now();
//! controller.receive(SprayJob::new(0u8, detected).with_duration(Duration::from_millis(200)))?;
//! # Ok::<(), sprayer_controller::ControllerError>(())
//! ```

pub mod channel;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod queue;
pub mod timing;
mod worker;

pub use channel::{ChannelSlot, WaitOutcome};
pub use controller::{Controller, ControllerConfig};
pub use dispatcher::Dispatcher;
pub use error::{ControllerError, ControllerResult};
pub use job::{SprayJob, DEFAULT_DURATION};
pub use queue::{ChannelQueue, DEFAULT_CAPACITY};
pub use timing::{correct, TimingCorrection};

pub use sprayer_hal::ChannelId;
