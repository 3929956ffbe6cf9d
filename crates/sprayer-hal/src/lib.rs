// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! # sprayer-hal
//!
//! Actuator abstraction for the spray controller.
//!
//! This crate provides:
//! - **[`Actuator`]** - the on/off/beep interface the channel workers drive,
//!   plus the administrative operations (all on, all off, remove, clear)
//! - **[`RelayBoard`]** - an `Actuator` over any set of
//!   [`embedded_hal::digital::OutputPin`]s, one per channel plus an optional buzzer
//! - **Pins** - [`SysfsPin`] for Linux GPIO lines and [`SimulatedPin`] for
//!   desktop runs and tests
//!
//! ## Backends
//!
//! ```rust,no_run
//! use sprayer_hal::{Actuator, ChannelId, RelayBoard};
//!
//! // Simulation: same calls, no hardware
//! let board = RelayBoard::simulated([(ChannelId(0), 27), (ChannelId(1), 22)], Some(4));
//! board.on(ChannelId(0)).unwrap();
//! board.off(ChannelId(0)).unwrap();
//!
//! // Hardware: exports the GPIO lines through sysfs
//! let board = RelayBoard::open_sysfs([(ChannelId(0), 27)], Some(4)).unwrap();
//! board.all_off().unwrap();
//! ```

/// Actuator trait, channel identifiers and beep patterns.
pub mod actuator;
/// Output pin implementations.
pub mod pin;
/// Relay board: channel → pin bindings implementing [`Actuator`].
pub mod relay_board;

pub use actuator::{Actuator, BeepPattern, ChannelId, HalError};
pub use pin::{SimulatedPin, SysfsPin, SysfsPinError};
pub use relay_board::RelayBoard;
