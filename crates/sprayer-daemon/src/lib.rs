// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Spray daemon library
//!
//! Decoding and ingestion of detection events, split from the binary so the
//! pipeline can be tested without a terminal.

pub mod event;
pub mod ingest;

pub use event::DetectionEvent;
pub use ingest::{ingest, IngestStats};
