// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Job ingestion
//!
//! The dispatcher routes each job to its channel's slot and records it in the
//! audit log. It never waits on a worker: the only lock it takes besides the
//! routing table is the per-channel queue mutex.

use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use sprayer_hal::ChannelId;
use sprayer_observability::LineLogger;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::channel::ChannelSlot;
use crate::error::{ControllerError, ControllerResult};
use crate::job::SprayJob;

pub(crate) type Routes = Arc<RwLock<BTreeMap<ChannelId, Arc<ChannelSlot>>>>;

/// Cloneable handle for submitting spray jobs
///
/// Clones share the routing table, so a channel removed through the
/// controller stops accepting jobs on every handle.
#[derive(Clone)]
pub struct Dispatcher {
    routes: Routes,
    audit: Arc<dyn LineLogger>,
}

impl Dispatcher {
    pub(crate) fn new(routes: Routes, audit: Arc<dyn LineLogger>) -> Self {
        Self { routes, audit }
    }

    /// Queue a job on its channel and wake the channel's worker
    ///
    /// # Returns
    /// `ControllerError::UnknownChannel` if the channel is not configured or
    /// has been removed; the job is dropped in that case.
    pub fn receive(&self, job: SprayJob) -> ControllerResult<()> {
        let channel = job.channel;
        let audit_line = format_enqueue(&job);

        let evicted = {
            let routes = self.routes.read();
            let slot = routes
                .get(&channel)
                .ok_or(ControllerError::UnknownChannel(channel))?;
            slot.push(job)
        };

        self.audit.log_line(&audit_line);
        debug!("[DISPATCH] Queued job on channel {}", channel);

        if let Some(dropped) = evicted {
            info!(
                "[DISPATCH] Channel {} queue full, dropped job detected {:.3}s ago",
                channel,
                dropped.detected_at.elapsed().as_secs_f64()
            );
        }
        Ok(())
    }

    /// Channels currently accepting jobs, ascending
    pub fn channels(&self) -> Vec<ChannelId> {
        self.routes.read().keys().copied().collect()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channels", &self.channels())
            .finish()
    }
}

/// `channel: 0 | time: <detection, wall clock> | location: .. | delay: .. | duration: ..`
fn format_enqueue(job: &SprayJob) -> String {
    let age = Instant::now().saturating_duration_since(job.detected_at);
    let detected = Utc::now()
        - chrono::Duration::from_std(age).unwrap_or_else(|_| chrono::Duration::zero());

    format!(
        "channel: {} | time: {} | location: {} | delay: {:?} | duration: {:?}",
        job.channel,
        detected.to_rfc3339_opts(SecondsFormat::Millis, true),
        job.location,
        job.delay,
        job.duration
    )
}
