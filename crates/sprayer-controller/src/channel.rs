// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared state between the dispatcher and one channel worker
//!
//! The queue and the shutdown flag sit behind a single mutex, paired with a
//! condvar. Producers push and notify; the worker waits on the condvar both
//! when idle and while timing an activation, so a shutdown interrupts any of
//! its waits.

use parking_lot::{Condvar, Mutex};
use std::time::Duration;

use crate::job::SprayJob;
use crate::queue::ChannelQueue;

#[derive(Debug)]
struct ChannelState {
    queue: ChannelQueue,
    shutdown: bool,
}

/// Result of an interruptible wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Shutdown,
}

#[derive(Debug)]
pub struct ChannelSlot {
    state: Mutex<ChannelState>,
    signal: Condvar,
}

impl ChannelSlot {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(ChannelState {
                queue: ChannelQueue::with_capacity(capacity),
                shutdown: false,
            }),
            signal: Condvar::new(),
        }
    }

    /// Enqueue and wake the worker; returns the evicted job on overflow
    pub fn push(&self, job: SprayJob) -> Option<SprayJob> {
        let evicted = self.state.lock().queue.push(job);
        self.signal.notify_one();
        evicted
    }

    /// Block until a job is available
    ///
    /// Returns `None` once the slot has been shut down, even if jobs remain.
    pub fn pop_blocking(&self) -> Option<SprayJob> {
        let mut state = self.state.lock();
        self.signal
            .wait_while(&mut state, |s| s.queue.is_empty() && !s.shutdown);
        if state.shutdown {
            return None;
        }
        state.queue.pop()
    }

    /// Next job if one is queued and the slot is still open
    pub fn try_pop(&self) -> Option<SprayJob> {
        let mut state = self.state.lock();
        if state.shutdown {
            return None;
        }
        state.queue.pop()
    }

    /// Sleep for `duration` unless the slot is shut down first
    ///
    /// The mutex is released for the whole wait, so producers are never
    /// blocked by a worker timing an activation.
    pub fn sleep(&self, duration: Duration) -> WaitOutcome {
        let mut state = self.state.lock();
        if !duration.is_zero() {
            self.signal
                .wait_while_for(&mut state, |s| !s.shutdown, duration);
        }
        if state.shutdown {
            WaitOutcome::Shutdown
        } else {
            WaitOutcome::Elapsed
        }
    }

    /// Flag the slot closed and wake its worker
    pub fn shutdown(&self) {
        self.state.lock().shutdown = true;
        self.signal.notify_all();
    }

    /// Jobs waiting to be picked up
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Drop every pending job, returning how many were dropped
    pub fn discard_pending(&self) -> usize {
        self.state.lock().queue.clear()
    }
}
