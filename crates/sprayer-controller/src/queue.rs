// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bounded per-channel job FIFO
//!
//! A full queue evicts its oldest job to make room: the newest detection is
//! always the most relevant one for a nozzle that is already behind.

use std::collections::VecDeque;

use crate::job::SprayJob;

/// Default number of pending jobs per channel
pub const DEFAULT_CAPACITY: usize = 5;

#[derive(Debug)]
pub struct ChannelQueue {
    jobs: VecDeque<SprayJob>,
    capacity: usize,
}

impl ChannelQueue {
    /// Queue holding at most `capacity` jobs (a capacity of 0 is treated as 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            jobs: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a job, returning the job evicted to make room, if any
    pub fn push(&mut self, job: SprayJob) -> Option<SprayJob> {
        let evicted = if self.jobs.len() >= self.capacity {
            self.jobs.pop_front()
        } else {
            None
        };
        self.jobs.push_back(job);
        evicted
    }

    pub fn pop(&mut self) -> Option<SprayJob> {
        self.jobs.pop_front()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every pending job, returning how many there were
    pub fn clear(&mut self) -> usize {
        let dropped = self.jobs.len();
        self.jobs.clear();
        dropped
    }
}

impl Default for ChannelQueue {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
