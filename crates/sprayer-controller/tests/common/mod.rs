// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for controller integration tests

#![allow(dead_code)]

use parking_lot::Mutex;
use sprayer_hal::{Actuator, BeepPattern, ChannelId, HalError};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    On(ChannelId),
    Off(ChannelId),
    Beep,
}

/// Actuator that records every call with the instant it happened
pub struct RecordingActuator {
    bound: Mutex<BTreeSet<ChannelId>>,
    events: Mutex<Vec<(Instant, Event)>>,
}

impl RecordingActuator {
    pub fn new(channels: impl IntoIterator<Item = u8>) -> Self {
        Self {
            bound: Mutex::new(channels.into_iter().map(ChannelId).collect()),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().iter().map(|(_, e)| *e).collect()
    }

    pub fn count(&self, event: Event) -> usize {
        self.events.lock().iter().filter(|(_, e)| *e == event).count()
    }

    /// Instant of the first occurrence of `event`
    pub fn first(&self, event: Event) -> Option<Instant> {
        self.events
            .lock()
            .iter()
            .find(|(_, e)| *e == event)
            .map(|(at, _)| *at)
    }

    fn record(&self, channel: ChannelId, event: Event) -> Result<(), HalError> {
        if !self.bound.lock().contains(&channel) {
            return Err(HalError::UnknownChannel(channel));
        }
        self.events.lock().push((Instant::now(), event));
        Ok(())
    }
}

impl Actuator for RecordingActuator {
    fn on(&self, channel: ChannelId) -> Result<(), HalError> {
        self.record(channel, Event::On(channel))
    }

    fn off(&self, channel: ChannelId) -> Result<(), HalError> {
        self.record(channel, Event::Off(channel))
    }

    fn beep(&self, _pattern: BeepPattern) -> Result<(), HalError> {
        self.events.lock().push((Instant::now(), Event::Beep));
        Ok(())
    }

    fn all_on(&self) -> Result<(), HalError> {
        for channel in self.channels() {
            self.on(channel)?;
        }
        Ok(())
    }

    fn all_off(&self) -> Result<(), HalError> {
        for channel in self.channels() {
            self.off(channel)?;
        }
        Ok(())
    }

    fn remove(&self, channel: ChannelId) -> bool {
        self.bound.lock().remove(&channel)
    }

    fn clear(&self) {
        self.bound.lock().clear();
    }

    fn channels(&self) -> Vec<ChannelId> {
        self.bound.lock().iter().copied().collect()
    }
}

/// Poll `condition` every 5 ms until it holds or `timeout` passes
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// An instant `ago` in the past
pub fn detected_ago(ago: Duration) -> Instant {
    Instant::now()
        .checked_sub(ago)
        .expect("monotonic clock older than the requested age")
}
