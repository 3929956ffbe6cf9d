// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use embedded_hal::digital::OutputPin;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::thread;
use tracing::{debug, info, warn};

use crate::actuator::{Actuator, BeepPattern, ChannelId, HalError};
use crate::pin::{SimulatedPin, SysfsPin};

struct Relay<P> {
    line: u32,
    pin: Mutex<P>,
}

struct Buzzer<P> {
    line: u32,
    pin: Mutex<P>,
}

/// Relay bank: one output pin per channel plus an optional buzzer
///
/// Channel bindings live behind a lock so that `remove`/`clear` can run
/// while workers hold a shared reference to the board.
pub struct RelayBoard<P: OutputPin + Send> {
    relays: RwLock<BTreeMap<ChannelId, Relay<P>>>,
    buzzer: Option<Buzzer<P>>,
}

impl<P: OutputPin + Send> RelayBoard<P> {
    /// Build a board from already-configured pins
    ///
    /// # Arguments
    /// * `relays` - `(channel, gpio line, pin)` per channel
    /// * `buzzer` - `(gpio line, pin)` for the buzzer, if fitted
    pub fn new(
        relays: impl IntoIterator<Item = (ChannelId, u32, P)>,
        buzzer: Option<(u32, P)>,
    ) -> Self {
        let relays = relays
            .into_iter()
            .map(|(channel, line, pin)| {
                (
                    channel,
                    Relay {
                        line,
                        pin: Mutex::new(pin),
                    },
                )
            })
            .collect();

        Self {
            relays: RwLock::new(relays),
            buzzer: buzzer.map(|(line, pin)| Buzzer {
                line,
                pin: Mutex::new(pin),
            }),
        }
    }

    fn set(&self, channel: ChannelId, high: bool) -> Result<(), HalError> {
        let relays = self.relays.read();
        let relay = relays
            .get(&channel)
            .ok_or(HalError::UnknownChannel(channel))?;

        let mut pin = relay.pin.lock();
        let result = if high { pin.set_high() } else { pin.set_low() };
        result.map_err(|e| HalError::Pin {
            target: format!("channel {}", channel),
            message: format!("{:?}", e),
        })?;

        info!(
            "[RELAY] Solenoid {} {} (GPIO {})",
            channel,
            if high { "ON" } else { "OFF" },
            relay.line
        );
        Ok(())
    }

    fn set_all(&self, high: bool) -> Result<(), HalError> {
        let channels = self.channels();
        let mut first_error = None;
        for channel in channels {
            if let Err(e) = self.set(channel, high) {
                warn!("[RELAY] {}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl RelayBoard<SimulatedPin> {
    /// Board of simulated pins; no hardware is touched
    pub fn simulated(
        channels: impl IntoIterator<Item = (ChannelId, u32)>,
        buzzer_line: Option<u32>,
    ) -> Self {
        info!("[RELAY] Using simulated relay board");
        Self::new(
            channels
                .into_iter()
                .map(|(channel, line)| (channel, line, SimulatedPin::new(line))),
            buzzer_line.map(|line| (line, SimulatedPin::new(line))),
        )
    }
}

impl RelayBoard<SysfsPin> {
    /// Board of sysfs GPIO lines, every line exported and driven low
    pub fn open_sysfs(
        channels: impl IntoIterator<Item = (ChannelId, u32)>,
        buzzer_line: Option<u32>,
    ) -> Result<Self, HalError> {
        let mut relays = Vec::new();
        for (channel, line) in channels {
            relays.push((channel, line, SysfsPin::export(line)?));
        }
        let buzzer = match buzzer_line {
            Some(line) => Some((line, SysfsPin::export(line)?)),
            None => None,
        };
        info!("[RELAY] Opened {} relay line(s) via sysfs", relays.len());
        Ok(Self::new(relays, buzzer))
    }
}

impl<P: OutputPin + Send> Actuator for RelayBoard<P> {
    fn on(&self, channel: ChannelId) -> Result<(), HalError> {
        self.set(channel, true)
    }

    fn off(&self, channel: ChannelId) -> Result<(), HalError> {
        self.set(channel, false)
    }

    fn beep(&self, pattern: BeepPattern) -> Result<(), HalError> {
        let Some(buzzer) = &self.buzzer else {
            for _ in 0..pattern.repeats {
                info!("[RELAY] BEEP");
            }
            return Ok(());
        };

        let pin_error = |e: P::Error| HalError::Pin {
            target: "buzzer".to_string(),
            message: format!("{:?}", e),
        };

        let mut pin = buzzer.pin.lock();
        for cycle in 0..pattern.repeats {
            debug!(
                "[RELAY] Beep {}/{} (GPIO {})",
                cycle + 1,
                pattern.repeats,
                buzzer.line
            );
            pin.set_high().map_err(pin_error)?;
            thread::sleep(pattern.on_time);
            pin.set_low().map_err(pin_error)?;
            if cycle + 1 < pattern.repeats {
                thread::sleep(pattern.off_time);
            }
        }
        Ok(())
    }

    fn all_on(&self) -> Result<(), HalError> {
        self.set_all(true)
    }

    fn all_off(&self) -> Result<(), HalError> {
        self.set_all(false)
    }

    fn remove(&self, channel: ChannelId) -> bool {
        let removed = self.relays.write().remove(&channel).is_some();
        if removed {
            info!("[RELAY] Channel {} unbound", channel);
        }
        removed
    }

    fn clear(&self) {
        let mut relays = self.relays.write();
        info!("[RELAY] Unbinding {} channel(s)", relays.len());
        relays.clear();
    }

    fn channels(&self) -> Vec<ChannelId> {
        self.relays.read().keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{ErrorKind, ErrorType};
    use std::time::{Duration, Instant};

    struct Probes {
        board: RelayBoard<SimulatedPin>,
        relays: Vec<SimulatedPin>,
        buzzer: SimulatedPin,
    }

    fn probed_board() -> Probes {
        let relays: Vec<SimulatedPin> = [27, 22, 23].into_iter().map(SimulatedPin::new).collect();
        let buzzer = SimulatedPin::new(4);
        let board = RelayBoard::new(
            relays
                .iter()
                .enumerate()
                .map(|(i, pin)| (ChannelId(i as u8), pin.line(), pin.clone())),
            Some((4, buzzer.clone())),
        );
        Probes {
            board,
            relays,
            buzzer,
        }
    }

    #[test]
    fn test_on_off_drive_only_the_bound_pin() {
        let probes = probed_board();

        probes.board.on(ChannelId(1)).unwrap();
        assert!(!probes.relays[0].is_high());
        assert!(probes.relays[1].is_high());
        assert!(!probes.relays[2].is_high());

        probes.board.off(ChannelId(1)).unwrap();
        assert!(!probes.relays[1].is_high());
    }

    #[test]
    fn test_unknown_channel() {
        let probes = probed_board();
        assert!(matches!(
            probes.board.on(ChannelId(9)),
            Err(HalError::UnknownChannel(ChannelId(9)))
        ));
    }

    #[test]
    fn test_all_on_all_off() {
        let probes = probed_board();

        probes.board.all_on().unwrap();
        assert!(probes.relays.iter().all(|p| p.is_high()));

        probes.board.all_off().unwrap();
        assert!(probes.relays.iter().all(|p| !p.is_high()));
    }

    #[test]
    fn test_remove_and_clear_unbind_channels() {
        let probes = probed_board();

        assert!(probes.board.remove(ChannelId(0)));
        assert!(!probes.board.remove(ChannelId(0)));
        assert_eq!(probes.board.channels(), vec![ChannelId(1), ChannelId(2)]);
        assert!(probes.board.off(ChannelId(0)).is_err());

        probes.board.clear();
        assert!(probes.board.channels().is_empty());
    }

    #[test]
    fn test_stop_switches_off_before_unbinding() {
        let probes = probed_board();
        probes.board.all_on().unwrap();

        probes.board.stop().unwrap();

        assert!(probes.relays.iter().all(|p| !p.is_high()));
        assert!(probes.board.channels().is_empty());
    }

    #[test]
    fn test_beep_ends_low_and_takes_pattern_time() {
        let probes = probed_board();
        let pattern = BeepPattern::new(Duration::from_millis(20), 2);

        let start = Instant::now();
        probes.board.beep(pattern).unwrap();

        // Two on-times and one off-time between them
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(!probes.buzzer.is_high());
    }

    #[test]
    fn test_beep_without_buzzer_is_ok() {
        let board = RelayBoard::simulated([(ChannelId(0), 27)], None);
        board.beep(BeepPattern::default()).unwrap();
    }

    #[derive(Debug)]
    struct Stuck;

    impl embedded_hal::digital::Error for Stuck {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = Stuck;
    }

    impl OutputPin for BrokenPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Err(Stuck)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Err(Stuck)
        }
    }

    #[test]
    fn test_pin_failure_is_reported_per_channel() {
        let board = RelayBoard::new([(ChannelId(3), 9, BrokenPin)], None);

        match board.on(ChannelId(3)) {
            Err(HalError::Pin { target, message }) => {
                assert_eq!(target, "channel 3");
                assert_eq!(message, "Stuck");
            }
            other => panic!("expected pin error, got {:?}", other),
        }
        assert!(board.all_off().is_err());
    }
}
