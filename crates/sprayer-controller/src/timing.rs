// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Latency compensation
//!
//! A job's delay and duration are requested relative to the detection
//! instant. By the time a worker picks it up some of that time is already
//! gone, so both are shortened by the elapsed time and clamped at zero.

use std::time::{Duration, Instant};

use crate::job::SprayJob;

/// Wait intervals for one job, corrected for time spent in transit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingCorrection {
    /// Time between detection and correction
    pub elapsed: Duration,
    /// `duration - elapsed`, clamped at zero
    pub on_duration: Duration,
    /// How far `duration - elapsed` went below zero, if it did
    pub on_shortfall: Option<Duration>,
    /// `delay - elapsed`, clamped at zero; zero whenever `on_duration` is zero
    pub delay: Duration,
}

/// Correct `job`'s intervals for the time elapsed up to `now`
pub fn correct(job: &SprayJob, now: Instant) -> TimingCorrection {
    let elapsed = now.saturating_duration_since(job.detected_at);

    let (on_duration, on_shortfall) = match job.duration.checked_sub(elapsed) {
        Some(remaining) => (remaining, None),
        None => (Duration::ZERO, Some(elapsed - job.duration)),
    };

    // No point waiting to open a nozzle that would close immediately
    let delay = if on_duration.is_zero() {
        Duration::ZERO
    } else {
        job.delay.saturating_sub(elapsed)
    };

    TimingCorrection {
        elapsed,
        on_duration,
        on_shortfall,
        delay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_at(detected_at: Instant, delay_ms: u64, duration_ms: u64) -> SprayJob {
        SprayJob::new(0u8, detected_at)
            .with_delay(Duration::from_millis(delay_ms))
            .with_duration(Duration::from_millis(duration_ms))
    }

    #[test]
    fn test_subtracts_elapsed() {
        let detected = Instant::now();
        let now = detected + Duration::from_millis(40);

        let t = correct(&job_at(detected, 100, 1000), now);

        assert_eq!(t.elapsed, Duration::from_millis(40));
        assert_eq!(t.on_duration, Duration::from_millis(960));
        assert_eq!(t.delay, Duration::from_millis(60));
        assert_eq!(t.on_shortfall, None);
    }

    #[test]
    fn test_stale_job_clamps_to_zero() {
        let detected = Instant::now();
        let now = detected + Duration::from_secs(5);

        let t = correct(&job_at(detected, 0, 1000), now);

        assert_eq!(t.on_duration, Duration::ZERO);
        assert_eq!(t.on_shortfall, Some(Duration::from_secs(4)));
        assert_eq!(t.delay, Duration::ZERO);
    }

    #[test]
    fn test_delay_dropped_when_nothing_left_to_spray() {
        let detected = Instant::now();
        let now = detected + Duration::from_millis(200);

        // Delay still in the future, duration already spent
        let t = correct(&job_at(detected, 500, 200), now);

        assert_eq!(t.on_duration, Duration::ZERO);
        assert_eq!(t.on_shortfall, None);
        assert_eq!(t.delay, Duration::ZERO);
    }

    #[test]
    fn test_elapsed_delay_is_silent_clamp() {
        let detected = Instant::now();
        let now = detected + Duration::from_millis(80);

        let t = correct(&job_at(detected, 50, 1000), now);

        assert_eq!(t.delay, Duration::ZERO);
        assert_eq!(t.on_duration, Duration::from_millis(920));
        assert_eq!(t.on_shortfall, None);
    }

    #[test]
    fn test_future_detection_counts_as_zero_elapsed() {
        let now = Instant::now();
        let detected = now + Duration::from_millis(10);

        let t = correct(&job_at(detected, 20, 300), now);

        assert_eq!(t.elapsed, Duration::ZERO);
        assert_eq!(t.on_duration, Duration::from_millis(300));
        assert_eq!(t.delay, Duration::from_millis(20));
    }
}
