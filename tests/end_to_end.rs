// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end: TOML config → controller → simulated relay board → audit file

use sprayer::config::load_config;
use sprayer::controller::ControllerError;
use sprayer::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("sprayer.toml");
    std::fs::write(&path, body).unwrap();
    path
}

fn config_in(dir: &Path) -> SprayerConfig {
    let body = format!(
        r#"
[system]
backend = "simulation"

[[channels]]
id = 0
pin = 27

[[channels]]
id = 1
pin = 22

[buzzer]
pin = 4
startup_beep = true
beep_ms = 10
repeats = 1

[logging]
dir = "{}"
audit_file = "spray_log.txt"
"#,
        dir.join("logs").display().to_string().replace('\\', "/")
    );
    let path = write_config(dir, &body);
    load_config(Some(&path), None).unwrap()
}

fn wait_for_audit(path: &Path, needle: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if std::fs::read_to_string(path)
            .map(|c| c.contains(needle))
            .unwrap_or(false)
        {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn test_overlapping_jobs_are_audited() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let audit_path = config.logging.audit_path();

    let controller = Controller::from_config(&config).unwrap();
    assert_eq!(controller.channels(), vec![ChannelId(0), ChannelId(1)]);

    let detected = Instant::now();
    controller
        .receive(SprayJob::new(0u8, detected).with_duration(Duration::from_millis(200)))
        .unwrap();
    controller
        .receive(SprayJob::new(0u8, detected).with_duration(Duration::from_millis(20)))
        .unwrap();

    // Second job is picked up only after the first window closes
    assert!(wait_for_audit(&audit_path, "for channel 0; activating for 0s", Duration::from_secs(2)));
    controller.shutdown();

    let content = std::fs::read_to_string(&audit_path).unwrap();
    let enqueued = content.lines().filter(|l| l.contains("channel: 0 | time: ")).count();
    let applied = content.lines().filter(|l| l.contains("[INFO] on-duration")).count();
    assert_eq!(enqueued, 2);
    assert_eq!(applied, 1);
}

#[test]
fn test_unknown_channel_reported_to_caller() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());

    let controller = Controller::from_config(&config).unwrap();
    let result = controller.receive(SprayJob::new(3u8, Instant::now()));

    assert!(matches!(result, Err(ControllerError::UnknownChannel(ChannelId(3)))));
}

#[test]
fn test_invalid_config_is_rejected_before_start() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.buzzer.pin = Some(27);

    let result = Controller::from_config(&config);

    assert!(matches!(result, Err(ControllerError::Config(_))));
    assert!(!config.logging.audit_path().exists());
}
