// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin, StatefulOutputPin};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::HalError;

/// Default sysfs GPIO root on Linux
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Output line driven through the Linux sysfs GPIO interface
///
/// The line is exported and configured as an output on open, and driven low
/// again when dropped.
pub struct SysfsPin {
    line: u32,
    value: File,
}

/// Write failure on a sysfs value file
#[derive(Debug)]
pub struct SysfsPinError(pub std::io::Error);

impl digital::Error for SysfsPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl SysfsPin {
    /// Export `line` under `/sys/class/gpio` and configure it as a low output
    pub fn export(line: u32) -> Result<Self, HalError> {
        Self::export_at(Path::new(SYSFS_GPIO_ROOT), line)
    }

    /// Export `line` under a custom sysfs root
    ///
    /// # Arguments
    /// * `root` - Directory containing `export` and the `gpioN` folders
    /// * `line` - Kernel GPIO line number
    pub fn export_at(root: &Path, line: u32) -> Result<Self, HalError> {
        let setup = |source| HalError::Setup { line, source };
        let line_dir = root.join(format!("gpio{}", line));

        if !line_dir.exists() {
            std::fs::write(root.join("export"), line.to_string()).map_err(setup)?;
        }

        // udev may still be applying permissions to a freshly exported line
        let direction = line_dir.join("direction");
        let max_retries = 20;
        let mut attempt = 1;
        loop {
            match std::fs::write(&direction, "low") {
                Ok(()) => break,
                Err(e) if attempt < max_retries => {
                    debug!(
                        "[GPIO] Retry {}/{} configuring GPIO {}: {}",
                        attempt, max_retries, line, e
                    );
                    attempt += 1;
                    thread::sleep(Duration::from_millis(50));
                }
                Err(e) => return Err(setup(e)),
            }
        }

        let value = OpenOptions::new()
            .write(true)
            .open(value_path(&line_dir))
            .map_err(setup)?;

        info!("[GPIO] GPIO {} exported as output", line);
        Ok(Self { line, value })
    }

    fn write_level(&mut self, level: &[u8]) -> Result<(), SysfsPinError> {
        self.value.seek(SeekFrom::Start(0)).map_err(SysfsPinError)?;
        self.value.write_all(level).map_err(SysfsPinError)
    }
}

fn value_path(line_dir: &Path) -> PathBuf {
    line_dir.join("value")
}

impl ErrorType for SysfsPin {
    type Error = SysfsPinError;
}

impl OutputPin for SysfsPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write_level(b"0")
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write_level(b"1")
    }
}

impl Drop for SysfsPin {
    fn drop(&mut self) {
        if let Err(e) = self.write_level(b"0") {
            warn!("[GPIO] Failed to drive GPIO {} low on release: {:?}", self.line, e);
        }
    }
}

/// Pin that only records and logs its level
///
/// Clones share state, so a test can keep a clone to observe the level the
/// relay board last wrote.
#[derive(Debug, Clone)]
pub struct SimulatedPin {
    line: u32,
    high: Arc<AtomicBool>,
}

impl SimulatedPin {
    /// New low pin standing in for GPIO `line`
    pub fn new(line: u32) -> Self {
        Self {
            line,
            high: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Simulated GPIO line number
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Level last written
    pub fn is_high(&self) -> bool {
        self.high.load(Ordering::Acquire)
    }
}

impl ErrorType for SimulatedPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for SimulatedPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        debug!("[SIM] GPIO {} -> low", self.line);
        self.high.store(false, Ordering::Release);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        debug!("[SIM] GPIO {} -> high", self.line);
        self.high.store(true, Ordering::Release);
        Ok(())
    }
}

impl StatefulOutputPin for SimulatedPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_high())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_high())
    }
}
