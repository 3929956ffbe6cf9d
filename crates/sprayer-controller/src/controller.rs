// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Spray Controller
//!
//! Composition root: one [`ChannelSlot`] + worker thread per configured
//! channel, a shared [`Actuator`] and a shared audit [`LineLogger`].
//!
//! Startup:
//! 1. Spawn one `spray-ch<N>` thread per channel
//! 2. Wait until every worker reports ready
//! 3. Log "setup complete" and sound the confirmation beep

use parking_lot::Mutex;
use sprayer_config::{validate_config, ActuatorBackend, SprayerConfig};
use sprayer_hal::{Actuator, BeepPattern, ChannelId, RelayBoard};
use sprayer_observability::{FileLineLogger, LineLogger};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

use crate::channel::ChannelSlot;
use crate::dispatcher::{Dispatcher, Routes};
use crate::error::{ControllerError, ControllerResult};
use crate::job::SprayJob;
use crate::queue::DEFAULT_CAPACITY;
use crate::worker::ChannelWorker;

/// Construction parameters independent of any file format
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub channels: Vec<ChannelId>,
    pub queue_capacity: usize,
    /// Sounded once every worker is running; `None` to start silently
    pub startup_beep: Option<BeepPattern>,
}

impl ControllerConfig {
    pub fn new(channels: impl IntoIterator<Item = ChannelId>) -> Self {
        Self {
            channels: channels.into_iter().collect(),
            queue_capacity: DEFAULT_CAPACITY,
            startup_beep: None,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_startup_beep(mut self, pattern: BeepPattern) -> Self {
        self.startup_beep = Some(pattern);
        self
    }
}

impl From<&SprayerConfig> for ControllerConfig {
    fn from(config: &SprayerConfig) -> Self {
        let startup_beep = config.buzzer.startup_beep.then(|| BeepPattern {
            on_time: config.buzzer.on_time(),
            off_time: config.buzzer.off_time(),
            repeats: config.buzzer.repeats,
        });
        Self {
            channels: config.channels.iter().map(|c| ChannelId(c.id)).collect(),
            queue_capacity: config.queue.capacity,
            startup_beep,
        }
    }
}

struct WorkerHandle {
    slot: Arc<ChannelSlot>,
    thread: JoinHandle<()>,
}

/// Owns the per-channel pipelines
///
/// Dropping the controller shuts every worker down and joins it.
pub struct Controller {
    routes: Routes,
    dispatcher: Dispatcher,
    actuator: Arc<dyn Actuator>,
    workers: Mutex<BTreeMap<ChannelId, WorkerHandle>>,
}

impl Controller {
    /// Spawn one worker per channel and run the startup sequence
    ///
    /// # Arguments
    /// * `config` - Channels, queue capacity and startup beep
    /// * `actuator` - Shared actuator bank; must already bind every channel
    /// * `audit` - Sink for enqueue and timing lines
    pub fn start(
        config: ControllerConfig,
        actuator: Arc<dyn Actuator>,
        audit: Arc<dyn LineLogger>,
    ) -> ControllerResult<Self> {
        let mut seen = BTreeSet::new();
        if let Some(&duplicate) = config.channels.iter().find(|&&c| !seen.insert(c)) {
            return Err(ControllerError::DuplicateChannel(duplicate));
        }

        let routes: Routes = Arc::default();
        let (ready_tx, ready_rx) = mpsc::channel::<ChannelId>();
        let mut workers = BTreeMap::new();

        for &channel in &config.channels {
            let slot = Arc::new(ChannelSlot::new(config.queue_capacity));
            let worker = ChannelWorker::new(
                channel,
                Arc::clone(&slot),
                Arc::clone(&actuator),
                Arc::clone(&audit),
            );
            let ready = ready_tx.clone();

            let spawned = thread::Builder::new()
                .name(format!("spray-ch{}", channel))
                .spawn(move || {
                    let _ = ready.send(channel);
                    worker.run();
                });

            match spawned {
                Ok(thread) => {
                    routes.write().insert(channel, Arc::clone(&slot));
                    workers.insert(channel, WorkerHandle { slot, thread });
                }
                Err(source) => {
                    error!(
                        "[CONTROLLER] Failed to spawn worker for channel {}: {}",
                        channel, source
                    );
                    for (_, worker) in workers {
                        stop_worker(worker);
                    }
                    return Err(ControllerError::Spawn { channel, source });
                }
            }
        }
        drop(ready_tx);

        // A worker that panicked before reporting drops its sender; recv then
        // fails once every sender is gone instead of blocking forever.
        for _ in 0..workers.len() {
            if ready_rx.recv().is_err() {
                warn!("[CONTROLLER] A worker exited before reporting ready");
                break;
            }
        }

        info!(
            "[CONTROLLER] Setup complete: {} channel(s), queue capacity {}",
            workers.len(),
            config.queue_capacity.max(1)
        );

        if let Some(pattern) = config.startup_beep {
            if let Err(e) = actuator.beep(pattern) {
                warn!("[CONTROLLER] Startup beep failed: {}", e);
            }
        }

        Ok(Self {
            dispatcher: Dispatcher::new(Arc::clone(&routes), audit),
            routes,
            actuator,
            workers: Mutex::new(workers),
        })
    }

    /// Validate `config`, build its backend and audit log, and start
    pub fn from_config(config: &SprayerConfig) -> ControllerResult<Self> {
        validate_config(config)?;

        let pins: Vec<(ChannelId, u32)> = config
            .channel_pins()
            .map(|(id, pin)| (ChannelId(id), pin))
            .collect();

        let actuator: Arc<dyn Actuator> = match config.system.backend {
            ActuatorBackend::Hardware => {
                Arc::new(RelayBoard::open_sysfs(pins, config.buzzer.pin)?)
            }
            ActuatorBackend::Simulation => {
                Arc::new(RelayBoard::simulated(pins, config.buzzer.pin))
            }
        };

        let audit = FileLineLogger::open(config.logging.audit_path())
            .map_err(|e| ControllerError::Audit(format!("{:#}", e)))?;

        Self::start(ControllerConfig::from(config), actuator, Arc::new(audit))
    }

    /// Submit a job; see [`Dispatcher::receive`]
    pub fn receive(&self, job: SprayJob) -> ControllerResult<()> {
        self.dispatcher.receive(job)
    }

    /// Handle for submitting jobs from other threads
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Channels with a running worker, ascending
    pub fn channels(&self) -> Vec<ChannelId> {
        self.workers.lock().keys().copied().collect()
    }

    /// Jobs queued on `channel`, not counting the one being processed
    pub fn pending(&self, channel: ChannelId) -> Option<usize> {
        self.workers.lock().get(&channel).map(|w| w.slot.pending())
    }

    /// Energize every bound channel
    pub fn all_on(&self) -> ControllerResult<()> {
        Ok(self.actuator.all_on()?)
    }

    /// De-energize every bound channel
    pub fn all_off(&self) -> ControllerResult<()> {
        Ok(self.actuator.all_off()?)
    }

    /// Stop accepting jobs for `channel`, stop its worker and unbind it
    pub fn remove_channel(&self, channel: ChannelId) -> ControllerResult<()> {
        self.routes.write().remove(&channel);
        let worker = self
            .workers
            .lock()
            .remove(&channel)
            .ok_or(ControllerError::UnknownChannel(channel))?;

        stop_worker(worker);
        self.actuator.remove(channel);
        info!("[CONTROLLER] Channel {} removed", channel);
        Ok(())
    }

    /// Remove every channel
    pub fn clear(&self) {
        for channel in self.channels() {
            if let Err(e) = self.remove_channel(channel) {
                warn!("[CONTROLLER] {}", e);
            }
        }
        self.actuator.clear();
    }

    /// Stop every worker and wait for it to exit
    ///
    /// Workers switch their channel off if it is on and discard pending
    /// jobs. Actuator bindings are kept. Calling this twice is harmless.
    pub fn shutdown(&self) {
        self.routes.write().clear();
        let workers = std::mem::take(&mut *self.workers.lock());
        if workers.is_empty() {
            return;
        }

        info!("[CONTROLLER] Shutting down {} worker(s)", workers.len());
        for worker in workers.values() {
            worker.slot.shutdown();
        }
        for (_, worker) in workers {
            join_worker(worker.thread);
        }
        info!("[CONTROLLER] All workers stopped");
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("channels", &self.channels())
            .finish()
    }
}

fn stop_worker(worker: WorkerHandle) {
    worker.slot.shutdown();
    join_worker(worker.thread);
}

fn join_worker(thread: JoinHandle<()>) {
    let name = thread.thread().name().unwrap_or("spray-ch?").to_string();
    if thread.join().is_err() {
        error!("[CONTROLLER] Worker thread {} panicked", name);
    }
}
