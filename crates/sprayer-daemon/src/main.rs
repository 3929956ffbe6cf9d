// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::Parser;
use sprayer_config::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config, SprayerConfig,
};
use sprayer_controller::Controller;
use sprayer_observability::{debug_flags_help, init_logging, parse_debug_flags, Retention};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use tracing::{error, info, warn};

use sprayer_daemon::ingest;

/// Sprayer - drives spray nozzles from detection events read on stdin
#[derive(Parser, Debug)]
#[command(name = "sprayer", version, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Path to sprayer.toml (default: SPRAYER_CONFIG_PATH, then search from the working directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Actuator backend: hardware or simulation
    #[arg(long)]
    backend: Option<String>,

    /// Directory for run logs and the spray audit log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Pending jobs kept per channel
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(backend) = &self.backend {
            overrides.insert("backend".to_string(), backend.clone());
        }
        if let Some(dir) = &self.log_dir {
            overrides.insert("log_dir".to_string(), dir.display().to_string());
        }
        if let Some(capacity) = self.queue_capacity {
            overrides.insert("queue_capacity".to_string(), capacity.to_string());
        }
        if self.verbose {
            overrides.insert("log_level".to_string(), "debug".to_string());
        }
        overrides
    }
}

enum Signal {
    Interrupt,
    InputClosed,
}

fn main() -> Result<()> {
    // `--debug-<crate>` flags are consumed here, not by clap
    let debug_flags = parse_debug_flags();
    let args = Args::parse_from(std::env::args().filter(|a| !a.starts_with("--debug-")));

    let config = resolve_config(&args)?;

    let retention = Retention {
        days: config.logging.retention_days,
        runs: config.logging.retention_runs,
    };
    let _logging = init_logging(
        &debug_flags,
        &config.system.log_level,
        &config.logging.dir,
        retention,
    )?;

    info!("Sprayer v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "  Backend: {:?}, channels: {}, queue capacity: {}",
        config.system.backend,
        config.channels.len(),
        config.queue.capacity
    );

    let controller = Controller::from_config(&config).context("Failed to start controller")?;

    let (signal_tx, signal_rx) = mpsc::channel();
    let running = Arc::new(AtomicBool::new(true));

    {
        let signal_tx = signal_tx.clone();
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
            let _ = signal_tx.send(Signal::Interrupt);
        })
        .context("Failed to install Ctrl-C handler")?;
    }

    // Blocked on stdin most of the time; left detached at exit
    let dispatcher = controller.dispatcher();
    let defaults = config.dispatch.clone();
    let reader_running = Arc::clone(&running);
    thread::Builder::new()
        .name("stdin-ingest".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            match ingest(stdin.lock(), &dispatcher, &defaults, &reader_running) {
                Ok(stats) => info!(
                    "Input closed: {} accepted, {} rejected, {} malformed",
                    stats.accepted, stats.rejected, stats.malformed
                ),
                Err(e) => error!("Failed to read detection events: {}", e),
            }
            let _ = signal_tx.send(Signal::InputClosed);
        })
        .context("Failed to spawn stdin reader")?;

    info!("Ready - reading detection events from stdin (Ctrl+C to stop)");

    while let Ok(signal) = signal_rx.recv() {
        match signal {
            Signal::Interrupt => {
                info!("Shutdown signal received...");
                break;
            }
            Signal::InputClosed => {
                warn!("No more input; nozzles stay armed until Ctrl+C");
            }
        }
    }

    controller.shutdown();
    info!("Sprayer shutdown complete");
    Ok(())
}

/// Config file if one is given or found, defaults otherwise; then overrides
fn resolve_config(args: &Args) -> Result<SprayerConfig> {
    let overrides = args.overrides();

    if let Some(path) = &args.config {
        return load_config(Some(path), Some(&overrides))
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    match find_config_file() {
        Ok(path) => load_config(Some(&path), Some(&overrides))
            .with_context(|| format!("Failed to load config from {}", path.display())),
        Err(_) => {
            eprintln!("No sprayer.toml found, using built-in defaults");
            let mut config = SprayerConfig::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &overrides);
            Ok(config)
        }
    }
}
