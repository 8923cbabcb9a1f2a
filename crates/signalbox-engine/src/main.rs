//! Engine binary for the Signalbox traffic light.
//!
//! Loads configuration, starts the configured lights with vehicles
//! queued at each, runs until the configured time elapses or Ctrl-C, then
//! stops every light and prints a JSON run summary to stdout.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `signalbox-config.yaml` (or the path in
//!    `SIGNALBOX_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Start lights and vehicles
//! 4. Wait for the run to end
//! 5. Stop lights, join vehicles, print the summary

mod error;
mod logging;
mod simulation;

use std::path::PathBuf;
use std::time::Duration;

use signalbox_core::config::SignalboxConfig;
use tracing::{info, warn};

use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "signalbox-config.yaml";

/// Environment variable naming an alternative configuration file.
const CONFIG_PATH_ENV: &str = "SIGNALBOX_CONFIG";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration is invalid, a light fails to start
/// or stop, or the summary cannot be written.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, loaded_from) = load_config()?;

    // 2. Initialize structured logging.
    logging::init(&config.logging);
    info!("signalbox-engine starting");
    match loaded_from {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        lights = config.simulation.lights,
        vehicles = config.simulation.vehicles,
        run_seconds = config.simulation.run_seconds,
        cycle_min_ms = config.light.cycle_min_ms,
        cycle_max_ms = config.light.cycle_max_ms,
        removal_order = ?config.light.removal_order,
        "Run parameters"
    );

    // 3-5. Run.
    let summary = simulation::run(&config, shutdown_signal(config.simulation.run_seconds)).await?;

    let json = serde_json::to_string_pretty(&summary).map_err(EngineError::from)?;
    println!("{json}");

    info!("signalbox-engine shutdown complete");
    Ok(())
}

/// Load configuration, returning the path it came from if a file was read.
fn load_config() -> Result<(SignalboxConfig, Option<PathBuf>), EngineError> {
    load_config_from(std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
}

/// Load from `explicit` if given, else from the default path if present.
///
/// A missing explicit file is an error. Only a missing default file falls
/// back to built-in defaults.
fn load_config_from(
    explicit: Option<PathBuf>,
) -> Result<(SignalboxConfig, Option<PathBuf>), EngineError> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !path.exists() {
                let mut config = SignalboxConfig::default();
                config.logging.apply_env_overrides();
                return Ok((config, None));
            }
            path
        }
    };
    let config = SignalboxConfig::from_file(&path)?;
    Ok((config, Some(path)))
}

/// Resolve when the run should end: after `run_seconds` (unless 0) or on
/// Ctrl-C, whichever comes first.
async fn shutdown_signal(run_seconds: u64) {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    if run_seconds == 0 {
        interrupt.await;
        info!("Interrupt received");
        return;
    }

    tokio::select! {
        () = interrupt => info!("Interrupt received"),
        () = tokio::time::sleep(Duration::from_secs(run_seconds)) => {
            info!(run_seconds, "Run time elapsed");
        }
    }
}
