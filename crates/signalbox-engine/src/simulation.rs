//! The engine run: lights, the vehicles queued at them, and teardown.
//!
//! Each light gets `simulation.vehicles` blocking vehicle tasks. A vehicle
//! waits for green, crosses, and queues up again until the run ends. All
//! vehicles at one light share its notification queue, so one Green
//! notification lets exactly one vehicle cross.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use signalbox_core::config::SignalboxConfig;
use signalbox_core::light::LightController;
use signalbox_types::{LightId, Phase};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::EngineError;

/// How long a vehicle waits for green before re-checking for shutdown.
const VEHICLE_POLL: Duration = Duration::from_millis(250);

/// Outcome of one light over the run.
#[derive(Debug, Clone, Serialize)]
pub struct LightSummary {
    /// The light.
    pub light_id: LightId,
    /// Phase changes performed.
    pub transitions: u64,
    /// Phase shown when the light was stopped.
    pub final_phase: Phase,
    /// Vehicles queued at this light.
    pub vehicles: u32,
    /// Total crossings by those vehicles.
    pub crossings: u64,
}

/// Outcome of a whole engine run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// When the first light was started.
    pub started_at: DateTime<Utc>,
    /// When the last vehicle finished.
    pub ended_at: DateTime<Utc>,
    /// Per-light results, in start order.
    pub lights: Vec<LightSummary>,
}

/// Start the configured lights and vehicles, run until `shutdown`
/// resolves, then stop everything and summarize.
///
/// Lights are stopped and joined on every exit path: explicitly on
/// success, and by [`LightController`]'s drop on early error returns.
pub async fn run<F>(config: &SignalboxConfig, shutdown: F) -> Result<RunSummary, EngineError>
where
    F: Future<Output = ()>,
{
    let started_at = Utc::now();

    let mut lights = Vec::new();
    for _ in 0..config.simulation.lights {
        let light = Arc::new(LightController::with_config(&config.light)?);
        light.start()?;
        lights.push(light);
    }
    info!(
        lights = lights.len(),
        vehicles_per_light = config.simulation.vehicles,
        "Lights online"
    );

    let done = Arc::new(AtomicBool::new(false));
    let mut vehicles: Vec<(LightId, JoinHandle<u64>)> = Vec::new();
    for light in &lights {
        for vehicle in 0..config.simulation.vehicles {
            let light_id = light.id();
            let light = Arc::clone(light);
            let done = Arc::clone(&done);
            let handle = tokio::task::spawn_blocking(move || drive(&light, &done, vehicle));
            vehicles.push((light_id, handle));
        }
    }

    shutdown.await;
    info!("Shutting down");

    done.store(true, Ordering::Release);
    for light in &lights {
        light.stop()?;
    }

    let mut crossings: BTreeMap<LightId, u64> = BTreeMap::new();
    for (light_id, handle) in vehicles {
        let crossed = handle.await.map_err(|e| EngineError::Vehicle {
            message: e.to_string(),
        })?;
        let total = crossings.entry(light_id).or_insert(0);
        *total = total.saturating_add(crossed);
    }

    let lights = lights
        .iter()
        .map(|light| LightSummary {
            light_id: light.id(),
            transitions: light.transitions(),
            final_phase: light.current_phase(),
            vehicles: config.simulation.vehicles,
            crossings: crossings.get(&light.id()).copied().unwrap_or(0),
        })
        .collect();

    Ok(RunSummary {
        started_at,
        ended_at: Utc::now(),
        lights,
    })
}

/// Vehicle loop: wait for green, cross, repeat until `done`.
fn drive(light: &LightController, done: &AtomicBool, vehicle: u32) -> u64 {
    let mut crossings: u64 = 0;
    while !done.load(Ordering::Acquire) {
        if light.wait_for_green_timeout(VEHICLE_POLL) {
            crossings = crossings.saturating_add(1);
            debug!(light_id = %light.id(), vehicle, crossings, "Vehicle crossed");
        }
    }
    crossings
}
