//! Public traffic light controller.
//!
//! A [`LightController`] owns one notification [`BlockingQueue`], one
//! [`PhaseState`] snapshot and, once started, one background
//! [`PhaseCycler`] thread. It offers a blocking
//! [`wait_for_green`](LightController::wait_for_green) and a non-blocking
//! [`current_phase`](LightController::current_phase).
//!
//! # Lifecycle
//!
//! 1. [`new`](LightController::new) -- phase is Red, nothing running.
//! 2. [`start`](LightController::start) -- spawns the cycler. Allowed once.
//! 3. [`stop`](LightController::stop) -- stops and joins the cycler. Also
//!    performed on drop, so the thread never outlives the controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use signalbox_types::{LightId, Phase};
use tracing::{info, warn};

use crate::config::LightConfig;
use crate::cycler::PhaseCycler;
use crate::phase::PhaseState;
use crate::queue::{BlockingQueue, RemovalOrder};
use crate::stop::StopSignal;
use crate::timing::{CycleTiming, TimingError};

/// Errors from the controller lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum LightError {
    /// [`LightController::start`] was called on a controller that already
    /// has a cycler.
    #[error("light {light_id} already started")]
    AlreadyStarted {
        /// The light that rejected the second start.
        light_id: LightId,
    },

    /// The operating system refused to create the cycler thread.
    #[error("failed to spawn cycler for light {light_id}: {source}")]
    Spawn {
        /// The light whose cycler could not be spawned.
        light_id: LightId,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cycler thread panicked before it could be joined.
    #[error("cycler for light {light_id} panicked")]
    CyclerPanicked {
        /// The light whose cycler panicked.
        light_id: LightId,
    },
}

/// A single traffic light toggling between Red and Green on its own.
///
/// Share it behind an [`Arc`] to call [`wait_for_green`](Self::wait_for_green)
/// from several threads.
///
/// # Multiple waiters
///
/// Phase notifications go through one shared queue and each notification
/// is delivered to exactly one waiter. With several threads blocked in
/// `wait_for_green`, one Green notification releases one of them; the
/// others keep waiting for later Green notifications. Use
/// [`current_phase`](Self::current_phase) when every observer needs to see
/// the light.
#[derive(Debug)]
pub struct LightController {
    id: LightId,
    state: Arc<PhaseState>,
    queue: Arc<BlockingQueue<Phase>>,
    stop: Arc<StopSignal>,
    timing: CycleTiming,
    seed: Option<u64>,
    started: AtomicBool,
    cycler: Mutex<Option<JoinHandle<u64>>>,
}

impl LightController {
    /// Create a stopped light showing Red, with a LIFO notification queue.
    pub fn new(timing: CycleTiming) -> Self {
        Self::with_order(timing, RemovalOrder::Lifo)
    }

    /// Create a stopped light with an explicit notification removal order.
    pub fn with_order(timing: CycleTiming, order: RemovalOrder) -> Self {
        Self {
            id: LightId::new(),
            state: Arc::new(PhaseState::new()),
            queue: Arc::new(BlockingQueue::with_order(order)),
            stop: Arc::new(StopSignal::new()),
            timing,
            seed: None,
            started: AtomicBool::new(false),
            cycler: Mutex::new(None),
        }
    }

    /// Create a stopped light from the `light` configuration section.
    pub fn with_config(config: &LightConfig) -> Result<Self, TimingError> {
        let light = Self::with_order(config.timing()?, config.removal_order);
        Ok(match config.seed {
            Some(seed) => light.with_seed(seed),
            None => light,
        })
    }

    /// Use a fixed seed for the interval generator.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// This light's identifier.
    pub const fn id(&self) -> LightId {
        self.id
    }

    /// The interval set the cycler draws from.
    pub const fn timing(&self) -> CycleTiming {
        self.timing
    }

    /// Spawn the background cycler.
    ///
    /// # Errors
    ///
    /// Returns [`LightError::AlreadyStarted`] if this controller was started
    /// or stopped before; no second thread is created. Returns [`LightError::Spawn`] if the thread cannot be
    /// created, in which case the controller may be started again.
    pub fn start(&self) -> Result<(), LightError> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(light_id = %self.id, "Rejected second start");
            return Err(LightError::AlreadyStarted { light_id: self.id });
        }

        let cycler = PhaseCycler::new(
            self.id,
            Arc::clone(&self.state),
            Arc::clone(&self.queue),
            Arc::clone(&self.stop),
            self.timing,
            self.seed,
        );

        let handle = thread::Builder::new()
            .name(format!("light-{}", self.id.short()))
            .spawn(move || cycler.run())
            .map_err(|source| {
                self.started.store(false, Ordering::Release);
                LightError::Spawn {
                    light_id: self.id,
                    source,
                }
            })?;

        *self.lock_cycler() = Some(handle);
        info!(light_id = %self.id, "Light started");
        Ok(())
    }

    /// Block until a Green notification arrives.
    ///
    /// Red notifications received along the way are discarded. There is
    /// no timeout: if the light was never started this never returns.
    pub fn wait_for_green(&self) {
        while !self.queue.receive().is_green() {}
    }

    /// Like [`wait_for_green`](Self::wait_for_green) with an overall
    /// deadline. Returns `true` if Green was observed in time.
    pub fn wait_for_green_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait_for_green();
            return true;
        };
        loop {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            match self.queue.receive_timeout(remaining) {
                Some(Phase::Green) => return true,
                Some(Phase::Red) => {}
                None => return false,
            }
        }
    }

    /// The phase currently shown, read without blocking.
    pub fn current_phase(&self) -> Phase {
        self.state.current()
    }

    /// Number of transitions the cycler has performed.
    pub fn transitions(&self) -> u64 {
        self.state.transitions()
    }

    /// Notifications sent but not yet received by any waiter.
    pub fn pending_notifications(&self) -> usize {
        self.queue.len()
    }

    /// Whether a cycler thread is currently running.
    pub fn is_running(&self) -> bool {
        self.lock_cycler()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the cycler and wait for its thread to exit.
    ///
    /// Safe to call more than once and on a light that was never started.
    /// A stopped light can never be started. Threads blocked in
    /// [`wait_for_green`](Self::wait_for_green) are not released.
    ///
    /// # Errors
    ///
    /// Returns [`LightError::CyclerPanicked`] if the cycler thread panicked.
    pub fn stop(&self) -> Result<(), LightError> {
        self.started.store(true, Ordering::Release);
        self.stop.request_stop();
        let handle = self.lock_cycler().take();
        let Some(handle) = handle else {
            return Ok(());
        };
        match handle.join() {
            Ok(cycles) => {
                info!(light_id = %self.id, cycles, "Light stopped");
                Ok(())
            }
            Err(_) => Err(LightError::CyclerPanicked { light_id: self.id }),
        }
    }

    fn lock_cycler(&self) -> MutexGuard<'_, Option<JoinHandle<u64>>> {
        self.cycler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LightController {
    fn default() -> Self {
        Self::new(CycleTiming::default())
    }
}

impl Drop for LightController {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "Light cycler did not shut down cleanly");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fast() -> CycleTiming {
        CycleTiming::from_millis(10, 20, 5).unwrap()
    }

    #[test]
    fn new_light_is_red_and_idle() {
        let light = LightController::default();
        assert_eq!(light.current_phase(), Phase::Red);
        assert_eq!(light.transitions(), 0);
        assert!(!light.is_running());
    }

    #[test]
    fn second_start_is_rejected() {
        let light = LightController::new(fast());
        light.start().unwrap();
        let err = light.start().unwrap_err();
        assert!(matches!(err, LightError::AlreadyStarted { light_id } if light_id == light.id()));
        assert!(light.is_running());
        light.stop().unwrap();
    }

    #[test]
    fn start_after_stop_is_rejected() {
        let light = LightController::new(fast());
        light.start().unwrap();
        light.stop().unwrap();
        assert!(matches!(
            light.start(),
            Err(LightError::AlreadyStarted { .. })
        ));
        assert!(!light.is_running());
    }

    #[test]
    fn start_after_stop_on_idle_light_is_rejected() {
        let light = LightController::new(fast());
        light.stop().unwrap();
        assert!(matches!(
            light.start(),
            Err(LightError::AlreadyStarted { .. })
        ));
        assert!(!light.is_running());
        assert_eq!(light.transitions(), 0);
    }

    #[test]
    fn stop_is_idempotent_and_safe_unstarted() {
        let light = LightController::new(fast());
        light.stop().unwrap();
        light.stop().unwrap();
    }

    #[test]
    fn wait_for_green_then_phase_is_green() {
        let timing = CycleTiming::from_millis(50, 100, 25).unwrap();
        let light = LightController::new(timing).with_seed(5);
        light.start().unwrap();
        light.wait_for_green();
        assert_eq!(light.current_phase(), Phase::Green);
        light.stop().unwrap();
    }

    #[test]
    fn wait_times_out_when_never_started() {
        let light = LightController::new(fast());
        assert!(!light.wait_for_green_timeout(Duration::from_millis(30)));
    }

    #[test]
    fn with_config_applies_order_and_seed() {
        let config = LightConfig {
            cycle_min_ms: 10,
            cycle_max_ms: 30,
            cycle_step_ms: 10,
            removal_order: RemovalOrder::Fifo,
            seed: Some(9),
        };
        let light = LightController::with_config(&config).unwrap();
        assert_eq!(light.timing().min(), Duration::from_millis(10));
        assert_eq!(light.queue.order(), RemovalOrder::Fifo);
        assert_eq!(light.seed, Some(9));
    }
}
