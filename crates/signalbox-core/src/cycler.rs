//! Background task that times and performs phase transitions.
//!
//! Each cycle the [`PhaseCycler`]:
//!
//! 1. draws a hold interval from its [`CycleTiming`],
//! 2. sleeps until that deadline on the monotonic clock (woken early by a
//!    stop request),
//! 3. toggles the phase in the shared [`PhaseState`],
//! 4. pushes the new phase onto the notification [`BlockingQueue`].
//!
//! The snapshot write and the queue push are two separate steps. A reader
//! of the snapshot may see a new phase before the matching notification
//! is receivable, or the other way round.

use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use signalbox_types::{LightId, Phase};
use tracing::{debug, info};

use crate::phase::PhaseState;
use crate::queue::BlockingQueue;
use crate::stop::StopSignal;
use crate::timing::CycleTiming;

/// The timer loop driving one light.
///
/// Built by [`LightController::start`](crate::light::LightController::start)
/// and moved onto a dedicated thread.
#[derive(Debug)]
pub struct PhaseCycler {
    light_id: LightId,
    state: Arc<PhaseState>,
    queue: Arc<BlockingQueue<Phase>>,
    stop: Arc<StopSignal>,
    timing: CycleTiming,
    rng: StdRng,
}

impl PhaseCycler {
    /// Create a cycler over shared state.
    ///
    /// With `seed` set the interval sequence is reproducible; otherwise
    /// the generator is seeded from the operating system.
    pub fn new(
        light_id: LightId,
        state: Arc<PhaseState>,
        queue: Arc<BlockingQueue<Phase>>,
        stop: Arc<StopSignal>,
        timing: CycleTiming,
        seed: Option<u64>,
    ) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            light_id,
            state,
            queue,
            stop,
            timing,
            rng,
        }
    }

    /// Run cycles until a stop is requested. Returns the number of
    /// transitions this call performed.
    pub fn run(mut self) -> u64 {
        info!(
            light_id = %self.light_id,
            min_ms = self.timing.min().as_millis(),
            max_ms = self.timing.max().as_millis(),
            choices = self.timing.choices(),
            "Phase cycler starting"
        );

        let mut cycles: u64 = 0;
        while self.step().is_some() {
            cycles = cycles.saturating_add(1);
        }

        info!(light_id = %self.light_id, cycles, "Phase cycler stopped");
        cycles
    }

    /// Wait out one interval and publish the next phase.
    ///
    /// Returns `None` without touching the phase if a stop was requested
    /// before or during the wait.
    pub fn step(&mut self) -> Option<Phase> {
        if self.stop.is_stop_requested() {
            return None;
        }

        let hold = self.timing.sample(&mut self.rng);
        let started = Instant::now();
        let deadline = started.checked_add(hold)?;
        if self.stop.wait_until(deadline) {
            return None;
        }

        let phase = self.state.advance();
        self.queue.send(phase);

        debug!(
            light_id = %self.light_id,
            cycle = self.state.transitions(),
            phase = %phase,
            held_ms = started.elapsed().as_millis(),
            "Phase changed"
        );
        Some(phase)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn cycler(timing: CycleTiming) -> (PhaseCycler, Arc<PhaseState>, Arc<BlockingQueue<Phase>>, Arc<StopSignal>) {
        let state = Arc::new(PhaseState::new());
        let queue = Arc::new(BlockingQueue::new());
        let stop = Arc::new(StopSignal::new());
        let cycler = PhaseCycler::new(
            LightId::new(),
            Arc::clone(&state),
            Arc::clone(&queue),
            Arc::clone(&stop),
            timing,
            Some(42),
        );
        (cycler, state, queue, stop)
    }

    #[test]
    fn step_publishes_snapshot_then_notification() {
        let timing = CycleTiming::fixed(Duration::from_millis(5)).unwrap();
        let (mut cycler, state, queue, _stop) = cycler(timing);

        assert_eq!(cycler.step(), Some(Phase::Green));
        assert_eq!(state.current(), Phase::Green);
        assert_eq!(queue.try_receive(), Some(Phase::Green));

        assert_eq!(cycler.step(), Some(Phase::Red));
        assert_eq!(state.current(), Phase::Red);
        assert_eq!(queue.try_receive(), Some(Phase::Red));
    }

    #[test]
    fn step_respects_minimum_hold() {
        let timing = CycleTiming::from_millis(20, 40, 10).unwrap();
        let (mut cycler, _state, _queue, _stop) = cycler(timing);
        let started = Instant::now();
        cycler.step().unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn stop_before_step_leaves_phase_untouched() {
        let timing = CycleTiming::fixed(Duration::from_millis(5)).unwrap();
        let (mut cycler, state, queue, stop) = cycler(timing);
        stop.request_stop();
        assert_eq!(cycler.step(), None);
        assert_eq!(state.current(), Phase::Red);
        assert!(queue.is_empty());
    }

    #[test]
    fn run_exits_promptly_on_stop() {
        let (cycler, state, _queue, stop) = cycler(CycleTiming::default());
        let handle = thread::spawn(move || cycler.run());
        thread::sleep(Duration::from_millis(20));
        let requested = Instant::now();
        stop.request_stop();
        let cycles = handle.join().unwrap();
        assert!(requested.elapsed() < Duration::from_secs(1));
        assert_eq!(cycles, 0);
        assert_eq!(state.current(), Phase::Red);
    }
}
