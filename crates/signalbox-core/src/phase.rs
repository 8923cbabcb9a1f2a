//! Authoritative phase snapshot shared between the cycler and readers.
//!
//! The current [`Phase`] is stored as a single byte in an [`AtomicU8`], so
//! every read observes a whole phase value and no lock is taken on the
//! read path. Only the cycler thread writes; any thread may read.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use signalbox_types::Phase;

const RED: u8 = 0;
const GREEN: u8 = 1;

const fn encode(phase: Phase) -> u8 {
    match phase {
        Phase::Red => RED,
        Phase::Green => GREEN,
    }
}

const fn decode(raw: u8) -> Phase {
    if raw == GREEN { Phase::Green } else { Phase::Red }
}

/// The externally observable phase of one light.
#[derive(Debug)]
pub struct PhaseState {
    /// Encoded current phase.
    current: AtomicU8,
    /// Number of transitions published so far.
    transitions: AtomicU64,
}

impl PhaseState {
    /// Create a snapshot starting at [`Phase::Red`].
    pub const fn new() -> Self {
        Self {
            current: AtomicU8::new(encode(Phase::Red)),
            transitions: AtomicU64::new(0),
        }
    }

    /// Read the current phase without blocking.
    pub fn current(&self) -> Phase {
        decode(self.current.load(Ordering::Acquire))
    }

    /// Toggle the phase and return the new value.
    ///
    /// The flip is a single atomic read-modify-write, so a reader sees
    /// either the old or the new phase and nothing in between.
    pub fn advance(&self) -> Phase {
        let previous = self.current.fetch_xor(GREEN, Ordering::AcqRel);
        self.transitions.fetch_add(1, Ordering::Relaxed);
        decode(previous).toggled()
    }

    /// Number of transitions since creation.
    pub fn transitions(&self) -> u64 {
        self.transitions.load(Ordering::Relaxed)
    }
}

impl Default for PhaseState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn starts_red() {
        let state = PhaseState::new();
        assert_eq!(state.current(), Phase::Red);
        assert_eq!(state.transitions(), 0);
    }

    #[test]
    fn advance_toggles_and_counts() {
        let state = PhaseState::new();
        assert_eq!(state.advance(), Phase::Green);
        assert_eq!(state.current(), Phase::Green);
        assert_eq!(state.advance(), Phase::Red);
        assert_eq!(state.current(), Phase::Red);
        assert_eq!(state.transitions(), 2);
    }

    #[test]
    fn concurrent_readers_only_see_valid_phases() {
        let state = Arc::new(PhaseState::new());
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    (0..10_000)
                        .map(|_| state.current())
                        .all(|p| p == Phase::Red || p == Phase::Green)
                })
            })
            .collect();
        for _ in 0..10_000 {
            state.advance();
        }
        for reader in readers {
            assert!(reader.join().unwrap());
        }
        assert_eq!(state.current(), Phase::Red);
        assert_eq!(state.transitions(), 10_000);
    }
}
