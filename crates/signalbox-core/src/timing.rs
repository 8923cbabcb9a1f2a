//! Randomized cycle interval for the phase cycler.
//!
//! A [`CycleTiming`] describes the closed set of interval lengths a light
//! may hold a phase for: `min, min + step, ..., max`. The default is
//! `{4s, 5s, 6s}`. Each cycle draws one value uniformly from that set.

use std::time::Duration;

use rand::Rng;

/// Errors from building a [`CycleTiming`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimingError {
    /// The minimum interval is larger than the maximum.
    #[error("cycle minimum {min_ms}ms exceeds maximum {max_ms}ms")]
    InvalidRange {
        /// Configured minimum in milliseconds.
        min_ms: u64,
        /// Configured maximum in milliseconds.
        max_ms: u64,
    },

    /// The step between candidate intervals is zero.
    #[error("cycle step must be at least 1ms")]
    ZeroStep,

    /// The minimum interval is zero, which would spin the cycler.
    #[error("cycle minimum must be at least 1ms")]
    ZeroInterval,
}

/// Interval set a cycler samples from, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    min_ms: u64,
    max_ms: u64,
    step_ms: u64,
}

impl CycleTiming {
    /// Default minimum hold time.
    pub const DEFAULT_MIN_MS: u64 = 4_000;
    /// Default maximum hold time.
    pub const DEFAULT_MAX_MS: u64 = 6_000;
    /// Default spacing between candidate hold times.
    pub const DEFAULT_STEP_MS: u64 = 1_000;

    /// Build a timing from explicit millisecond bounds.
    ///
    /// `max_ms` is included only when it lies on the `step_ms` grid from
    /// `min_ms`; otherwise the largest grid point below it is the maximum.
    pub const fn from_millis(min_ms: u64, max_ms: u64, step_ms: u64) -> Result<Self, TimingError> {
        if min_ms == 0 {
            return Err(TimingError::ZeroInterval);
        }
        if step_ms == 0 {
            return Err(TimingError::ZeroStep);
        }
        if min_ms > max_ms {
            return Err(TimingError::InvalidRange { min_ms, max_ms });
        }
        Ok(Self {
            min_ms,
            max_ms,
            step_ms,
        })
    }

    /// A timing that always yields exactly `interval`.
    pub fn fixed(interval: Duration) -> Result<Self, TimingError> {
        let ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        Self::from_millis(ms, ms, 1)
    }

    /// Shortest interval that can be drawn.
    pub const fn min(&self) -> Duration {
        Duration::from_millis(self.min_ms)
    }

    /// Upper bound on the drawn interval.
    pub const fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }

    /// Number of candidate intervals.
    pub const fn choices(&self) -> u64 {
        self.extra_steps().saturating_add(1)
    }

    /// Draw one interval uniformly from the candidate set.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        let k = rng.random_range(0..=self.extra_steps());
        let offset = k.saturating_mul(self.step_ms);
        Duration::from_millis(self.min_ms.saturating_add(offset))
    }

    const fn extra_steps(&self) -> u64 {
        // step_ms is non-zero by construction.
        match self.max_ms.saturating_sub(self.min_ms).checked_div(self.step_ms) {
            Some(n) => n,
            None => 0,
        }
    }
}

impl Default for CycleTiming {
    fn default() -> Self {
        Self {
            min_ms: Self::DEFAULT_MIN_MS,
            max_ms: Self::DEFAULT_MAX_MS,
            step_ms: Self::DEFAULT_STEP_MS,
        }
    }
}
