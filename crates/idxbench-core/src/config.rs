//! Experiment configuration.

// Allow numeric casts between Duration nanos and u64 for think-time sampling.
#![allow(clippy::cast_possible_truncation)]

use crate::error::ExperimentError;
use rand::Rng;
use std::time::Duration;

/// Randomized pause between a worker's successive operation invocations.
///
/// Bounds the per-worker request rate and avoids a thundering-herd artifact
/// that would bias latency measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkTime {
    min: Duration,
    max: Duration,
}

impl ThinkTime {
    /// Create a think-time interval. Requires `min <= max`.
    pub fn new(min: Duration, max: Duration) -> Result<Self, ExperimentError> {
        if min > max {
            return Err(ExperimentError::InvalidConfig(format!(
                "think time minimum {min:?} exceeds maximum {max:?}"
            )));
        }
        Ok(Self { min, max })
    }

    /// A zero-length interval: workers pause only to yield.
    pub const fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draw a pause duration uniformly from `[min, max]`.
    pub fn sample(&self, rng: &mut impl Rng) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let span = (self.max - self.min).as_nanos() as u64;
        self.min + Duration::from_nanos(rng.random_range(0..=span))
    }
}

/// Configuration for one experiment phase run.
///
/// Both phases of an experiment run with the same configuration so that the
/// workloads are structurally identical; only the precondition differs.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Number of virtual workers to ramp up to.
    pub worker_count: usize,
    /// Maximum workers started per one-second ramp-up tick.
    pub spawn_rate: u32,
    /// Wall-clock run time, measured from the first worker's start.
    pub duration: Duration,
    /// Pause interval between a worker's successive invocations.
    pub think_time: ThinkTime,
    /// Bound on graceful shutdown; exceeding it surfaces a
    /// [`ExperimentError::SchedulerTimeout`].
    pub shutdown_grace: Duration,
    /// Base seed for per-worker RNGs. Runs with the same seed and
    /// configuration produce the same selection sequences per worker.
    pub base_seed: u64,
}

impl ExperimentConfig {
    /// Create a validated configuration.
    pub fn new(
        worker_count: usize,
        spawn_rate: u32,
        duration: Duration,
        think_time: ThinkTime,
        shutdown_grace: Duration,
    ) -> Result<Self, ExperimentError> {
        if worker_count == 0 {
            return Err(ExperimentError::InvalidConfig(
                "worker count must be positive".into(),
            ));
        }
        if spawn_rate == 0 {
            return Err(ExperimentError::InvalidConfig(
                "spawn rate must be positive".into(),
            ));
        }
        if duration.is_zero() {
            return Err(ExperimentError::InvalidConfig(
                "duration must be positive".into(),
            ));
        }
        if shutdown_grace.is_zero() {
            return Err(ExperimentError::InvalidConfig(
                "shutdown grace period must be positive".into(),
            ));
        }
        Ok(Self {
            worker_count,
            spawn_rate,
            duration,
            think_time,
            shutdown_grace,
            base_seed: 0,
        })
    }

    /// Set the base seed for per-worker RNGs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn think_time_rejects_inverted_interval() {
        let result = ThinkTime::new(Duration::from_millis(500), Duration::from_millis(100));
        assert!(matches!(result, Err(ExperimentError::InvalidConfig(_))));
    }

    #[test]
    fn think_time_samples_within_bounds() {
        let think = ThinkTime::new(Duration::from_millis(100), Duration::from_millis(500))
            .expect("valid interval");
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let pause = think.sample(&mut rng);
            assert!(pause >= Duration::from_millis(100));
            assert!(pause <= Duration::from_millis(500));
        }
    }

    #[test]
    fn degenerate_think_time_is_constant() {
        let think = ThinkTime::none();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(think.sample(&mut rng), Duration::ZERO);
    }

    #[test]
    fn config_rejects_zero_values() {
        let think = ThinkTime::none();
        let grace = Duration::from_secs(5);
        let duration = Duration::from_secs(1);
        assert!(ExperimentConfig::new(0, 5, duration, think, grace).is_err());
        assert!(ExperimentConfig::new(10, 0, duration, think, grace).is_err());
        assert!(ExperimentConfig::new(10, 5, Duration::ZERO, think, grace).is_err());
        assert!(ExperimentConfig::new(10, 5, duration, think, Duration::ZERO).is_err());
        assert!(ExperimentConfig::new(10, 5, duration, think, grace).is_ok());
    }
}
