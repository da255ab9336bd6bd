//! Concurrency-safe aggregation of per-invocation measurements.
//!
//! Workers hand every [`Measurement`] to the sink synchronously before their
//! next iteration. Aggregation is commutative and associative (sum, min,
//! max), so result correctness is independent of how worker emissions
//! interleave.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Whether an invocation completed or failed with an operation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// One timed operation invocation. Created by a worker, never mutated after
/// creation.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub operation_name: String,
    pub duration: Duration,
    pub result_count: u64,
    pub outcome: Outcome,
    pub error_detail: Option<String>,
}

impl Measurement {
    pub fn success(operation_name: impl Into<String>, duration: Duration, result_count: u64) -> Self {
        Self {
            operation_name: operation_name.into(),
            duration,
            result_count,
            outcome: Outcome::Success,
            error_detail: None,
        }
    }

    pub fn failure(
        operation_name: impl Into<String>,
        duration: Duration,
        error_detail: impl Into<String>,
    ) -> Self {
        Self {
            operation_name: operation_name.into(),
            duration,
            result_count: 0,
            outcome: Outcome::Failure,
            error_detail: Some(error_detail.into()),
        }
    }
}

/// Running statistics for one operation within one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationStats {
    pub operation_name: String,
    pub request_count: u64,
    pub failure_count: u64,
    pub total_duration: Duration,
    pub min_duration: Duration,
    pub max_duration: Duration,
}

impl OperationStats {
    fn new(operation_name: String) -> Self {
        Self {
            operation_name,
            request_count: 0,
            failure_count: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::ZERO,
            max_duration: Duration::ZERO,
        }
    }

    fn apply(&mut self, measurement: &Measurement) {
        if self.request_count == 0 {
            self.min_duration = measurement.duration;
            self.max_duration = measurement.duration;
        } else {
            self.min_duration = self.min_duration.min(measurement.duration);
            self.max_duration = self.max_duration.max(measurement.duration);
        }
        self.request_count += 1;
        if measurement.outcome == Outcome::Failure {
            self.failure_count += 1;
        }
        self.total_duration += measurement.duration;
    }

    /// Mean latency over all recorded invocations.
    pub fn avg_duration(&self) -> Duration {
        if self.request_count == 0 {
            Duration::ZERO
        } else {
            self.total_duration / u32::try_from(self.request_count).unwrap_or(u32::MAX)
        }
    }

    pub fn avg_ms(&self) -> f64 {
        if self.request_count == 0 {
            0.0
        } else {
            self.total_duration.as_secs_f64() * 1000.0 / self.request_count as f64
        }
    }

    pub fn min_ms(&self) -> f64 {
        self.min_duration.as_secs_f64() * 1000.0
    }

    pub fn max_ms(&self) -> f64 {
        self.max_duration.as_secs_f64() * 1000.0
    }
}

/// Concurrency-safe aggregator for measurement records.
///
/// `record` is called from all workers; `drain` is the single serialization
/// point, called only after the scheduler has confirmed all workers have
/// stopped, so a phase's result set is complete and closed before the next
/// phase begins.
#[derive(Debug, Default)]
pub struct MeasurementSink {
    stats: Mutex<HashMap<String, OperationStats>>,
}

impl MeasurementSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one measurement into the named operation's running statistics.
    /// O(1) amortized; safe to call concurrently.
    pub fn record(&self, measurement: &Measurement) {
        let mut stats = self.stats.lock().expect("measurement sink lock poisoned");
        stats
            .entry(measurement.operation_name.clone())
            .or_insert_with(|| OperationStats::new(measurement.operation_name.clone()))
            .apply(measurement);
    }

    /// Return the accumulated statistics and reset to empty, ready for the
    /// next phase.
    pub fn drain(&self) -> HashMap<String, OperationStats> {
        let mut stats = self.stats.lock().expect("measurement sink lock poisoned");
        std::mem::take(&mut *stats)
    }
}
