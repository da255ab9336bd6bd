//! Phase orchestration: precondition, timed run, result set.

use crate::config::ExperimentConfig;
use crate::error::{ExperimentError, PreconditionError};
use crate::registry::OperationRegistry;
use crate::scheduler::Scheduler;
use crate::sink::{MeasurementSink, OperationStats};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Complete, closed result set of one experiment phase. Produced exactly
/// once per [`PhaseController::run_phase`] call; immutable afterward.
#[derive(Debug, Clone)]
pub struct PhaseResult {
    pub phase_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub stats: HashMap<String, OperationStats>,
}

impl PhaseResult {
    /// Wall-clock time the phase spent running workers.
    pub fn elapsed(&self) -> Duration {
        (self.ended_at - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub fn total_requests(&self) -> u64 {
        self.stats.values().map(|s| s.request_count).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.stats.values().map(|s| s.failure_count).sum()
    }

    /// Throughput derived directly from recorded measurements.
    pub fn requests_per_sec(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.total_requests() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Orchestrates one full experiment phase: apply a named precondition
/// (index state transition), run the scheduler, drain the sink into a
/// [`PhaseResult`].
///
/// Each run owns a fresh sink, so baseline and optimized measurements can
/// never contaminate one another. Phases run in strict sequence: the store
/// is never subjected to both workloads or index states simultaneously.
pub struct PhaseController {
    registry: Arc<OperationRegistry>,
    config: ExperimentConfig,
}

impl PhaseController {
    pub fn new(registry: Arc<OperationRegistry>, config: ExperimentConfig) -> Self {
        Self { registry, config }
    }

    /// Run one phase. A failed precondition aborts the phase before the
    /// scheduler runs: an experiment must never measure against an
    /// indeterminate index state.
    pub async fn run_phase<F, Fut>(
        &self,
        phase_name: &str,
        precondition: F,
    ) -> Result<PhaseResult, ExperimentError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), PreconditionError>>,
    {
        tracing::info!(phase = phase_name, "applying precondition");
        precondition()
            .await
            .map_err(|source| ExperimentError::Precondition {
                phase: phase_name.to_string(),
                source,
            })?;

        let sink = Arc::new(MeasurementSink::new());
        let scheduler = Scheduler::new(
            Arc::clone(&self.registry),
            Arc::clone(&sink),
            self.config.clone(),
        );

        tracing::info!(
            phase = phase_name,
            workers = self.config.worker_count,
            spawn_rate = self.config.spawn_rate,
            duration_secs = self.config.duration.as_secs_f64(),
            "phase starting"
        );
        let started_at = Utc::now();
        scheduler.run().await?;
        let ended_at = Utc::now();

        // All workers have stopped; the drain closes the result set.
        let stats = sink.drain();
        let result = PhaseResult {
            phase_name: phase_name.to_string(),
            started_at,
            ended_at,
            stats,
        };
        tracing::info!(
            phase = phase_name,
            requests = result.total_requests(),
            failures = result.total_failures(),
            rps = result.requests_per_sec(),
            "phase complete"
        );
        Ok(result)
    }
}
