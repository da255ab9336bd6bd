//! Ramp-up, fixed-duration run, and graceful shutdown of virtual workers.

use crate::config::ExperimentConfig;
use crate::error::ExperimentError;
use crate::registry::OperationRegistry;
use crate::sink::MeasurementSink;
use crate::worker::VirtualWorker;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};

/// Drives one timed load run: spawns workers incrementally at the configured
/// spawn rate, lets them run for the configured duration (measured from the
/// first worker's start), then signals cancellation and waits for all
/// in-flight invocations to complete.
///
/// No measurement is dropped mid-flight and no worker is forcibly killed on
/// the normal path; a shutdown that exceeds the grace period surfaces as
/// [`ExperimentError::SchedulerTimeout`].
pub struct Scheduler {
    registry: Arc<OperationRegistry>,
    sink: Arc<MeasurementSink>,
    config: ExperimentConfig,
}

impl Scheduler {
    pub fn new(
        registry: Arc<OperationRegistry>,
        sink: Arc<MeasurementSink>,
        config: ExperimentConfig,
    ) -> Self {
        Self {
            registry,
            sink,
            config,
        }
    }

    /// Run the full worker lifecycle: ramp-up, timed run, graceful shutdown.
    pub async fn run(&self) -> Result<(), ExperimentError> {
        if self.registry.is_empty() {
            return Err(ExperimentError::EmptyRegistry);
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let mut workers = JoinSet::new();
        let mut spawned = 0usize;

        // At most spawn_rate new workers per one-second tick, smoothing
        // startup load so early measurements are not skewed by a
        // simultaneous cold-start burst. The first tick fires immediately.
        let mut ramp = tokio::time::interval(Duration::from_secs(1));
        ramp.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut deadline: Option<Instant> = None;
        while spawned < self.config.worker_count {
            if let Some(at) = deadline {
                tokio::select! {
                    _ = ramp.tick() => {}
                    () = tokio::time::sleep_until(at) => break,
                }
            } else {
                ramp.tick().await;
            }

            let batch = (self.config.spawn_rate as usize).min(self.config.worker_count - spawned);
            for _ in 0..batch {
                let worker = VirtualWorker::new(
                    spawned,
                    Arc::clone(&self.registry),
                    Arc::clone(&self.sink),
                    self.config.think_time,
                    self.config.base_seed,
                );
                workers.spawn(worker.run(Arc::clone(&cancel)));
                spawned += 1;
            }
            if deadline.is_none() {
                // Wall-clock duration counts from the first worker's start.
                deadline = Some(Instant::now() + self.config.duration);
            }
            tracing::debug!(spawned, total = self.config.worker_count, "ramp-up tick");
        }

        if let Some(at) = deadline {
            tokio::time::sleep_until(at).await;
        }

        cancel.store(true, Ordering::Relaxed);
        tracing::debug!(workers = spawned, "cancellation signalled, draining workers");

        let grace = self.config.shutdown_grace;
        let drain = async {
            while let Some(joined) = workers.join_next().await {
                if let Err(error) = joined {
                    tracing::warn!(%error, "worker task did not join cleanly");
                }
            }
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            let pending = workers.len();
            tracing::error!(pending, ?grace, "graceful shutdown timed out");
            // Dropping the JoinSet aborts the stuck tasks; their in-flight
            // measurements are lost, which is exactly what the error reports.
            return Err(ExperimentError::SchedulerTimeout { grace, pending });
        }

        tracing::debug!("all workers stopped");
        Ok(())
    }
}
