//! Virtual worker: one simulated concurrent client.

use crate::config::ThinkTime;
use crate::registry::OperationRegistry;
use crate::sink::{Measurement, MeasurementSink};
use quanta::Clock;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Mixes the worker id into the base seed so sibling workers draw distinct
/// but reproducible selection sequences.
fn worker_seed(base_seed: u64, id: usize) -> u64 {
    base_seed ^ (id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// One unit of concurrent execution. Repeatedly selects an operation by
/// weight, invokes and times it, records the measurement, and pauses for a
/// randomized think time.
pub(crate) struct VirtualWorker {
    id: usize,
    registry: Arc<OperationRegistry>,
    sink: Arc<MeasurementSink>,
    think_time: ThinkTime,
    rng: ChaCha8Rng,
    clock: Clock,
}

impl VirtualWorker {
    pub(crate) fn new(
        id: usize,
        registry: Arc<OperationRegistry>,
        sink: Arc<MeasurementSink>,
        think_time: ThinkTime,
        base_seed: u64,
    ) -> Self {
        Self {
            id,
            registry,
            sink,
            think_time,
            rng: ChaCha8Rng::seed_from_u64(worker_seed(base_seed, id)),
            clock: Clock::new(),
        }
    }

    /// Worker loop. Runs until the cancellation flag is observed at a loop
    /// boundary; an in-flight invocation is allowed to finish, never
    /// interrupted mid-call.
    ///
    /// A failed invocation is absorbed into a failure measurement and the
    /// loop continues: one bad query must not abort the experiment.
    pub(crate) async fn run(mut self, cancel: Arc<AtomicBool>) {
        tracing::trace!(worker = self.id, "worker started");

        while !cancel.load(Ordering::Relaxed) {
            // The scheduler rejects empty registries before spawning anyone.
            let Ok(operation) = self.registry.select(&mut self.rng) else {
                break;
            };

            let start = self.clock.now();
            let outcome = operation.invoke().await;
            let elapsed = self.clock.now().duration_since(start);

            let measurement = match outcome {
                Ok(result_count) => Measurement::success(operation.name(), elapsed, result_count),
                Err(error) => {
                    tracing::trace!(
                        worker = self.id,
                        operation = operation.name(),
                        error = error.detail(),
                        "invocation failed"
                    );
                    Measurement::failure(operation.name(), elapsed, error.detail())
                }
            };
            self.sink.record(&measurement);

            if cancel.load(Ordering::Relaxed) {
                break;
            }
            let pause = self.think_time.sample(&mut self.rng);
            if pause.is_zero() {
                // Still yield so cancellation and sibling tasks make progress.
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(pause).await;
            }
        }

        tracing::trace!(worker = self.id, "worker stopped");
    }
}
