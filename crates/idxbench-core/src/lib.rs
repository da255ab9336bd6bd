//! Experiment orchestrator for measuring the performance impact of
//! database indexing strategies.
//!
//! The orchestrator runs two structurally identical load experiments, one
//! against an unindexed dataset and one against the same dataset with a
//! defined set of indexes, and reduces the raw measurements into a
//! per-operation and aggregate before/after comparison:
//!
//! 1. An [`OperationRegistry`] holds the weighted catalogue of workload
//!    operations (arbitrary closures wrapping calls into an external store).
//! 2. A [`PhaseController`] applies a phase precondition (e.g. "indexes
//!    absent" / "indexes present") and drives the [`Scheduler`], which ramps
//!    up virtual workers that repeatedly select, invoke, and time operations.
//! 3. Every invocation yields a [`Measurement`] recorded by the
//!    [`MeasurementSink`]; draining the sink closes the phase into a
//!    [`PhaseResult`].
//! 4. [`compare`] reduces two phase results into a [`Comparison`].
//!
//! Workload determinism comes from per-worker seeded RNGs; invocation-level
//! failures are absorbed into the measurements rather than aborting the
//! experiment, since failure rate is itself a measured signal.

pub mod compare;
pub mod config;
pub mod error;
pub mod phase;
pub mod registry;
pub mod scheduler;
pub mod sink;
mod worker;

pub use compare::{compare, AggregateComparison, Comparison, OperationComparison};
pub use config::{ExperimentConfig, ThinkTime};
pub use error::{ExperimentError, OperationError, PreconditionError};
pub use phase::{PhaseController, PhaseResult};
pub use registry::{Operation, OperationRegistry};
pub use scheduler::Scheduler;
pub use sink::{Measurement, MeasurementSink, OperationStats, Outcome};
