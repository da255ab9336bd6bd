//! Error types for the experiment orchestrator.
//!
//! Two kinds of failure live here. [`ExperimentError`] is the harness-level
//! taxonomy: configuration mistakes, failed phase preconditions, and a stuck
//! graceful shutdown, all of which abort a run. [`OperationError`] and
//! [`PreconditionError`] are produced by collaborator code supplied through
//! the registry and phase APIs; an `OperationError` is always absorbed into a
//! failure measurement and never stops a worker.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single workload operation invocation.
///
/// Operation bodies wrap calls into an external store, so the detail is an
/// opaque message rather than a structured cause. Workers record it verbatim
/// in the failure measurement.
#[derive(Debug, Clone, Error)]
#[error("{detail}")]
pub struct OperationError {
    detail: String,
}

impl OperationError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Failure of a phase precondition (an external state transition such as
/// index creation or removal).
#[derive(Debug, Clone, Error)]
#[error("{detail}")]
pub struct PreconditionError {
    detail: String,
}

impl PreconditionError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// Harness-level errors. All of these abort a run; only operation-level
/// failures are recovered in place.
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// Registration rejected a non-positive selection weight.
    #[error("operation \"{name}\" has invalid weight {weight} (must be positive)")]
    InvalidWeight { name: String, weight: u32 },

    /// Registration rejected a name that is already present.
    #[error("operation \"{0}\" is already registered")]
    DuplicateOperation(String),

    /// Selection was attempted on a registry with no operations.
    #[error("no operations registered")]
    EmptyRegistry,

    /// A configuration value violated its constraints.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The phase precondition failed; the scheduler never ran.
    #[error("precondition for phase \"{phase}\" failed: {source}")]
    Precondition {
        phase: String,
        #[source]
        source: PreconditionError,
    },

    /// Workers did not finish within the shutdown grace period. This
    /// indicates a stuck operation and is surfaced rather than retried.
    #[error("graceful shutdown exceeded {grace:?} with {pending} workers still in flight")]
    SchedulerTimeout { grace: Duration, pending: usize },
}
