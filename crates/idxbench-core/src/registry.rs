//! Weighted catalogue of workload operations.
//!
//! The registry is an explicit mapping populated by direct `register` calls
//! at startup, so operation sets are deterministic and testable in
//! isolation. It is read-only after initialization: workers share it behind
//! an `Arc` and only ever call [`OperationRegistry::select`].

use crate::error::{ExperimentError, OperationError};
use rand::Rng;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future produced by an operation body.
pub type OperationFuture = Pin<Box<dyn Future<Output = Result<u64, OperationError>> + Send>>;

type OperationBody = Arc<dyn Fn() -> OperationFuture + Send + Sync>;

/// One registered workload operation: a unique name, a relative selection
/// weight, and a pluggable body wrapping a call into the external store.
///
/// Immutable once registered; referenced, never copied, by workers.
pub struct Operation {
    name: String,
    weight: u32,
    body: OperationBody,
}

impl Operation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Invoke the operation body, yielding the result count on success.
    pub async fn invoke(&self) -> Result<u64, OperationError> {
        (self.body)().await
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// The fixed catalogue of workload operations for an experiment.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    operations: Vec<Operation>,
    // cumulative[i] = weights[0] + .. + weights[i]; selection is a binary
    // search over this prefix-sum table
    cumulative: Vec<u64>,
    total_weight: u64,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation under a unique name with a positive weight.
    pub fn register<F, Fut>(
        &mut self,
        name: impl Into<String>,
        weight: u32,
        body: F,
    ) -> Result<(), ExperimentError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<u64, OperationError>> + Send + 'static,
    {
        let name = name.into();
        if weight == 0 {
            return Err(ExperimentError::InvalidWeight { name, weight });
        }
        if self.operations.iter().any(|op| op.name == name) {
            return Err(ExperimentError::DuplicateOperation(name));
        }

        self.total_weight += u64::from(weight);
        self.cumulative.push(self.total_weight);
        self.operations.push(Operation {
            name,
            weight,
            body: Arc::new(move || Box::pin(body()) as OperationFuture),
        });
        Ok(())
    }

    /// Select one operation by weighted random sampling: operation *i* is
    /// chosen with probability `weight_i / total_weight`.
    ///
    /// Selections are independent and identically distributed across calls,
    /// so two phases run with the same registry produce workloads with a
    /// matching long-run operation mix.
    pub fn select(&self, rng: &mut impl Rng) -> Result<&Operation, ExperimentError> {
        if self.operations.is_empty() {
            return Err(ExperimentError::EmptyRegistry);
        }
        let ticket = rng.random_range(0..self.total_weight);
        let index = self.cumulative.partition_point(|&bound| bound <= ticket);
        Ok(&self.operations[index])
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Names of all registered operations, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|op| op.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    fn noop_registry(weights: &[(&str, u32)]) -> OperationRegistry {
        let mut registry = OperationRegistry::new();
        for &(name, weight) in weights {
            registry
                .register(name, weight, || async { Ok(0) })
                .expect("registration");
        }
        registry
    }

    #[test]
    fn rejects_zero_weight() {
        let mut registry = OperationRegistry::new();
        let result = registry.register("scan", 0, || async { Ok(0) });
        assert!(matches!(
            result,
            Err(ExperimentError::InvalidWeight { weight: 0, .. })
        ));
    }

    #[test]
    fn rejects_duplicate_name() {
        let mut registry = noop_registry(&[("scan", 1)]);
        let result = registry.register("scan", 2, || async { Ok(0) });
        assert!(matches!(
            result,
            Err(ExperimentError::DuplicateOperation(name)) if name == "scan"
        ));
    }

    #[test]
    fn empty_registry_cannot_select() {
        let registry = OperationRegistry::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            registry.select(&mut rng),
            Err(ExperimentError::EmptyRegistry)
        ));
    }

    #[test]
    fn selection_frequency_follows_weights() {
        let registry = noop_registry(&[("fast", 3), ("slow", 1)]);
        let mut rng = ChaCha8Rng::seed_from_u64(0xC0FFEE);

        let samples = 40_000;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for _ in 0..samples {
            let op = registry.select(&mut rng).expect("non-empty registry");
            *counts.entry(op.name()).or_default() += 1;
        }

        let fast_share = counts["fast"] as f64 / f64::from(samples);
        // expected 0.75; tolerance well beyond sampling error at 40k draws
        assert!(
            (fast_share - 0.75).abs() < 0.02,
            "fast share {fast_share} too far from 0.75"
        );
        assert!(counts["slow"] > 0);
    }

    #[test]
    fn single_operation_always_selected() {
        let registry = noop_registry(&[("only", 7)]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(registry.select(&mut rng).unwrap().name(), "only");
        }
    }

    #[tokio::test]
    async fn invoke_propagates_result_count_and_failure() {
        let mut registry = OperationRegistry::new();
        registry
            .register("hits", 1, || async { Ok(42) })
            .expect("registration");
        registry
            .register("broken", 1, || async {
                Err(OperationError::new("connection reset"))
            })
            .expect("registration");

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..20 {
            let op = registry.select(&mut rng).unwrap();
            match op.name() {
                "hits" => assert_eq!(op.invoke().await.unwrap(), 42),
                "broken" => {
                    let err = op.invoke().await.unwrap_err();
                    assert_eq!(err.detail(), "connection reset");
                }
                other => panic!("unexpected operation {other}"),
            }
        }
    }
}
