//! Before/after reduction of two phase result sets.

use crate::phase::PhaseResult;
use std::collections::BTreeMap;

/// Per-operation improvement figures for one operation present in both
/// phases.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationComparison {
    pub baseline_ms: f64,
    pub optimized_ms: f64,
    /// Percentage latency reduction; `0` when the baseline average is zero.
    pub improvement_pct: f64,
    /// Ratio of baseline to optimized average latency. A zero-latency
    /// optimized result yields `f64::INFINITY`, a valid if extreme outcome.
    pub speedup_multiplier: f64,
    /// Optimized failures minus baseline failures; negative means indexing
    /// reduced the failure count.
    pub failure_delta: i64,
}

/// Arithmetic mean of the per-operation figures over the compared set.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateComparison {
    pub avg_improvement_pct: f64,
    pub avg_speedup_multiplier: f64,
    pub operations_compared: usize,
}

/// Result of comparing two phases. Only operations present in both result
/// sets are compared; operations seen in a single phase are reported
/// separately and excluded from the aggregate, since they cannot be fairly
/// compared.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub per_operation: BTreeMap<String, OperationComparison>,
    pub baseline_only: Vec<String>,
    pub optimized_only: Vec<String>,
    pub aggregate: AggregateComparison,
}

/// Reduce two phase result sets into per-operation and aggregate
/// improvement ratios. Derived purely from the inputs; an empty compared
/// set yields the `{0, 1, 0}` aggregate by convention rather than an error.
pub fn compare(baseline: &PhaseResult, optimized: &PhaseResult) -> Comparison {
    let mut per_operation = BTreeMap::new();
    let mut baseline_only = Vec::new();
    let mut optimized_only: Vec<String> = optimized
        .stats
        .keys()
        .filter(|name| !baseline.stats.contains_key(*name))
        .cloned()
        .collect();
    optimized_only.sort_unstable();

    for (name, base) in &baseline.stats {
        let Some(opt) = optimized.stats.get(name) else {
            baseline_only.push(name.clone());
            continue;
        };

        let baseline_ms = base.avg_ms();
        let optimized_ms = opt.avg_ms();
        let improvement_pct = if baseline_ms > 0.0 {
            (baseline_ms - optimized_ms) / baseline_ms * 100.0
        } else {
            0.0
        };
        let speedup_multiplier = if optimized_ms > 0.0 {
            baseline_ms / optimized_ms
        } else {
            f64::INFINITY
        };

        per_operation.insert(
            name.clone(),
            OperationComparison {
                baseline_ms,
                optimized_ms,
                improvement_pct,
                speedup_multiplier,
                failure_delta: opt.failure_count as i64 - base.failure_count as i64,
            },
        );
    }
    baseline_only.sort_unstable();

    let compared = per_operation.len();
    let aggregate = if compared == 0 {
        AggregateComparison {
            avg_improvement_pct: 0.0,
            avg_speedup_multiplier: 1.0,
            operations_compared: 0,
        }
    } else {
        let n = compared as f64;
        AggregateComparison {
            avg_improvement_pct: per_operation
                .values()
                .map(|c| c.improvement_pct)
                .sum::<f64>()
                / n,
            avg_speedup_multiplier: per_operation
                .values()
                .map(|c| c.speedup_multiplier)
                .sum::<f64>()
                / n,
            operations_compared: compared,
        }
    };

    Comparison {
        per_operation,
        baseline_only,
        optimized_only,
        aggregate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::OperationStats;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::time::Duration;

    fn stats(name: &str, avg_ms: u64, requests: u64, failures: u64) -> OperationStats {
        OperationStats {
            operation_name: name.to_string(),
            request_count: requests,
            failure_count: failures,
            total_duration: Duration::from_millis(avg_ms) * u32::try_from(requests).unwrap(),
            min_duration: Duration::from_millis(avg_ms),
            max_duration: Duration::from_millis(avg_ms),
        }
    }

    fn phase(name: &str, entries: Vec<OperationStats>) -> PhaseResult {
        let now = Utc::now();
        PhaseResult {
            phase_name: name.to_string(),
            started_at: now,
            ended_at: now,
            stats: entries
                .into_iter()
                .map(|s| (s.operation_name.clone(), s))
                .collect(),
        }
    }

    #[test]
    fn computes_improvement_and_speedup() {
        let baseline = phase("baseline", vec![stats("search", 100, 10, 2)]);
        let optimized = phase("optimized", vec![stats("search", 25, 10, 0)]);

        let comparison = compare(&baseline, &optimized);
        let search = &comparison.per_operation["search"];
        assert!((search.improvement_pct - 75.0).abs() < f64::EPSILON);
        assert!((search.speedup_multiplier - 4.0).abs() < f64::EPSILON);
        assert_eq!(search.failure_delta, -2);
        assert_eq!(comparison.aggregate.operations_compared, 1);
    }

    #[test]
    fn zero_optimized_latency_yields_infinity_sentinel() {
        let baseline = phase("baseline", vec![stats("search", 100, 10, 0)]);
        let optimized = phase("optimized", vec![stats("search", 0, 10, 0)]);

        let comparison = compare(&baseline, &optimized);
        let search = &comparison.per_operation["search"];
        assert!(search.speedup_multiplier.is_infinite());
        assert!(search.speedup_multiplier.is_sign_positive());
        assert!((search.improvement_pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_baseline_latency_yields_zero_improvement() {
        let baseline = phase("baseline", vec![stats("search", 0, 10, 0)]);
        let optimized = phase("optimized", vec![stats("search", 5, 10, 0)]);

        let comparison = compare(&baseline, &optimized);
        let search = &comparison.per_operation["search"];
        assert!((search.improvement_pct - 0.0).abs() < f64::EPSILON);
        assert!((search.speedup_multiplier - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn compared_set_is_the_intersection() {
        let baseline = phase(
            "baseline",
            vec![stats("shared", 10, 1, 0), stats("gone", 10, 1, 0)],
        );
        let optimized = phase(
            "optimized",
            vec![stats("shared", 5, 1, 0), stats("added", 5, 1, 0)],
        );

        let comparison = compare(&baseline, &optimized);
        assert_eq!(
            comparison.per_operation.keys().collect::<Vec<_>>(),
            vec!["shared"]
        );
        assert_eq!(comparison.baseline_only, vec!["gone"]);
        assert_eq!(comparison.optimized_only, vec!["added"]);
        assert_eq!(comparison.aggregate.operations_compared, 1);
    }

    #[test]
    fn empty_intersection_uses_convention_aggregate() {
        let baseline = phase("baseline", vec![stats("a", 10, 1, 0)]);
        let optimized = phase("optimized", vec![stats("b", 10, 1, 0)]);

        let comparison = compare(&baseline, &optimized);
        assert!(comparison.per_operation.is_empty());
        assert!((comparison.aggregate.avg_improvement_pct - 0.0).abs() < f64::EPSILON);
        assert!((comparison.aggregate.avg_speedup_multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(comparison.aggregate.operations_compared, 0);
    }

    #[test]
    fn aggregate_is_mean_of_per_operation_values() {
        let baseline = phase(
            "baseline",
            vec![stats("a", 100, 10, 0), stats("b", 40, 10, 0)],
        );
        let optimized = phase(
            "optimized",
            vec![stats("a", 50, 10, 0), stats("b", 10, 10, 0)],
        );

        let comparison = compare(&baseline, &optimized);
        // a: 50% / 2x, b: 75% / 4x
        assert!((comparison.aggregate.avg_improvement_pct - 62.5).abs() < 1e-9);
        assert!((comparison.aggregate.avg_speedup_multiplier - 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_phases_compare_cleanly() {
        let baseline = phase("baseline", vec![]);
        let optimized = phase("optimized", vec![]);
        let comparison = compare(&baseline, &optimized);
        assert!(comparison.per_operation.is_empty());
        assert!(comparison.baseline_only.is_empty());
        assert!(comparison.optimized_only.is_empty());
        assert_eq!(comparison.aggregate.operations_compared, 0);
    }
}
