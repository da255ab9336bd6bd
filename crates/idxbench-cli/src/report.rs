//! Comparison table rendering and JSON report export.

use chrono::Utc;
use idxbench_core::{Comparison, ExperimentConfig, PhaseResult};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// JSON-serializable experiment report.
#[derive(Debug, Serialize)]
pub struct ExperimentReport {
    pub metadata: ReportMetadata,
    pub baseline: PhaseJson,
    pub optimized: PhaseJson,
    pub per_operation: BTreeMap<String, OperationComparisonJson>,
    pub aggregate: AggregateJson,
}

#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub idxbench_version: String,
    pub worker_count: usize,
    pub spawn_rate: u32,
    pub duration_secs: f64,
    pub seed: u64,
    pub documents: usize,
}

#[derive(Debug, Serialize)]
pub struct PhaseJson {
    pub phase_name: String,
    pub started_at: String,
    pub ended_at: String,
    pub requests_per_sec: f64,
    pub operations: BTreeMap<String, OperationStatsJson>,
}

#[derive(Debug, Serialize)]
pub struct OperationStatsJson {
    pub request_count: u64,
    pub failure_count: u64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct OperationComparisonJson {
    pub baseline_ms: f64,
    pub optimized_ms: f64,
    pub improvement_pct: f64,
    /// `None` encodes the positive-infinity sentinel, which JSON cannot
    /// represent.
    pub speedup_multiplier: Option<f64>,
    pub failure_delta: i64,
}

#[derive(Debug, Serialize)]
pub struct AggregateJson {
    pub avg_improvement_pct: f64,
    pub avg_speedup_multiplier: Option<f64>,
    pub operations_compared: usize,
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

impl PhaseJson {
    fn from_result(result: &PhaseResult) -> Self {
        Self {
            phase_name: result.phase_name.clone(),
            started_at: result.started_at.to_rfc3339(),
            ended_at: result.ended_at.to_rfc3339(),
            requests_per_sec: result.requests_per_sec(),
            operations: result
                .stats
                .iter()
                .map(|(name, stats)| {
                    (
                        name.clone(),
                        OperationStatsJson {
                            request_count: stats.request_count,
                            failure_count: stats.failure_count,
                            avg_ms: stats.avg_ms(),
                            min_ms: stats.min_ms(),
                            max_ms: stats.max_ms(),
                        },
                    )
                })
                .collect(),
        }
    }
}

impl ExperimentReport {
    pub fn new(
        config: &ExperimentConfig,
        documents: usize,
        baseline: &PhaseResult,
        optimized: &PhaseResult,
        comparison: &Comparison,
    ) -> Self {
        Self {
            metadata: ReportMetadata {
                timestamp: Utc::now().to_rfc3339(),
                idxbench_version: env!("CARGO_PKG_VERSION").to_string(),
                worker_count: config.worker_count,
                spawn_rate: config.spawn_rate,
                duration_secs: config.duration.as_secs_f64(),
                seed: config.base_seed,
                documents,
            },
            baseline: PhaseJson::from_result(baseline),
            optimized: PhaseJson::from_result(optimized),
            per_operation: comparison
                .per_operation
                .iter()
                .map(|(name, c)| {
                    (
                        name.clone(),
                        OperationComparisonJson {
                            baseline_ms: c.baseline_ms,
                            optimized_ms: c.optimized_ms,
                            improvement_pct: c.improvement_pct,
                            speedup_multiplier: finite(c.speedup_multiplier),
                            failure_delta: c.failure_delta,
                        },
                    )
                })
                .collect(),
            aggregate: AggregateJson {
                avg_improvement_pct: comparison.aggregate.avg_improvement_pct,
                avg_speedup_multiplier: finite(comparison.aggregate.avg_speedup_multiplier),
                operations_compared: comparison.aggregate.operations_compared,
            },
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn export(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Console renderer for the before/after comparison.
pub struct ComparisonPrinter {
    color: bool,
}

impl ComparisonPrinter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn heading(&self, text: &str) {
        println!();
        if self.color {
            println!("{}", text.bold().cyan());
        } else {
            println!("{text}");
        }
    }

    fn format_speedup(multiplier: f64) -> String {
        if multiplier.is_infinite() {
            "inf".to_string()
        } else {
            format!("{multiplier:.2}x")
        }
    }

    /// Print one phase's per-operation statistics.
    pub fn print_phase(&self, result: &PhaseResult) {
        self.heading(&format!(
            "{} ({:.1}s, {:.1} req/s)",
            result.phase_name,
            result.elapsed().as_secs_f64(),
            result.requests_per_sec()
        ));

        let mut names: Vec<_> = result.stats.keys().collect();
        names.sort_unstable();
        println!(
            "  {:<18} {:>9} {:>9} {:>10} {:>10} {:>10}",
            "operation", "requests", "failures", "avg", "min", "max"
        );
        for name in names {
            let stats = &result.stats[name];
            println!(
                "  {:<18} {:>9} {:>9} {:>8.2}ms {:>8.2}ms {:>8.2}ms",
                stats.operation_name,
                stats.request_count,
                stats.failure_count,
                stats.avg_ms(),
                stats.min_ms(),
                stats.max_ms()
            );
        }
    }

    /// Print the per-operation comparison table and the aggregate summary.
    pub fn print_comparison(&self, comparison: &Comparison) {
        self.heading("Index impact");

        println!(
            "  {:<18} {:>11} {:>12} {:>12} {:>9} {:>9}",
            "operation", "baseline", "optimized", "improvement", "speedup", "failures"
        );
        for (name, c) in &comparison.per_operation {
            let improvement = format!("{:+.1}%", c.improvement_pct);
            let speedup = Self::format_speedup(c.speedup_multiplier);
            let failures = format!("{:+}", c.failure_delta);
            if self.color && c.improvement_pct > 0.0 {
                println!(
                    "  {:<18} {:>9.2}ms {:>10.2}ms {:>12} {:>9} {:>9}",
                    name,
                    c.baseline_ms,
                    c.optimized_ms,
                    improvement.green().to_string(),
                    speedup.green().to_string(),
                    failures
                );
            } else {
                println!(
                    "  {:<18} {:>9.2}ms {:>10.2}ms {:>12} {:>9} {:>9}",
                    name, c.baseline_ms, c.optimized_ms, improvement, speedup, failures
                );
            }
        }

        for name in &comparison.baseline_only {
            println!("  {name:<18} only measured in the baseline phase (not compared)");
        }
        for name in &comparison.optimized_only {
            println!("  {name:<18} only measured in the optimized phase (not compared)");
        }

        let aggregate = &comparison.aggregate;
        println!();
        if aggregate.operations_compared == 0 {
            println!("  no operations were measured in both phases; nothing to compare");
            return;
        }
        let summary = format!(
            "average improvement {:+.1}%, average speedup {}, over {} operations",
            aggregate.avg_improvement_pct,
            Self::format_speedup(aggregate.avg_speedup_multiplier),
            aggregate.operations_compared
        );
        if self.color {
            println!("  {}", summary.bold());
        } else {
            println!("  {summary}");
        }
    }
}
