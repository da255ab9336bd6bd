//! Command-line interface for the experiment harness.

use clap::Parser;
use idxbench_core::{ExperimentConfig, ExperimentError, ThinkTime};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

/// Before/after index performance experiments over a document-style
/// listings store.
///
/// Runs two structurally identical load phases, first with secondary indexes
/// absent and then with them present, and reports per-operation and
/// aggregate improvement figures.
#[derive(Parser, Debug)]
#[command(name = "idxbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Number of concurrent virtual workers.
    #[arg(long, default_value = "50")]
    pub workers: usize,

    /// Workers started per second during ramp-up.
    #[arg(long = "spawn-rate", default_value = "5")]
    pub spawn_rate: u32,

    /// Run time per phase, in seconds (measured from the first worker's
    /// start).
    #[arg(long, default_value = "60")]
    pub duration: u64,

    /// Minimum think time between a worker's operations, in milliseconds.
    #[arg(long = "think-time-min", default_value = "100", value_name = "MS")]
    pub think_time_min: u64,

    /// Maximum think time between a worker's operations, in milliseconds.
    #[arg(long = "think-time-max", default_value = "500", value_name = "MS")]
    pub think_time_max: u64,

    /// Bound on graceful shutdown, in seconds. Exceeding it fails the run
    /// and indicates a stuck operation.
    #[arg(long = "grace-period", default_value = "30")]
    pub grace_period: u64,

    /// Base seed for workload and dataset generation.
    ///
    /// Runs with the same seed and configuration draw the same operation
    /// sequences per worker.
    #[arg(long, default_value = "42", env = "IDXBENCH_SEED")]
    pub seed: u64,

    /// Number of documents in the generated listings store.
    #[arg(long, default_value = "20000")]
    pub docs: usize,

    /// Export the full report to a JSON file.
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, conflicts_with = "color")]
    pub no_color: bool,

    /// Force colored output (even when not a TTY).
    #[arg(long, conflicts_with = "no_color")]
    pub color: bool,

    /// Verbose output.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Build the validated core configuration from the CLI surface.
    pub fn experiment_config(&self) -> Result<ExperimentConfig, ExperimentError> {
        let think_time = ThinkTime::new(
            Duration::from_millis(self.think_time_min),
            Duration::from_millis(self.think_time_max),
        )?;
        Ok(ExperimentConfig::new(
            self.workers,
            self.spawn_rate,
            Duration::from_secs(self.duration),
            think_time,
            Duration::from_secs(self.grace_period),
        )?
        .with_seed(self.seed))
    }

    pub fn use_color(&self) -> bool {
        if self.no_color {
            false
        } else if self.color {
            true
        } else {
            std::io::stdout().is_terminal()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags_build_a_valid_config() {
        let cli = Cli::parse_from(["idxbench"]);
        let config = cli.experiment_config().expect("defaults are valid");
        assert_eq!(config.worker_count, 50);
        assert_eq!(config.spawn_rate, 5);
        assert_eq!(config.duration, Duration::from_secs(60));
        assert_eq!(config.think_time.min(), Duration::from_millis(100));
        assert_eq!(config.think_time.max(), Duration::from_millis(500));
        assert_eq!(config.base_seed, 42);
    }

    #[test]
    fn inverted_think_time_is_rejected() {
        let cli = Cli::parse_from([
            "idxbench",
            "--think-time-min",
            "500",
            "--think-time-max",
            "100",
        ]);
        assert!(cli.experiment_config().is_err());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let cli = Cli::parse_from(["idxbench", "--workers", "0"]);
        assert!(matches!(
            cli.experiment_config(),
            Err(ExperimentError::InvalidConfig(_))
        ));
    }
}
