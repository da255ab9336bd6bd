//! idxbench - before/after index performance experiment harness.

use anyhow::{Context, Result};
use clap::Parser;
use idxbench_cli::{
    cli::Cli,
    ops::build_registry,
    report::{ComparisonPrinter, ExperimentReport},
    store::ListingStore,
};
use idxbench_core::{compare, PhaseController};
use owo_colors::OwoColorize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise derive the level from --verbose.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = cli
        .experiment_config()
        .context("invalid experiment configuration")?;
    let color = cli.use_color();
    print_banner(&cli, color);

    tracing::info!(documents = cli.docs, seed = cli.seed, "seeding listings store");
    let store = Arc::new(ListingStore::seeded(cli.docs, cli.seed));
    let registry = Arc::new(
        build_registry(&store, cli.seed).context("failed to build the operation catalogue")?,
    );

    let printer = ComparisonPrinter::new(color);
    let controller = PhaseController::new(registry, config.clone());

    // Baseline phase: indexes absent.
    let baseline_store = Arc::clone(&store);
    let baseline = controller
        .run_phase("baseline", move || async move {
            baseline_store.drop_indexes();
            Ok(())
        })
        .await
        .context("baseline phase failed")?;
    printer.print_phase(&baseline);

    // Optimized phase: same workload against the indexed store.
    let optimized_store = Arc::clone(&store);
    let optimized = controller
        .run_phase("optimized", move || async move {
            optimized_store.build_indexes();
            Ok(())
        })
        .await
        .context("optimized phase failed")?;
    printer.print_phase(&optimized);

    let comparison = compare(&baseline, &optimized);
    printer.print_comparison(&comparison);

    if let Some(path) = &cli.json {
        let report = ExperimentReport::new(&config, cli.docs, &baseline, &optimized, &comparison);
        report
            .export(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        println!("\nReport written to: {}", path.display());
    }

    Ok(())
}

/// Print a compact one-line banner with the experiment parameters.
fn print_banner(cli: &Cli, color: bool) {
    let line = format!(
        "{} docs, {} workers (spawn rate {}/s), {}s per phase, seed {}",
        cli.docs, cli.workers, cli.spawn_rate, cli.duration, cli.seed
    );
    println!();
    if color {
        println!("{}: {}", "idxbench".cyan().bold(), line);
    } else {
        println!("idxbench: {line}");
    }
}
