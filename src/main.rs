//! Bike-share demand estimation and station reallocation: CLI entry point.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bikeshare_sim::cli::{self, CliOptions};
use bikeshare_sim::config::{RunConfig, UsageKind};
use bikeshare_sim::estimator::DemandEstimator;
use bikeshare_sim::io::{export_adjustments, export_predictions, read_dataset};
use bikeshare_sim::realloc::{ReallocationSummary, UsageSource, aggregate_districts, simulate_network};

/// Feature importances printed after the regression report.
const TOP_FEATURES: usize = 5;

fn load_config(opts: &CliOptions) -> Result<RunConfig> {
    let mut cfg = if let Some(ref path) = opts.config {
        RunConfig::from_toml_file(path)?
    } else {
        RunConfig::from_preset(opts.preset.as_deref().unwrap_or("baseline"))?
    };

    if let Some(ref train) = opts.train {
        cfg.data.train = Some(train.clone());
    }
    if let Some(ref test) = opts.test {
        cfg.data.test = Some(test.clone());
    }
    if let Some(usage) = opts.usage {
        cfg.reallocation.usage = usage;
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("{} invalid configuration value(s)", errors.len());
    }
    Ok(cfg)
}

fn required(path: Option<&PathBuf>, flag: &str) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.clone()),
        None => bail!("no {flag} table given (use {flag} <csv> or set it under [data])"),
    }
}

fn run(opts: &CliOptions) -> Result<()> {
    let cfg = load_config(opts)?;
    let train_path = required(cfg.data.train.as_ref(), "--train")?;
    let test_path = required(cfg.data.test.as_ref(), "--test")?;
    let roles = cfg.data.roles();

    let train = read_dataset(&train_path, &roles)
        .with_context(|| format!("failed to load training table {}", train_path.display()))?;
    let test = read_dataset(&test_path, &roles)
        .with_context(|| format!("failed to load test table {}", test_path.display()))?;
    info!(
        train_rows = train.len(),
        test_rows = test.len(),
        features = train.schema().len(),
        "tables loaded"
    );

    let output = DemandEstimator::new(cfg.model.clone()).fit_and_score(&train, &test)?;
    let predicted = output.predictions()?.to_vec();

    println!("{}", output.report()?);
    println!();
    println!("Top features:");
    for (name, share) in output.model.feature_importance().iter().take(TOP_FEATURES) {
        println!("  {name:<24} {share:.3}");
    }

    let usage = match cfg.reallocation.usage {
        UsageKind::Observed => UsageSource::Observed,
        UsageKind::Predicted => UsageSource::Predicted(&predicted),
    };
    let stats = aggregate_districts(
        &test,
        &cfg.data.station_column,
        &cfg.data.population_column,
        usage,
    )?;
    let adjustments = simulate_network(&stats, &cfg.reallocation.policy())?;
    let summary = ReallocationSummary::from_adjustments(&adjustments);
    info!(usage = %cfg.reallocation.usage, districts = summary.districts, "reallocation complete");

    println!();
    println!("{summary}");

    if let Some(ref path) = opts.predictions_out {
        export_predictions(&test, &predicted, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Predictions written to {}", path.display());
    }
    if let Some(ref path) = opts.adjustments_out {
        export_adjustments(&adjustments, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Adjustments written to {}", path.display());
    }

    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = run(&opts) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
