//! Render BOSH deployment metrics from a snapshot file.

use clap::Parser;
use tracing::info;

use bosh_exporter_common::init_tracing;
use bosh_exporter_deployments::{
    DeploymentFilter, DeploymentsCollector, ExporterConfig, FileSource, FilteredSource, render,
};

/// Render BOSH deployment metrics in the Prometheus text format.
#[derive(Parser, Debug)]
#[command(name = "bosh-deployments-exporter")]
#[command(about = "Render BOSH deployments as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// Path to the deployments snapshot (overrides config).
    #[arg(short, long)]
    snapshot: Option<String>,

    /// Metrics namespace (overrides config).
    #[arg(long)]
    namespace: Option<String>,

    /// Environment label (overrides config).
    #[arg(long)]
    environment: Option<String>,

    /// BOSH director name (overrides config).
    #[arg(long)]
    bosh_name: Option<String>,

    /// BOSH director UUID (overrides config).
    #[arg(long)]
    bosh_uuid: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    // Apply CLI overrides
    if let Some(snapshot) = args.snapshot {
        config.snapshot.path = Some(snapshot);
    }
    if let Some(namespace) = args.namespace {
        config.metrics.namespace = namespace;
    }
    if let Some(environment) = args.environment {
        config.metrics.environment = environment;
    }
    if let Some(bosh_name) = args.bosh_name {
        config.bosh.name = bosh_name;
    }
    if let Some(bosh_uuid) = args.bosh_uuid {
        config.bosh.uuid = bosh_uuid;
    }
    if let Some(log_level) = args.log_level {
        config.logging.level = log_level;
    }
    config.validate()?;

    init_tracing(&config.logging)?;

    let snapshot_path = config
        .snapshot
        .path
        .clone()
        .ok_or_else(|| anyhow::anyhow!("No snapshot file given (use --snapshot or snapshot.path)"))?;

    let collector = DeploymentsCollector::new(
        &config.metrics.namespace,
        &config.metrics.environment,
        &config.bosh.name,
        &config.bosh.uuid,
    );

    let source = FilteredSource::new(
        FileSource::new(&snapshot_path),
        DeploymentFilter::new(&config.filters),
    );

    info!(snapshot = %snapshot_path, "Rendering deployments metrics");

    let samples = collector.collect_from(&source)?;
    let output = render(&collector.describe(), &samples)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))?;
    print!("{}", output);

    let stats = collector.stats();
    info!(
        scrapes = stats.scrapes,
        scrape_failures = stats.scrape_failures,
        duplicate_releases = stats.duplicate_releases,
        duplicate_stemcells = stats.duplicate_stemcells,
        skipped_records = stats.skipped_records,
        samples = stats.last_sample_count,
        "Final statistics"
    );

    Ok(())
}
