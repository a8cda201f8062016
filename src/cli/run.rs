use crate::config::parse::{load_config, ConfigError};
use crate::config::Config;
use crate::scheduler::{log_outcome, BuildError, CycleOutcome, CycleRunner, Scheduler};
use crate::sink::sheet::SheetSink;
use crate::sink::traits::SinkError;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("setup error: {0}")]
    Build(#[from] BuildError),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Usage(String),
}

fn require_config_path(config_path: Option<PathBuf>) -> PathBuf {
    match config_path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Searched locations:");
            eprintln!("  ~/.config/notify-tally/config.yml");
            eprintln!("  /etc/notify-tally/config.yml");
            eprintln!("\nUse --config <path> to specify a config file, or run 'notify-tally config init' to generate one.");
            std::process::exit(1);
        }
    }
}

fn load(config_path: &Path) -> Result<Config, RunError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    Ok(load_config(config_path)?)
}

/// Run cycles on the configured schedule until Ctrl+C.
pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = require_config_path(config_path);
    run_scheduled(&config_path).await.map_err(|e| e.into())
}

async fn run_scheduled(config_path: &Path) -> Result<(), RunError> {
    let config = load(config_path)?;
    let runner = Arc::new(CycleRunner::from_config(&config, true)?);

    if runner.channels().is_empty() {
        warn!("No channels configured, every cycle will have nothing to report");
    }
    if runner.sink_names().is_empty() {
        warn!("No sinks configured, reports will only be logged");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(
        runner,
        config.schedule.interval,
        config.schedule.run_on_start,
    );
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    info!("Scheduler running, press Ctrl+C to shutdown");

    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    scheduler_handle.await?;
    info!("Shutdown complete");
    Ok(())
}

/// Run a single cycle now. With `dry_run`, sinks are skipped and the report is
/// printed as JSON.
pub async fn once(
    config_path: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = require_config_path(config_path);
    run_once(&config_path, dry_run).await.map_err(|e| e.into())
}

async fn run_once(config_path: &Path, dry_run: bool) -> Result<(), RunError> {
    let config = load(config_path)?;
    let runner = CycleRunner::from_config(&config, !dry_run)?;

    let outcome = runner.run_cycle(Utc::now()).await;
    log_outcome(&outcome);

    if let CycleOutcome::Published { report, .. } = &outcome {
        if dry_run {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }
    Ok(())
}

/// Print the pivot view of the sheet history as TSV.
pub async fn pivot(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = require_config_path(config_path);
    print_pivot(&config_path).await.map_err(|e| e.into())
}

async fn print_pivot(config_path: &Path) -> Result<(), RunError> {
    let config = load(config_path)?;
    let sheet = config
        .sinks
        .sheet
        .as_ref()
        .ok_or_else(|| RunError::Usage("sinks.sheet is not configured".to_string()))?;

    let sink = SheetSink::open(&sheet.path)?;
    let table = sink.pivot().await?;

    if table.rows.is_empty() {
        println!("No rows recorded yet in {}", sheet.path.display());
    } else {
        print!("{}", table.to_tsv());
    }
    Ok(())
}
