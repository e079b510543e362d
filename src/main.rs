mod models;
mod repo;
mod service;
mod utils;

use crate::models::config::{setup_config, Config};
use crate::models::dry_run_mode::DryRunMode;
use crate::models::error::BackupError;
use crate::repo::sqlite::SqliteSnapshotEngine;
use crate::service::backup::BackupRunner;
use crate::utils::progress::{create_spinner, format_bytes};
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};

#[derive(Parser)]
#[command(name = "RustySnapshotBackup")]
#[command(about = "Snapshots a SQLite database and prunes old snapshots", long_about = None)]
struct Cli {
    #[arg(
        short = 'c',
        long = "config",
        default_value = "config.json",
        env = "SNAPSHOT_BACKUP_CONFIG"
    )]
    config_file: String,

    #[arg(
        short = 'l',
        long = "log-level",
        default_value = "info",
        env = "LOG_LEVEL"
    )]
    log_level: String,

    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    #[arg(short = 'v', long = "validate-only")]
    validate_only: bool,

    #[arg(short = 'd', long = "dry-run")]
    dry_run: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(parse_log_level(&args.log_level))
        .format_timestamp_secs()
        .init();

    info!("RustySnapshotBackup starting...");

    // Strip any surrounding quotes from config file path
    let config_file_path = args
        .config_file
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    let config: Config =
        setup_config(config_file_path).context("Failed to load configuration")?;
    debug!("Loaded config: {:?}", &config);

    if args.validate_only {
        info!("Configuration is valid. Exiting (--validate-only mode).");
        return Ok(());
    }

    let dry_run_mode = if args.dry_run {
        info!("Running in DRY RUN mode - nothing will be created or deleted");
        DryRunMode::Preview
    } else {
        DryRunMode::None
    };

    run_backup(config, dry_run_mode, args.quiet)
}

fn parse_log_level(level: &str) -> log::LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    }
}

fn run_backup(config: Config, dry_run_mode: DryRunMode, quiet: bool) -> Result<()> {
    let engine = SqliteSnapshotEngine::from_config(&config);
    let source = config.database_file.clone();
    let runner = BackupRunner::new(config, engine, dry_run_mode);

    let spinner = if quiet {
        None
    } else {
        Some(create_spinner(
            dry_run_mode.log_prefix(),
            &format!("Backing up {}...", source),
        ))
    };

    let result = runner.run();

    if let Some(spinner) = spinner {
        match &result {
            Ok(_) => spinner.finish_with_message(format!("Backed up {}", source)),
            Err(_) => spinner.abandon_with_message(format!("Backup of {} failed", source)),
        }
    }

    let report = result.map_err(tag_failure)?;

    if report.prune.has_failures() {
        warn!(
            "Backup completed, but {} old snapshot(s) could not be deleted",
            report.prune.failures.len()
        );
    } else if dry_run_mode.is_dry_run() {
        info!(
            "DRY RUN completed - would write {} and delete {} old snapshot(s)",
            report.snapshot_path.display(),
            report.prune.deleted.len()
        );
    } else {
        info!(
            "Backup completed successfully: {} [{}] ({} old snapshot(s) deleted, {} kept)",
            report.snapshot_path.display(),
            format_bytes(report.snapshot_bytes.unwrap_or_default()),
            report.prune.deleted.len(),
            report.prune.retained.len()
        );
    }
    Ok(())
}

/// Single place a failed run is reported: `main` prints this chain once.
fn tag_failure(e: BackupError) -> anyhow::Error {
    let category = e.category();
    anyhow::Error::new(e).context(format!("Backup run failed ({:?} error)", category))
}
