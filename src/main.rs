//! Backup Keeper - Main entry point
//!
//! Daemon that keeps content-addressed, retention-bounded backups of a
//! single database file.

use anyhow::Result;
use backup_keeper::{backup::BackupScheduler, config::Config, utils};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Source file to back up (overrides config)
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Backup directory (overrides config)
    #[arg(short, long)]
    backup_dir: Option<PathBuf>,

    /// Seconds between backup passes (overrides config)
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Maximum number of retained artifacts (overrides config)
    #[arg(long)]
    retention: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Run exactly one backup pass and exit
    #[arg(long)]
    once: bool,

    /// List retained artifacts (oldest to newest) and exit
    #[arg(long)]
    list: bool,

    /// With --list, print artifacts as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    // CLI overrides
    if let Some(source) = args.source {
        config.source.path = source;
    }
    if let Some(dir) = args.backup_dir {
        config.backup.dir = dir;
    }
    if let Some(secs) = args.interval_secs {
        config.backup.interval_secs = secs;
    }
    if let Some(retention) = args.retention {
        config.backup.retention = retention;
    }
    config.validate()?;

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    let scheduler = Arc::new(BackupScheduler::new(&config));

    if args.list {
        return print_artifacts(&scheduler, args.json);
    }

    if args.once {
        // Manual trigger: unlike the periodic loop, a failure here is
        // reported through the exit code.
        scheduler.run_pass()?;
        return Ok(());
    }

    tracing::info!(
        "Starting backup-keeper v{} (source: {}, interval: {}s, retention: {})",
        env!("CARGO_PKG_VERSION"),
        config.source.path.display(),
        config.backup.interval_secs,
        config.backup.retention
    );

    let cancel = CancellationToken::new();
    let scheduler_handle = scheduler.start(cancel.clone());

    // Wait for shutdown signal, then let any in-flight pass finish
    shutdown_signal().await;
    cancel.cancel();

    match tokio::time::timeout(std::time::Duration::from_secs(30), scheduler_handle).await {
        Ok(Ok(())) => tracing::info!("Scheduler shutdown complete"),
        Ok(Err(e)) => tracing::error!("Scheduler task panicked: {}", e),
        Err(_) => tracing::warn!("Scheduler shutdown timeout, forcing exit"),
    }

    Ok(())
}

fn print_artifacts(scheduler: &BackupScheduler, as_json: bool) -> Result<()> {
    let artifacts = scheduler.list_artifacts()?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&artifacts)?);
    } else {
        for artifact in &artifacts {
            println!(
                "{}\t{}\t{}",
                artifact.created_at.format("%Y-%m-%d %H:%M:%S"),
                artifact.fingerprint_prefix,
                artifact.file_name
            );
        }
        println!("{} artifact(s) retained", artifacts.len());
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
