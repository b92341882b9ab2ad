//! rebackup daemon - periodic one-way directory backup
//!
//! Copies every entry of the source directory that is missing from the
//! destination, removes every destination entry the source no longer has,
//! then sleeps for the configured interval and repeats. A cycle with any
//! per-file failure plays the error sound and speaks the error message.
//!
//! # Architecture
//!
//! Configuration comes from the YAML file plus command-line overrides. The
//! loop is controlled by a `CancellationToken` that is triggered on receipt
//! of SIGTERM or SIGINT; the same token stops any alert sound still playing.

mod logging;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rebackup_alerts::{
    CommandPlayer, CommandSpeechEngine, ISoundPlayer, ISpeechEngine, LogOnlyAlerts, NoBackend,
    NotificationController,
};
use rebackup_core::{
    config::{AlertsConfig, Config, ConfigBuilder},
    ports::{alerts::IAlertService, local_filesystem::ILocalFileSystem},
};
use rebackup_sync::{
    engine::SyncEngine, filesystem::LocalFileSystemAdapter, scheduler::SyncScheduler,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

// ============================================================================
// Command line
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "rebackupd", version, about = "Periodic one-way directory backup")]
struct Args {
    /// Configuration file [default: $XDG_CONFIG_HOME/rebackup/config.yaml]
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory to back up
    #[arg(long, value_name = "DIR")]
    source: Option<PathBuf>,

    /// Directory kept in step with the source
    #[arg(long, value_name = "DIR")]
    destination: Option<PathBuf>,

    /// Minutes to sleep between cycles
    #[arg(long, value_name = "MINUTES")]
    interval: Option<u64>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

/// Loads the configuration file and applies command-line overrides
fn load_config(args: &Args) -> Result<Config> {
    load_config_from(args, &Config::default_path())
}

/// Like [`load_config`], with `default_path` used when `--config` is absent
///
/// An explicit `--config` must load. A missing file at `default_path` means
/// built-in defaults; a present but unreadable or malformed one is an error.
fn load_config_from(args: &Args, default_path: &Path) -> Result<Config> {
    let base = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load_or_default(default_path).with_context(|| {
            format!("Failed to load configuration from {}", default_path.display())
        })?,
    };

    let mut builder = ConfigBuilder::from_config(base);
    if let Some(source) = &args.source {
        builder = builder.sync_source(source.clone());
    }
    if let Some(destination) = &args.destination {
        builder = builder.sync_destination(destination.clone());
    }
    if let Some(minutes) = args.interval {
        builder = builder.sync_interval_minutes(minutes);
    }
    if let Some(level) = &args.log_level {
        builder = builder.logging_level(level.as_str());
    }

    match builder.build_validated() {
        Ok(config) => Ok(config),
        Err(errors) => {
            let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
            bail!("Invalid configuration: {}", details.join("; "))
        }
    }
}

// ============================================================================
// Alert backends
// ============================================================================

fn sound_player(config: &AlertsConfig) -> Arc<dyn ISoundPlayer> {
    if let Some(program) = &config.player {
        return Arc::new(CommandPlayer::for_program(program));
    }

    #[cfg(feature = "native-audio")]
    {
        Arc::new(rebackup_alerts::RodioPlayer::new())
    }

    #[cfg(not(feature = "native-audio"))]
    {
        match CommandPlayer::detect() {
            Some(player) => Arc::new(player),
            None => {
                warn!("No sound player found, alert sounds are disabled");
                Arc::new(NoBackend)
            }
        }
    }
}

fn speech_engine(config: &AlertsConfig) -> Arc<dyn ISpeechEngine> {
    if let Some(program) = &config.speech_engine {
        return Arc::new(CommandSpeechEngine::for_program(program));
    }
    match CommandSpeechEngine::detect() {
        Some(engine) => Arc::new(engine),
        None => {
            warn!("No speech engine found, spoken alerts are disabled");
            Arc::new(NoBackend)
        }
    }
}

fn alert_service(config: &AlertsConfig, shutdown: CancellationToken) -> Arc<dyn IAlertService> {
    if !config.enabled {
        info!("Alerts disabled, failures will only be logged");
        return Arc::new(LogOnlyAlerts::new());
    }
    Arc::new(NotificationController::from_config(
        config,
        sound_player(config),
        speech_engine(config),
        shutdown,
    ))
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;
    let _log_guard = logging::init(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        source = %config.sync.source.display(),
        destination = %config.sync.destination.display(),
        "rebackup daemon starting (rebackupd)"
    );

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let fs: Arc<dyn ILocalFileSystem> = Arc::new(LocalFileSystemAdapter::new());
    let alerts = alert_service(&config.alerts, shutdown_token.clone());
    let engine = SyncEngine::from_config(fs, alerts, &config);
    let interval = config.sync.interval().context("Invalid sync interval")?;
    let scheduler = SyncScheduler::new(engine, interval, shutdown_token);

    if args.once {
        let report = scheduler.run_once().await?;
        if report.had_error() {
            bail!("{} file operation(s) failed", report.failures.len());
        }
        return Ok(());
    }

    match scheduler.run().await {
        Ok(cycles) => {
            info!(cycles, "rebackup daemon shut down gracefully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "rebackup daemon exiting with error");
            Err(e.into())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
