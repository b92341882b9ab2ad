//! Tracing subscriber setup
//!
//! `RUST_LOG` wins over `logging.level`. Console output goes to stderr in
//! text or JSON form; when `logging.directory` is set, a daily-rotated plain
//! text file is written there as well.

use anyhow::{Context, Result};
use rebackup_core::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name prefix for rotated log files
pub const LOG_FILE_PREFIX: &str = "rebackup.log";

/// Installs the global subscriber
///
/// The returned guard flushes the log file on drop; keep it alive for the
/// life of the process.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (text_layer, json_layer) = if config.format == "json" {
        let layer = fmt::layer().json().with_writer(std::io::stderr);
        (None, Some(layer))
    } else {
        let layer = fmt::layer().with_target(true).with_writer(std::io::stderr);
        (Some(layer), None)
    };

    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_init_creates_log_directory() {
        let dir = TempDir::new().unwrap();
        let log_dir = dir.path().join("logs");
        let config = LoggingConfig {
            directory: Some(log_dir.clone()),
            ..LoggingConfig::default()
        };

        let guard = init(&config).unwrap();

        assert!(log_dir.is_dir());
        assert!(guard.is_some());
        tracing::info!("log directory test");
    }
}
