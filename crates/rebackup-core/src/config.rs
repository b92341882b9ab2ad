//! Configuration module for rebackup.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::{errors::DomainError, newtypes::SyncInterval};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for rebackup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub alerts: AlertsConfig,
    pub logging: LoggingConfig,
}

/// Synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Directory whose entries are mirrored.
    pub source: PathBuf,
    /// Directory kept in step with `source`; created if missing.
    pub destination: PathBuf,
    /// Minutes to sleep between cycles.
    pub interval_minutes: u64,
}

/// Sound and speech alert settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// When false, alerts are only logged.
    pub enabled: bool,
    /// Default sound for success alerts.
    pub success_sound: PathBuf,
    /// Default sound for warning alerts.
    pub warning_sound: PathBuf,
    /// Default sound for error alerts.
    pub error_sound: PathBuf,
    /// Directory searched for same-named override sounds. `None` means the
    /// current working directory.
    pub custom_sound_dir: Option<PathBuf>,
    /// Message spoken when a cycle has errors.
    pub error_message: String,
    /// Longest time (ms) an alert call waits for its sound before returning.
    pub settle_delay_ms: u64,
    /// External player program. `None` auto-detects one.
    pub player: Option<String>,
    /// External text-to-speech program. `None` auto-detects one.
    pub speech_engine: Option<String>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `text` or `json`.
    pub format: String,
    /// Directory for daily-rotated log files. `None` logs to stderr only.
    pub directory: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, or return [`Config::default`] if no file exists there.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_yaml::from_str(&content)
                .with_context(|| format!("parse {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/rebackup/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("rebackup")
            .join("config.yaml")
    }
}

impl SyncConfig {
    /// The configured interval as a validated [`SyncInterval`].
    pub fn interval(&self) -> Result<SyncInterval, DomainError> {
        SyncInterval::from_minutes(self.interval_minutes)
    }
}

impl AlertsConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

/// Sound shipped next to the binary and used for every alert level.
const DEFAULT_ALERT_SOUND: &str = "data/bad.mp3";

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("backups"),
            destination: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("rebackup")
                .join("backup"),
            interval_minutes: 60,
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            success_sound: PathBuf::from(DEFAULT_ALERT_SOUND),
            warning_sound: PathBuf::from(DEFAULT_ALERT_SOUND),
            error_sound: PathBuf::from(DEFAULT_ALERT_SOUND),
            custom_sound_dir: None,
            error_message: "backup error".to_string(),
            settle_delay_ms: 1000,
            player: None,
            speech_engine: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            directory: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.interval_minutes"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

/// Upper bound for `alerts.settle_delay_ms`.
const MAX_SETTLE_DELAY_MS: u64 = 60_000;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        if self.sync.interval_minutes == 0 {
            errors.push(ValidationError {
                field: "sync.interval_minutes".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.sync.source.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "sync.source".into(),
                message: "must not be empty".into(),
            });
        }
        if self.sync.destination.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "sync.destination".into(),
                message: "must not be empty".into(),
            });
        }
        if !self.sync.source.as_os_str().is_empty() && self.sync.source == self.sync.destination {
            errors.push(ValidationError {
                field: "sync.destination".into(),
                message: format!(
                    "must differ from sync.source ({})",
                    self.sync.source.display()
                ),
            });
        }

        // --- alerts ---
        if self.alerts.enabled {
            for (field, path) in [
                ("alerts.success_sound", &self.alerts.success_sound),
                ("alerts.warning_sound", &self.alerts.warning_sound),
                ("alerts.error_sound", &self.alerts.error_sound),
            ] {
                if path.file_name().is_none() {
                    errors.push(ValidationError {
                        field: field.into(),
                        message: format!("must name a file: '{}'", path.display()),
                    });
                }
            }
            if self.alerts.error_message.trim().is_empty() {
                errors.push(ValidationError {
                    field: "alerts.error_message".into(),
                    message: "must not be empty".into(),
                });
            }
        }
        if self.alerts.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            errors.push(ValidationError {
                field: "alerts.settle_delay_ms".into(),
                message: format!("must not exceed {MAX_SETTLE_DELAY_MS}"),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Config`].
///
/// Starts from defaults and lets callers override individual fields.
///
/// ```rust
/// use rebackup_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let cfg = ConfigBuilder::new()
///     .sync_source(PathBuf::from("/srv/backups"))
///     .sync_destination(PathBuf::from("/mnt/archive"))
///     .sync_interval_minutes(15)
///     .logging_level("debug")
///     .build();
///
/// assert_eq!(cfg.sync.interval_minutes, 15);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder pre-populated with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Start from an existing configuration, e.g. one loaded from disk.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    // --- sync ---

    pub fn sync_source(mut self, source: PathBuf) -> Self {
        self.config.sync.source = source;
        self
    }

    pub fn sync_destination(mut self, destination: PathBuf) -> Self {
        self.config.sync.destination = destination;
        self
    }

    pub fn sync_interval_minutes(mut self, minutes: u64) -> Self {
        self.config.sync.interval_minutes = minutes;
        self
    }

    // --- alerts ---

    pub fn alerts_enabled(mut self, enabled: bool) -> Self {
        self.config.alerts.enabled = enabled;
        self
    }

    /// Use the same default sound for all three alert levels.
    pub fn alerts_sound(mut self, sound: PathBuf) -> Self {
        self.config.alerts.success_sound = sound.clone();
        self.config.alerts.warning_sound = sound.clone();
        self.config.alerts.error_sound = sound;
        self
    }

    pub fn alerts_custom_sound_dir(mut self, dir: PathBuf) -> Self {
        self.config.alerts.custom_sound_dir = Some(dir);
        self
    }

    pub fn alerts_error_message(mut self, message: impl Into<String>) -> Self {
        self.config.alerts.error_message = message.into();
        self
    }

    pub fn alerts_settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.alerts.settle_delay_ms = ms;
        self
    }

    pub fn alerts_player(mut self, program: impl Into<String>) -> Self {
        self.config.alerts.player = Some(program.into());
        self
    }

    pub fn alerts_speech_engine(mut self, program: impl Into<String>) -> Self {
        self.config.alerts.speech_engine = Some(program.into());
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    pub fn logging_directory(mut self, dir: PathBuf) -> Self {
        self.config.logging.directory = Some(dir);
        self
    }

    /// Consume the builder and return the [`Config`] without validation.
    pub fn build(self) -> Config {
        self.config
    }

    /// Consume the builder, validate, and return the [`Config`] or errors.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let errors = self.config.validate();
        if errors.is_empty() {
            Ok(self.config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
