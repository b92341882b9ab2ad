//! Alert service port (driven/secondary port)
//!
//! The sync engine raises alerts through this trait without knowing how
//! they are delivered. Implementations may play a sound, speak a message,
//! or only log.
//!
//! ## Design Notes
//!
//! - Alerts are best-effort. Neither method reports failure back to the
//!   caller; implementations log delivery problems themselves.
//! - [`IAlertService::raise`] may return before the sound has finished.
//! - [`IAlertService::speak`] returns only after the message has been spoken.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of event an alert sound represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Success,
    Warning,
    Error,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertLevel::Success => "success",
            AlertLevel::Warning => "warning",
            AlertLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Port trait for audible and spoken alerts
#[async_trait::async_trait]
pub trait IAlertService: Send + Sync {
    /// Plays the sound for `level` in the background
    async fn raise(&self, level: AlertLevel);

    /// Speaks `message` and waits until it has been spoken
    async fn speak(&self, message: &str);
}
