//! Alert service for hosts without audio

use rebackup_core::ports::alerts::{AlertLevel, IAlertService};
use tracing::warn;

/// [`IAlertService`] that only writes log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyAlerts;

impl LogOnlyAlerts {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl IAlertService for LogOnlyAlerts {
    async fn raise(&self, level: AlertLevel) {
        warn!(%level, "Alert raised (sound disabled)");
    }

    async fn speak(&self, message: &str) {
        warn!(text = message, "Alert message (speech disabled)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_only_alerts_never_block() {
        let alerts = LogOnlyAlerts::new();
        alerts.raise(AlertLevel::Error).await;
        alerts.speak("backup error").await;
    }
}
