//! Sync scheduler - repeats sync cycles on a fixed interval
//!
//! The [`SyncScheduler`] drives a [`SyncEngine`]: run a cycle, sleep for the
//! configured interval, repeat. It stops when its [`CancellationToken`] is
//! cancelled or when a cycle returns a fatal [`SyncError`].
//!
//! ## Flow
//!
//! ```text
//! run_cycle ──→ sleep(interval) ──→ run_cycle ──→ ...
//!     │               │
//!  SyncError     shutdown.cancelled()
//!     ↓               ↓
//!   Err(..)         Ok(cycles)
//! ```
//!
//! A cycle already in progress is always allowed to finish; cancellation is
//! only observed between cycles.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use rebackup_core::domain::{
    newtypes::SyncInterval,
    report::{CycleReport, FileOperation},
};

use crate::{engine::SyncEngine, SyncError};

/// Runs [`SyncEngine`] cycles on a fixed interval
pub struct SyncScheduler {
    /// Engine that performs each cycle
    engine: SyncEngine,
    /// Sleep between the end of one cycle and the start of the next
    interval: SyncInterval,
    /// Cancelled on shutdown
    shutdown: CancellationToken,
}

impl SyncScheduler {
    /// Creates a new `SyncScheduler`
    ///
    /// # Arguments
    /// * `engine` - Engine that performs each cycle
    /// * `interval` - Time to sleep after each cycle
    /// * `shutdown` - Token that stops the loop between cycles
    pub fn new(engine: SyncEngine, interval: SyncInterval, shutdown: CancellationToken) -> Self {
        info!(
            interval_minutes = interval.minutes(),
            source = %engine.source().display(),
            destination = %engine.destination().display(),
            "Creating sync scheduler"
        );

        Self {
            engine,
            interval,
            shutdown,
        }
    }

    pub fn interval(&self) -> SyncInterval {
        self.interval
    }

    /// Runs exactly one cycle and logs its summary
    pub async fn run_once(&self) -> Result<CycleReport, SyncError> {
        let report = self.engine.run_cycle().await?;
        log_summary(&report);
        Ok(report)
    }

    /// Main loop
    ///
    /// Runs cycles until shutdown is requested (returns the number of
    /// completed cycles) or a cycle fails fatally (returns the error).
    pub async fn run(&self) -> Result<u64, SyncError> {
        info!(interval = %self.interval, "Sync loop starting");

        let mut cycles: u64 = 0;

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            self.run_once().await?;
            cycles += 1;

            tokio::select! {
                _ = tokio::time::sleep(self.interval.as_duration()) => {}
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!(cycles, "Sync loop stopped");
        Ok(cycles)
    }
}

fn log_summary(report: &CycleReport) {
    if report.had_error() {
        warn!(
            copied = report.copied.len(),
            deleted = report.deleted.len(),
            skipped = report.skipped.len(),
            copy_failures = report.failures_of(FileOperation::Copy).count(),
            delete_failures = report.failures_of(FileOperation::Delete).count(),
            duration_ms = report.duration_ms,
            "Sync cycle completed with errors"
        );
    } else {
        info!(
            copied = report.copied.len(),
            deleted = report.deleted.len(),
            skipped = report.skipped.len(),
            duration_ms = report.duration_ms,
            "Sync cycle completed"
        );
    }
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Arc, time::Duration};

    use rebackup_core::{
        domain::listing::DirectoryListing, ports::local_filesystem::ILocalFileSystem,
    };

    use super::*;
    use crate::engine::tests::{MemoryFileSystem, RecordingAlerts};

    fn minutes(n: u64) -> SyncInterval {
        SyncInterval::from_minutes(n).unwrap()
    }

    /// Wraps a filesystem and cancels `token` once `limit` source listings
    /// have been taken
    struct CancelAfter {
        inner: MemoryFileSystem,
        token: CancellationToken,
        limit: usize,
    }

    #[async_trait::async_trait]
    impl ILocalFileSystem for CancelAfter {
        async fn ensure_directory(&self, path: &Path) -> anyhow::Result<()> {
            self.inner.ensure_directory(path).await
        }

        async fn list_names(&self, path: &Path) -> anyhow::Result<DirectoryListing> {
            let listing = self.inner.list_names(path).await?;
            let source_lists = self
                .inner
                .ops
                .lock()
                .unwrap()
                .iter()
                .filter(|op| op.as_str() == "list /src")
                .count();
            if source_lists >= self.limit {
                self.token.cancel();
            }
            Ok(listing)
        }

        async fn copy_file(&self, from: &Path, to: &Path) -> anyhow::Result<()> {
            self.inner.copy_file(from, to).await
        }

        async fn remove_file(&self, path: &Path) -> anyhow::Result<()> {
            self.inner.remove_file(path).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_repeats_until_cancelled() {
        let token = CancellationToken::new();
        let fs = Arc::new(CancelAfter {
            inner: MemoryFileSystem::default()
                .with_dir("/src", &["a"])
                .with_dir("/dst", &[]),
            token: token.clone(),
            limit: 3,
        });
        let alerts = Arc::new(RecordingAlerts::default());
        let engine = SyncEngine::new(fs.clone(), alerts, "/src", "/dst", "backup error");
        let scheduler = SyncScheduler::new(engine, minutes(60), token);

        let cycles = tokio::time::timeout(Duration::from_secs(24 * 3600), scheduler.run())
            .await
            .expect("loop should stop after cancellation")
            .unwrap();

        assert_eq!(cycles, 3);
        // Only the first cycle had anything to copy.
        assert_eq!(fs.inner.copies(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sleeps_for_the_interval_between_cycles() {
        let token = CancellationToken::new();
        let fs = Arc::new(CancelAfter {
            inner: MemoryFileSystem::default()
                .with_dir("/src", &[])
                .with_dir("/dst", &[]),
            token: token.clone(),
            limit: 2,
        });
        let alerts = Arc::new(RecordingAlerts::default());
        let engine = SyncEngine::new(fs, alerts, "/src", "/dst", "backup error");
        let scheduler = SyncScheduler::new(engine, minutes(5), token);

        let start = tokio::time::Instant::now();
        let cycles = scheduler.run().await.unwrap();

        assert_eq!(cycles, 2);
        // One full interval elapsed between the two cycles, and no second sleep.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(300), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(600), "elapsed {elapsed:?}");
    }

    #[tokio::test]
    async fn test_run_returns_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let fs = Arc::new(MemoryFileSystem::default().with_dir("/src", &["a"]));
        let alerts = Arc::new(RecordingAlerts::default());
        let engine = SyncEngine::new(fs.clone(), alerts, "/src", "/dst", "backup error");
        let scheduler = SyncScheduler::new(engine, minutes(1), token);

        assert_eq!(scheduler.run().await.unwrap(), 0);
        assert_eq!(fs.copies(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_fatal_error() {
        let fs = Arc::new(
            MemoryFileSystem::default()
                .with_dir("/src", &["a"])
                .failing_ensure(),
        );
        let alerts = Arc::new(RecordingAlerts::default());
        let engine = SyncEngine::new(fs, alerts, "/src", "/dst", "backup error");
        let scheduler = SyncScheduler::new(engine, minutes(1), CancellationToken::new());

        let err = scheduler.run().await.unwrap_err();
        assert!(matches!(err, SyncError::CreateDestination { .. }));
    }

    #[tokio::test]
    async fn test_run_once_returns_report() {
        let fs = Arc::new(
            MemoryFileSystem::default()
                .with_dir("/src", &["a.txt", "b.txt"])
                .with_dir("/dst", &["b.txt", "c.txt"]),
        );
        let alerts = Arc::new(RecordingAlerts::default());
        let engine = SyncEngine::new(fs, alerts, "/src", "/dst", "backup error");
        let scheduler = SyncScheduler::new(engine, minutes(1), CancellationToken::new());

        let report = scheduler.run_once().await.unwrap();
        assert_eq!(report.copied, vec!["a.txt"]);
        assert_eq!(report.deleted, vec!["c.txt"]);
        assert_eq!(scheduler.interval().minutes(), 1);
    }
}
