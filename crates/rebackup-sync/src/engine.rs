//! One-way synchronization engine
//!
//! The [`SyncEngine`] runs a single sync cycle between a source and a
//! destination directory.
//!
//! ## Cycle Flow
//!
//! 1. **Prepare**: create the destination (and parents) if missing
//! 2. **Snapshot**: list entry names on both sides
//! 3. **Copy**: every name in the source but not the destination
//! 4. **Delete**: every name in the destination but not the source
//! 5. **Alert**: if anything in steps 3-4 failed, raise one error sound and
//!    speak one message
//!
//! Failures in steps 1-2 abort the cycle with a [`SyncError`]. Failures in
//! steps 3-4 are logged, recorded in the [`CycleReport`], and the remaining
//! names are still processed. Nothing is retried.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use rebackup_core::config::Config;
use rebackup_core::domain::listing::{DirectoryListing, SyncPlan};
use rebackup_core::domain::report::{CycleReport, FileOperation};
use rebackup_core::ports::alerts::{AlertLevel, IAlertService};
use rebackup_core::ports::local_filesystem::ILocalFileSystem;

use crate::SyncError;

// ============================================================================
// SyncEngine struct
// ============================================================================

/// Runs sync cycles from `source` into `destination`
pub struct SyncEngine {
    /// Filesystem port
    fs: Arc<dyn ILocalFileSystem>,
    /// Alert port, used only when a cycle has failures
    alerts: Arc<dyn IAlertService>,
    /// Directory treated as the truth
    source: PathBuf,
    /// Directory brought in line with `source`
    destination: PathBuf,
    /// Message spoken after a failed cycle
    error_message: String,
}

impl SyncEngine {
    /// Creates a new `SyncEngine`
    ///
    /// # Arguments
    /// * `fs` - Filesystem adapter
    /// * `alerts` - Alert adapter
    /// * `source` - Directory whose entries are mirrored
    /// * `destination` - Directory kept in step with `source`
    /// * `error_message` - Message spoken when a cycle has failures
    pub fn new(
        fs: Arc<dyn ILocalFileSystem>,
        alerts: Arc<dyn IAlertService>,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            fs,
            alerts,
            source: source.into(),
            destination: destination.into(),
            error_message: error_message.into(),
        }
    }

    /// Creates a `SyncEngine` from the `sync` and `alerts` sections of `config`
    pub fn from_config(
        fs: Arc<dyn ILocalFileSystem>,
        alerts: Arc<dyn IAlertService>,
        config: &Config,
    ) -> Self {
        Self::new(
            fs,
            alerts,
            config.sync.source.clone(),
            config.sync.destination.clone(),
            config.alerts.error_message.clone(),
        )
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    // ========================================================================
    // SyncEngine::run_cycle()
    // ========================================================================

    /// Runs one sync cycle
    ///
    /// # Errors
    /// Returns [`SyncError`] only when the destination cannot be created or
    /// either directory cannot be listed. Per-file failures are reported in
    /// the returned [`CycleReport`].
    pub async fn run_cycle(&self) -> Result<CycleReport, SyncError> {
        let started_at = Utc::now();
        let timer = Instant::now();

        self.fs
            .ensure_directory(&self.destination)
            .await
            .map_err(|e| SyncError::CreateDestination {
                path: self.destination.clone(),
                reason: format!("{e:#}"),
            })?;

        let source_names = self.list(&self.source).await?;
        let dest_names = self.list(&self.destination).await?;
        let plan = SyncPlan::between(&source_names, &dest_names);

        debug!(
            source_entries = source_names.len(),
            destination_entries = dest_names.len(),
            to_copy = plan.to_copy.len(),
            to_delete = plan.to_delete.len(),
            noop = plan.is_noop(),
            "Sync plan computed"
        );

        let mut report = CycleReport::new(started_at);

        for name in &plan.unchanged {
            info!(file = %name.to_string_lossy(), "File skipped");
            report.record_skipped(name);
        }
        for name in &plan.to_copy {
            self.copy_one(name, &mut report).await;
        }
        for name in &plan.to_delete {
            self.delete_one(name, &mut report).await;
        }

        report.duration_ms = timer.elapsed().as_millis() as u64;

        if report.had_error() {
            warn!(
                failures = report.failures.len(),
                "Sync cycle finished with errors, raising alert"
            );
            self.alerts.raise(AlertLevel::Error).await;
            self.alerts.speak(&self.error_message).await;
        }

        Ok(report)
    }

    async fn list(&self, path: &Path) -> Result<DirectoryListing, SyncError> {
        self.fs
            .list_names(path)
            .await
            .map_err(|e| SyncError::ListDirectory {
                path: path.to_path_buf(),
                reason: format!("{e:#}"),
            })
    }

    async fn copy_one(&self, name: &OsStr, report: &mut CycleReport) {
        let from = self.source.join(name);
        let to = self.destination.join(name);
        info!(file = %name.to_string_lossy(), "Copying file");

        match self.fs.copy_file(&from, &to).await {
            Ok(()) => report.record_copied(name),
            Err(e) => {
                error!(
                    file = %name.to_string_lossy(),
                    error = %format_args!("{e:#}"),
                    "Failed to copy file"
                );
                debug!(file = %name.to_string_lossy(), error = ?e, "Copy failure detail");
                report.record_failure(name, FileOperation::Copy, format!("{e:#}"));
            }
        }
    }

    async fn delete_one(&self, name: &OsStr, report: &mut CycleReport) {
        let path = self.destination.join(name);
        info!(file = %name.to_string_lossy(), "Removing old file");

        match self.fs.remove_file(&path).await {
            Ok(()) => report.record_deleted(name),
            Err(e) => {
                error!(
                    file = %name.to_string_lossy(),
                    error = %format_args!("{e:#}"),
                    "Failed to remove file"
                );
                debug!(file = %name.to_string_lossy(), error = ?e, "Remove failure detail");
                report.record_failure(name, FileOperation::Delete, format!("{e:#}"));
            }
        }
    }
}

// ============================================================================
// Unit tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        collections::{BTreeMap, HashMap, HashSet},
        ffi::OsString,
        sync::Mutex,
    };

    use super::*;

    /// In-memory filesystem holding a flat map of names per directory
    #[derive(Default)]
    pub(crate) struct MemoryFileSystem {
        dirs: Mutex<HashMap<PathBuf, BTreeMap<OsString, Vec<u8>>>>,
        fail_copy: HashSet<OsString>,
        fail_remove: HashSet<OsString>,
        fail_ensure: bool,
        pub(crate) ops: Mutex<Vec<String>>,
    }

    impl MemoryFileSystem {
        pub(crate) fn with_dir(self, dir: &str, names: &[&str]) -> Self {
            let files = names
                .iter()
                .map(|n| (OsString::from(n), n.as_bytes().to_vec()))
                .collect();
            self.dirs.lock().unwrap().insert(PathBuf::from(dir), files);
            self
        }

        pub(crate) fn failing_copy(mut self, name: &str) -> Self {
            self.fail_copy.insert(OsString::from(name));
            self
        }

        pub(crate) fn failing_remove(mut self, name: &str) -> Self {
            self.fail_remove.insert(OsString::from(name));
            self
        }

        pub(crate) fn failing_ensure(mut self) -> Self {
            self.fail_ensure = true;
            self
        }

        pub(crate) fn names(&self, dir: &str) -> Vec<String> {
            self.dirs
                .lock()
                .unwrap()
                .get(Path::new(dir))
                .map(|files| {
                    files
                        .keys()
                        .map(|k| k.to_string_lossy().into_owned())
                        .collect()
                })
                .unwrap_or_default()
        }

        fn count(&self, prefix: &str) -> usize {
            self.ops
                .lock()
                .unwrap()
                .iter()
                .filter(|op| op.starts_with(prefix))
                .count()
        }

        pub(crate) fn copies(&self) -> usize {
            self.count("copy ")
        }

        pub(crate) fn removes(&self) -> usize {
            self.count("remove ")
        }
    }

    fn split(path: &Path) -> (PathBuf, OsString) {
        let parent = path.parent().unwrap().to_path_buf();
        let name = path.file_name().unwrap().to_os_string();
        (parent, name)
    }

    #[async_trait::async_trait]
    impl ILocalFileSystem for MemoryFileSystem {
        async fn ensure_directory(&self, path: &Path) -> anyhow::Result<()> {
            if self.fail_ensure {
                anyhow::bail!("read-only filesystem");
            }
            self.dirs
                .lock()
                .unwrap()
                .entry(path.to_path_buf())
                .or_default();
            Ok(())
        }

        async fn list_names(&self, path: &Path) -> anyhow::Result<DirectoryListing> {
            self.ops
                .lock()
                .unwrap()
                .push(format!("list {}", path.display()));
            let dirs = self.dirs.lock().unwrap();
            let files = dirs
                .get(path)
                .ok_or_else(|| anyhow::anyhow!("no such directory"))?;
            Ok(DirectoryListing::from_names(files.keys().cloned())?)
        }

        async fn copy_file(&self, from: &Path, to: &Path) -> anyhow::Result<()> {
            let (src_dir, name) = split(from);
            let (dst_dir, dst_name) = split(to);
            self.ops
                .lock()
                .unwrap()
                .push(format!("copy {}", name.to_string_lossy()));
            if self.fail_copy.contains(&name) {
                anyhow::bail!("permission denied");
            }
            let mut dirs = self.dirs.lock().unwrap();
            let data = dirs
                .get(&src_dir)
                .and_then(|f| f.get(&name))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("source missing"))?;
            dirs.entry(dst_dir).or_default().insert(dst_name, data);
            Ok(())
        }

        async fn remove_file(&self, path: &Path) -> anyhow::Result<()> {
            let (dir, name) = split(path);
            self.ops
                .lock()
                .unwrap()
                .push(format!("remove {}", name.to_string_lossy()));
            if self.fail_remove.contains(&name) {
                anyhow::bail!("file is busy");
            }
            self.dirs
                .lock()
                .unwrap()
                .get_mut(&dir)
                .and_then(|f| f.remove(&name))
                .map(|_| ())
                .ok_or_else(|| anyhow::anyhow!("not found"))
        }
    }

    /// Alert service that records every call
    #[derive(Default)]
    pub(crate) struct RecordingAlerts {
        pub(crate) raised: Mutex<Vec<AlertLevel>>,
        pub(crate) spoken: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl IAlertService for RecordingAlerts {
        async fn raise(&self, level: AlertLevel) {
            self.raised.lock().unwrap().push(level);
        }

        async fn speak(&self, message: &str) {
            self.spoken.lock().unwrap().push(message.to_string());
        }
    }

    fn engine(fs: Arc<MemoryFileSystem>, alerts: Arc<RecordingAlerts>) -> SyncEngine {
        SyncEngine::new(fs, alerts, "/src", "/dst", "backup error")
    }

    #[tokio::test]
    async fn test_cycle_copies_missing_and_deletes_stale() {
        let fs = Arc::new(
            MemoryFileSystem::default()
                .with_dir("/src", &["a.txt", "b.txt"])
                .with_dir("/dst", &["b.txt", "c.txt"]),
        );
        let alerts = Arc::new(RecordingAlerts::default());

        let report = engine(fs.clone(), alerts.clone()).run_cycle().await.unwrap();

        assert_eq!(report.copied, vec!["a.txt"]);
        assert_eq!(report.deleted, vec!["c.txt"]);
        assert_eq!(report.skipped, vec!["b.txt"]);
        assert!(!report.had_error());
        assert_eq!(fs.names("/dst"), vec!["a.txt", "b.txt"]);
        assert!(alerts.raised.lock().unwrap().is_empty());
        assert!(alerts.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shared_name_is_never_touched() {
        let fs = Arc::new(
            MemoryFileSystem::default()
                .with_dir("/src", &["same.txt"])
                .with_dir("/dst", &["same.txt"]),
        );
        let alerts = Arc::new(RecordingAlerts::default());

        let report = engine(fs.clone(), alerts).run_cycle().await.unwrap();

        assert_eq!(report.changes(), 0);
        assert_eq!(fs.copies(), 0);
        assert_eq!(fs.removes(), 0);
    }

    #[tokio::test]
    async fn test_second_cycle_is_idempotent() {
        let fs = Arc::new(
            MemoryFileSystem::default()
                .with_dir("/src", &["1", "2", "3"])
                .with_dir("/dst", &["4"]),
        );
        let alerts = Arc::new(RecordingAlerts::default());
        let engine = engine(fs.clone(), alerts);

        engine.run_cycle().await.unwrap();
        let copies_after_first = fs.copies();
        let removes_after_first = fs.removes();

        let second = engine.run_cycle().await.unwrap();

        assert_eq!(second.changes(), 0);
        assert_eq!(fs.copies(), copies_after_first);
        assert_eq!(fs.removes(), removes_after_first);
    }

    #[tokio::test]
    async fn test_copy_failure_does_not_stop_other_work() {
        let fs = Arc::new(
            MemoryFileSystem::default()
                .with_dir("/src", &["a", "bad", "z"])
                .with_dir("/dst", &["stale1", "stale2"])
                .failing_copy("bad"),
        );
        let alerts = Arc::new(RecordingAlerts::default());

        let report = engine(fs.clone(), alerts.clone()).run_cycle().await.unwrap();

        assert_eq!(report.copied, vec!["a", "z"]);
        assert_eq!(report.deleted, vec!["stale1", "stale2"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "bad");
        assert_eq!(report.failures[0].operation, FileOperation::Copy);
        assert!(report.had_error());
        assert_eq!(fs.copies(), 3);
        assert_eq!(fs.removes(), 2);
    }

    #[tokio::test]
    async fn test_many_failures_raise_exactly_one_alert() {
        let fs = Arc::new(
            MemoryFileSystem::default()
                .with_dir("/src", &["x", "y"])
                .with_dir("/dst", &["old"])
                .failing_copy("x")
                .failing_copy("y")
                .failing_remove("old"),
        );
        let alerts = Arc::new(RecordingAlerts::default());

        let report = engine(fs, alerts.clone()).run_cycle().await.unwrap();

        assert_eq!(report.failures.len(), 3);
        assert_eq!(*alerts.raised.lock().unwrap(), vec![AlertLevel::Error]);
        assert_eq!(*alerts.spoken.lock().unwrap(), vec!["backup error".to_string()]);
    }

    #[tokio::test]
    async fn test_error_flag_resets_each_cycle() {
        let fs = Arc::new(
            MemoryFileSystem::default()
                .with_dir("/src", &[])
                .with_dir("/dst", &["locked"])
                .failing_remove("locked"),
        );
        let alerts = Arc::new(RecordingAlerts::default());
        let engine = engine(fs.clone(), alerts.clone());

        assert!(engine.run_cycle().await.unwrap().had_error());
        assert!(engine.run_cycle().await.unwrap().had_error());
        // One alert per failed cycle.
        assert_eq!(alerts.raised.lock().unwrap().len(), 2);
        assert_eq!(alerts.spoken.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_destination_is_created_before_listing() {
        let fs = Arc::new(MemoryFileSystem::default().with_dir("/src", &["a"]));
        let alerts = Arc::new(RecordingAlerts::default());

        let report = engine(fs.clone(), alerts).run_cycle().await.unwrap();

        assert_eq!(report.copied, vec!["a"]);
        assert_eq!(fs.names("/dst"), vec!["a"]);
    }

    #[tokio::test]
    async fn test_destination_creation_failure_is_fatal() {
        let fs = Arc::new(
            MemoryFileSystem::default()
                .with_dir("/src", &["a"])
                .failing_ensure(),
        );
        let alerts = Arc::new(RecordingAlerts::default());

        let err = engine(fs.clone(), alerts.clone())
            .run_cycle()
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::CreateDestination { .. }));
        assert_eq!(fs.copies(), 0);
        assert!(alerts.raised.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_source_listing_failure_is_fatal() {
        let fs = Arc::new(MemoryFileSystem::default());
        let alerts = Arc::new(RecordingAlerts::default());

        let err = engine(fs, alerts).run_cycle().await.unwrap_err();

        match err {
            SyncError::ListDirectory { path, .. } => assert_eq!(path, PathBuf::from("/src")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_from_config_uses_configured_paths_and_message() {
        let config = rebackup_core::config::ConfigBuilder::new()
            .sync_source(PathBuf::from("/in"))
            .sync_destination(PathBuf::from("/out"))
            .alerts_error_message("archive broken")
            .build();
        let fs = Arc::new(
            MemoryFileSystem::default()
                .with_dir("/in", &["f"])
                .with_dir("/out", &[])
                .failing_copy("f"),
        );
        let alerts = Arc::new(RecordingAlerts::default());

        let engine = SyncEngine::from_config(fs, alerts.clone(), &config);
        assert_eq!(engine.source(), Path::new("/in"));
        assert_eq!(engine.destination(), Path::new("/out"));

        engine.run_cycle().await.unwrap();
        assert_eq!(*alerts.spoken.lock().unwrap(), vec!["archive broken".to_string()]);
    }
}
