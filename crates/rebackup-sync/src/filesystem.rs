//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] using `tokio::fs` for async file operations.
//!
//! ## Design Decisions
//!
//! - **Flat listing**: `read_dir` of a single level; every entry type is
//!   reported, so a subdirectory in the source shows up as a name whose copy
//!   fails rather than being silently ignored.
//! - **Metadata**: `tokio::fs::copy` carries permissions; access and
//!   modification times are restored afterwards with `filetime`. A failure
//!   there is logged and the copy still counts as done.
//! - **No recursion on delete**: only plain files are removed.

use std::path::Path;

use anyhow::{bail, Context};
use filetime::FileTime;
use rebackup_core::{domain::listing::DirectoryListing, ports::local_filesystem::ILocalFileSystem};
use tracing::{debug, instrument, warn};

// ============================================================================
// LocalFileSystemAdapter struct
// ============================================================================

/// Sets access and modification times on a copied file
type SetTimes = fn(&Path, FileTime, FileTime) -> std::io::Result<()>;

fn set_file_times(path: &Path, atime: FileTime, mtime: FileTime) -> std::io::Result<()> {
    filetime::set_file_times(path, atime, mtime)
}

/// Adapter that bridges the [`ILocalFileSystem`] port to the real filesystem.
///
/// All operations derive their context from the path arguments. The source
/// and destination directories live in the sync engine.
#[derive(Debug, Clone)]
pub struct LocalFileSystemAdapter {
    set_times: SetTimes,
}

impl LocalFileSystemAdapter {
    /// Create a new `LocalFileSystemAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            set_times: set_file_times,
        }
    }
}

impl Default for LocalFileSystemAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn ensure_directory(&self, path: &Path) -> anyhow::Result<()> {
        if tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
            return Ok(());
        }
        debug!("creating directory");
        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("create_dir_all {}", path.display()))?;
        debug!("directory created");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn list_names(&self, path: &Path) -> anyhow::Result<DirectoryListing> {
        let mut entries = tokio::fs::read_dir(path)
            .await
            .with_context(|| format!("read_dir {}", path.display()))?;

        let mut listing = DirectoryListing::new();
        while let Some(entry) = entries.next_entry().await? {
            listing.insert(entry.file_name())?;
        }

        debug!(entries = listing.len(), "directory listed");
        Ok(listing)
    }

    #[instrument(skip(self), fields(from = %from.display(), to = %to.display()))]
    async fn copy_file(&self, from: &Path, to: &Path) -> anyhow::Result<()> {
        let metadata = tokio::fs::metadata(from)
            .await
            .with_context(|| format!("stat {}", from.display()))?;
        if metadata.is_dir() {
            bail!("{} is a directory; only files are copied", from.display());
        }

        let bytes = tokio::fs::copy(from, to)
            .await
            .with_context(|| format!("copy {} -> {}", from.display(), to.display()))?;

        // The bytes are in place; losing the timestamps does not fail the copy.
        let atime = FileTime::from_last_access_time(&metadata);
        let mtime = FileTime::from_last_modification_time(&metadata);
        let target = to.to_path_buf();
        let set_times = self.set_times;
        match tokio::task::spawn_blocking(move || set_times(&target, atime, mtime)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "copied, but file times were not preserved"),
            Err(e) => warn!(error = %e, "file time task failed"),
        }

        debug!(bytes, "copy complete");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn remove_file(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("remove {}", path.display()))?;
        debug!("remove complete");
        Ok(())
    }
}

// ============================================================================
// Unit tests
// ============================================================================
