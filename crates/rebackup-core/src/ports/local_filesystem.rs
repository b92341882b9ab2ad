//! Local filesystem port (driven/secondary port)
//!
//! The sync engine only needs four operations: make sure a directory exists,
//! take a flat snapshot of its entry names, copy one entry, remove one entry.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - Listing is non-recursive. Every entry is reported by base-name,
//!   whatever its type.

use std::path::Path;

use crate::domain::listing::DirectoryListing;

/// Port trait for the filesystem operations used by a sync cycle
#[async_trait::async_trait]
pub trait ILocalFileSystem: Send + Sync {
    /// Creates `path` and any missing parents; succeeds if it already exists
    async fn ensure_directory(&self, path: &Path) -> anyhow::Result<()>;

    /// Returns the base-names of all entries directly inside `path`
    async fn list_names(&self, path: &Path) -> anyhow::Result<DirectoryListing>;

    /// Copies the file at `from` to `to`, preserving metadata where the
    /// platform allows
    async fn copy_file(&self, from: &Path, to: &Path) -> anyhow::Result<()>;

    /// Removes the file at `path`
    async fn remove_file(&self, path: &Path) -> anyhow::Result<()>;
}
