//! rebackup Sync - One-way periodic directory synchronization
//!
//! Provides:
//! - Presence-by-name comparison of two flat directory listings
//! - Copy of missing entries and deletion of stale ones, continuing past
//!   per-file failures
//! - A periodic loop that raises one alert per failed cycle
//!
//! ## Modules
//!
//! - [`engine`] - Single sync cycle: snapshot, plan, copy, delete, alert
//! - [`filesystem`] - Local filesystem adapter (`tokio::fs`, mtime preservation)
//! - [`scheduler`] - Repeats cycles on a fixed interval until shutdown

pub mod engine;
pub mod filesystem;
pub mod scheduler;

use std::path::PathBuf;

use thiserror::Error;

/// Errors that end the sync loop
///
/// Per-file copy and delete failures are not errors at this level; they are
/// recorded in the cycle report and the loop carries on.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The destination directory could not be created
    #[error("Failed to create destination directory {path}: {reason}")]
    CreateDestination { path: PathBuf, reason: String },

    /// A directory could not be listed
    #[error("Failed to list directory {path}: {reason}")]
    ListDirectory { path: PathBuf, reason: String },
}
