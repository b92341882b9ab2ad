//! Outcome of a single sync cycle

use std::{ffi::OsStr, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which per-file step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOperation {
    /// Copying a source entry into the destination
    Copy,
    /// Removing a destination entry that no longer exists in the source
    Delete,
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileOperation::Copy => "copy",
            FileOperation::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

/// A recoverable per-file failure recorded during a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// Entry base-name (lossy if the name is not valid UTF-8)
    pub name: String,
    pub operation: FileOperation,
    /// Rendered error chain
    pub error: String,
}

/// Summary of one sync cycle
///
/// A fresh report is created at the start of every cycle, so the error state
/// never carries over from one cycle to the next.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    /// When the cycle started
    pub started_at: DateTime<Utc>,
    /// Names copied from source to destination
    pub copied: Vec<String>,
    /// Names deleted from the destination
    pub deleted: Vec<String>,
    /// Names present on both sides and left untouched
    pub skipped: Vec<String>,
    /// Per-file copy and delete failures
    pub failures: Vec<FileFailure>,
    /// Wall-clock duration of the copy/delete phase in milliseconds
    pub duration_ms: u64,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            copied: Vec::new(),
            deleted: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn record_copied(&mut self, name: &OsStr) {
        self.copied.push(name.to_string_lossy().into_owned());
    }

    pub fn record_deleted(&mut self, name: &OsStr) {
        self.deleted.push(name.to_string_lossy().into_owned());
    }

    pub fn record_skipped(&mut self, name: &OsStr) {
        self.skipped.push(name.to_string_lossy().into_owned());
    }

    pub fn record_failure(
        &mut self,
        name: &OsStr,
        operation: FileOperation,
        error: impl fmt::Display,
    ) {
        self.failures.push(FileFailure {
            name: name.to_string_lossy().into_owned(),
            operation,
            error: error.to_string(),
        });
    }

    /// True if any copy or delete failed during the cycle
    pub fn had_error(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Number of copy and delete operations that succeeded
    pub fn changes(&self) -> usize {
        self.copied.len() + self.deleted.len()
    }

    /// Failures for one kind of operation
    pub fn failures_of(&self, operation: FileOperation) -> impl Iterator<Item = &FileFailure> {
        self.failures
            .iter()
            .filter(move |f| f.operation == operation)
    }
}
