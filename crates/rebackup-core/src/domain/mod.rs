//! Domain types for one-way directory synchronization
//!
//! - [`listing`] - Flat snapshots of directory entry names and the plan derived from two of them
//! - [`report`] - Per-cycle outcome, including per-file failures
//! - [`newtypes`] - Validated value types
//! - [`errors`] - Domain error type

pub mod errors;
pub mod listing;
pub mod newtypes;
pub mod report;

pub use errors::DomainError;
pub use listing::{DirectoryListing, SyncPlan};
pub use newtypes::SyncInterval;
pub use report::{CycleReport, FileFailure, FileOperation};
