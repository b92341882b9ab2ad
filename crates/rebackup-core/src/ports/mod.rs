//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the sync engine depends on; their
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ILocalFileSystem`] - Flat directory listing, copy, delete, directory creation
//! - [`IAlertService`] - Audible and spoken alerts raised at the end of a failed cycle

pub mod alerts;
pub mod local_filesystem;

pub use alerts::{AlertLevel, IAlertService};
pub use local_filesystem::ILocalFileSystem;
