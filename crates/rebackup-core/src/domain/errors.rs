//! Domain error types

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The sync interval must be a positive number of minutes
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// An entry name is not a plain base-name
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),
}
