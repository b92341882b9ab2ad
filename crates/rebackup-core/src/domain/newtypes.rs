//! Validated value types

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Time to wait between the end of one sync cycle and the start of the next
///
/// Always a positive whole number of minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct SyncInterval(u64);

impl SyncInterval {
    /// Creates an interval of `minutes` minutes
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidInterval`] when `minutes` is zero.
    pub fn from_minutes(minutes: u64) -> Result<Self, DomainError> {
        if minutes == 0 {
            return Err(DomainError::InvalidInterval(
                "interval must be at least one minute".to_string(),
            ));
        }
        Ok(Self(minutes))
    }

    /// The interval in minutes
    pub fn minutes(&self) -> u64 {
        self.0
    }

    /// The interval as a [`Duration`] (`minutes * 60` seconds)
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0.saturating_mul(60))
    }
}

impl TryFrom<u64> for SyncInterval {
    type Error = DomainError;

    fn try_from(minutes: u64) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
    }
}

impl From<SyncInterval> for u64 {
    fn from(interval: SyncInterval) -> Self {
        interval.0
    }
}

impl fmt::Display for SyncInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}
