//! Directory listings and the sync plan derived from them
//!
//! A [`DirectoryListing`] is a flat snapshot of the entry names in one
//! directory: base-names only, no paths and no metadata. Names are stored as
//! [`OsString`] so entries whose names are not valid UTF-8 are still carried
//! through to the copy and delete steps.
//!
//! Comparison is by presence of the name only. A name that appears on both
//! sides is never touched, whatever its contents or timestamps.

use std::{
    collections::BTreeSet,
    ffi::{OsStr, OsString},
    path::{Component, Path},
};

use super::errors::DomainError;

/// Flat, sorted set of entry base-names in a single directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    names: BTreeSet<OsString>,
}

impl DirectoryListing {
    /// Creates an empty listing
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a listing from an iterator of names
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidFileName`] if any name is not a single
    /// normal path component (empty, `.`, `..`, or containing a separator).
    pub fn from_names<I, N>(names: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = N>,
        N: Into<OsString>,
    {
        let mut listing = Self::new();
        for name in names {
            listing.insert(name)?;
        }
        Ok(listing)
    }

    /// Adds a name to the listing
    ///
    /// Returns `true` if the name was not already present.
    pub fn insert(&mut self, name: impl Into<OsString>) -> Result<bool, DomainError> {
        let name = name.into();
        validate_base_name(&name)?;
        Ok(self.names.insert(name))
    }

    /// Returns true if `name` is present
    pub fn contains(&self, name: impl AsRef<OsStr>) -> bool {
        self.names.contains(name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &OsStr> {
        self.names.iter().map(OsString::as_os_str)
    }

    /// Names present here but absent from `other`
    pub fn missing_from<'a>(
        &'a self,
        other: &'a DirectoryListing,
    ) -> impl Iterator<Item = &'a OsStr> {
        self.names.difference(&other.names).map(OsString::as_os_str)
    }

    /// Names present in both listings
    pub fn shared_with<'a>(
        &'a self,
        other: &'a DirectoryListing,
    ) -> impl Iterator<Item = &'a OsStr> {
        self.names.intersection(&other.names).map(OsString::as_os_str)
    }
}

fn validate_base_name(name: &OsStr) -> Result<(), DomainError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(single)), None) if single == name => Ok(()),
        _ => Err(DomainError::InvalidFileName(name.to_string_lossy().into_owned())),
    }
}

// ============================================================================
// SyncPlan
// ============================================================================

/// The work one cycle has to do, derived from a source and destination listing
///
/// - `to_copy`: names in the source but not the destination
/// - `to_delete`: names in the destination but not the source
/// - `unchanged`: names on both sides; left alone
///
/// Each list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub to_copy: Vec<OsString>,
    pub to_delete: Vec<OsString>,
    pub unchanged: Vec<OsString>,
}

impl SyncPlan {
    /// Computes the plan that makes `destination` hold exactly the names in `source`
    pub fn between(source: &DirectoryListing, destination: &DirectoryListing) -> Self {
        Self {
            to_copy: source
                .missing_from(destination)
                .map(OsStr::to_os_string)
                .collect(),
            to_delete: destination
                .missing_from(source)
                .map(OsStr::to_os_string)
                .collect(),
            unchanged: source
                .shared_with(destination)
                .map(OsStr::to_os_string)
                .collect(),
        }
    }

    /// True when there is nothing to copy or delete
    pub fn is_noop(&self) -> bool {
        self.to_copy.is_empty() && self.to_delete.is_empty()
    }
}
