//! Tracked package records

use std::fmt;

use gitpm_types::{InstallStatus, PackageDescriptor};
use serde::Serialize;

/// Position of a record in its tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordId(pub(crate) usize);

impl RecordId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One installable package and its current status
///
/// Records are read-only outside the tracker; the status only changes
/// through the tracker's request and tick methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    #[serde(flatten)]
    descriptor: PackageDescriptor,
    status: InstallStatus,
}

impl PackageRecord {
    pub(crate) fn new(descriptor: PackageDescriptor) -> Self {
        Self {
            descriptor,
            status: InstallStatus::NotInstalled,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.descriptor.display_name
    }

    #[must_use]
    pub fn package_id(&self) -> &str {
        &self.descriptor.package_id
    }

    #[must_use]
    pub fn source_uri(&self) -> &str {
        &self.descriptor.source_uri
    }

    #[must_use]
    pub fn status(&self) -> InstallStatus {
        self.status
    }

    #[must_use]
    pub fn descriptor(&self) -> &PackageDescriptor {
        &self.descriptor
    }

    /// Whether `query` names this record by package id or display name
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        self.descriptor.package_id == query
            || self.descriptor.display_name.eq_ignore_ascii_case(query)
    }

    /// Set the status, returning the previous one
    pub(crate) fn set_status(&mut self, status: InstallStatus) -> InstallStatus {
        std::mem::replace(&mut self.status, status)
    }
}
