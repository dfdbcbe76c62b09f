use gitpm_types::InstallStatus;
use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Package tracker events consumed by CLI/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PackageEvent {
    /// Add request issued to the package service
    InstallRequested { package: String, source_uri: String },

    /// Add request resolved successfully
    InstallCompleted {
        package: String,
        display_name: String,
    },

    /// Add request resolved with a failure
    InstallFailed {
        package: String,
        source_uri: String,
        failure: FailureContext,
        reverted_to: InstallStatus,
    },

    /// Remove request issued to the package service
    UninstallRequested { package: String },

    /// Remove request resolved successfully
    UninstallCompleted {
        package: String,
        display_name: String,
    },

    /// Remove request resolved with a failure
    UninstallFailed {
        package: String,
        failure: FailureContext,
        reverted_to: InstallStatus,
    },

    /// Installed-package query issued
    ListStarting,

    /// Installed-package query resolved
    ListCompleted {
        /// Packages reported by the service
        installed: usize,
        /// Tracked records marked installed by this listing
        matched: usize,
    },

    /// Installed-package query failed
    ListFailed { failure: FailureContext },

    /// A tracked record moved between states
    StatusChanged {
        package: String,
        from: InstallStatus,
        to: InstallStatus,
    },
}
