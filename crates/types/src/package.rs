//! Package-related type definitions

use crate::Version;
use gitpm_errors::PackageError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configured description of one installable package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Name shown to the user
    pub display_name: String,
    /// Canonical package identifier, e.g. `com.example.tools`
    pub package_id: String,
    /// Where the package is installed from (git URL or `file:` path)
    pub source_uri: String,
}

impl PackageDescriptor {
    /// Create a new descriptor
    pub fn new(
        display_name: impl Into<String>,
        package_id: impl Into<String>,
        source_uri: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            package_id: package_id.into(),
            source_uri: source_uri.into(),
        }
    }

    /// Check that every field is present
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidDescriptor` naming the first empty field.
    pub fn validate(&self, origin: &str) -> Result<(), PackageError> {
        let fields = [
            ("display_name", &self.display_name),
            ("package_id", &self.package_id),
            ("source_uri", &self.source_uri),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(PackageError::InvalidDescriptor {
                    origin: origin.to_string(),
                    message: format!("`{field}` must not be empty"),
                });
            }
        }
        Ok(())
    }
}

/// Installation state of a tracked package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    #[default]
    NotInstalled,
    Installed,
    CurrentlyInstalling,
}

impl InstallStatus {
    /// Whether a request is outstanding for the package
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, Self::CurrentlyInstalling)
    }
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInstalled => write!(f, "not installed"),
            Self::Installed => write!(f, "installed"),
            Self::CurrentlyInstalling => write!(f, "installing"),
        }
    }
}

/// Kind of external operation a request performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Remove,
    List,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
            Self::List => write!(f, "list"),
        }
    }
}

/// Where an installed package came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageSource {
    Git,
    Local,
    #[serde(rename = "builtin")]
    BuiltIn,
    #[default]
    Registry,
}

impl PackageSource {
    /// Classify a dependency value from the project manifest
    #[must_use]
    pub fn from_location(location: &str) -> Self {
        if location.starts_with("file:") {
            Self::Local
        } else if location.starts_with("git")
            || location.ends_with(".git")
            || location.contains(".git#")
            || location.starts_with("ssh://")
            || location.starts_with("https://")
            || location.starts_with("http://")
        {
            Self::Git
        } else {
            Self::Registry
        }
    }
}

/// An installed package as reported by the package service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Canonical package identifier
    pub name: String,
    /// Version from the package metadata, when known
    pub version: Option<Version>,
    /// Source location recorded for the package
    pub location: String,
    pub source: PackageSource,
    /// Whether the project depends on it directly
    pub direct: bool,
}

impl PackageInfo {
    /// Create info for a direct dependency
    pub fn direct(name: impl Into<String>, location: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            name: name.into(),
            version: None,
            source: PackageSource::from_location(&location),
            location,
            direct: true,
        }
    }

    /// Attach a version
    #[must_use]
    pub fn with_version(mut self, version: Option<Version>) -> Self {
        self.version = version;
        self
    }
}
