//! Package descriptor error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PackageError {
    #[error("package not found: {name}")]
    NotFound { name: String },

    #[error("package not installed: {name}")]
    NotInstalled { name: String },

    #[error("invalid package descriptor {origin}: {message}")]
    InvalidDescriptor { origin: String, message: String },

    #[error("invalid package metadata at {source_uri}: {message}")]
    InvalidMetadata { source_uri: String, message: String },
}

impl UserFacingError for PackageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidDescriptor { .. } => {
                Some("Every descriptor needs display_name, package_id and source_uri.")
            }
            Self::InvalidMetadata { .. } => {
                Some("The package source must contain a package.json with a `name` field.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "package.not_found",
            Self::NotInstalled { .. } => "package.not_installed",
            Self::InvalidDescriptor { .. } => "package.invalid_descriptor",
            Self::InvalidMetadata { .. } => "package.invalid_metadata",
        };
        Some(code)
    }
}
