//! Project manifest error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ManifestError {
    #[error("manifest not found: {path}")]
    NotFound { path: String },

    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("malformed manifest {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("failed to write manifest {path}: {message}")]
    WriteFailed { path: String, message: String },
}

impl ManifestError {
    /// Convert an `io::Error` into a `ManifestError` with an associated path
    #[must_use]
    pub fn from_io_with_path(err: &std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.display().to_string(),
            },
            std::io::ErrorKind::NotFound => Self::NotFound {
                path: path.display().to_string(),
            },
            _ => Self::WriteFailed {
                path: path.display().to_string(),
                message: err.to_string(),
            },
        }
    }
}

impl UserFacingError for ManifestError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => {
                Some("Point --project at a directory containing Packages/manifest.json.")
            }
            Self::PermissionDenied { .. } => Some("Ensure the manifest is writable and retry."),
            Self::Malformed { .. } => Some("Fix the JSON syntax in the manifest and retry."),
            Self::WriteFailed { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::WriteFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "manifest.not_found",
            Self::PermissionDenied { .. } => "manifest.permission_denied",
            Self::Malformed { .. } => "manifest.malformed",
            Self::WriteFailed { .. } => "manifest.write_failed",
        };
        Some(code)
    }
}
