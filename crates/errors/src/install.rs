//! Install tracker error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum InstallError {
    #[error("a request is already pending for {package}")]
    RequestPending { package: String },

    #[error("unknown package record: {package}")]
    UnknownRecord { package: String },

    #[error("git command failed: {command}: {message}")]
    GitFailed { command: String, message: String },

    #[error("request handle dropped before completion: {operation}")]
    RequestAbandoned { operation: String },
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::RequestPending { .. } => {
                Some("Wait for the running install or uninstall to finish, then retry.")
            }
            Self::UnknownRecord { .. } => {
                Some("Run `gitpm list` to see the packages configured for this project.")
            }
            Self::GitFailed { .. } => Some("Check that git is installed and the URL is reachable."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::RequestPending { .. } | Self::GitFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::RequestPending { .. } => "install.request_pending",
            Self::UnknownRecord { .. } => "install.unknown_record",
            Self::GitFailed { .. } => "install.git_failed",
            Self::RequestAbandoned { .. } => "install.request_abandoned",
        };
        Some(code)
    }
}
