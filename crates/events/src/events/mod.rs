use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventSource};
use gitpm_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the failure has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod general;
pub mod package;

pub use general::*;
pub use package::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, debug output)
    General(GeneralEvent),

    /// Package tracker events (install, uninstall, listing)
    Package(PackageEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Package(event) => match event {
                PackageEvent::InstallRequested { .. }
                | PackageEvent::InstallCompleted { .. }
                | PackageEvent::InstallFailed { .. } => EventSource::INSTALL,
                PackageEvent::UninstallRequested { .. }
                | PackageEvent::UninstallCompleted { .. }
                | PackageEvent::UninstallFailed { .. } => EventSource::UNINSTALL,
                PackageEvent::ListStarting
                | PackageEvent::ListCompleted { .. }
                | PackageEvent::ListFailed { .. } => EventSource::LIST,
                PackageEvent::StatusChanged { .. } => EventSource::TRACKER,
            },
        }
    }

    /// Severity used when routing this event
    #[must_use]
    pub fn log_level(&self) -> EventLevel {
        match self {
            Self::General(GeneralEvent::Error { .. })
            | Self::Package(
                PackageEvent::InstallFailed { .. }
                | PackageEvent::UninstallFailed { .. }
                | PackageEvent::ListFailed { .. },
            ) => EventLevel::Error,

            Self::General(GeneralEvent::Warning { .. }) => EventLevel::Warn,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Package(PackageEvent::StatusChanged { .. }) => EventLevel::Debug,

            _ => EventLevel::Info,
        }
    }
}
