//! CLI error handling

use std::fmt;
use std::time::Duration;

use gitpm_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(gitpm_errors::ConfigError),
    /// Tracker, client or catalog error
    Ops(gitpm_errors::Error),

    /// Invalid command arguments
    InvalidArguments(String),
    /// No catalog entry matches the given name
    UnknownPackage(String),
    /// Another request is still in flight
    Busy(String),
    /// A request resolved with a failure
    Failed { operation: String, message: String },
    /// Outstanding requests did not resolve in time
    Timeout { operation: String, waited: Duration },
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Ops(e) => {
                let message = e.user_message();
                write!(f, "{message}")?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }

            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::UnknownPackage(name) => write!(
                f,
                "No catalog package named '{name}'\n  Hint: run `gitpm list` to see the catalog."
            ),
            CliError::Busy(name) => write!(
                f,
                "{name} has a request in progress\n  Retry: wait for it to finish and try again."
            ),
            CliError::Failed { operation, message } => write!(f, "{operation} failed: {message}"),
            CliError::Timeout { operation, waited } => write!(
                f,
                "{operation} did not finish within {}s\n  Hint: raise tracker.wait_timeout_secs or GITPM_WAIT_TIMEOUT_SECS.",
                waited.as_secs()
            ),
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Ops(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<gitpm_errors::ConfigError> for CliError {
    fn from(e: gitpm_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<gitpm_errors::Error> for CliError {
    fn from(e: gitpm_errors::Error) -> Self {
        match e {
            gitpm_errors::Error::Config(e) => CliError::Config(e),
            other => CliError::Ops(other),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
