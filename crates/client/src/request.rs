//! Pollable handles for in-flight package operations

use std::task::Poll;

use gitpm_errors::{Error, InstallError};
use gitpm_types::OperationKind;
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Observed outcome of a request once it has completed
#[derive(Debug, Clone)]
enum Outcome {
    Succeeded,
    Failed(String),
}

/// Handle to an operation running outside the caller
///
/// The handle is checked with [`Request::poll`], which never blocks. The
/// result is yielded exactly once; afterwards the handle only reports
/// whether it succeeded.
#[derive(Debug)]
pub struct Request<T> {
    kind: OperationKind,
    target: String,
    receiver: Option<oneshot::Receiver<Result<T, Error>>>,
    outcome: Option<Outcome>,
}

/// Sending half of a [`Request`], used by the code doing the work
#[derive(Debug)]
pub struct Completer<T> {
    sender: oneshot::Sender<Result<T, Error>>,
}

impl<T> Completer<T> {
    /// Resolve the paired request. Ignored if the request was dropped.
    pub fn complete(self, result: Result<T, Error>) {
        let _ = self.sender.send(result);
    }
}

impl<T> Request<T> {
    /// Create a pending request and the completer that resolves it
    #[must_use]
    pub fn channel(kind: OperationKind, target: impl Into<String>) -> (Completer<T>, Self) {
        let (sender, receiver) = oneshot::channel();
        let request = Self {
            kind,
            target: target.into(),
            receiver: Some(receiver),
            outcome: None,
        };
        (Completer { sender }, request)
    }

    /// Create a request that is already resolved
    #[must_use]
    pub fn ready(kind: OperationKind, target: impl Into<String>, result: Result<T, Error>) -> Self {
        let (completer, request) = Self::channel(kind, target);
        completer.complete(result);
        request
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Source URI or package id the operation acts on
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Whether completion has been observed by [`Request::poll`]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.outcome.is_some()
    }

    /// Whether the request completed successfully
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, Some(Outcome::Succeeded))
    }

    /// Failure message of a completed request
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Some(Outcome::Failed(message)) => Some(message),
            _ => None,
        }
    }

    /// Check for completion without blocking
    ///
    /// Returns `Poll::Ready` with the result the first time completion is
    /// observed. A worker that vanishes without answering resolves the
    /// request with `InstallError::RequestAbandoned`.
    pub fn poll(&mut self) -> Poll<Result<T, Error>> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Poll::Ready(Err(Error::internal(format!(
                "{} request for {} was already consumed",
                self.kind, self.target
            ))));
        };

        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return Poll::Pending,
            Err(TryRecvError::Closed) => Err(InstallError::RequestAbandoned {
                operation: format!("{} {}", self.kind, self.target),
            }
            .into()),
        };

        self.receiver = None;
        self.outcome = Some(match &result {
            Ok(_) => Outcome::Succeeded,
            Err(err) => Outcome::Failed(err.to_string()),
        });
        Poll::Ready(result)
    }

    /// Wait for the result instead of polling
    ///
    /// # Errors
    ///
    /// Returns the operation's error, or `InstallError::RequestAbandoned` if
    /// the worker went away.
    pub async fn wait(mut self) -> Result<T, Error> {
        let Some(receiver) = self.receiver.take() else {
            return Err(Error::internal("request was already consumed"));
        };
        receiver.await.unwrap_or_else(|_| {
            Err(InstallError::RequestAbandoned {
                operation: format!("{} {}", self.kind, self.target),
            }
            .into())
        })
    }
}
