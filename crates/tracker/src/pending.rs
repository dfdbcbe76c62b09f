//! Outstanding requests registered for polling

use gitpm_client::Request;
use gitpm_types::{InstallStatus, OperationKind, PackageInfo};
use serde::Serialize;

use crate::RecordId;

/// Handle of an outstanding request, by operation
#[derive(Debug)]
pub(crate) enum PendingHandle {
    Add(Request<PackageInfo>),
    Remove(Request<()>),
    List(Request<Vec<PackageInfo>>),
}

/// A registered poll entry: an in-flight operation and what it acts on
///
/// List requests have no target record. Entries are dropped on the tick
/// their completion is observed.
#[derive(Debug)]
pub struct PendingRequest {
    pub(crate) record: Option<RecordId>,
    /// Record status before the request was issued
    pub(crate) previous: InstallStatus,
    pub(crate) handle: PendingHandle,
}

impl PendingRequest {
    pub(crate) fn add(record: RecordId, previous: InstallStatus, request: Request<PackageInfo>) -> Self {
        Self {
            record: Some(record),
            previous,
            handle: PendingHandle::Add(request),
        }
    }

    pub(crate) fn remove(record: RecordId, previous: InstallStatus, request: Request<()>) -> Self {
        Self {
            record: Some(record),
            previous,
            handle: PendingHandle::Remove(request),
        }
    }

    pub(crate) fn list(request: Request<Vec<PackageInfo>>) -> Self {
        Self {
            record: None,
            previous: InstallStatus::NotInstalled,
            handle: PendingHandle::List(request),
        }
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self.handle {
            PendingHandle::Add(_) => OperationKind::Add,
            PendingHandle::Remove(_) => OperationKind::Remove,
            PendingHandle::List(_) => OperationKind::List,
        }
    }

    #[must_use]
    pub fn record(&self) -> Option<RecordId> {
        self.record
    }
}

/// Outcome of one request observed during a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub kind: OperationKind,
    /// Package id of the target record; `None` for list requests
    pub package: Option<String>,
    pub succeeded: bool,
    /// Failure message when `succeeded` is false
    pub error: Option<String>,
}
