//! The install tracker state machine

use std::task::Poll;

use gitpm_client::PackageClient;
use gitpm_errors::{Error, InstallError};
use gitpm_events::{
    AppEvent, EventEmitter, EventSender, FailureContext, GeneralEvent, PackageEvent,
};
use gitpm_types::{InstallStatus, OperationKind, PackageDescriptor, PackageInfo};

use crate::pending::{Completion, PendingHandle, PendingRequest};
use crate::record::{PackageRecord, RecordId};

/// Which packages a listing reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub include_indirect: bool,
    pub include_built_in: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            include_indirect: true,
            include_built_in: false,
        }
    }
}

/// Tracks install status for a fixed set of packages
///
/// A record is `CurrentlyInstalling` exactly while a request for it is
/// registered; a second install or uninstall for the same record is refused
/// until the first one resolves. Requests for different records are
/// independent and may complete in any order.
///
/// A failed request is logged and reported as an event, and the record goes
/// back to the status it had before the request.
pub struct PackageTracker<C> {
    client: C,
    records: Vec<PackageRecord>,
    pending: Vec<PendingRequest>,
    list_options: ListOptions,
    event_sender: Option<EventSender>,
}

impl<C: PackageClient> PackageTracker<C> {
    /// Start a session: one `NotInstalled` record per descriptor, in order
    #[must_use]
    pub fn new(client: C, descriptors: impl IntoIterator<Item = PackageDescriptor>) -> Self {
        Self {
            client,
            records: descriptors.into_iter().map(PackageRecord::new).collect(),
            pending: Vec::new(),
            list_options: ListOptions::default(),
            event_sender: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    #[must_use]
    pub fn with_list_options(mut self, options: ListOptions) -> Self {
        self.list_options = options;
        self
    }

    /// The package service this tracker issues requests to
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    #[must_use]
    pub fn records(&self) -> &[PackageRecord] {
        &self.records
    }

    #[must_use]
    pub fn record(&self, id: RecordId) -> Option<&PackageRecord> {
        self.records.get(id.0)
    }

    /// Iterate record ids alongside their records
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &PackageRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| (RecordId(index), record))
    }

    /// Find a record by package id or display name
    #[must_use]
    pub fn find(&self, query: &str) -> Option<RecordId> {
        self.iter()
            .find(|(_, record)| record.matches(query))
            .map(|(id, _)| id)
    }

    /// Whether any record has an install or uninstall outstanding
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.records.iter().any(|record| record.status().is_busy())
    }

    /// Whether an installed-package listing is outstanding
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.pending
            .iter()
            .any(|entry| entry.kind() == OperationKind::List)
    }

    /// Whether any request of any kind is outstanding
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Outstanding requests in the order they were issued
    #[must_use]
    pub fn pending(&self) -> &[PendingRequest] {
        &self.pending
    }

    /// Issue an add request for a record
    ///
    /// On success the record is `CurrentlyInstalling` when this returns.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::UnknownRecord` for an id outside this tracker
    /// and `InstallError::RequestPending` if the record already has a request
    /// outstanding; no request is issued in either case.
    pub fn request_install(&mut self, id: RecordId) -> Result<(), Error> {
        let record = self.idle_record(id)?;
        let package = record.package_id().to_string();
        let source_uri = record.source_uri().to_string();

        let request = self.client.add(&source_uri);
        let previous = self.transition(id, InstallStatus::CurrentlyInstalling);
        self.pending.push(PendingRequest::add(id, previous, request));

        tracing::info!(package = %package, source = %source_uri, "install requested");
        self.event_sender.emit_for_package(
            &package,
            AppEvent::Package(PackageEvent::InstallRequested {
                package: package.clone(),
                source_uri,
            }),
        );
        Ok(())
    }

    /// Issue a remove request for a record
    ///
    /// # Errors
    ///
    /// Same as [`PackageTracker::request_install`].
    pub fn request_uninstall(&mut self, id: RecordId) -> Result<(), Error> {
        let package = self.idle_record(id)?.package_id().to_string();

        let request = self.client.remove(&package);
        let previous = self.transition(id, InstallStatus::CurrentlyInstalling);
        self.pending.push(PendingRequest::remove(id, previous, request));

        tracing::info!(package = %package, "uninstall requested");
        self.event_sender.emit_for_package(
            &package,
            AppEvent::Package(PackageEvent::UninstallRequested {
                package: package.clone(),
            }),
        );
        Ok(())
    }

    /// Query the service for installed packages
    ///
    /// When the listing resolves, every idle record whose package id is
    /// listed becomes `Installed`; other records keep their status.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::RequestPending` if a listing is already
    /// outstanding.
    pub fn refresh_list(&mut self) -> Result<(), Error> {
        if self.is_refreshing() {
            return Err(InstallError::RequestPending {
                package: "installed package list".to_string(),
            }
            .into());
        }

        let ListOptions {
            include_indirect,
            include_built_in,
        } = self.list_options;
        let request = self.client.list(include_indirect, include_built_in);
        self.pending.push(PendingRequest::list(request));

        tracing::debug!(include_indirect, include_built_in, "installed package list requested");
        self.event_sender
            .emit(AppEvent::Package(PackageEvent::ListStarting));
        Ok(())
    }

    /// Poll every outstanding request once
    ///
    /// Requests that have not completed are left alone. Completed requests
    /// apply their transition and are deregistered, so each completion is
    /// handled exactly once. Returns the completions observed on this tick.
    pub fn tick(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        let entries = std::mem::take(&mut self.pending);

        for mut entry in entries {
            match self.poll_entry(&mut entry) {
                Some(completion) => completions.push(completion),
                None => self.pending.push(entry),
            }
        }

        completions
    }

    fn poll_entry(&mut self, entry: &mut PendingRequest) -> Option<Completion> {
        match &mut entry.handle {
            PendingHandle::Add(request) => match request.poll() {
                Poll::Pending => None,
                Poll::Ready(result) => {
                    let id = entry.record?;
                    Some(self.finish_add(id, entry.previous, result))
                }
            },
            PendingHandle::Remove(request) => match request.poll() {
                Poll::Pending => None,
                Poll::Ready(result) => {
                    let id = entry.record?;
                    Some(self.finish_remove(id, entry.previous, result))
                }
            },
            PendingHandle::List(request) => match request.poll() {
                Poll::Pending => None,
                Poll::Ready(result) => Some(self.finish_list(result)),
            },
        }
    }

    fn finish_add(
        &mut self,
        id: RecordId,
        previous: InstallStatus,
        result: Result<PackageInfo, Error>,
    ) -> Completion {
        let record = &self.records[id.0];
        let package = record.package_id().to_string();
        let display_name = record.display_name().to_string();
        let source_uri = record.source_uri().to_string();

        match result {
            Ok(info) => {
                if info.name != package {
                    tracing::warn!(
                        package = %package,
                        installed = %info.name,
                        "installed package name differs from the configured id"
                    );
                    self.event_sender.emit_warning(format!(
                        "{source_uri} installed as {} but is configured as {package}",
                        info.name
                    ));
                }
                self.transition(id, InstallStatus::Installed);
                tracing::info!(package = %package, "installed {display_name}");
                self.event_sender.emit_for_package(
                    &package,
                    AppEvent::Package(PackageEvent::InstallCompleted {
                        package: package.clone(),
                        display_name,
                    }),
                );
                completed(OperationKind::Add, Some(package))
            }
            Err(err) => {
                self.transition(id, previous);
                tracing::error!(package = %package, source = %source_uri, error = %err, "install failed");
                self.event_sender.emit_for_package(
                    &package,
                    AppEvent::Package(PackageEvent::InstallFailed {
                        package: package.clone(),
                        source_uri,
                        failure: FailureContext::from_error(&err),
                        reverted_to: previous,
                    }),
                );
                failed(OperationKind::Add, Some(package), &err)
            }
        }
    }

    fn finish_remove(
        &mut self,
        id: RecordId,
        previous: InstallStatus,
        result: Result<(), Error>,
    ) -> Completion {
        let record = &self.records[id.0];
        let package = record.package_id().to_string();
        let display_name = record.display_name().to_string();

        match result {
            Ok(()) => {
                self.transition(id, InstallStatus::NotInstalled);
                tracing::info!(package = %package, "removed {display_name}");
                self.event_sender.emit_for_package(
                    &package,
                    AppEvent::Package(PackageEvent::UninstallCompleted {
                        package: package.clone(),
                        display_name,
                    }),
                );
                completed(OperationKind::Remove, Some(package))
            }
            Err(err) => {
                self.transition(id, previous);
                tracing::error!(package = %package, error = %err, "uninstall failed");
                self.event_sender.emit_for_package(
                    &package,
                    AppEvent::Package(PackageEvent::UninstallFailed {
                        package: package.clone(),
                        failure: FailureContext::from_error(&err),
                        reverted_to: previous,
                    }),
                );
                failed(OperationKind::Remove, Some(package), &err)
            }
        }
    }

    fn finish_list(&mut self, result: Result<Vec<PackageInfo>, Error>) -> Completion {
        match result {
            Ok(installed) => {
                let mut matched = 0;
                for index in 0..self.records.len() {
                    let record = &self.records[index];
                    let listed = installed
                        .iter()
                        .any(|package| package.name == record.package_id());
                    if !listed {
                        continue;
                    }
                    // A record with its own request outstanding is settled by that request
                    if record.status().is_busy() {
                        tracing::debug!(
                            package = %record.package_id(),
                            "listed package has a request outstanding, keeping its status"
                        );
                        continue;
                    }
                    self.transition(RecordId(index), InstallStatus::Installed);
                    matched += 1;
                }

                tracing::debug!(installed = installed.len(), matched, "installed package list received");
                self.event_sender
                    .emit(AppEvent::Package(PackageEvent::ListCompleted {
                        installed: installed.len(),
                        matched,
                    }));
                completed(OperationKind::List, None)
            }
            Err(err) => {
                tracing::error!(error = %err, "listing installed packages failed");
                self.event_sender
                    .emit(AppEvent::Package(PackageEvent::ListFailed {
                        failure: FailureContext::from_error(&err),
                    }));
                failed(OperationKind::List, None, &err)
            }
        }
    }

    /// Ensure a record exists and has no request outstanding
    fn idle_record(&self, id: RecordId) -> Result<&PackageRecord, Error> {
        let record = self
            .records
            .get(id.0)
            .ok_or_else(|| InstallError::UnknownRecord {
                package: id.to_string(),
            })?;

        let has_entry = self.pending.iter().any(|entry| entry.record == Some(id));
        if record.status().is_busy() || has_entry {
            tracing::warn!(package = %record.package_id(), "request refused, one is already pending");
            self.event_sender.emit(AppEvent::General(GeneralEvent::warning(format!(
                "{} already has a request in progress",
                record.display_name()
            ))));
            return Err(InstallError::RequestPending {
                package: record.package_id().to_string(),
            }
            .into());
        }
        Ok(record)
    }

    /// Move a record to `status`, returning the status it had
    fn transition(&mut self, id: RecordId, status: InstallStatus) -> InstallStatus {
        let record = &mut self.records[id.0];
        let from = record.set_status(status);
        if from != status {
            let package = record.package_id().to_string();
            self.event_sender.emit_for_package(
                &package,
                AppEvent::Package(PackageEvent::StatusChanged {
                    package: package.clone(),
                    from,
                    to: status,
                }),
            );
        }
        from
    }
}

fn completed(kind: OperationKind, package: Option<String>) -> Completion {
    Completion {
        kind,
        package,
        succeeded: true,
        error: None,
    }
}

fn failed(kind: OperationKind, package: Option<String>, err: &Error) -> Completion {
    Completion {
        kind,
        package,
        succeeded: false,
        error: Some(err.to_string()),
    }
}

impl<C> std::fmt::Debug for PackageTracker<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageTracker")
            .field("records", &self.records)
            .field("pending", &self.pending)
            .field("list_options", &self.list_options)
            .finish_non_exhaustive()
    }
}
