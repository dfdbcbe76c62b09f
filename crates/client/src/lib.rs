#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package service client for gitpm
//!
//! The tracker never talks to the filesystem or to git directly. It issues
//! operations through [`PackageClient`], which hands back a [`Request`]
//! immediately; the work runs elsewhere and the caller polls the handle
//! until it completes.
//!
//! [`ManifestClient`] is the production implementation: it edits the
//! project's package manifest and resolves package names from git or local
//! sources.

mod client;
mod manifest;
mod request;
mod source;

pub use client::ManifestClient;
pub use manifest::{LockEntry, LockFile, Manifest};
pub use request::{Completer, Request};
pub use source::{PackageMetadata, SourceLocation};

use gitpm_types::PackageInfo;

/// External package-management service consumed by the tracker
///
/// Every method returns without blocking; completion is observed by polling
/// the returned handle.
pub trait PackageClient {
    /// Begin installing the package found at `source_uri`
    fn add(&self, source_uri: &str) -> Request<PackageInfo>;

    /// Begin removing the package with identifier `package_id`
    fn remove(&self, package_id: &str) -> Request<()>;

    /// Begin listing installed packages
    fn list(&self, include_indirect: bool, include_built_in: bool) -> Request<Vec<PackageInfo>>;
}
