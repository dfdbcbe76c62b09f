#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package install tracker for gitpm
//!
//! The tracker owns one [`PackageRecord`] per configured package and moves
//! each record's status through `NotInstalled`, `CurrentlyInstalling` and
//! `Installed` as add/remove requests issued through a
//! [`gitpm_client::PackageClient`] resolve.
//!
//! Nothing here blocks or spawns. The host calls [`PackageTracker::tick`]
//! periodically; each tick checks every outstanding request once and applies
//! the transitions for the ones that have completed.

mod pending;
mod record;
mod tracker;

pub use pending::{Completion, PendingRequest};
pub use record::{PackageRecord, RecordId};
pub use tracker::{ListOptions, PackageTracker};
