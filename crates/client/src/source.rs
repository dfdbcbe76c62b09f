//! Package source locations and metadata resolution

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use gitpm_errors::{Error, InstallError, PackageError};
use gitpm_types::Version;
use serde::Deserialize;
use tokio::fs;
use tokio::process::Command;

const PACKAGE_METADATA: &str = "package.json";

/// Where a package is fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// A directory on disk (`file:` URIs and bare paths)
    Local(PathBuf),
    /// A git repository, optionally pinned to a revision and a subdirectory
    Git {
        url: String,
        revision: Option<String>,
        subdir: Option<String>,
    },
}

impl SourceLocation {
    /// Interpret a source URI
    ///
    /// Relative local paths are resolved against `base`, the directory that
    /// holds the manifest. Git URIs may carry a `git+` scheme prefix,
    /// `?path=<subdir>` and a trailing `#<revision>` (branch, tag or commit).
    #[must_use]
    pub fn parse(uri: &str, base: &Path) -> Self {
        if let Some(path) = uri.strip_prefix("file:") {
            return Self::Local(resolve_local(path, base));
        }

        let looks_remote = uri.contains("://") || uri.starts_with("git@");
        if !looks_remote {
            return Self::Local(resolve_local(uri, base));
        }

        // `git+https://`, `git+ssh://` and `git+file://` name the transport explicitly
        let uri = uri.strip_prefix("git+").unwrap_or(uri);
        let (rest, revision) = match uri.split_once('#') {
            Some((rest, rev)) if !rev.is_empty() => (rest, Some(rev.to_string())),
            Some((rest, _)) => (rest, None),
            None => (uri, None),
        };
        let (url, subdir) = match rest.split_once("?path=") {
            Some((url, dir)) if !dir.is_empty() => {
                (url, Some(dir.trim_matches('/').to_string()))
            }
            Some((url, _)) => (url, None),
            None => (rest, None),
        };

        Self::Git {
            url: url.to_string(),
            revision,
            subdir,
        }
    }
}

fn resolve_local(path: &str, base: &Path) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Fields of a package's `package.json` that gitpm cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: Option<Version>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    name: Option<String>,
    version: Option<String>,
}

impl PackageMetadata {
    /// Read `package.json` from a package directory
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidMetadata` if the file is missing,
    /// unparsable, or has no `name`.
    pub async fn read_from_dir(dir: &Path, source_uri: &str) -> Result<Self, Error> {
        let invalid = |message: String| PackageError::InvalidMetadata {
            source_uri: source_uri.to_string(),
            message,
        };

        let path = dir.join(PACKAGE_METADATA);
        let contents = fs::read_to_string(&path)
            .await
            .map_err(|e| invalid(format!("{}: {e}", path.display())))?;
        let raw: RawMetadata =
            serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))?;

        let name = raw
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| invalid("`name` is missing".to_string()))?;

        Ok(Self {
            name,
            version: raw.version.and_then(|v| Version::parse(&v).ok()),
        })
    }

    /// Resolve metadata for any source location
    ///
    /// Git sources are shallow-cloned into a temporary directory that is
    /// removed before returning.
    ///
    /// # Errors
    ///
    /// Returns `InstallError::GitFailed` if git cannot fetch the repository,
    /// or the errors of [`PackageMetadata::read_from_dir`].
    pub async fn resolve(location: &SourceLocation, source_uri: &str) -> Result<Self, Error> {
        match location {
            SourceLocation::Local(dir) => Self::read_from_dir(dir, source_uri).await,
            SourceLocation::Git {
                url,
                revision,
                subdir,
            } => {
                let checkout = blocking(tempfile::tempdir).await??;
                let result = async {
                    shallow_clone(url, revision.as_deref(), checkout.path()).await?;
                    let package_dir = match subdir {
                        Some(subdir) => checkout.path().join(subdir),
                        None => checkout.path().to_path_buf(),
                    };
                    Self::read_from_dir(&package_dir, source_uri).await
                }
                .await;

                if let Err(e) = blocking(move || checkout.close()).await? {
                    tracing::warn!(error = %e, "failed to remove package checkout");
                }
                result
            }
        }
    }
}

/// Run filesystem work that has no async counterpart off the runtime threads
async fn blocking<T, F>(work: F) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::internal(format!("blocking task failed: {e}")))
}

/// Whether a revision is a full commit id (SHA-1 or SHA-256)
fn is_commit_id(revision: &str) -> bool {
    matches!(revision.len(), 40 | 64) && revision.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Fetch a single revision of `url` into `dest`
///
/// Branches and tags go through `git clone --branch`. Commit ids, and any
/// revision the clone does not accept, are fetched into a fresh repository
/// and checked out detached.
async fn shallow_clone(url: &str, revision: Option<&str>, dest: &Path) -> Result<(), Error> {
    tracing::debug!(url, revision, "cloning package source");

    let Some(revision) = revision else {
        return git(
            &["clone", "--depth", "1", "--quiet"],
            &[OsStr::new(url), dest.as_os_str()],
            None,
        )
        .await;
    };

    if !is_commit_id(revision) {
        let branch = dest.join("branch");
        let cloned = git(
            &["clone", "--depth", "1", "--quiet", "--branch", revision],
            &[OsStr::new(url), branch.as_os_str()],
            None,
        )
        .await;
        match cloned {
            Ok(()) => return move_checkout(&branch, dest).await,
            Err(e) => {
                tracing::debug!(revision, error = %e, "not a branch or tag, fetching revision");
            }
        }
    }

    let pinned = dest.join("revision");
    fs::create_dir_all(&pinned)
        .await
        .map_err(|e| Error::io_with_path(&e, &pinned))?;
    git(&["init", "--quiet"], &[], Some(&pinned)).await?;
    git(
        &["fetch", "--depth", "1", "--quiet"],
        &[OsStr::new(url), OsStr::new(revision)],
        Some(&pinned),
    )
    .await?;
    git(&["checkout", "--quiet", "FETCH_HEAD"], &[], Some(&pinned)).await?;
    move_checkout(&pinned, dest).await
}

/// Move the entries of a checkout up into `dest`
async fn move_checkout(from: &Path, dest: &Path) -> Result<(), Error> {
    let mut entries = fs::read_dir(from)
        .await
        .map_err(|e| Error::io_with_path(&e, from))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io_with_path(&e, from))?
    {
        let target = dest.join(entry.file_name());
        fs::rename(entry.path(), &target)
            .await
            .map_err(|e| Error::io_with_path(&e, &target))?;
    }
    fs::remove_dir(from)
        .await
        .map_err(|e| Error::io_with_path(&e, from))
}

async fn git(args: &[&str], paths: &[&OsStr], cwd: Option<&Path>) -> Result<(), Error> {
    let mut command = Command::new("git");
    command.args(args).args(paths).kill_on_drop(true);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let display = format!("git {}", args.first().copied().unwrap_or_default());
    let output = command.output().await.map_err(|e| InstallError::GitFailed {
        command: display.clone(),
        message: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(InstallError::GitFailed {
            command: display,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }
    Ok(())
}
