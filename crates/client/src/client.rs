//! Manifest-backed package client

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gitpm_errors::{Error, PackageError};
use gitpm_types::{OperationKind, PackageInfo, PackageSource, Version};
use tokio::runtime::Handle;
use tokio::sync::Mutex;

use crate::manifest::{LockFile, Manifest};
use crate::request::Request;
use crate::source::{PackageMetadata, SourceLocation};
use crate::PackageClient;

const BUILT_IN_SOURCE: &str = "builtin";

/// Package client that installs by editing the project manifest
///
/// Each operation runs as a task on the runtime captured at construction.
/// Manifest read-modify-write cycles are serialized so concurrent add and
/// remove requests for different packages cannot lose each other's edits.
#[derive(Clone)]
pub struct ManifestClient {
    inner: Arc<Inner>,
    runtime: Handle,
}

struct Inner {
    manifest_path: PathBuf,
    lock_path: PathBuf,
    built_in_prefixes: Vec<String>,
    write_lock: Mutex<()>,
}

impl ManifestClient {
    /// Create a client for the given manifest and lock file
    ///
    /// # Errors
    ///
    /// Returns an error if called outside a tokio runtime.
    pub fn new(
        manifest_path: impl Into<PathBuf>,
        lock_path: impl Into<PathBuf>,
        built_in_prefixes: Vec<String>,
    ) -> Result<Self, Error> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::internal(format!("package client needs a tokio runtime: {e}")))?;
        Ok(Self {
            inner: Arc::new(Inner {
                manifest_path: manifest_path.into(),
                lock_path: lock_path.into(),
                built_in_prefixes,
                write_lock: Mutex::new(()),
            }),
            runtime,
        })
    }

    #[must_use]
    pub fn manifest_path(&self) -> &Path {
        &self.inner.manifest_path
    }

    fn spawn<T, F>(&self, kind: OperationKind, target: &str, work: F) -> Request<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let (completer, request) = Request::channel(kind, target);
        self.runtime.spawn(async move {
            completer.complete(work.await);
        });
        request
    }
}

impl Inner {
    fn manifest_dir(&self) -> &Path {
        self.manifest_path.parent().unwrap_or_else(|| Path::new("."))
    }

    fn is_built_in(&self, name: &str) -> bool {
        self.built_in_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    async fn add(&self, source_uri: String) -> Result<PackageInfo, Error> {
        let location = SourceLocation::parse(&source_uri, self.manifest_dir());
        let metadata = PackageMetadata::resolve(&location, &source_uri).await?;

        let _guard = self.write_lock.lock().await;
        let mut manifest = Manifest::load(&self.manifest_path).await?;
        manifest.insert_dependency(&metadata.name, &source_uri);
        manifest.save().await?;

        tracing::info!(package = %metadata.name, source = %source_uri, "dependency added to manifest");
        Ok(PackageInfo::direct(metadata.name, source_uri).with_version(metadata.version))
    }

    async fn remove(&self, package_id: String) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        let mut manifest = Manifest::load(&self.manifest_path).await?;
        if !manifest.remove_dependency(&package_id) {
            return Err(PackageError::NotInstalled { name: package_id }.into());
        }
        manifest.save().await?;

        tracing::info!(package = %package_id, "dependency removed from manifest");
        Ok(())
    }

    async fn list(
        &self,
        include_indirect: bool,
        include_built_in: bool,
    ) -> Result<Vec<PackageInfo>, Error> {
        let manifest = Manifest::load(&self.manifest_path).await?;
        let lock = LockFile::load_or_empty(&self.lock_path).await?;

        let mut packages: Vec<PackageInfo> = manifest
            .dependencies()
            .into_iter()
            .map(|(name, location)| {
                let version = lock
                    .get(&name)
                    .and_then(|entry| Version::parse(&entry.version).ok());
                PackageInfo::direct(name, location).with_version(version)
            })
            .collect();

        if include_indirect {
            for (name, entry) in &lock.dependencies {
                if entry.depth == 0 || manifest.contains(name) {
                    continue;
                }
                packages.push(PackageInfo {
                    name: name.clone(),
                    version: Version::parse(&entry.version).ok(),
                    location: entry.version.clone(),
                    source: lock_source(entry.source.as_deref()),
                    direct: false,
                });
            }
        }

        if !include_built_in {
            packages.retain(|package| {
                package.source != PackageSource::BuiltIn && !self.is_built_in(&package.name)
            });
        }

        Ok(packages)
    }
}

fn lock_source(source: Option<&str>) -> PackageSource {
    match source {
        Some(BUILT_IN_SOURCE) => PackageSource::BuiltIn,
        Some("git") => PackageSource::Git,
        Some("local" | "embedded") => PackageSource::Local,
        _ => PackageSource::Registry,
    }
}

impl PackageClient for ManifestClient {
    fn add(&self, source_uri: &str) -> Request<PackageInfo> {
        let inner = Arc::clone(&self.inner);
        let uri = source_uri.to_string();
        self.spawn(OperationKind::Add, source_uri, async move {
            inner.add(uri).await
        })
    }

    fn remove(&self, package_id: &str) -> Request<()> {
        let inner = Arc::clone(&self.inner);
        let id = package_id.to_string();
        self.spawn(OperationKind::Remove, package_id, async move {
            inner.remove(id).await
        })
    }

    fn list(&self, include_indirect: bool, include_built_in: bool) -> Request<Vec<PackageInfo>> {
        let inner = Arc::clone(&self.inner);
        self.spawn(OperationKind::List, "installed packages", async move {
            inner.list(include_indirect, include_built_in).await
        })
    }
}

impl std::fmt::Debug for ManifestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestClient")
            .field("manifest_path", &self.inner.manifest_path)
            .field("lock_path", &self.inner.lock_path)
            .finish_non_exhaustive()
    }
}
