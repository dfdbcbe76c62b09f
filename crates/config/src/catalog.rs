//! Package catalog assembly
//!
//! A catalog is the ordered set of package descriptors a session tracks. It
//! is built from the inline `[[packages]]` entries of the configuration
//! followed by one descriptor file per package in the catalog directory.

use gitpm_errors::{Error, PackageError};
use gitpm_types::PackageDescriptor;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::{constants, Config};

/// Ordered, de-duplicated package descriptors
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    descriptors: Vec<PackageDescriptor>,
}

impl Catalog {
    /// Load the catalog for a configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog directory cannot be read, or a
    /// descriptor file cannot be parsed or is missing a field.
    pub async fn load(config: &Config) -> Result<Self, Error> {
        let mut catalog = Self::default();
        let mut seen = HashSet::new();

        for descriptor in &config.packages {
            catalog.push(descriptor.clone(), "inline", &mut seen)?;
        }

        if let Some(dir) = config.catalog_dir() {
            for path in descriptor_files(&dir).await? {
                let descriptor = read_descriptor(&path).await?;
                catalog.push(descriptor, &path.display().to_string(), &mut seen)?;
            }
        }

        tracing::debug!(packages = catalog.len(), "package catalog loaded");
        Ok(catalog)
    }

    fn push(
        &mut self,
        descriptor: PackageDescriptor,
        origin: &str,
        seen: &mut HashSet<String>,
    ) -> Result<(), Error> {
        descriptor.validate(origin)?;
        if !seen.insert(descriptor.package_id.clone()) {
            tracing::warn!(
                package = %descriptor.package_id,
                origin,
                "duplicate package descriptor ignored"
            );
            return Ok(());
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Descriptors in tracking order
    #[must_use]
    pub fn descriptors(&self) -> &[PackageDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl IntoIterator for Catalog {
    type Item = PackageDescriptor;
    type IntoIter = std::vec::IntoIter<PackageDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.into_iter()
    }
}

/// Descriptor files in a directory, sorted by file name
async fn descriptor_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| Error::io_with_path(&e, dir))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io_with_path(&e, dir))?
    {
        let path = entry.path();
        let is_descriptor = path
            .extension()
            .is_some_and(|ext| ext == constants::DESCRIPTOR_EXTENSION);
        if is_descriptor && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

async fn read_descriptor(path: &Path) -> Result<PackageDescriptor, Error> {
    let contents = fs::read_to_string(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))?;
    toml::from_str(&contents).map_err(|e| {
        PackageError::InvalidDescriptor {
            origin: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}
