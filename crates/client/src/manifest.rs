//! Project manifest and lock file access

use std::path::{Path, PathBuf};

use gitpm_errors::{Error, ManifestError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tokio::fs;

const DEPENDENCIES: &str = "dependencies";

/// The project's package manifest
///
/// Only the `dependencies` object is interpreted; every other key is kept
/// verbatim and in its original order when the manifest is saved.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    document: Map<String, Value>,
}

impl Manifest {
    /// Read and parse a manifest
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NotFound` if the file is missing and
    /// `ManifestError::Malformed` if it is not a JSON object with an object
    /// valued `dependencies` key.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| ManifestError::from_io_with_path(&e, path))?;
        Self::parse(path, &contents)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, Error> {
        let malformed = |message: String| ManifestError::Malformed {
            path: path.display().to_string(),
            message,
        };

        let document: Map<String, Value> =
            serde_json::from_str(contents).map_err(|e| malformed(e.to_string()))?;
        match document.get(DEPENDENCIES) {
            None | Some(Value::Object(_)) => {}
            Some(_) => return Err(malformed("`dependencies` must be an object".into()).into()),
        }

        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dependencies as `(package id, location)` pairs in manifest order
    ///
    /// Entries whose location is not a string are skipped.
    #[must_use]
    pub fn dependencies(&self) -> Vec<(String, String)> {
        self.document
            .get(DEPENDENCIES)
            .and_then(Value::as_object)
            .map(|deps| {
                deps.iter()
                    .filter_map(|(name, location)| {
                        location.as_str().map(|loc| (name.clone(), loc.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, package_id: &str) -> bool {
        self.document
            .get(DEPENDENCIES)
            .and_then(Value::as_object)
            .is_some_and(|deps| deps.contains_key(package_id))
    }

    /// Add or replace a dependency
    pub fn insert_dependency(&mut self, package_id: &str, location: &str) {
        let deps = self
            .document
            .entry(DEPENDENCIES)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(deps) = deps {
            deps.insert(package_id.to_string(), Value::String(location.to_string()));
        }
    }

    /// Remove a dependency, returning whether it was present
    pub fn remove_dependency(&mut self, package_id: &str) -> bool {
        self.document
            .get_mut(DEPENDENCIES)
            .and_then(Value::as_object_mut)
            .is_some_and(|deps| deps.shift_remove(package_id).is_some())
    }

    /// Write the manifest back to disk
    ///
    /// The document is written to a sibling temporary file and renamed over
    /// the original so readers never observe a partial manifest.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::WriteFailed` (or `PermissionDenied`) if the
    /// file cannot be written or renamed.
    pub async fn save(&self) -> Result<(), Error> {
        let mut contents = serde_json::to_string_pretty(&self.document)?;
        contents.push('\n');

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents)
            .await
            .map_err(|e| ManifestError::from_io_with_path(&e, &tmp_path))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| ManifestError::from_io_with_path(&e, &self.path))?;
        Ok(())
    }
}

/// One resolved package in the lock file
#[derive(Debug, Clone, Deserialize)]
pub struct LockEntry {
    #[serde(default)]
    pub version: String,
    /// 0 for direct dependencies, greater for transitive ones
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub source: Option<String>,
}

/// The resolved dependency graph written next to the manifest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LockFile {
    #[serde(default)]
    pub dependencies: BTreeMap<String, LockEntry>,
}

impl LockFile {
    /// Read the lock file, treating a missing file as empty
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::Malformed` if the file exists but cannot be
    /// parsed, or an I/O error if it cannot be read.
    pub async fn load_or_empty(path: &Path) -> Result<Self, Error> {
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no lock file, listing direct dependencies only");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::io_with_path(&e, path)),
        };

        serde_json::from_str(&contents).map_err(|e| {
            ManifestError::Malformed {
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    #[must_use]
    pub fn get(&self, package_id: &str) -> Option<&LockEntry> {
        self.dependencies.get(package_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
  "scopedRegistries": [],
  "dependencies": {
    "com.unity.modules.audio": "1.0.0",
    "com.foo": "https://x/foo.git"
  }
}"#;

    #[test]
    fn test_dependencies_keep_manifest_order() {
        let manifest = Manifest::parse(Path::new("manifest.json"), MANIFEST).unwrap();
        let names: Vec<_> = manifest.dependencies().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["com.unity.modules.audio", "com.foo"]);
        assert!(manifest.contains("com.foo"));
    }

    #[test]
    fn test_insert_and_remove() {
        let mut manifest = Manifest::parse(Path::new("manifest.json"), MANIFEST).unwrap();
        manifest.insert_dependency("com.bar", "file:../bar");
        assert!(manifest.contains("com.bar"));
        assert!(manifest.remove_dependency("com.foo"));
        assert!(!manifest.remove_dependency("com.foo"));

        let names: Vec<_> = manifest.dependencies().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["com.unity.modules.audio", "com.bar"]);
    }

    #[test]
    fn test_insert_creates_dependencies_object() {
        let mut manifest = Manifest::parse(Path::new("manifest.json"), "{}").unwrap();
        manifest.insert_dependency("com.foo", "https://x/foo.git");
        assert_eq!(
            manifest.dependencies(),
            vec![("com.foo".to_string(), "https://x/foo.git".to_string())]
        );
    }

    #[test]
    fn test_rejects_non_object_dependencies() {
        let result = Manifest::parse(Path::new("manifest.json"), r#"{"dependencies": []}"#);
        assert!(matches!(
            result,
            Err(Error::Manifest(ManifestError::Malformed { .. }))
        ));
    }
}
