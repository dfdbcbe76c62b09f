#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for gitpm
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/gitpm/config.toml)
//! - Environment variables
//! - CLI flags
//!
//! It also assembles the package catalog: the ordered list of package
//! descriptors a session tracks.

pub mod catalog;
pub mod constants;
pub mod core;

pub use catalog::Catalog;
pub use crate::core::{GeneralConfig, ProjectConfig, TrackerConfig};

use gitpm_errors::{ConfigError, Error};
use gitpm_types::{ColorChoice, OutputFormat, PackageDescriptor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Inline package descriptors, tracked before any catalog directory entries
    #[serde(default)]
    pub packages: Vec<PackageDescriptor>,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::APP_DIR)
            .join(constants::CONFIG_FILE))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        tracing::debug!(path = %path.display(), "loaded configuration file");

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // GITPM_OUTPUT
        if let Ok(output) = std::env::var("GITPM_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "GITPM_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // GITPM_COLOR
        if let Ok(color) = std::env::var("GITPM_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "GITPM_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        // GITPM_PROJECT
        if let Ok(root) = std::env::var("GITPM_PROJECT") {
            if root.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "GITPM_PROJECT".to_string(),
                    value: root,
                }
                .into());
            }
            self.project.root = Some(PathBuf::from(root));
        }

        // GITPM_TICK_INTERVAL_MS
        if let Ok(interval) = std::env::var("GITPM_TICK_INTERVAL_MS") {
            self.tracker.tick_interval_ms = match interval.parse() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "GITPM_TICK_INTERVAL_MS".to_string(),
                        value: interval,
                    }
                    .into())
                }
            };
        }

        // GITPM_WAIT_TIMEOUT_SECS
        if let Ok(timeout) = std::env::var("GITPM_WAIT_TIMEOUT_SECS") {
            self.tracker.wait_timeout_secs =
                timeout.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "GITPM_WAIT_TIMEOUT_SECS".to_string(),
                    value: timeout,
                })?;
        }

        Ok(())
    }

    /// Get the project root (with default)
    #[must_use]
    pub fn project_root(&self) -> PathBuf {
        self.project
            .root
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Get the absolute manifest path
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.project_root().join(&self.project.manifest)
    }

    /// Get the absolute lock file path
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.project_root().join(&self.project.lock_file)
    }

    /// Get the catalog directory, if one is configured
    #[must_use]
    pub fn catalog_dir(&self) -> Option<PathBuf> {
        self.project.catalog_dir.as_ref().map(|dir| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                self.project_root().join(dir)
            }
        })
    }

    /// Interval between poll ticks
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tracker.tick_interval_ms.max(1))
    }

    /// Upper bound on how long the CLI waits for outstanding requests
    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.tracker.wait_timeout_secs)
    }
}
