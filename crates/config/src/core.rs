//! Configuration sections

use gitpm_types::{ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants;

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

/// Project layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project root; the current directory when unset
    pub root: Option<PathBuf>,
    /// Manifest path relative to the project root
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    /// Lock file path relative to the project root
    #[serde(default = "default_lock_file")]
    pub lock_file: PathBuf,
    /// Directory of package descriptor files
    pub catalog_dir: Option<PathBuf>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: None,
            manifest: default_manifest(),
            lock_file: default_lock_file(),
            catalog_dir: None,
        }
    }
}

/// Tracker polling and listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64, // 0 = wait forever
    #[serde(default = "default_include_indirect")]
    pub include_indirect: bool,
    #[serde(default)]
    pub include_built_in: bool,
    #[serde(default = "default_built_in_prefixes")]
    pub built_in_prefixes: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            wait_timeout_secs: default_wait_timeout_secs(),
            include_indirect: default_include_indirect(),
            include_built_in: false,
            built_in_prefixes: default_built_in_prefixes(),
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_manifest() -> PathBuf {
    PathBuf::from(constants::MANIFEST_FILE)
}

fn default_lock_file() -> PathBuf {
    PathBuf::from(constants::LOCK_FILE)
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_wait_timeout_secs() -> u64 {
    300 // 5 minutes
}

fn default_include_indirect() -> bool {
    true
}

fn default_built_in_prefixes() -> Vec<String> {
    vec![constants::BUILT_IN_PREFIX.to_string()]
}
