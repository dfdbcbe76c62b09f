//! Fixed names used when locating configuration and project files

pub const APP_DIR: &str = "gitpm";
pub const CONFIG_FILE: &str = "config.toml";

pub const MANIFEST_FILE: &str = "Packages/manifest.json";
pub const LOCK_FILE: &str = "Packages/packages-lock.json";

/// Module packages shipped with the editor itself
pub const BUILT_IN_PREFIX: &str = "com.unity.modules.";

/// Extension of package descriptor files inside a catalog directory
pub const DESCRIPTOR_EXTENSION: &str = "toml";
