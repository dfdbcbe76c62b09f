//! Integration tests for config

#[cfg(test)]
mod tests {
    use gitpm_config::*;
    use gitpm_types::{ColorChoice, OutputFormat, PackageDescriptor};
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::{tempdir, NamedTempFile};

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for var in [
            "GITPM_OUTPUT",
            "GITPM_COLOR",
            "GITPM_PROJECT",
            "GITPM_TICK_INTERVAL_MS",
            "GITPM_WAIT_TIMEOUT_SECS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
default_output = "plain"
color = "never"

[project]
root = "/work/game"
catalog_dir = "Tools/Packages"

[tracker]
tick_interval_ms = 50
include_indirect = false

[[packages]]
display_name = "Foo"
package_id = "com.foo"
source_uri = "https://x/foo.git"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Plain);
        assert_eq!(config.general.color, ColorChoice::Never);
        assert_eq!(config.tracker.tick_interval_ms, 50);
        assert!(!config.tracker.include_indirect);
        assert_eq!(config.tracker.wait_timeout_secs, 300);
        assert_eq!(
            config.manifest_path(),
            std::path::PathBuf::from("/work/game/Packages/manifest.json")
        );
        assert_eq!(
            config.catalog_dir(),
            Some(std::path::PathBuf::from("/work/game/Tools/Packages"))
        );
        assert_eq!(config.packages.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let result = Config::load_from_file(&dir.path().join("absent.toml")).await;
        assert!(matches!(
            result,
            Err(gitpm_errors::Error::Config(
                gitpm_errors::ConfigError::NotFound { .. }
            ))
        ));
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("GITPM_OUTPUT", "json");
        std::env::set_var("GITPM_COLOR", "always");
        std::env::set_var("GITPM_TICK_INTERVAL_MS", "25");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.general.color, ColorChoice::Always);
        assert_eq!(config.tracker.tick_interval_ms, 25);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("GITPM_TICK_INTERVAL_MS", "0");

        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }

    #[tokio::test]
    async fn test_catalog_merges_inline_and_directory() {
        let dir = tempdir().unwrap();
        let catalog_dir = dir.path().join("catalog");
        std::fs::create_dir_all(&catalog_dir).unwrap();
        std::fs::write(
            catalog_dir.join("b-bar.toml"),
            "display_name = \"Bar\"\npackage_id = \"com.bar\"\nsource_uri = \"https://x/bar.git\"\n",
        )
        .unwrap();
        std::fs::write(
            catalog_dir.join("a-foo.toml"),
            "display_name = \"Foo again\"\npackage_id = \"com.foo\"\nsource_uri = \"https://x/foo2.git\"\n",
        )
        .unwrap();
        std::fs::write(catalog_dir.join("notes.txt"), "ignored").unwrap();

        let mut config = Config::default();
        config.project.root = Some(dir.path().to_path_buf());
        config.project.catalog_dir = Some("catalog".into());
        config.packages = vec![PackageDescriptor::new("Foo", "com.foo", "https://x/foo.git")];

        let catalog = Catalog::load(&config).await.unwrap();
        let ids: Vec<_> = catalog
            .descriptors()
            .iter()
            .map(|d| d.package_id.as_str())
            .collect();
        assert_eq!(ids, vec!["com.foo", "com.bar"]);
        assert_eq!(catalog.descriptors()[0].display_name, "Foo");
    }

    #[tokio::test]
    async fn test_catalog_rejects_incomplete_descriptor() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("broken.toml"),
            "display_name = \"Broken\"\npackage_id = \"\"\nsource_uri = \"https://x/b.git\"\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.project.catalog_dir = Some(dir.path().to_path_buf());

        let result = Catalog::load(&config).await;
        assert!(matches!(
            result,
            Err(gitpm_errors::Error::Package(
                gitpm_errors::PackageError::InvalidDescriptor { .. }
            ))
        ));
    }
}
