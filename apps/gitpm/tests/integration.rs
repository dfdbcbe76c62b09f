//! Integration tests for the gitpm CLI

use std::path::Path;
use std::process::{Command, Output};

fn gitpm(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gitpm"))
        .arg("--config")
        .arg(config)
        .arg("--color")
        .arg("never")
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("GITPM_OUTPUT")
        .env_remove("GITPM_PROJECT")
        .output()
        .expect("Failed to execute gitpm")
}

/// A project with an empty manifest, a local package and a config listing it
fn fixture(root: &Path) -> std::path::PathBuf {
    let packages = root.join("project/Packages");
    std::fs::create_dir_all(&packages).unwrap();
    std::fs::write(
        packages.join("manifest.json"),
        "{\n  \"dependencies\": {}\n}\n",
    )
    .unwrap();

    let source = root.join("foo");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(
        source.join("package.json"),
        r#"{ "name": "com.foo", "version": "0.3.1", "displayName": "Foo" }"#,
    )
    .unwrap();

    let config = root.join("config.toml");
    std::fs::write(
        &config,
        format!(
            r#"
[project]
root = "{}"

[tracker]
tick_interval_ms = 10
wait_timeout_secs = 30

[[packages]]
display_name = "Foo"
package_id = "com.foo"
source_uri = "file:{}"
"#,
            root.join("project").display(),
            source.display()
        ),
    )
    .unwrap();
    config
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_gitpm"))
        .arg("--version")
        .output()
        .expect("Failed to execute gitpm");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("gitpm"));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_gitpm"))
        .arg("--help")
        .output()
        .expect("Failed to execute gitpm");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("install"));
    assert!(stdout.contains("uninstall"));
    assert!(stdout.contains("list"));
}

#[test]
fn test_cli_invalid_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_gitpm"))
        .arg("invalid-command")
        .output()
        .expect("Failed to execute gitpm");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_install_then_list_then_uninstall() {
    let temp = tempfile::tempdir().unwrap();
    let config = fixture(temp.path());

    let output = gitpm(&config, &["--json", "list"]);
    assert!(output.status.success(), "{output:?}");
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed["result"], "packages");
    assert_eq!(listed["packages"][0]["package_id"], "com.foo");
    assert_eq!(listed["packages"][0]["status"], "not_installed");

    let output = gitpm(&config, &["--json", "install", "Foo"]);
    assert!(output.status.success(), "{output:?}");
    let installed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(installed["result"], "completed");
    assert_eq!(installed["completion"]["succeeded"], true);

    let manifest =
        std::fs::read_to_string(temp.path().join("project/Packages/manifest.json")).unwrap();
    assert!(manifest.contains("\"com.foo\""));

    let output = gitpm(&config, &["--json", "list"]);
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed["packages"][0]["status"], "installed");

    let output = gitpm(&config, &["--json", "uninstall", "com.foo"]);
    assert!(output.status.success(), "{output:?}");
    let manifest =
        std::fs::read_to_string(temp.path().join("project/Packages/manifest.json")).unwrap();
    assert!(!manifest.contains("com.foo"));
}

#[test]
fn test_source_prints_uri() {
    let temp = tempfile::tempdir().unwrap();
    let config = fixture(temp.path());

    let output = gitpm(&config, &["source", "foo"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim().starts_with("file:"));
}

#[test]
fn test_unknown_package_fails() {
    let temp = tempfile::tempdir().unwrap();
    let config = fixture(temp.path());

    let output = gitpm(&config, &["install", "nope"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No catalog package named 'nope'"));
}
