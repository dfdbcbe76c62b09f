//! Integration tests for the manifest client

#[cfg(test)]
mod tests {
    use gitpm_client::*;
    use gitpm_errors::{Error, PackageError};
    use gitpm_types::{PackageSource, Version};
    use std::path::{Path, PathBuf};
    use std::task::Poll;
    use tempfile::{tempdir, TempDir};

    struct Project {
        _dir: TempDir,
        root: PathBuf,
    }

    impl Project {
        fn manifest_path(&self) -> PathBuf {
            self.root.join("Packages/manifest.json")
        }

        fn lock_path(&self) -> PathBuf {
            self.root.join("Packages/packages-lock.json")
        }

        fn client(&self) -> ManifestClient {
            ManifestClient::new(
                self.manifest_path(),
                self.lock_path(),
                vec!["com.unity.modules.".to_string()],
            )
            .unwrap()
        }

        fn manifest_json(&self) -> serde_json::Value {
            let contents = std::fs::read_to_string(self.manifest_path()).unwrap();
            serde_json::from_str(&contents).unwrap()
        }
    }

    fn create_project(manifest: &str) -> Project {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std::fs::create_dir_all(root.join("Packages")).unwrap();
        std::fs::write(root.join("Packages/manifest.json"), manifest).unwrap();
        Project { _dir: dir, root }
    }

    fn write_package(root: &Path, dir: &str, metadata: &str) {
        let path = root.join(dir);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("package.json"), metadata).unwrap();
    }

    #[tokio::test]
    async fn test_add_local_package_writes_manifest() {
        let project = create_project(r#"{"dependencies": {"com.unity.modules.audio": "1.0.0"}}"#);
        write_package(
            &project.root,
            "Local/foo",
            r#"{"name": "com.foo", "version": "1.2.0", "displayName": "Foo"}"#,
        );

        let info = project.client().add("file:../Local/foo").wait().await.unwrap();
        assert_eq!(info.name, "com.foo");
        assert_eq!(info.version, Some(Version::new(1, 2, 0)));
        assert_eq!(info.source, PackageSource::Local);

        let manifest = project.manifest_json();
        assert_eq!(manifest["dependencies"]["com.foo"], "file:../Local/foo");
        assert_eq!(manifest["dependencies"]["com.unity.modules.audio"], "1.0.0");
    }

    #[tokio::test]
    async fn test_add_without_metadata_fails() {
        let project = create_project(r#"{"dependencies": {}}"#);
        std::fs::create_dir_all(project.root.join("Empty")).unwrap();

        let result = project.client().add("file:../Empty").wait().await;
        assert!(matches!(
            result,
            Err(Error::Package(PackageError::InvalidMetadata { .. }))
        ));
        assert_eq!(project.manifest_json()["dependencies"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_remove_missing_package_fails() {
        let project = create_project(r#"{"dependencies": {}}"#);
        let result = project.client().remove("com.absent").wait().await;
        assert!(matches!(
            result,
            Err(Error::Package(PackageError::NotInstalled { .. }))
        ));
    }

    #[tokio::test]
    async fn test_remove_keeps_other_dependencies() {
        let project = create_project(
            r#"{"dependencies": {"com.foo": "https://x/foo.git", "com.bar": "https://x/bar.git"}}"#,
        );
        project.client().remove("com.foo").wait().await.unwrap();

        let deps = project.manifest_json()["dependencies"].clone();
        assert!(deps.get("com.foo").is_none());
        assert_eq!(deps["com.bar"], "https://x/bar.git");
    }

    #[tokio::test]
    async fn test_list_filters_built_in_and_reads_lock() {
        let project = create_project(
            r#"{"dependencies": {
                "com.unity.modules.audio": "1.0.0",
                "com.foo": "https://x/foo.git"
            }}"#,
        );
        std::fs::write(
            project.lock_path(),
            r#"{"dependencies": {
                "com.foo": {"version": "2.0.0", "depth": 0, "source": "git"},
                "com.foo.core": {"version": "2.0.1", "depth": 1, "source": "registry"},
                "com.unity.ugui": {"version": "1.0.0", "depth": 1, "source": "builtin"}
            }}"#,
        )
        .unwrap();

        let client = project.client();
        let packages = client.list(true, false).wait().await.unwrap();
        let names: Vec<_> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["com.foo", "com.foo.core"]);
        assert_eq!(packages[0].version, Some(Version::new(2, 0, 0)));
        assert!(!packages[1].direct);

        let direct_only = client.list(false, true).wait().await.unwrap();
        let names: Vec<_> = direct_only.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["com.unity.modules.audio", "com.foo"]);
    }

    #[tokio::test]
    async fn test_request_completes_when_polled() {
        let project = create_project(r#"{"dependencies": {"com.foo": "https://x/foo.git"}}"#);
        let mut request = project.client().list(false, false);

        let packages = loop {
            match request.poll() {
                Poll::Ready(result) => break result.unwrap(),
                Poll::Pending => tokio::time::sleep(std::time::Duration::from_millis(5)).await,
            }
        };
        assert_eq!(packages.len(), 1);
        assert!(request.is_completed());
        assert!(request.succeeded());
    }

    fn run_git(dir: &Path, args: &[&str]) -> String {
        let output = std::process::Command::new("git")
            .args(["-c", "user.name=gitpm", "-c", "user.email=gitpm@example.com"])
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(output.status.success(), "git {args:?}: {output:?}");
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// A repository whose first commit is 1.0.0 (tagged `v1`) and HEAD is 2.0.0
    fn create_repo() -> (TempDir, String) {
        let dir = tempdir().unwrap();
        let repo = dir.path();
        run_git(repo, &["init", "--quiet"]);
        run_git(repo, &["config", "uploadpack.allowAnySHA1InWant", "true"]);

        write_package(repo, ".", r#"{"name": "com.acme.tools", "version": "1.0.0"}"#);
        run_git(repo, &["add", "package.json"]);
        run_git(repo, &["commit", "--quiet", "-m", "first"]);
        run_git(repo, &["tag", "v1"]);
        let first = run_git(repo, &["rev-parse", "HEAD"]);

        write_package(repo, ".", r#"{"name": "com.acme.tools", "version": "2.0.0"}"#);
        run_git(repo, &["commit", "--quiet", "-am", "second"]);

        (dir, first)
    }

    async fn resolve_git(uri: &str) -> Result<PackageMetadata, Error> {
        let location = SourceLocation::parse(uri, Path::new("/unused"));
        assert!(matches!(location, SourceLocation::Git { .. }), "{location:?}");
        PackageMetadata::resolve(&location, uri).await
    }

    #[tokio::test]
    async fn test_git_scheme_prefix_is_cloned() {
        let (repo, _) = create_repo();
        let uri = format!("git+file://{}", repo.path().display());

        let metadata = resolve_git(&uri).await.unwrap();
        assert_eq!(metadata.name, "com.acme.tools");
        assert_eq!(metadata.version, Some(Version::new(2, 0, 0)));
    }

    #[tokio::test]
    async fn test_git_tag_revision() {
        let (repo, _) = create_repo();
        let uri = format!("git+file://{}#v1", repo.path().display());

        let metadata = resolve_git(&uri).await.unwrap();
        assert_eq!(metadata.version, Some(Version::new(1, 0, 0)));
    }

    #[tokio::test]
    async fn test_git_commit_revision() {
        let (repo, first) = create_repo();
        let uri = format!("git+file://{}#{first}", repo.path().display());

        let metadata = resolve_git(&uri).await.unwrap();
        assert_eq!(metadata.version, Some(Version::new(1, 0, 0)));
    }

    #[tokio::test]
    async fn test_add_pinned_git_package() {
        let (repo, first) = create_repo();
        let project = create_project(r#"{"dependencies": {}}"#);
        let uri = format!("git+file://{}#{first}", repo.path().display());

        let info = project.client().add(&uri).wait().await.unwrap();
        assert_eq!(info.name, "com.acme.tools");
        assert_eq!(info.version, Some(Version::new(1, 0, 0)));
        assert_eq!(info.source, PackageSource::Git);
        assert_eq!(project.manifest_json()["dependencies"]["com.acme.tools"], uri.as_str());
    }

    #[tokio::test]
    async fn test_unknown_git_revision_fails() {
        let (repo, _) = create_repo();
        let uri = format!("git+file://{}#no-such-branch", repo.path().display());

        let err = resolve_git(&uri).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Install(gitpm_errors::InstallError::GitFailed { .. })
        ));
    }
}
