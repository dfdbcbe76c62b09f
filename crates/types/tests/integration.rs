//! Integration tests for types

#[cfg(test)]
mod tests {
    use gitpm_types::*;

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&InstallStatus::CurrentlyInstalling).unwrap();
        assert_eq!(json, r#""currently_installing""#);
    }

    #[test]
    fn test_descriptor_from_toml() {
        let descriptor: PackageDescriptor = toml::from_str(
            r#"
display_name = "Foo"
package_id = "com.foo"
source_uri = "https://x/foo.git"
"#,
        )
        .unwrap();
        assert_eq!(descriptor.package_id, "com.foo");
        assert_eq!(descriptor.display_name, "Foo");
    }

    #[test]
    fn test_output_format_default() {
        let fmt = OutputFormat::default();
        assert_eq!(fmt, OutputFormat::Tty);
    }

    #[test]
    fn test_package_info_direct() {
        let info = PackageInfo::direct("com.foo", "file:../foo")
            .with_version(Some(Version::new(1, 2, 0)));
        assert!(info.direct);
        assert_eq!(info.source, PackageSource::Local);
        assert_eq!(info.version, Some(Version::new(1, 2, 0)));
    }
}
