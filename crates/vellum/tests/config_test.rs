//! Tests for configuration loading.

use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use vellum::{VellumConfig, VellumErrorKind};

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_from_file_reads_all_sections() {
    let file = toml_file(
        r#"
[storage]
path = "/var/lib/vellum"
file_command = "/usr/local/bin/file"

[media_types]
"text/plain" = ["txt", "text"]
"image/svg+xml" = ["svg"]

[[variants]]
name = "thumb"
width = 128

[[variants]]
name = "preview"
width = 1024
format = "webp"
"#,
    );

    let config = VellumConfig::from_file(file.path()).unwrap();

    assert_eq!(
        config.storage.path.as_deref(),
        Some(std::path::Path::new("/var/lib/vellum"))
    );
    assert_eq!(
        config.storage.file_command.as_deref(),
        Some(std::path::Path::new("/usr/local/bin/file"))
    );
    assert_eq!(config.media_types["text/plain"], ["txt", "text"]);
    assert_eq!(config.media_types["image/svg+xml"], ["svg"]);

    let names: Vec<_> = config.variants.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, ["thumb", "preview"]);
    assert_eq!(config.variants[0].param_u64("width"), Some(128));
    assert_eq!(config.variants[1].param_str("format"), Some("webp"));
}

#[test]
fn test_sections_are_optional() {
    let file = toml_file("");

    let config = VellumConfig::from_file(file.path()).unwrap();

    assert_eq!(config, VellumConfig::default());
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = TempDir::new().unwrap();

    let err = VellumConfig::from_file(dir.path().join("absent.toml")).unwrap_err();

    assert!(matches!(err.kind(), VellumErrorKind::Config(_)));
}

#[test]
fn test_malformed_file_is_config_error() {
    let file = toml_file("[storage]\npath = [not, a, path");

    let err = VellumConfig::from_file(file.path()).unwrap_err();

    assert!(matches!(err.kind(), VellumErrorKind::Config(_)));
}

#[test]
fn test_into_storage_requires_path() {
    let err = VellumConfig::default().into_storage().unwrap_err();

    assert!(matches!(err.kind(), VellumErrorKind::Config(_)));
}

#[test]
fn test_root_override() {
    let dir = TempDir::new().unwrap();
    let file = toml_file("[storage]\npath = \"/somewhere/else\"\n");

    let storage = VellumConfig::from_file(file.path())
        .unwrap()
        .with_root(dir.path())
        .into_storage()
        .unwrap();

    assert_eq!(storage.root(), dir.path());
}
