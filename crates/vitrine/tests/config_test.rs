//! Configuration loading tests.

use std::io::Write;
use tempfile::NamedTempFile;
use vitrine::{ErrorCategory, VitrineConfig};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_file_values_override_defaults() {
    let file = write_config(
        r#"
database_url = "/tmp/images.db"
pool_size = 4
token_key = "abababababababababababababababababababababababababababababababab"
url_prefix = "/img/"

[storage]
root = "/srv/images"

[artifacts]
thumbnail_size = 64
compress_target_kb = 200
"#,
    );

    let config = VitrineConfig::from_file(file.path()).unwrap();
    assert_eq!(config.database_url, "/tmp/images.db");
    assert_eq!(config.pool_size, 4);
    assert_eq!(config.pool_timeout_secs, 30);
    assert_eq!(config.storage.root, std::path::PathBuf::from("/srv/images"));
    assert_eq!(*config.artifacts.thumbnail_size(), 64);
    assert_eq!(*config.artifacts.compress_target_kb(), 200);
    assert_eq!(*config.artifacts.compress_initial_quality(), 90);
    assert_eq!(config.url_prefix(), "/img");
}

#[test]
fn test_missing_key_is_rejected() {
    let file = write_config("database_url = \"/tmp/images.db\"\n");

    let err = VitrineConfig::from_file(file.path()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Internal);
    assert!(err.to_string().contains("token_key"));
}

#[test]
fn test_out_of_range_pool_is_rejected() {
    let file = write_config(
        r#"
pool_size = 0
token_key = "abababababababababababababababababababababababababababababababab"
"#,
    );

    assert!(VitrineConfig::from_file(file.path()).is_err());
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(VitrineConfig::load(Some(&missing)).is_err());
}
