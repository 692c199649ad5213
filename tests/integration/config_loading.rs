//! Integration tests for configuration loading
//!
//! Only explicit config files are used here; process environment is left
//! untouched so these tests can run in parallel.

use squadshot::config::{ConfigLoader, SquadshotConfig, ValidationError};
use tempfile::TempDir;

#[test]
fn test_full_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("squadshot.toml");
    std::fs::write(
        &path,
        r#"
[provider]
endpoint = "https://example.test/v1beta"
model = "image-model"
classifier_model = "text-model"
api_key_env = "SQUADSHOT_TEST_KEY"
request_timeout_secs = 30

[generation]
concurrency = 3
batch_size = 6
max_attempts = 4
base_delay_ms = 250
max_jitter_ms = 0

[album]
title = "Chicken Dinner"
columns = 3
rows = 2
font_path = "/fonts/Bold.ttf"

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.provider.classifier_model.as_deref(), Some("text-model"));
    assert_eq!(config.provider.request_timeout().as_secs(), 30);
    assert_eq!(config.provider.connect_timeout().as_secs(), 10);

    let retry = config.generation.retry_policy();
    assert_eq!(retry.max_attempts, 4);
    assert_eq!(retry.base_delay_for(3).as_millis(), 1000);

    assert_eq!(config.album.capacity(), 6);
    assert_eq!(config.album.jpeg_quality, 92);
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_invalid_values_reported_per_section() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[provider]
endpoint = "ftp://nope"

[album]
jpeg_quality = 0
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    let errors = config.validate().unwrap_err();
    assert!(matches!(errors[0], ValidationError::Provider(_)));
    assert!(matches!(errors[1], ValidationError::Album(_)));
}

#[test]
fn test_malformed_file_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[generation\nconcurrency = ").unwrap();
    assert!(ConfigLoader::load_from_file(&path).is_err());
}

#[test]
fn test_defaults_round_trip_through_toml() {
    let config = SquadshotConfig::default();
    let text = toml::to_string(&config).unwrap();
    let parsed: SquadshotConfig = toml::from_str(&text).unwrap();
    assert_eq!(parsed.generation.concurrency, 2);
    assert_eq!(parsed.album.width, 2480);
}
