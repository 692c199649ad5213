//! Integration tests for the CLI route table

use super::test_utils::{fast_config, solid_png};
use clap::Parser;
use image::GenericImageView;
use squadshot::cli::{Cli, RunContext};
use squadshot::error::ApiError;
use squadshot::types::ImageData;
use tempfile::TempDir;

fn write_png(dir: &std::path::Path, name: &str, rgb: [u8; 3]) -> String {
    let path = dir.join(name);
    std::fs::write(&path, solid_png(40, 50, rgb).bytes).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_compose_command_writes_album() {
    let temp_dir = TempDir::new().unwrap();
    let a = write_png(temp_dir.path(), "a.png", [200, 30, 30]);
    let b = write_png(temp_dir.path(), "b.png", [30, 50, 200]);
    let out = temp_dir.path().join("pages").join("album.jpg");

    let cli = Cli::try_parse_from([
        "squadshot".to_string(),
        "compose".to_string(),
        "--out".to_string(),
        out.to_string_lossy().to_string(),
        "--seed".to_string(),
        "3".to_string(),
        format!("Ghillie Ghost={}", a),
        format!("Desert Ranger={}", b),
    ])
    .unwrap();

    let context = RunContext::from_config(temp_dir.path().to_path_buf(), fast_config()).unwrap();
    let output = context.execute(&cli.command).unwrap();
    assert!(output.contains("600x840"));

    let page = ImageData::from_path(&out).unwrap();
    assert_eq!(page.mime_type, "image/jpeg");
    assert_eq!(page.decode().unwrap().dimensions(), (600, 840));
}

#[test]
fn test_compose_rejects_duplicate_labels() {
    let temp_dir = TempDir::new().unwrap();
    let a = write_png(temp_dir.path(), "a.png", [200, 30, 30]);
    let out = temp_dir.path().join("album.jpg");

    let cli = Cli::try_parse_from([
        "squadshot".to_string(),
        "compose".to_string(),
        "--out".to_string(),
        out.to_string_lossy().to_string(),
        format!("Twin={}", a),
        format!("Twin={}", a),
    ])
    .unwrap();

    let context = RunContext::from_config(temp_dir.path().to_path_buf(), fast_config()).unwrap();
    let err = context.execute(&cli.command).unwrap_err();
    assert!(matches!(err, ApiError::CompositionFailed(_)));
    assert!(!out.exists());
}

#[test]
fn test_invalid_config_rejected_by_run_context() {
    let mut config = fast_config();
    config.generation.concurrency = 0;
    let result = RunContext::from_config(std::path::PathBuf::from("."), config);
    assert!(matches!(result, Err(ApiError::ConfigError(_))));
}
