//! Output artifacts: per-label portraits and album pages on disk.

use crate::error::ApiError;
use crate::types::{extension_for_mime, ImageData};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name for a label: lowercase, whitespace runs become single hyphens.
///
/// `"Desert Ranger"` with `png` gives `desert-ranger.png`.
pub fn artifact_file_name(label: &str, extension: &str) -> String {
    let stem = label
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let stem = if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem
    };
    format!("{}.{}", stem, extension)
}

/// Write `bytes` to `dir/name`, creating `dir` if needed.
pub fn write_artifact(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, ApiError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        ApiError::Io(format!(
            "Failed to create output directory {}: {}",
            dir.display(),
            e
        ))
    })?;
    let path = dir.join(name);
    std::fs::write(&path, bytes)
        .map_err(|e| ApiError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
    info!(path = %path.display(), bytes = bytes.len(), "Artifact written");
    Ok(path)
}

/// Write a generated portrait under its label-derived name.
pub fn write_portrait(dir: &Path, label: &str, image: &ImageData) -> Result<PathBuf, ApiError> {
    let name = artifact_file_name(label, extension_for_mime(&image.mime_type));
    write_artifact(dir, &name, &image.bytes)
}
