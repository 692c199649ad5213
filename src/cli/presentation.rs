//! CLI presentation: text tables and JSON for command results.

use crate::album::EncodedImage;
use crate::classify::Gender;
use crate::error::ApiError;
use crate::scheduler::GenerationStatus;
use comfy_table::Table;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One line of the batch summary
#[derive(Debug, Clone, Serialize)]
pub struct BatchRow {
    pub label: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl BatchRow {
    pub fn new(label: impl Into<String>, status: &GenerationStatus, file: Option<PathBuf>) -> Self {
        let error = match status {
            GenerationStatus::Error(message) => Some(message.clone()),
            _ => None,
        };
        Self {
            label: label.into(),
            status: status.name(),
            error,
            file,
        }
    }
}

pub fn format_classify_result(gender: Gender, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(&serde_json::json!({ "gender": gender }));
    }
    Ok(format!("Subject: {}", gender))
}

pub fn format_batch_text(gender: Gender, rows: &[BatchRow], album: Option<&str>) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Label", "Status", "Output"]);
    for row in rows {
        let output = match (&row.file, &row.error) {
            (Some(file), _) => file.display().to_string(),
            (None, Some(error)) => error.clone(),
            (None, None) => "-".to_string(),
        };
        table.add_row(vec![row.label.clone(), row.status.to_string(), output]);
    }

    let done = rows.iter().filter(|r| r.status == "done").count();
    let mut out = format!(
        "Subject: {}\n{}\n{} of {} portraits generated",
        gender,
        table,
        done,
        rows.len()
    );
    if let Some(album) = album {
        out.push_str(&format!("\nAlbum: {}", album));
    }
    out
}

pub fn format_batch_json(
    gender: Gender,
    rows: &[BatchRow],
    album: Option<&str>,
) -> Result<String, ApiError> {
    to_json(&serde_json::json!({
        "gender": gender,
        "portraits": rows,
        "album": album,
    }))
}

pub fn format_compose_result(path: &Path, page: &EncodedImage) -> String {
    format!(
        "Album written to {} ({}x{}, {} bytes)",
        path.display(),
        page.width,
        page.height,
        page.image.bytes.len()
    )
}

fn to_json(value: &serde_json::Value) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::Io(format!("Failed to serialize output: {}", e)))
}
