//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::AlbumIncomplete(_) => format!("{}\nRegenerate the failed labels first.", e),
        ApiError::ConfigError(_) => format!("{}\nCheck config/config.toml or SQUADSHOT__* variables.", e),
        _ => e.to_string(),
    }
}
