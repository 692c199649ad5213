//! Configuration System
//!
//! Layered configuration: built-in defaults, the user's global file, the
//! workspace files, then `SQUADSHOT__SECTION__KEY` environment variables.

use crate::album::AlbumConfig;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

pub use crate::provider::ProviderConfig;
pub use crate::scheduler::GenerationConfig;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SquadshotConfig {
    /// Remote model endpoint and credentials
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Batch scheduling and retry settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Album page geometry and output
    #[serde(default)]
    pub album: AlbumConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Provider(String),
    Generation(String),
    Album(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ValidationError::Album(msg) => write!(f, "Album: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SquadshotConfig {
    /// Validate every section, collecting all problems
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if let Err(e) = self.album.validate() {
            errors.push(ValidationError::Album(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
