//! Generation task: one themed scene to render for one subject label.

use serde::{Deserialize, Serialize};

/// Where the subject is placed and what they are doing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneParameters {
    pub outfit: String,
    pub location: String,
    pub action: String,
}

/// Immutable unit of work
///
/// Labels are unique within a batch; they key status updates and artifact names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTask {
    pub subject_label: String,
    pub scene: SceneParameters,
}

impl GenerationTask {
    pub fn new(
        subject_label: impl Into<String>,
        outfit: impl Into<String>,
        location: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject_label: subject_label.into(),
            scene: SceneParameters {
                outfit: outfit.into(),
                location: location.into(),
                action: action.into(),
            },
        }
    }

    pub fn label(&self) -> &str {
        &self.subject_label
    }
}
