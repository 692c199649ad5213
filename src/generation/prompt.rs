//! Prompt construction and fallback handling.
//!
//! Every primary prompt embeds the subject label behind a fixed marker so a
//! rejected prompt can be rebuilt as a shorter fallback without access to the
//! originating task.

use crate::generation::task::GenerationTask;

/// Marker preceding the quoted outfit label in primary prompts.
pub const OUTFIT_MARKER: &str = "wearing the iconic PUBG outfit: \"";

/// Primary scene prompt for a task.
pub fn scene_prompt(task: &GenerationTask) -> String {
    format!(
        "Transform the person in this photo into a battle-royale character portrait. \
         Keep their face, facial features and expression clearly recognizable. \
         Show them {marker}{label}\" ({outfit}). \
         Place them in {location}, {action}. \
         Render it as a cinematic, high-detail game key art shot with dramatic lighting, \
         framed from the waist up so the face stays the focal point.",
        marker = OUTFIT_MARKER,
        label = task.subject_label,
        outfit = task.scene.outfit,
        location = task.scene.location,
        action = task.scene.action,
    )
}

/// Recover the outfit label from a primary prompt.
pub fn extract_outfit_label(prompt: &str) -> Option<&str> {
    let start = prompt.find(OUTFIT_MARKER)? + OUTFIT_MARKER.len();
    let rest = &prompt[start..];
    let end = rest.find('"')?;
    let label = rest[..end].trim();
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// Shorter, literal instruction used after the primary prompt is rejected.
pub fn fallback_prompt(label: &str) -> String {
    format!(
        "Edit this photo: dress the person in a \"{}\" video game outfit. \
         Keep the face fully visible and unchanged. \
         Plain game-style background.",
        label
    )
}
