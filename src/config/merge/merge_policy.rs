//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Only scalars every deployment needs are seeded here; the remaining fields
/// fall back to their serde defaults during deserialization.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("generation.concurrency", 2)?
        .set_default("generation.max_attempts", 3)?
        .set_default("album.width", 2480)?
        .set_default("album.height", 3508)?
        .set_default("album.jpeg_quality", 92)
}
