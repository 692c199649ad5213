//! CLI help and command-name contract for logging spans.

use crate::cli::parse::Commands;

/// Command name string for log fields (e.g. "generate").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Classify { .. } => "classify",
        Commands::Generate { .. } => "generate",
        Commands::Compose { .. } => "compose",
    }
}
