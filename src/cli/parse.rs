//! CLI parse: clap types for squadshot. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Squadshot CLI - themed squad portraits and album pages from one photo
#[derive(Parser)]
#[command(name = "squadshot")]
#[command(about = "Generate themed portraits from a photo and lay them out on an album page")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (config/ is read from here)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify the subject of a photo
    Classify {
        /// Source photo
        #[arg(long)]
        photo: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Classify, draw themed tasks, generate portraits and write them out
    Generate {
        /// Source photo
        #[arg(long)]
        photo: PathBuf,
        /// Theme pool TOML (outfits, locations, actions)
        #[arg(long)]
        themes: PathBuf,
        /// Portraits to generate (defaults to generation.batch_size)
        #[arg(long)]
        count: Option<usize>,
        /// Concurrent generations (defaults to generation.concurrency)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Output directory
        #[arg(long, default_value = "out")]
        out: PathBuf,
        /// Also compose the album page
        #[arg(long)]
        album: bool,
        /// Seed for theme drawing and card tilt
        #[arg(long)]
        seed: Option<u64>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Compose an album page from images on disk
    Compose {
        /// Output file (JPEG)
        #[arg(long)]
        out: PathBuf,
        /// Seed for card tilt
        #[arg(long)]
        seed: Option<u64>,
        /// Images as LABEL=PATH, in grid order
        #[arg(required = true, value_parser = parse_labeled_path)]
        images: Vec<(String, PathBuf)>,
    },
}

/// Parse `LABEL=PATH`. The label ends at the first `=`.
pub fn parse_labeled_path(value: &str) -> Result<(String, PathBuf), String> {
    let (label, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=PATH, got '{}'", value))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(format!("missing label in '{}'", value));
    }
    if path.is_empty() {
        return Err(format!("missing path in '{}'", value));
    }
    Ok((label.to_string(), PathBuf::from(path)))
}
