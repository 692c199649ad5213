//! CLI route: single route table and run context. Dispatches to the studio,
//! compositor and presentation.

use crate::album::{AlbumCompositor, AlbumImageSet};
use crate::artifact::{write_artifact, write_portrait};
use crate::classify::Gender;
use crate::cli::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_batch_json, format_batch_text, format_classify_result, format_compose_result,
    BatchRow,
};
use crate::config::{ConfigLoader, SquadshotConfig};
use crate::error::ApiError;
use crate::scheduler::GenerationStatus;
use crate::studio::Studio;
use crate::theme::ThemePool;
use crate::types::ImageData;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{info, warn};

/// Runtime context for CLI execution: workspace and loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: SquadshotConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::from_config(workspace_root, config)
    }

    /// Create run context from an already loaded configuration.
    pub fn from_config(workspace_root: PathBuf, config: SquadshotConfig) -> Result<Self, ApiError> {
        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &SquadshotConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(command = name, workspace = %self.workspace_root.display(), "Executing command");

        let result = match command {
            Commands::Classify { photo, format } => self.handle_classify(photo, format),
            Commands::Generate {
                photo,
                themes,
                count,
                concurrency,
                out,
                album,
                seed,
                format,
            } => self.handle_generate(GenerateArgs {
                photo,
                themes,
                count: *count,
                concurrency: *concurrency,
                out,
                album: *album,
                seed: *seed,
                format,
            }),
            Commands::Compose { out, seed, images } => self.handle_compose(out, *seed, images),
        };

        info!(
            command = name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn handle_classify(&self, photo: &Path, format: &str) -> Result<String, ApiError> {
        let photo = ImageData::from_path(photo)?;
        let studio = Studio::from_config(&self.config)?;
        let gender = runtime()?.block_on(studio.classify(&photo));
        format_classify_result(gender, format)
    }

    fn handle_generate(&self, args: GenerateArgs<'_>) -> Result<String, ApiError> {
        let photo = ImageData::from_path(args.photo)?;
        let pool = ThemePool::load(args.themes)?;
        let studio = Studio::from_config(&self.config)?;
        let count = args.count.unwrap_or(self.config.generation.batch_size);
        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let rt = runtime()?;
        let (gender, labels) = rt.block_on(async {
            let gender = studio.classify(&photo).await;
            let tasks = pool.draw_tasks(gender, count, &mut rng)?;
            let labels: Vec<String> = tasks.iter().map(|t| t.subject_label.clone()).collect();
            studio.run_batch(&photo, tasks, args.concurrency).await;
            Ok::<(Gender, Vec<String>), ApiError>((gender, labels))
        })?;

        let mut rows = Vec::with_capacity(labels.len());
        for label in &labels {
            let status = studio
                .status(label)
                .unwrap_or_else(|| GenerationStatus::Error("no status recorded".to_string()));
            let file = match &status {
                GenerationStatus::Done(image) => Some(write_portrait(args.out, label, image)?),
                _ => None,
            };
            rows.push(BatchRow::new(label.clone(), &status, file));
        }

        let album = if args.album {
            match studio.compose_album_with_rng(labels.iter().map(String::as_str), &mut rng) {
                Ok(page) => {
                    let path = write_artifact(args.out, "album.jpg", &page.image.bytes)?;
                    Some(path.display().to_string())
                }
                Err(ApiError::AlbumIncomplete(missing)) => {
                    warn!(missing = ?missing, "Album skipped");
                    Some(format!("skipped, missing {}", missing.join(", ")))
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        if args.format == "json" {
            format_batch_json(gender, &rows, album.as_deref())
        } else {
            Ok(format_batch_text(gender, &rows, album.as_deref()))
        }
    }

    fn handle_compose(
        &self,
        out: &Path,
        seed: Option<u64>,
        images: &[(String, PathBuf)],
    ) -> Result<String, ApiError> {
        let mut loaded = IndexMap::new();
        for (label, path) in images {
            if loaded.contains_key(label) {
                return Err(ApiError::CompositionFailed(format!(
                    "Duplicate album label '{}'",
                    label
                )));
            }
            loaded.insert(label.clone(), ImageData::from_path(path)?);
        }
        let set = AlbumImageSet::decode(loaded.iter())?;

        let compositor = AlbumCompositor::new(self.config.album.clone());
        let page = match seed {
            Some(seed) => compositor.compose_with_rng(&set, &mut StdRng::seed_from_u64(seed))?,
            None => compositor.compose(&set)?,
        };

        let dir = out
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = out
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ApiError::Io(format!("Invalid output path {}", out.display())))?;
        let path = write_artifact(dir, name, &page.image.bytes)?;
        Ok(format_compose_result(&path, &page))
    }
}

struct GenerateArgs<'a> {
    photo: &'a Path,
    themes: &'a Path,
    count: Option<usize>,
    concurrency: Option<usize>,
    out: &'a Path,
    album: bool,
    seed: Option<u64>,
    format: &'a str,
}

fn runtime() -> Result<Runtime, ApiError> {
    Runtime::new().map_err(|e| ApiError::Io(format!("Failed to create runtime: {}", e)))
}
