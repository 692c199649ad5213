//! Theme pools: outfit, location and action word lists used to build a batch.
//!
//! The lists themselves are user-supplied (TOML); this module only samples
//! them. Outfits are drawn without replacement so labels stay unique within a
//! batch.

use crate::classify::Gender;
use crate::error::ApiError;
use crate::generation::GenerationTask;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Named outfit with a short visual description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outfit {
    pub label: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemePool {
    #[serde(default)]
    pub male: Vec<Outfit>,
    #[serde(default)]
    pub female: Vec<Outfit>,
    /// Outfits suitable for anyone; always part of the candidate set
    #[serde(default)]
    pub unisex: Vec<Outfit>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl ThemePool {
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ApiError::ConfigError(format!("Failed to read theme file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ApiError> {
        let pool: ThemePool = toml::from_str(contents)
            .map_err(|e| ApiError::ConfigError(format!("Invalid theme file: {}", e)))?;
        pool.validate()?;
        Ok(pool)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.locations.is_empty() {
            return Err(ApiError::ConfigError(
                "Theme pool needs at least one location".to_string(),
            ));
        }
        if self.actions.is_empty() {
            return Err(ApiError::ConfigError(
                "Theme pool needs at least one action".to_string(),
            ));
        }
        Ok(())
    }

    /// Outfits eligible for a classified subject. `Unknown` draws from all.
    ///
    /// Labels are unique in the result; the first occurrence of a label wins.
    pub fn outfits_for(&self, gender: Gender) -> Vec<&Outfit> {
        let gendered: Vec<&Outfit> = match gender {
            Gender::Male => self.male.iter().collect(),
            Gender::Female => self.female.iter().collect(),
            Gender::Unknown => self.male.iter().chain(self.female.iter()).collect(),
        };
        let mut seen = HashSet::new();
        gendered
            .into_iter()
            .chain(self.unisex.iter())
            .filter(|outfit| seen.insert(outfit.label.clone()))
            .collect()
    }

    /// Draw `count` tasks with distinct outfit labels.
    pub fn draw_tasks<R: Rng>(
        &self,
        gender: Gender,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<GenerationTask>, ApiError> {
        self.validate()?;
        let mut candidates = self.outfits_for(gender);
        if candidates.len() < count {
            return Err(ApiError::ConfigError(format!(
                "Theme pool has {} outfits for '{}', {} requested",
                candidates.len(),
                gender,
                count
            )));
        }

        let mut tasks = Vec::with_capacity(count);
        for _ in 0..count {
            let outfit = candidates.swap_remove(rng.random_range(0..candidates.len()));
            let location = &self.locations[rng.random_range(0..self.locations.len())];
            let action = &self.actions[rng.random_range(0..self.actions.len())];
            tasks.push(GenerationTask::new(
                outfit.label.clone(),
                outfit.description.clone(),
                location.clone(),
                action.clone(),
            ));
        }
        Ok(tasks)
    }
}
