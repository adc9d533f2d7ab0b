//! Runtime configuration.
//!
//! Every knob has a default, so the service can be built with
//! `TailorConfig::default()` and no environment at all. `from_env` layers
//! `RETAILOR_*` variables (and a local `.env`, when present) on top.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_MAX_REVIEW_ITERATIONS: u32 = 3;
pub const DEFAULT_MAX_REVIEWER_PASSES: u32 = 2;
const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct TailorConfig {
    /// Directory holding one JSON cache entry per fingerprint.
    pub cache_dir: PathBuf,
    /// Directory where txt/docx/pdf artifacts are written.
    pub artifact_dir: PathBuf,
    /// Capacity of the submission channel feeding the worker.
    pub queue_capacity: usize,
    /// Default tailoring-loop budget for requests that do not set one.
    pub max_review_iterations: u32,
    /// Default reviewer-loop budget for requests that do not set one.
    pub max_reviewer_passes: u32,
}

impl Default for TailorConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("tailor_cache"),
            artifact_dir: PathBuf::from("tailored_resumes"),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_review_iterations: DEFAULT_MAX_REVIEW_ITERATIONS,
            max_reviewer_passes: DEFAULT_MAX_REVIEWER_PASSES,
        }
    }
}

impl TailorConfig {
    /// Loads configuration from the environment, falling back to defaults
    /// field by field.
    pub fn from_env() -> Result<Self> {
        // A missing .env is the normal case outside development.
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            cache_dir: env_path("RETAILOR_CACHE_DIR", defaults.cache_dir),
            artifact_dir: env_path("RETAILOR_ARTIFACT_DIR", defaults.artifact_dir),
            queue_capacity: env_parse("RETAILOR_QUEUE_CAPACITY", defaults.queue_capacity)?,
            max_review_iterations: env_parse(
                "RETAILOR_MAX_REVIEW_ITERATIONS",
                defaults.max_review_iterations,
            )?,
            max_reviewer_passes: env_parse(
                "RETAILOR_MAX_REVIEWER_PASSES",
                defaults.max_reviewer_passes,
            )?,
        })
    }
}

fn env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
