use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub ingestion: IngestionConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // Strict thresholds: a book needs more than nbook_ratings ratings
    pub nbook_ratings: usize,
    pub nuser_ratings: usize,
    pub rank: usize,
    pub top_k: usize,
    pub duplicate_policy: DuplicatePolicy,
    pub svd_max_iterations: usize, // 0 = unlimited
    pub svd_epsilon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    LastWriteWins,
    Reject,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub inputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    // stdout when unset
    pub path: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            nbook_ratings: 20,
            nuser_ratings: 5,
            rank: 5,
            top_k: 3,
            duplicate_policy: DuplicatePolicy::LastWriteWins,
            svd_max_iterations: 0,
            svd_epsilon: f64::EPSILON,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("BOOKREC").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
