pub mod algorithms;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::config::Config;
pub use crate::error::{RecommenderError, Result};
pub use crate::models::*;
pub use crate::services::{PipelineResult, RecommendationPipeline};

use std::path::Path;

pub fn recommend_from_files<P: AsRef<Path>>(
    paths: &[P],
    config: &crate::config::PipelineConfig,
) -> Result<PipelineResult> {
    let records = services::ingestion::load_ratings(paths)?;
    RecommendationPipeline::new(config.clone()).run(records)
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}
