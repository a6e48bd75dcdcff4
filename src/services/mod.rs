pub mod ingestion;
pub mod pipeline;

pub use pipeline::{PipelineResult, RecommendationPipeline, RunSummary};
