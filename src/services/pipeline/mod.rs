use crate::algorithms::{rated_books, select, MatrixBuilder, RatingPredictor, TruncatedSvd};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::*;
use crate::utils::validation::{validate_pipeline_config, validate_user_index};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input_records: usize,
    pub users: usize,
    pub books: usize,
    pub rank: usize,
    pub top_k: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub ratings: RatingMatrix,
    pub books: BookIndex,
    pub predictions: Option<PredictionMatrix>,
    pub recommendations: RecommendationTable,
    pub summary: RunSummary,
}

impl PipelineResult {
    pub fn ratings_for_user(&self, user_index: usize) -> Result<Vec<BookRating>> {
        validate_user_index(user_index, self.ratings.nrows())?;
        Ok(rated_books(&self.ratings, &self.books, user_index))
    }

    pub fn recommendations_for_user(&self, user_index: usize) -> Result<&RecommendationRow> {
        validate_user_index(user_index, self.recommendations.len())?;
        Ok(&self.recommendations.rows[user_index])
    }
}

pub struct RecommendationPipeline {
    config: PipelineConfig,
}

impl RecommendationPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, records: Vec<RatingRecord>) -> Result<PipelineResult> {
        validate_pipeline_config(&self.config)?;

        let input_records = records.len();
        info!(
            "Running pipeline on {} records (nbook_ratings={}, nuser_ratings={}, rank={}, top_k={})",
            input_records,
            self.config.nbook_ratings,
            self.config.nuser_ratings,
            self.config.rank,
            self.config.top_k
        );

        // Pivot and filter the raw records
        let builder = MatrixBuilder::new(self.config.nbook_ratings, self.config.nuser_ratings)
            .with_duplicate_policy(self.config.duplicate_policy);
        let (ratings, books) = builder.build(records)?;

        // Nothing left to factorize, so there are no predictions either
        let (predictions, recommendations) = if ratings.is_empty() {
            warn!("Rating matrix is empty, skipping prediction");
            (None, RecommendationTable::empty(self.config.top_k))
        } else {
            // Rank is checked against the filtered matrix here
            let predictor = TruncatedSvd::new(self.config.rank)
                .with_convergence(self.config.svd_epsilon, self.config.svd_max_iterations);
            let predicted = predictor.predict(&ratings)?;
            // Mask rated books and pick the top k per user
            let table = select(&ratings, &predicted, &books, self.config.top_k)?;
            (Some(predicted), table)
        };

        let summary = RunSummary {
            input_records,
            users: ratings.nrows(),
            books: ratings.ncols(),
            rank: self.config.rank,
            top_k: self.config.top_k,
            generated_at: Utc::now(),
        };
        info!(
            "Pipeline finished: {} users, {} books, {} recommendation rows",
            summary.users,
            summary.books,
            recommendations.len()
        );

        Ok(PipelineResult {
            ratings,
            books,
            predictions,
            recommendations,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use crate::error::RecommenderError;
    use RatingLabel::*;

    fn config(rank: usize) -> PipelineConfig {
        PipelineConfig {
            nbook_ratings: 0,
            nuser_ratings: 0,
            rank,
            ..PipelineConfig::default()
        }
    }

    fn records() -> Vec<RatingRecord> {
        vec![
            RatingRecord::new(1, "A", ItWasAmazing),
            RatingRecord::new(1, "B", LikedIt),
            RatingRecord::new(2, "B", ReallyLikedIt),
            RatingRecord::new(2, "C", ItWasOk),
            RatingRecord::new(3, "A", DidNotLikeIt),
            RatingRecord::new(3, "C", ItWasAmazing),
        ]
    }

    #[test]
    fn test_run_and_query() {
        let result = RecommendationPipeline::new(config(2)).run(records()).unwrap();
        assert_eq!(result.recommendations.len(), 3);
        assert_eq!(result.summary.users, 3);
        assert_eq!(result.summary.books, 3);
        assert!(result.predictions.is_some());

        let rated = result.ratings_for_user(0).unwrap();
        assert_eq!(
            rated.iter().map(|r| r.book.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
        let row = result.recommendations_for_user(0).unwrap();
        assert_eq!(row.user_id, 1);
        assert!(row.books().all(|book| book == "C"));
        assert_eq!(row.slots.len(), 3);
    }

    #[test]
    fn test_user_index_out_of_range() {
        let result = RecommendationPipeline::new(config(1)).run(records()).unwrap();
        assert!(matches!(
            result.ratings_for_user(3),
            Err(RecommenderError::UserIndexOutOfRange { index: 3, users: 3 })
        ));
        assert!(result.recommendations_for_user(99).is_err());
    }

    #[test]
    fn test_empty_after_filtering() {
        let pipeline = RecommendationPipeline::new(PipelineConfig {
            nbook_ratings: 50,
            nuser_ratings: 50,
            ..PipelineConfig::default()
        });
        let result = pipeline.run(records()).unwrap();
        assert!(result.recommendations.is_empty());
        assert!(result.predictions.is_none());
        assert!(result.ratings.is_empty());
    }

    #[test]
    fn test_rank_zero_is_invalid_rank() {
        let err = RecommendationPipeline::new(config(0)).run(records()).unwrap_err();
        assert!(matches!(err, RecommenderError::InvalidRank { rank: 0, max: 3 }));

        let err = RecommendationPipeline::new(config(0))
            .run(vec![RatingRecord::new(1, "A", LikedIt)])
            .unwrap_err();
        assert!(matches!(err, RecommenderError::InvalidRank { rank: 0, max: 1 }));
    }

    #[test]
    fn test_run_summary() {
        let mut input = records();
        input.push(RatingRecord::new(4, "A", NoRating));
        let result = RecommendationPipeline::new(config(2)).run(input).unwrap();

        let summary = &result.summary;
        assert_eq!(summary.input_records, 7);
        assert_eq!((summary.users, summary.books), (3, 3));
        assert_eq!((summary.rank, summary.top_k), (2, 3));

        let value = serde_json::to_value(summary).unwrap();
        assert_eq!(value["input_records"], 7);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_rank_too_large() {
        let err = RecommendationPipeline::new(config(4)).run(records()).unwrap_err();
        assert!(matches!(err, RecommenderError::InvalidRank { rank: 4, max: 3 }));
    }

    #[test]
    fn test_invalid_config_rejected_before_work() {
        let pipeline = RecommendationPipeline::new(PipelineConfig {
            top_k: 0,
            ..config(1)
        });
        assert!(matches!(
            pipeline.run(records()),
            Err(RecommenderError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_duplicate_policy_from_config() {
        let pipeline = RecommendationPipeline::new(PipelineConfig {
            duplicate_policy: DuplicatePolicy::Reject,
            ..config(1)
        });
        let mut input = records();
        input.push(RatingRecord::new(1, "A", ItWasOk));
        assert!(matches!(
            pipeline.run(input),
            Err(RecommenderError::DuplicateRating { user_id: 1, .. })
        ));
    }
}
