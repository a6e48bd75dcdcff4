use crate::config::PipelineConfig;
use crate::error::{RecommenderError, Result};
use crate::models::{BookIndex, PredictionMatrix, RatingMatrix};

pub fn validate_pipeline_config(config: &PipelineConfig) -> Result<()> {
    // Rank bounds depend on the filtered matrix and are checked by validate_rank.
    if config.top_k == 0 {
        return Err(RecommenderError::InvalidConfig(
            "Number of recommendations must be greater than 0".to_string(),
        ));
    }

    if !config.svd_epsilon.is_finite() || config.svd_epsilon <= 0.0 {
        return Err(RecommenderError::InvalidConfig(format!(
            "SVD epsilon must be a positive finite number, got {}",
            config.svd_epsilon
        )));
    }

    Ok(())
}

pub fn validate_rank(rank: usize, matrix: &RatingMatrix) -> Result<()> {
    if matrix.is_empty() {
        return Err(RecommenderError::EmptyMatrix {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
        });
    }

    let max = matrix.nrows().min(matrix.ncols());
    if rank == 0 || rank > max {
        return Err(RecommenderError::InvalidRank { rank, max });
    }

    Ok(())
}

pub fn validate_shapes(
    original: &RatingMatrix,
    predicted: &PredictionMatrix,
    books: &BookIndex,
) -> Result<()> {
    if predicted.shape() != original.shape() {
        return Err(RecommenderError::ShapeMismatch {
            expected: original.shape(),
            actual: predicted.shape(),
        });
    }

    if books.len() != original.ncols() {
        return Err(RecommenderError::ShapeMismatch {
            expected: original.shape(),
            actual: (original.nrows(), books.len()),
        });
    }

    Ok(())
}

pub fn validate_user_index(index: usize, users: usize) -> Result<()> {
    if index >= users {
        return Err(RecommenderError::UserIndexOutOfRange { index, users });
    }
    Ok(())
}
