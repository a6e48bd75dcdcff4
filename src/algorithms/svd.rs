use crate::error::{RecommenderError, Result};
use crate::models::{PredictionMatrix, RatingMatrix};
use crate::utils::{round_and_clip, validation::validate_rank};
use nalgebra::linalg::SVD;
use nalgebra::DMatrix;
use tracing::{debug, info};

pub trait RatingPredictor {
    fn predict(&self, matrix: &RatingMatrix) -> Result<PredictionMatrix>;
}

#[derive(Debug, Clone)]
pub struct TruncatedSvd {
    pub rank: usize,
    pub epsilon: f64,
    pub max_iterations: usize, // 0 = unlimited
}

impl TruncatedSvd {
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            epsilon: f64::EPSILON,
            max_iterations: 0,
        }
    }

    pub fn with_convergence(mut self, epsilon: f64, max_iterations: usize) -> Self {
        self.epsilon = epsilon;
        self.max_iterations = max_iterations;
        self
    }

    pub fn reconstruct(&self, matrix: &RatingMatrix) -> Result<DMatrix<f64>> {
        validate_rank(self.rank, matrix)?;

        let (rows, cols) = matrix.shape();
        let svd = SVD::try_new(
            matrix.values().clone(),
            true,
            true,
            self.epsilon,
            self.max_iterations,
        )
        .ok_or(RecommenderError::Decomposition { rows, cols })?;

        let (u, v_t) = match (svd.u, svd.v_t) {
            (Some(u), Some(v_t)) => (u, v_t),
            _ => return Err(RecommenderError::Decomposition { rows, cols }),
        };
        let sigma = svd.singular_values;

        // Order components by singular value, largest first
        let mut order: Vec<usize> = (0..sigma.len()).collect();
        order.sort_by(|&a, &b| {
            sigma[b]
                .partial_cmp(&sigma[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let leading = &order[..self.rank];

        debug!(
            "Leading singular values: {:?}",
            leading.iter().map(|&i| sigma[i]).collect::<Vec<_>>()
        );

        // (U[:, :n] * S[:n]) * Vt[:n, :], unrounded
        let mut users_svd = u.select_columns(leading.iter());
        for (j, &i) in leading.iter().enumerate() {
            users_svd.column_mut(j).scale_mut(sigma[i]);
        }
        let components = v_t.select_rows(leading.iter());

        Ok(users_svd * components)
    }
}

impl RatingPredictor for TruncatedSvd {
    fn predict(&self, matrix: &RatingMatrix) -> Result<PredictionMatrix> {
        let approx = self.reconstruct(matrix)?;
        // Round and clip into 0..=5
        let values = approx.map(round_and_clip);

        info!(
            "Predicted {}x{} ratings from {} singular components",
            values.nrows(),
            values.ncols(),
            self.rank
        );

        Ok(PredictionMatrix::new(values))
    }
}

pub fn predict(matrix: &RatingMatrix, n: usize) -> Result<PredictionMatrix> {
    TruncatedSvd::new(n).predict(matrix)
}
