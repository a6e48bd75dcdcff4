use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecommenderError>;

#[derive(Debug, Error)]
pub enum RecommenderError {
    #[error("Invalid rating label: {0:?}")]
    InvalidLabel(String),

    #[error("Invalid SVD rank {rank}: must be between 1 and {max}")]
    InvalidRank { rank: usize, max: usize },

    #[error("Rating matrix is empty ({rows} users x {cols} books)")]
    EmptyMatrix { rows: usize, cols: usize },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Duplicate rating for user {user_id} and book {book_name:?}")]
    DuplicateRating { user_id: u64, book_name: String },

    #[error("User index {index} out of range ({users} users)")]
    UserIndexOutOfRange { index: usize, users: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("SVD did not converge for a {rows}x{cols} matrix")]
    Decomposition { rows: usize, cols: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
