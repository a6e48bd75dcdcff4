pub mod matrix_builder;
pub mod selector;
pub mod svd;

pub use matrix_builder::MatrixBuilder;
pub use selector::{exclusion_mask, rated_books, select, DEFAULT_TOP_K};
pub use svd::{predict, RatingPredictor, TruncatedSvd};
