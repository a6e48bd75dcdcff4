use crate::error::{RecommenderError, Result};
use crate::models::*;
use crate::utils::{top_k_indices, validation::validate_shapes};
use nalgebra::DMatrix;
use tracing::info;

pub const DEFAULT_TOP_K: usize = 3;

// Cells the user already rated become None.
pub fn exclusion_mask(
    original: &RatingMatrix,
    predicted: &PredictionMatrix,
) -> Result<DMatrix<Option<u8>>> {
    if predicted.shape() != original.shape() {
        return Err(RecommenderError::ShapeMismatch {
            expected: original.shape(),
            actual: predicted.shape(),
        });
    }

    Ok(DMatrix::from_fn(original.nrows(), original.ncols(), |row, col| {
        if original.is_rated(row, col) {
            None
        } else {
            Some(predicted.get(row, col))
        }
    }))
}

pub fn select_row(
    masked: &DMatrix<Option<u8>>,
    row: usize,
    user_id: u64,
    books: &BookIndex,
    k: usize,
) -> RecommendationRow {
    // Excluded cells and zero predictions are never candidates
    let candidates: Vec<(usize, u8)> = masked
        .row(row)
        .iter()
        .enumerate()
        .filter_map(|(col, cell)| cell.filter(|&rating| rating > 0).map(|rating| (col, rating)))
        .collect();
    let scores: Vec<u8> = candidates.iter().map(|&(_, rating)| rating).collect();

    // Highest rating first, lower column index on ties
    let mut slots: Vec<RecommendationSlot> = top_k_indices(&scores, k)
        .into_iter()
        .filter_map(|i| {
            let (col, rating) = candidates[i];
            books.name(col).map(|name| {
                RecommendationSlot::Book(BookRating {
                    book: name.to_string(),
                    rating,
                })
            })
        })
        .collect();
    // Pad short rows up to k slots
    slots.resize(k, RecommendationSlot::Empty);

    RecommendationRow {
        user_index: row,
        user_id,
        slots,
    }
}

pub fn select(
    original: &RatingMatrix,
    predicted: &PredictionMatrix,
    books: &BookIndex,
    k: usize,
) -> Result<RecommendationTable> {
    validate_shapes(original, predicted, books)?;

    let masked = exclusion_mask(original, predicted)?;
    let rows: Vec<RecommendationRow> = original
        .user_ids()
        .iter()
        .enumerate()
        .map(|(row, &user_id)| select_row(&masked, row, user_id, books, k))
        .collect();

    let padded = rows
        .iter()
        .filter(|row| row.slots.iter().any(RecommendationSlot::is_empty))
        .count();
    info!(
        "Selected top-{} recommendations for {} users ({} padded)",
        k,
        rows.len(),
        padded
    );

    Ok(RecommendationTable::new(k, rows))
}

pub fn rated_books(original: &RatingMatrix, books: &BookIndex, row: usize) -> Vec<BookRating> {
    original
        .values()
        .row(row)
        .iter()
        .enumerate()
        .filter(|&(_, &value)| value > 0.0)
        .filter_map(|(col, &value)| {
            books.name(col).map(|name| BookRating {
                book: name.to_string(),
                rating: value as u8,
            })
        })
        .collect()
}
