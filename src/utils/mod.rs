pub mod validation;

pub const MIN_RATING: u8 = 0;
pub const MAX_RATING: u8 = 5;

pub fn top_k_indices<T: PartialOrd>(scores: &[T], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();

    // sort_by is stable, so the earliest index wins a tie
    indices.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    indices.truncate(k);
    indices
}

pub fn round_and_clip(value: f64) -> u8 {
    // Half to even, then clamp into the rating scale
    let rounded = value.round_ties_even();
    if rounded.is_nan() || rounded <= MIN_RATING as f64 {
        MIN_RATING
    } else if rounded > MAX_RATING as f64 {
        MAX_RATING
    } else {
        rounded as u8
    }
}

pub fn column_counts(values: &nalgebra::DMatrix<f64>) -> Vec<usize> {
    values
        .column_iter()
        .map(|column| column.iter().filter(|&&v| v != 0.0).count())
        .collect()
}

pub fn row_counts(values: &nalgebra::DMatrix<f64>) -> Vec<usize> {
    values
        .row_iter()
        .map(|row| row.iter().filter(|&&v| v != 0.0).count())
        .collect()
}
