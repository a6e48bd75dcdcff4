use crate::config::DuplicatePolicy;
use crate::error::{RecommenderError, Result};
use crate::models::*;
use crate::utils::{column_counts, row_counts};
use nalgebra::DMatrix;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct MatrixBuilder {
    pub nbook_ratings: usize,
    pub nuser_ratings: usize,
    pub duplicate_policy: DuplicatePolicy,
}

impl MatrixBuilder {
    pub fn new(nbook_ratings: usize, nuser_ratings: usize) -> Self {
        Self {
            nbook_ratings,
            nuser_ratings,
            duplicate_policy: DuplicatePolicy::LastWriteWins,
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn build<I>(&self, records: I) -> Result<(RatingMatrix, BookIndex)>
    where
        I: IntoIterator<Item = RatingRecord>,
    {
        // BTreeMaps give the canonical pivot order: users by id, books by name.
        let mut cells: BTreeMap<(u64, String), u8> = BTreeMap::new();
        let mut total = 0usize;
        let mut skipped = 0usize;

        // Drop unrated records; duplicates follow the configured policy
        for record in records {
            total += 1;
            let Some(score) = record.rating_label.score() else {
                skipped += 1;
                continue;
            };

            let key = (record.user_id, record.book_name);
            if let Some(previous) = cells.insert(key.clone(), score) {
                match self.duplicate_policy {
                    DuplicatePolicy::LastWriteWins => {
                        warn!(
                            "Duplicate rating for user {} and book {:?}: {} replaced by {}",
                            key.0, key.1, previous, score
                        );
                    }
                    DuplicatePolicy::Reject => {
                        return Err(RecommenderError::DuplicateRating {
                            user_id: key.0,
                            book_name: key.1,
                        });
                    }
                }
            }
        }

        debug!("Dropped {} of {} records without a rating", skipped, total);

        let mut user_ids: Vec<u64> = cells.keys().map(|(user, _)| *user).collect();
        user_ids.dedup();
        let mut book_names: Vec<&String> = cells.keys().map(|(_, book)| book).collect();
        book_names.sort();
        book_names.dedup();

        let book_positions: BTreeMap<&String, usize> = book_names
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, i))
            .collect();
        let user_positions: BTreeMap<u64, usize> = user_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();

        // Missing cells stay 0.0
        let mut pivot = DMatrix::<f64>::zeros(user_ids.len(), book_names.len());
        for ((user, book), score) in &cells {
            pivot[(user_positions[user], book_positions[book])] = *score as f64;
        }

        // Columns first, then rows counted over the surviving columns only.
        let kept_books: Vec<usize> = column_counts(&pivot)
            .into_iter()
            .enumerate()
            .filter(|&(_, count)| count > self.nbook_ratings)
            .map(|(col, _)| col)
            .collect();
        let pivot = pivot.select_columns(kept_books.iter());

        let kept_users: Vec<usize> = row_counts(&pivot)
            .into_iter()
            .enumerate()
            .filter(|&(_, count)| count > self.nuser_ratings)
            .map(|(row, _)| row)
            .collect();
        let values = pivot.select_rows(kept_users.iter());

        debug!(
            "Kept {} of {} books (> {} ratings) and {} of {} users (> {} ratings)",
            kept_books.len(),
            book_names.len(),
            self.nbook_ratings,
            kept_users.len(),
            user_ids.len(),
            self.nuser_ratings
        );

        let books = BookIndex::new(
            kept_books
                .iter()
                .map(|&col| book_names[col].clone())
                .collect(),
        );
        let users = kept_users.iter().map(|&row| user_ids[row]).collect();
        let matrix = RatingMatrix::new(values, users)?;

        if matrix.is_empty() {
            warn!(
                "No users or books survived filtering ({}x{})",
                matrix.nrows(),
                matrix.ncols()
            );
        }
        info!(
            "Built rating matrix: {} users x {} books",
            matrix.nrows(),
            matrix.ncols()
        );

        Ok((matrix, books))
    }

    pub fn build_from_raw<I>(&self, records: I) -> Result<(RatingMatrix, BookIndex)>
    where
        I: IntoIterator<Item = RawRatingRecord>,
    {
        let records = records
            .into_iter()
            .map(RatingRecord::try_from)
            .collect::<Result<Vec<_>>>()?;
        self.build(records)
    }
}

pub fn build(
    records: impl IntoIterator<Item = RatingRecord>,
    nbook_ratings: usize,
    nuser_ratings: usize,
) -> Result<(RatingMatrix, BookIndex)> {
    MatrixBuilder::new(nbook_ratings, nuser_ratings).build(records)
}
