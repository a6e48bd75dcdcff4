use crate::error::Result;
use crate::models::{RatingRecord, RawRatingRecord};
use std::io::Read;
use std::path::Path;
use tracing::info;

pub fn read_ratings<R: Read>(reader: R) -> Result<Vec<RatingRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    // Extra columns are ignored, unknown labels fail the whole read
    let mut records = Vec::new();
    for row in reader.deserialize::<RawRatingRecord>() {
        records.push(RatingRecord::try_from(row?)?);
    }
    Ok(records)
}

pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<RatingRecord>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let records = read_ratings(file)?;
    info!("Loaded {} rating records from {}", records.len(), path.display());
    Ok(records)
}

pub fn load_ratings<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<RatingRecord>> {
    let mut records = Vec::new();
    for path in paths {
        records.extend(load_file(path)?);
    }
    Ok(records)
}
