use crate::error::{RecommenderError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const NO_RATING_SENTINEL: &str = "This user doesn't have any rating";
pub const NO_RATING_ALIAS: &str = "no rating";

pub const EMPTY_BOOK: &str = "None";
pub const EMPTY_RATING: &str = "N/A";

// Serde goes through the dataset strings so FromStr is the only parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RatingLabel {
    ItWasAmazing,
    ReallyLikedIt,
    LikedIt,
    ItWasOk,
    DidNotLikeIt,
    NoRating,
}

impl RatingLabel {
    pub fn score(self) -> Option<u8> {
        match self {
            RatingLabel::ItWasAmazing => Some(5),
            RatingLabel::ReallyLikedIt => Some(4),
            RatingLabel::LikedIt => Some(3),
            RatingLabel::ItWasOk => Some(2),
            RatingLabel::DidNotLikeIt => Some(1),
            RatingLabel::NoRating => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RatingLabel::ItWasAmazing => "it was amazing",
            RatingLabel::ReallyLikedIt => "really liked it",
            RatingLabel::LikedIt => "liked it",
            RatingLabel::ItWasOk => "it was ok",
            RatingLabel::DidNotLikeIt => "did not like it",
            RatingLabel::NoRating => NO_RATING_SENTINEL,
        }
    }
}

impl FromStr for RatingLabel {
    type Err = RecommenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "it was amazing" => Ok(RatingLabel::ItWasAmazing),
            "really liked it" => Ok(RatingLabel::ReallyLikedIt),
            "liked it" => Ok(RatingLabel::LikedIt),
            "it was ok" => Ok(RatingLabel::ItWasOk),
            "did not like it" => Ok(RatingLabel::DidNotLikeIt),
            NO_RATING_SENTINEL | NO_RATING_ALIAS => Ok(RatingLabel::NoRating),
            other => Err(RecommenderError::InvalidLabel(other.to_string())),
        }
    }
}

impl TryFrom<String> for RatingLabel {
    type Error = RecommenderError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<RatingLabel> for String {
    fn from(label: RatingLabel) -> Self {
        label.as_str().to_string()
    }
}

impl fmt::Display for RatingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// One row as it appears in the source CSV files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRatingRecord {
    #[serde(rename = "ID")]
    pub user_id: u64,
    #[serde(rename = "Name")]
    pub book_name: String,
    #[serde(rename = "Rating")]
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: u64,
    pub book_name: String,
    pub rating_label: RatingLabel,
}

impl RatingRecord {
    pub fn new(user_id: u64, book_name: impl Into<String>, rating_label: RatingLabel) -> Self {
        Self {
            user_id,
            book_name: book_name.into(),
            rating_label,
        }
    }
}

impl TryFrom<RawRatingRecord> for RatingRecord {
    type Error = RecommenderError;

    fn try_from(raw: RawRatingRecord) -> Result<Self> {
        let rating_label = raw.rating.parse()?;
        Ok(Self {
            user_id: raw.user_id,
            book_name: raw.book_name,
            rating_label,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookIndex {
    names: Vec<String>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl BookIndex {
    pub fn new(names: Vec<String>) -> Self {
        let positions = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, positions }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, column: usize) -> Option<&str> {
        self.names.get(column).map(String::as_str)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

// 0.0 marks an unrated cell
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    values: DMatrix<f64>,
    user_ids: Vec<u64>,
}

impl RatingMatrix {
    pub fn new(values: DMatrix<f64>, user_ids: Vec<u64>) -> Result<Self> {
        if values.nrows() != user_ids.len() {
            return Err(RecommenderError::ShapeMismatch {
                expected: (user_ids.len(), values.ncols()),
                actual: values.shape(),
            });
        }
        Ok(Self { values, user_ids })
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn user_ids(&self) -> &[u64] {
        &self.user_ids
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    pub fn is_empty(&self) -> bool {
        self.nrows() == 0 || self.ncols() == 0
    }

    pub fn is_rated(&self, row: usize, col: usize) -> bool {
        self.values[(row, col)] != 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionMatrix {
    values: DMatrix<u8>,
}

impl PredictionMatrix {
    pub fn new(values: DMatrix<u8>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &DMatrix<u8> {
        &self.values
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.values[(row, col)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRating {
    pub book: String,
    pub rating: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationSlot {
    Book(BookRating),
    Empty,
}

impl RecommendationSlot {
    pub fn book(&self) -> &str {
        match self {
            RecommendationSlot::Book(entry) => &entry.book,
            RecommendationSlot::Empty => EMPTY_BOOK,
        }
    }

    pub fn rating(&self) -> String {
        match self {
            RecommendationSlot::Book(entry) => entry.rating.to_string(),
            RecommendationSlot::Empty => EMPTY_RATING.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RecommendationSlot::Empty)
    }
}

impl Serialize for RecommendationSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("RecommendationSlot", 2)?;
        state.serialize_field("book", self.book())?;
        match self {
            RecommendationSlot::Book(entry) => state.serialize_field("rating", &entry.rating)?,
            RecommendationSlot::Empty => state.serialize_field("rating", EMPTY_RATING)?,
        }
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationRow {
    pub user_index: usize,
    pub user_id: u64,
    pub slots: Vec<RecommendationSlot>,
}

impl RecommendationRow {
    pub fn books(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|slot| match slot {
            RecommendationSlot::Book(entry) => Some(entry.book.as_str()),
            RecommendationSlot::Empty => None,
        })
    }

    pub fn cells(&self) -> Vec<String> {
        // User first, then book/rating pairs in slot order
        let mut cells = Vec::with_capacity(1 + 2 * self.slots.len());
        cells.push(self.user_id.to_string());
        for slot in &self.slots {
            cells.push(slot.book().to_string());
            cells.push(slot.rating());
        }
        cells
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationTable {
    pub k: usize,
    pub rows: Vec<RecommendationRow>,
}

impl RecommendationTable {
    pub fn new(k: usize, rows: Vec<RecommendationRow>) -> Self {
        Self { k, rows }
    }

    pub fn empty(k: usize) -> Self {
        Self::new(k, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, user_index: usize) -> Option<&RecommendationRow> {
        self.rows.get(user_index)
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(1 + 2 * self.k);
        headers.push("User".to_string());
        for i in 1..=self.k {
            headers.push(format!("Book_{}", i));
            headers.push(format!("Rating_{}", i));
        }
        headers
    }

    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(self.headers())?;
        for row in &self.rows {
            writer.write_record(row.cells())?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_json<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_scores() {
        assert_eq!("it was amazing".parse::<RatingLabel>().unwrap().score(), Some(5));
        assert_eq!("really liked it".parse::<RatingLabel>().unwrap().score(), Some(4));
        assert_eq!("liked it".parse::<RatingLabel>().unwrap().score(), Some(3));
        assert_eq!("it was ok".parse::<RatingLabel>().unwrap().score(), Some(2));
        assert_eq!("did not like it".parse::<RatingLabel>().unwrap().score(), Some(1));
        assert_eq!(NO_RATING_SENTINEL.parse::<RatingLabel>().unwrap(), RatingLabel::NoRating);
        assert_eq!(NO_RATING_ALIAS.parse::<RatingLabel>().unwrap().score(), None);
    }

    #[test]
    fn test_unrecognized_label() {
        let err = "It was amazing!".parse::<RatingLabel>().unwrap_err();
        assert!(matches!(err, RecommenderError::InvalidLabel(ref s) if s == "It was amazing!"));
        assert!("Liked it".parse::<RatingLabel>().is_err());
    }

    #[test]
    fn test_label_serde_uses_dataset_strings() {
        let label: RatingLabel = serde_json::from_str(r#""really liked it""#).unwrap();
        assert_eq!(label, RatingLabel::ReallyLikedIt);
        assert_eq!(
            serde_json::to_string(&RatingLabel::ItWasOk).unwrap(),
            r#""it was ok""#
        );
        assert!(serde_json::from_str::<RatingLabel>(r#""ItWasAmazing""#).is_err());

        let record: RatingRecord =
            serde_json::from_str(r#"{"user_id":3,"book_name":"Emma","rating_label":"liked it"}"#)
                .unwrap();
        assert_eq!(record, RatingRecord::new(3, "Emma", RatingLabel::LikedIt));
        assert!(serde_json::from_str::<RatingRecord>(
            r#"{"user_id":3,"book_name":"Emma","rating_label":"It was amazing!"}"#
        )
        .is_err());
    }

    #[test]
    fn test_json_output_is_flushed() {
        let table = RecommendationTable::new(1, Vec::new());
        let mut writer = std::io::BufWriter::new(Vec::new());
        table.write_json(&mut writer).unwrap();
        assert!(writer.buffer().is_empty());
        assert!(!writer.get_ref().is_empty());
    }

    #[test]
    fn test_raw_record_conversion() {
        let raw = RawRatingRecord {
            user_id: 7,
            book_name: "Dune".to_string(),
            rating: "liked it".to_string(),
        };
        let record = RatingRecord::try_from(raw).unwrap();
        assert_eq!(record, RatingRecord::new(7, "Dune", RatingLabel::LikedIt));
    }

    #[test]
    fn test_book_index_lookup() {
        let books = BookIndex::new(vec!["Dune".to_string(), "Emma".to_string()]);
        assert_eq!(books.len(), 2);
        assert_eq!(books.name(1), Some("Emma"));
        assert_eq!(books.position("Dune"), Some(0));
        assert_eq!(books.position("Ulysses"), None);
        assert_eq!(books.name(2), None);
    }

    #[test]
    fn test_rating_matrix_rejects_mismatched_users() {
        let values = DMatrix::<f64>::zeros(2, 3);
        assert!(matches!(
            RatingMatrix::new(values, vec![1]),
            Err(RecommenderError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_table_csv_output() {
        let table = RecommendationTable::new(
            2,
            vec![RecommendationRow {
                user_index: 0,
                user_id: 42,
                slots: vec![
                    RecommendationSlot::Book(BookRating {
                        book: "Dune".to_string(),
                        rating: 4,
                    }),
                    RecommendationSlot::Empty,
                ],
            }],
        );

        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, "User,Book_1,Rating_1,Book_2,Rating_2\n42,Dune,4,None,N/A\n");
    }

    #[test]
    fn test_slot_json() {
        let slot = RecommendationSlot::Empty;
        assert_eq!(
            serde_json::to_string(&slot).unwrap(),
            r#"{"book":"None","rating":"N/A"}"#
        );
        let slot = RecommendationSlot::Book(BookRating {
            book: "Emma".to_string(),
            rating: 3,
        });
        assert_eq!(
            serde_json::to_string(&slot).unwrap(),
            r#"{"book":"Emma","rating":3}"#
        );
    }
}
