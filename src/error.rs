//! Error types for FAQ retrieval.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, FaqError>;

/// Errors that can occur while building, querying or evaluating an index.
///
/// Abstaining from an answer is not an error; see
/// [`PredictionOutcome`](crate::retriever::PredictionOutcome).
#[derive(Error, Debug)]
pub enum FaqError {
    /// Vectors or parallel sequences do not share the expected length.
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// A reference vector is not unit-length within tolerance.
    #[error("Vector {index} is not L2-normalized (norm = {norm:.6})")]
    Normalization { index: usize, norm: f64 },

    /// Retriever or splitter parameters are unusable.
    #[error("Invalid retrieval configuration: {0}")]
    Configuration(String),

    /// The test ratio is outside the open interval (0, 1).
    #[error("Test ratio must be in (0, 1), got {0}")]
    InvalidRatio(f64),

    /// Ground-truth and predicted label sequences differ in length.
    #[error("Label sequences differ in length: {truth} true labels, {predicted} predictions")]
    LengthMismatch { truth: usize, predicted: usize },

    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Malformed FAQ or variant data.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// The embedding backend failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Configuration file or environment error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The index file does not exist.
    #[error("Index file not found at '{0}'")]
    IndexNotFound(PathBuf),
}

impl FaqError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn dimension(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}

impl From<serde_json::Error> for FaqError {
    fn from(err: serde_json::Error) -> Self {
        FaqError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for FaqError {
    fn from(err: csv::Error) -> Self {
        FaqError::Dataset(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_values() {
        let err = FaqError::dimension("query vector", 384, 3);
        assert_eq!(
            err.to_string(),
            "Dimension mismatch in query vector: expected 384, got 3"
        );

        let err = FaqError::InvalidRatio(1.5);
        assert!(err.to_string().contains("1.5"));

        let err = FaqError::LengthMismatch {
            truth: 2,
            predicted: 1,
        };
        assert!(err.to_string().contains("2 true labels"));
    }
}
