//! Error types for memdump-jsonl operations.

use std::io;
use thiserror::Error;

/// The error type for line-delimited dump I/O.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line could not be parsed as a JSON object of the expected shape.
    #[error("line {line_number}: {source}")]
    Parse {
        /// 1-based line number of the offending line.
        line_number: usize,
        /// Underlying deserialization failure.
        source: serde_json::Error,
    },
}

impl Error {
    /// Returns the line number associated with a parse failure, if any.
    #[must_use]
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::Parse { line_number, .. } => Some(*line_number),
            Self::Io(_) | Self::Json(_) => None,
        }
    }
}

/// A specialized Result type for memdump-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
