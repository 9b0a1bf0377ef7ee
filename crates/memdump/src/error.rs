//! Error types for dump analysis.
//!
//! Loading is all-or-nothing: a malformed line aborts the whole load.
//! Analysis operations never mutate their input, so an error from one call
//! leaves every snapshot exactly as it was.

use crate::domain::Address;
use std::io;
use thiserror::Error;

/// The error type for memdump operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Line-format error not tied to a specific record.
    #[error("dump file error: {0}")]
    Jsonl(memdump_jsonl::Error),

    /// A line could not be parsed or has no resolvable address.
    #[error("malformed record at line {line_number}: {reason}")]
    MalformedRecord {
        /// 1-based line of the offending record
        line_number: usize,
        /// What was wrong with it
        reason: String,
    },

    /// A record references addresses absent from the dump.
    #[error("{address} references {} which do not exist", format_missing(.missing))]
    MissingReference {
        /// The referencing record
        address: Address,
        /// The dangling targets, sorted
        missing: Vec<Address>,
    },

    /// Malformed call parameters (empty root set, unknown seed, ...)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

fn format_missing(missing: &[Address]) -> String {
    missing
        .iter()
        .map(Address::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<memdump_jsonl::Error> for Error {
    fn from(e: memdump_jsonl::Error) -> Self {
        match e {
            memdump_jsonl::Error::Io(io_err) => Error::Io(io_err),
            memdump_jsonl::Error::Parse {
                line_number,
                source,
            } => Error::MalformedRecord {
                line_number,
                reason: source.to_string(),
            },
            other @ memdump_jsonl::Error::Json(_) => Error::Jsonl(other),
        }
    }
}

/// A specialized Result type for memdump operations.
pub type Result<T> = std::result::Result<T, Error>;
