//! JSONL reading operations.
//!
//! Dumps are read strictly line by line so peak memory is bounded by the
//! record being decoded, not by the size of the file.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Async reader for line-delimited dump records.
///
/// `JsonlReader` wraps an async reader in a [`BufReader`] and tracks the
/// current line number so that parse failures can point at the offending
/// line. Blank lines are skipped.
///
/// # Examples
///
/// ```no_run
/// use memdump_jsonl::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("heap.json").await?;
/// let mut reader = JsonlReader::new(file);
/// while let Some(value) = reader.read_line::<serde_json::Value>().await? {
///     println!("{value}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    reader: BufReader<R>,
    /// Line number of the last line read (1-based, 0 before any read).
    line_number: usize,
    /// Reused line buffer.
    line: String,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            line: String::new(),
        }
    }

    /// Creates a new `JsonlReader` with a custom buffer capacity.
    ///
    /// Heap dumps of large collections can have very long lines; a bigger
    /// buffer avoids repeated refills for those.
    #[must_use]
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            line: String::new(),
        }
    }

    /// Returns the line number of the last line read.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads and deserializes the next non-blank line.
    ///
    /// Returns `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the underlying reader fails and
    /// [`Error::Parse`] (carrying the line number) if the line is not valid
    /// JSON for `T`.
    pub async fn read_line<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        loop {
            self.line.clear();
            let read = self.reader.read_line(&mut self.line).await?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                tracing::trace!(line_number = self.line_number, "skipping blank line");
                continue;
            }

            return serde_json::from_str(trimmed)
                .map(Some)
                .map_err(|source| Error::Parse {
                    line_number: self.line_number,
                    source,
                });
        }
    }
}
