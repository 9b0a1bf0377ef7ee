//! JSONL writing operations.

use crate::error::Result;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Async writer for line-delimited dump records.
///
/// Each value is serialized as compact JSON followed by `\n`. Output is
/// buffered; call [`flush`](Self::flush) before dropping the writer.
///
/// # Examples
///
/// ```no_run
/// use memdump_jsonl::JsonlWriter;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::create("out.json").await?;
/// let mut writer = JsonlWriter::new(file);
/// writer.write(&serde_json::json!({"address": "0x1", "references": []})).await?;
/// writer.flush().await?;
/// # Ok(())
/// # }
/// ```
pub struct JsonlWriter<W> {
    writer: BufWriter<W>,
    records_written: usize,
}

impl<W: AsyncWrite + Unpin> JsonlWriter<W> {
    /// Creates a new `JsonlWriter` wrapping the given async writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            records_written: 0,
        }
    }

    /// Creates a new `JsonlWriter` with a custom buffer capacity.
    #[must_use]
    pub fn with_capacity(writer: W, capacity: usize) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, writer),
            records_written: 0,
        }
    }

    /// Number of records written so far.
    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Serializes `value` and writes it as a single line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying write fails.
    pub async fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.records_written += 1;
        Ok(())
    }

    /// Writes every value of `values`, one per line.
    ///
    /// # Errors
    ///
    /// Stops at the first failing value and returns its error.
    pub async fn write_all<T, I>(&mut self, values: I) -> Result<()>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        for value in values {
            self.write(&value).await?;
        }
        Ok(())
    }

    /// Flushes buffered output to the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying flush fails.
    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Consumes the writer, returning the underlying buffered writer.
    ///
    /// This does not flush.
    #[must_use]
    pub fn into_inner(self) -> BufWriter<W> {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[tokio::test]
    async fn writes_one_compact_object_per_line() {
        let mut writer = JsonlWriter::new(Cursor::new(Vec::new()));
        writer
            .write(&json!({"address": "0x1", "references": ["0x2"]}))
            .await
            .unwrap();
        writer.write(&json!({"root": "vm"})).await.unwrap();
        writer.flush().await.unwrap();
        assert_eq!(writer.records_written(), 2);

        let bytes = writer.into_inner().into_inner().into_inner();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "{\"address\":\"0x1\",\"references\":[\"0x2\"]}\n{\"root\":\"vm\"}\n"
        );
    }

    #[tokio::test]
    async fn write_all_counts_every_record() {
        let mut writer = JsonlWriter::with_capacity(Cursor::new(Vec::new()), 64);
        writer
            .write_all((0..3).map(|i| json!({ "n": i })))
            .await
            .unwrap();
        assert_eq!(writer.records_written(), 3);
    }
}
