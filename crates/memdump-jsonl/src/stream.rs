//! Lazy record streams.
//!
//! Iterating a dump file this way never holds more than one record in
//! memory, which is what walking a multi-gigabyte dump without building a
//! snapshot requires.

use crate::error::Result;
use crate::reader::JsonlReader;
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use tokio::io::AsyncRead;

/// Turns a reader into a stream of decoded records.
///
/// The stream ends after the first error.
///
/// # Examples
///
/// ```no_run
/// use futures::StreamExt;
/// use memdump_jsonl::{read_stream, JsonlReader};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = tokio::fs::File::open("heap.json").await?;
/// let records = read_stream::<serde_json::Value, _>(JsonlReader::new(file));
/// let mut records = std::pin::pin!(records);
/// while let Some(record) = records.next().await {
///     println!("{}", record?);
/// }
/// # Ok(())
/// # }
/// ```
pub fn read_stream<T, R>(reader: JsonlReader<R>) -> impl Stream<Item = Result<T>>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    stream::unfold(Some(reader), |state| async move {
        let mut reader = state?;
        match reader.read_line::<T>().await {
            Ok(Some(value)) => Some((Ok(value), Some(reader))),
            Ok(None) => None,
            Err(e) => Some((Err(e), None)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::Value;
    use std::io::Cursor;

    #[tokio::test]
    async fn yields_every_record() {
        let data = b"{\"n\":1}\n{\"n\":2}\n{\"n\":3}\n";
        let values: Vec<Value> = read_stream(JsonlReader::new(Cursor::new(&data[..])))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(values.len(), 3);
        assert_eq!(values[2]["n"], 3);
    }

    #[tokio::test]
    async fn stops_after_first_error() {
        let data = b"{\"n\":1}\nbroken\n{\"n\":3}\n";
        let results: Vec<Result<Value>> = read_stream(JsonlReader::new(Cursor::new(&data[..])))
            .collect()
            .await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().line_number(), Some(2));
    }
}
