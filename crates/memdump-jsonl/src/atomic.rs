//! Atomic replacement of dump files.
//!
//! Records are written to a sibling `*.tmp` file which is renamed over the
//! target once fully flushed. Renames within one filesystem are atomic on
//! POSIX, so readers see either the old dump or the complete new one.

use crate::{JsonlWriter, Result};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// Atomically writes a slice of values to a JSONL file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written,
/// if a value fails to serialize, or if the final rename fails. The
/// original file is left untouched in every failure case.
pub async fn write_jsonl_atomic<T, P>(path: P, values: &[T]) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    write_jsonl_atomic_iter(path, values.iter()).await.map(|_| ())
}

/// Atomically writes an iterator of values to a JSONL file.
///
/// Returns the number of records written.
///
/// # Errors
///
/// See [`write_jsonl_atomic`].
pub async fn write_jsonl_atomic_iter<T, I, P>(path: P, values: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    let written = match write_to_temp_file(&temp_path, values).await {
        Ok(written) => written,
        Err(e) => {
            // Best-effort cleanup; the write error is what matters.
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e);
        }
    };

    tokio::fs::rename(&temp_path, path).await?;
    tracing::debug!(path = %path.display(), records = written, "replaced dump file");
    Ok(written)
}

/// `heap.json` -> `heap.json.tmp`, `heap` -> `heap.tmp`.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let extension = match path.extension() {
        Some(ext) => {
            let mut ext = ext.to_os_string();
            ext.push(".tmp");
            ext
        }
        None => OsString::from("tmp"),
    };
    temp_path.set_extension(extension);
    temp_path
}

async fn write_to_temp_file<T, I>(temp_path: &Path, values: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let file = File::create(temp_path).await?;
    let mut writer = JsonlWriter::new(file);
    writer.write_all(values).await?;
    writer.flush().await?;
    Ok(writer.records_written())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    #[rstest]
    #[case::with_extension("/dumps/heap.json", "/dumps/heap.json.tmp")]
    #[case::without_extension("/dumps/heap", "/dumps/heap.tmp")]
    #[case::multiple_extensions("/dumps/heap.json.gz", "/dumps/heap.json.gz.tmp")]
    #[case::relative("heap.json", "heap.json.tmp")]
    fn temp_path_appends_tmp(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(make_temp_path(Path::new(input)), Path::new(expected));
    }

    #[tokio::test]
    async fn replaces_existing_file_and_removes_temp() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("heap.json");
        tokio::fs::write(&target, "stale\n").await.unwrap();

        let records = vec![json!({"address": "0x1"}), json!({"address": "0x2"})];
        write_jsonl_atomic(&target, &records).await.unwrap();

        let contents = tokio::fs::read_to_string(&target).await.unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.starts_with("{\"address\":\"0x1\"}"));
        assert!(!dir.path().join("heap.json.tmp").exists());
    }

    #[tokio::test]
    async fn iterator_variant_reports_count() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("heap.json");

        let written = write_jsonl_atomic_iter(&target, (0..5).map(|n| json!({ "n": n })))
            .await
            .unwrap();
        assert_eq!(written, 5);
    }

    #[tokio::test]
    async fn empty_input_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("empty.json");

        let records: Vec<serde_json::Value> = Vec::new();
        write_jsonl_atomic(&target, &records).await.unwrap();

        assert_eq!(tokio::fs::metadata(&target).await.unwrap().len(), 0);
    }
}
