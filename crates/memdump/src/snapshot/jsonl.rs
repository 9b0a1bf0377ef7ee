//! Loading and saving dumps in the line-delimited record format.
//!
//! Loading runs in two passes. The first parses every line, defaults the
//! address of root pseudo-records from their `root` name, and qualifies
//! addresses of records carrying a generation (`0x7f01` -> `0x7f01#12`),
//! remembering the latest qualified form of each raw address. The second
//! rewrites `class`, `class_address` and references through that mapping,
//! keeping the raw address when it was never qualified.
//!
//! Saving strips generation suffixes again so the output has the shape of
//! a dump produced by the runtime itself.

use super::Dump;
use crate::domain::{Address, Record, strip_generation};
use crate::error::{Error, Result};
use futures::{Stream, StreamExt};
use memdump_jsonl::{JsonlReader, JsonlWriter, read_stream, write_jsonl_atomic_iter};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite};

/// Load a dump file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and
/// [`Error::MalformedRecord`] for the first line that does not parse or
/// has neither `address` nor `root`. No partial dump is returned.
pub async fn load_from_jsonl(path: &Path) -> Result<Dump> {
    let file = File::open(path).await?;
    let dump = load_from_reader(file).await?;
    tracing::info!(path = %path.display(), records = dump.len(), "loaded dump");
    Ok(dump)
}

/// Load a dump from any async reader.
///
/// # Errors
///
/// See [`load_from_jsonl`].
pub async fn load_from_reader<R: AsyncRead + Unpin>(reader: R) -> Result<Dump> {
    let mut reader = JsonlReader::new(reader);
    let mut records: Vec<Record> = Vec::new();
    let mut qualified: HashMap<Address, Address> = HashMap::new();

    // Pass 1: parse, default addresses, qualify generations.
    while let Some(mut record) = reader.read_line::<Record>().await? {
        let line_number = reader.line_number();
        normalize_root(&mut record);
        if record.address.is_empty() {
            return Err(Error::MalformedRecord {
                line_number,
                reason: "record has neither an address nor a root name".to_string(),
            });
        }

        if let Some(generation) = record.generation {
            let raw = std::mem::take(&mut record.address);
            record.address = raw.with_generation(generation);
            qualified.insert(raw, record.address.clone());
        }
        records.push(record);
    }

    // Pass 2: resolve raw addresses to their latest generation.
    let mut by_address: BTreeMap<Address, Record> = BTreeMap::new();
    let mut duplicates = 0usize;
    for mut record in records {
        if !qualified.is_empty() {
            requalify(&mut record, &qualified);
        }
        if let Some(previous) = by_address.insert(record.address.clone(), record) {
            duplicates += 1;
            tracing::debug!(address = %previous.address, "duplicate address, keeping the last record");
        }
    }
    if duplicates > 0 {
        tracing::warn!(duplicates, "dump contains duplicate addresses");
    }

    tracing::debug!(
        records = by_address.len(),
        qualified = qualified.len(),
        lines = reader.line_number(),
        "parsed dump"
    );
    Ok(Dump::from_map(by_address))
}

fn normalize_root(record: &mut Record) {
    if record.address.is_empty()
        && let Some(root) = record.root.as_deref()
    {
        record.address = Address::new(root);
    }
}

fn requalify(record: &mut Record, qualified: &HashMap<Address, Address>) {
    let resolve = |address: &str| -> Option<Address> { qualified.get(address).cloned() };

    if let Some(class) = record.class.as_deref()
        && let Some(resolved) = resolve(class)
    {
        record.class = Some(resolved.0);
    }
    if let Some(class_address) = &record.class_address
        && let Some(resolved) = resolve(class_address.as_str())
    {
        record.class_address = Some(resolved);
    }
    if record.references.iter().any(|r| qualified.contains_key(r)) {
        record.references = std::mem::take(&mut record.references)
            .into_iter()
            .map(|r| resolve(r.as_str()).unwrap_or(r))
            .collect();
    }
}

/// The record as it should be written to disk.
///
/// Generation suffixes are stripped from `address`, `class_address`,
/// `class` and every reference. The `generation` field itself is kept, so
/// loading the saved file qualifies the addresses again.
#[must_use]
pub fn for_saving(record: &Record) -> Record {
    let mut record = record.clone();
    record.address = record.address.bare();
    record.class_address = record.class_address.as_ref().map(Address::bare);
    if let Some(class) = record.class.as_mut() {
        let stripped = strip_generation(class).len();
        class.truncate(stripped);
    }
    record.references = record.references.iter().map(Address::bare).collect();
    record
}

/// The records of `dump` in the order they must be written.
///
/// Loading resolves a raw address to the last record seen with it, so the
/// generations of one raw address are grouped, and the one that `class`,
/// `class_address` and references point to is written last. Unreferenced
/// generations come first, in ascending order.
fn save_order(dump: &Dump) -> Vec<&Record> {
    let targets: HashSet<&str> = dump
        .each_record()
        .flat_map(|record| {
            record
                .references
                .iter()
                .map(Address::as_str)
                .chain(record.class_address.as_ref().map(Address::as_str))
                .chain(record.class.as_deref())
        })
        .filter(|address| strip_generation(address).len() != address.len())
        .collect();

    let key = |record: &Record| {
        let address = record.address.as_str();
        (
            strip_generation(address).to_string(),
            targets.contains(address),
            record.generation,
        )
    };
    let mut records: Vec<&Record> = dump.each_record().collect();
    records.sort_by_cached_key(|&record| key(record));
    records
}

/// Save a dump to a file, atomically replacing it.
///
/// Returns the number of records written.
///
/// # Errors
///
/// Returns an error if the file cannot be written. A pre-existing file at
/// `path` is left untouched in that case.
pub async fn save_to_jsonl(dump: &Dump, path: &Path) -> Result<usize> {
    let written =
        write_jsonl_atomic_iter(path, save_order(dump).into_iter().map(for_saving)).await?;
    tracing::info!(path = %path.display(), records = written, "saved dump");
    Ok(written)
}

/// Save a dump to any async writer, one record per line.
///
/// # Errors
///
/// Returns an error if writing or flushing fails.
pub async fn save_to_writer<W: AsyncWrite + Unpin>(dump: &Dump, writer: W) -> Result<usize> {
    let mut writer = JsonlWriter::new(writer);
    for record in save_order(dump) {
        writer.write(&for_saving(record)).await?;
    }
    writer.flush().await?;
    Ok(writer.records_written())
}

/// Stream the records of a dump file without building a [`Dump`].
///
/// Root pseudo-records get their address from their `root` name. Addresses
/// are not generation-qualified: that needs the whole file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened. Each streamed item
/// carries its own parse error, and the stream ends after the first one.
pub async fn stream_records(path: &Path) -> Result<impl Stream<Item = Result<Record>>> {
    let file = File::open(path).await?;
    Ok(
        read_stream::<Record, _>(JsonlReader::new(file)).map(|record| {
            let mut record = record?;
            normalize_root(&mut record);
            Ok(record)
        }),
    )
}
