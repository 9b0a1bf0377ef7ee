//! Immutable heap dump snapshots.
//!
//! A [`Dump`] maps [`Address`] to [`Record`]. It is built once by the
//! loader and never mutated afterwards: every analysis (filter, collapse,
//! diff, ...) returns a brand-new `Dump`.
//!
//! # Dangling references
//!
//! Filtering transforms keep the references of surviving records as they
//! are, so references may point outside the dump. This is tolerated
//! everywhere; use [`Dump::remove_invalid_references`] to clean them up or
//! [`Dump::validate_references`] to treat them as an error.
//!
//! # Graph index
//!
//! Path and reachability queries use a [`GraphIndex`] built lazily, once,
//! on first use and cached for the lifetime of the dump. Building is
//! guarded by a [`OnceLock`] so concurrent first callers agree on a single
//! index. [`Dump::clear_graph`] drops the cache explicitly.

mod class_names;
mod collapse;
mod graph;
mod jsonl;
mod paths;
mod reachability;
mod traversal;

pub use graph::{GraphIndex, SUPER_ROOT};
pub use jsonl::{
    for_saving, load_from_jsonl, load_from_reader, save_to_jsonl, save_to_writer, stream_records,
};

use crate::domain::{Address, Record};
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

/// An immutable address-to-record map.
#[derive(Default)]
pub struct Dump {
    records: BTreeMap<Address, Record>,
    graph: OnceLock<GraphIndex>,
}

/// Object counts of a dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Records with neither class, type nor root name
    pub unknown: usize,
    /// Record count per class (or type, or root name)
    pub by_class: BTreeMap<String, usize>,
}

impl Stats {
    /// Total number of records counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.unknown + self.by_class.values().sum::<usize>()
    }

    /// Count one more record.
    pub fn count(&mut self, record: &Record) {
        match record.stats_key() {
            Some(key) => *self.by_class.entry(key.to_string()).or_insert(0) += 1,
            None => self.unknown += 1,
        }
    }

    /// Histogram entries, most frequent first.
    #[must_use]
    pub fn sorted_by_count(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self
            .by_class
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

impl Dump {
    /// Create an empty dump
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dump from already-normalized records.
    ///
    /// Records sharing an address collapse into the last one.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        records.into_iter().collect()
    }

    pub(crate) fn from_map(records: BTreeMap<Address, Record>) -> Self {
        Self {
            records,
            graph: OnceLock::new(),
        }
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dump has no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a record with this address exists
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.records.contains_key(address)
    }

    /// Look up a record by address
    #[must_use]
    pub fn find_by_address(&self, address: &str) -> Option<&Record> {
        self.records.get(address)
    }

    /// Iterate over all records in address order.
    ///
    /// The iteration is finite and can be restarted at will.
    pub fn each_record(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Iterate over all addresses in order
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.records.keys()
    }

    /// The set of all addresses
    #[must_use]
    pub fn address_set(&self) -> BTreeSet<Address> {
        self.records.keys().cloned().collect()
    }

    /// Keep the records satisfying `predicate`.
    ///
    /// References of kept records are left untouched and may dangle.
    pub fn filter(&self, mut predicate: impl FnMut(&Record) -> bool) -> Dump {
        self.records
            .iter()
            .filter(|(_, record)| predicate(record))
            .map(|(address, record)| (address.clone(), record.clone()))
            .collect::<BTreeMap<_, _>>()
            .into()
    }

    /// Replace every record by `f(record)`, keyed by its original address.
    pub fn map(&self, mut f: impl FnMut(Record) -> Record) -> Dump {
        self.filter_map(|record| Some(f(record)))
    }

    /// Like [`map`](Self::map), but `f` may drop a record by returning `None`.
    pub fn filter_map(&self, mut f: impl FnMut(Record) -> Option<Record>) -> Dump {
        self.records
            .iter()
            .filter_map(|(address, record)| f(record.clone()).map(|r| (address.clone(), r)))
            .collect::<BTreeMap<_, _>>()
            .into()
    }

    /// Records of the given type
    pub fn objects_of_type(&self, record_type: &str) -> Dump {
        self.filter(|r| r.is_type(record_type))
    }

    /// Records of the given class
    pub fn objects_of_class(&self, class: &str) -> Dump {
        self.filter(|r| r.class.as_deref() == Some(class))
    }

    /// Remove the records of `other`, and every reference to them.
    pub fn without(&self, other: &Dump) -> Dump {
        self.without_addresses(|address| other.contains(address.as_str()))
    }

    pub(crate) fn without_addresses(&self, removed: impl Fn(&Address) -> bool) -> Dump {
        self.filter_map(|mut record| {
            if removed(&record.address) {
                return None;
            }
            record.retain_references(|r| !removed(r));
            Some(record)
        })
    }

    /// Records whose address is in `selected`, with references pruned to
    /// `selected`.
    pub(crate) fn restrict_to(&self, selected: &BTreeSet<Address>) -> Dump {
        selected
            .iter()
            .filter_map(|address| self.records.get(address))
            .map(|record| {
                let mut record = record.clone();
                record.retain_references(|r| selected.contains(r));
                (record.address.clone(), record)
            })
            .collect::<BTreeMap<_, _>>()
            .into()
    }

    /// Records that reference more than `min` records of `children`.
    ///
    /// Returns the matching records along with, for each of them, the
    /// number of `children` it references. With `exclude_children`, records
    /// that are themselves in `children` are skipped.
    pub fn parents_of(
        &self,
        children: &Dump,
        min: usize,
        exclude_children: bool,
    ) -> (Dump, BTreeMap<Address, usize>) {
        let mut counts = BTreeMap::new();
        let parents = self.filter(|record| {
            if exclude_children && children.contains(record.address.as_str()) {
                return false;
            }
            let count = record
                .references
                .iter()
                .filter(|r| children.contains(r.as_str()))
                .count();
            if count > min {
                counts.insert(record.address.clone(), count);
                true
            } else {
                false
            }
        });
        (parents, counts)
    }

    /// Direct reference count of every record, smallest first.
    #[must_use]
    pub fn out_degree(&self) -> Vec<(Address, usize)> {
        let mut degrees: Vec<(Address, usize)> = self
            .records
            .values()
            .map(|r| (r.address.clone(), r.references.len()))
            .collect();
        degrees.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        degrees
    }

    /// Drop references to addresses absent from the dump.
    ///
    /// Returns the cleaned dump and the set of missing addresses found.
    #[must_use]
    pub fn remove_invalid_references(&self) -> (Dump, BTreeSet<Address>) {
        let mut missing = BTreeSet::new();
        let cleaned = self.map(|mut record| {
            record.retain_references(|r| {
                let present = self.contains(r.as_str());
                if !present {
                    missing.insert(r.clone());
                }
                present
            });
            record
        });
        if !missing.is_empty() {
            tracing::warn!(count = missing.len(), "removed references to missing records");
        }
        (cleaned, missing)
    }

    /// Fail if any reference points outside the dump.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingReference`] for the first offending record,
    /// listing all of its missing targets.
    pub fn validate_references(&self) -> Result<()> {
        for record in self.records.values() {
            let missing: Vec<Address> = record
                .references
                .iter()
                .filter(|r| !self.contains(r.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(Error::MissingReference {
                    address: record.address.clone(),
                    missing,
                });
            }
        }
        Ok(())
    }

    /// Count records per class, falling back to type and root name.
    #[must_use]
    pub fn stats(&self) -> Stats {
        compute_stats(self.records.values())
    }

    /// The graph index of this dump, built on first use.
    pub fn graph(&self) -> &GraphIndex {
        self.graph.get_or_init(|| GraphIndex::build(self))
    }

    /// Drop the cached graph index; the next query rebuilds it.
    pub fn clear_graph(&mut self) {
        self.graph.take();
    }

    /// Whether the graph index has been built.
    #[must_use]
    pub fn has_graph(&self) -> bool {
        self.graph.get().is_some()
    }
}

/// Statistics over any sequence of records.
///
/// Used both on loaded dumps and on record streams read straight from a
/// file.
pub fn compute_stats<'a>(records: impl IntoIterator<Item = &'a Record>) -> Stats {
    let mut stats = Stats::default();
    for record in records {
        stats.count(record);
    }
    stats
}

impl From<BTreeMap<Address, Record>> for Dump {
    fn from(records: BTreeMap<Address, Record>) -> Self {
        Self::from_map(records)
    }
}

impl FromIterator<Record> for Dump {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        iter.into_iter()
            .map(|record| (record.address.clone(), record))
            .collect::<BTreeMap<_, _>>()
            .into()
    }
}

impl<'a> IntoIterator for &'a Dump {
    type Item = &'a Record;
    type IntoIter = std::collections::btree_map::Values<'a, Address, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}

impl Clone for Dump {
    /// Clones the records; the graph cache is not carried over.
    fn clone(&self) -> Self {
        Self::from_map(self.records.clone())
    }
}

impl PartialEq for Dump {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl fmt::Debug for Dump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dump")
            .field("records", &self.records.len())
            .field("graph", &self.has_graph())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// `A -> B -> C`, plus an unrelated root `Z`.
    pub(crate) fn chain() -> Dump {
        Dump::from_records([
            Record::new("A").with_references(["B"]),
            Record::new("B").with_references(["C"]),
            Record::new("C"),
            Record::new("Z"),
        ])
    }

    pub(crate) fn addresses(dump: &Dump) -> Vec<&str> {
        dump.addresses().map(Address::as_str).collect()
    }

    pub(crate) fn refs<'a>(dump: &'a Dump, address: &str) -> Vec<&'a str> {
        dump.find_by_address(address)
            .unwrap_or_else(|| panic!("{address} missing from dump"))
            .references
            .iter()
            .map(Address::as_str)
            .collect()
    }
}
