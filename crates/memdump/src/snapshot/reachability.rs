//! Ancestor closures: what keeps a set of objects alive.
//!
//! The closure starts from a seed set and repeatedly selects every record
//! holding a reference into the selection, until a round adds nothing.
//! Rounds walk the backward adjacency of the graph index, so each record
//! is examined once per incoming edge instead of once per round.

use super::Dump;
use crate::domain::Address;
use crate::error::{Error, Result};
use std::collections::{BTreeSet, VecDeque};

impl Dump {
    /// Records of `to` absent from `self`, plus everything in `to` that
    /// keeps them alive.
    ///
    /// References are pruned to the result. `a.diff(&a)` is empty.
    #[must_use]
    pub fn diff(&self, to: &Dump) -> Dump {
        let seeds: BTreeSet<Address> = to
            .addresses()
            .filter(|address| !self.contains(address.as_str()))
            .cloned()
            .collect();
        tracing::info!(
            source = self.len(),
            target = to.len(),
            new_objects = seeds.len(),
            "computing dump difference"
        );
        to.restrict_to(&to.ancestor_closure(seeds))
    }

    /// Records of `to` whose address is absent from `self`, references
    /// untouched.
    ///
    /// Unlike [`diff`](Self::diff) this never includes a record of `self`.
    #[must_use]
    pub fn new_objects(&self, to: &Dump) -> Dump {
        to.filter(|record| !self.contains(record.address.as_str()))
    }

    /// Every record with a reference path to `address`, and the record
    /// itself.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `address` is not in the dump.
    pub fn ancestors_of(&self, address: &str) -> Result<Dump> {
        if !self.contains(address) {
            return Err(Error::InvalidArgument(format!(
                "no record with address {address} in the dump"
            )));
        }
        let seeds = BTreeSet::from([Address::new(address)]);
        Ok(self.restrict_to(&self.ancestor_closure(seeds)))
    }

    /// What survives once `removed` stops holding anything alive.
    ///
    /// Traversal starts from every root (address referenced by no record)
    /// and never enters `removed`. Records still reached survive, with
    /// references pruned to the survivors.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `removed` is not in the dump.
    pub fn remove_node(&self, removed: &str) -> Result<Dump> {
        if !self.contains(removed) {
            return Err(Error::InvalidArgument(format!(
                "no record with address {removed} in the dump"
            )));
        }

        let roots = self.root_addresses();
        let mut queue: VecDeque<&Address> = roots.iter().collect();
        let mut selected: BTreeSet<Address> = BTreeSet::new();

        while let Some(address) = queue.pop_front() {
            if address.as_str() == removed || selected.contains(address) {
                continue;
            }
            let Some(record) = self.find_by_address(address.as_str()) else {
                continue;
            };
            selected.insert(address.clone());
            queue.extend(record.references.iter());
        }

        tracing::debug!(
            roots = roots.len(),
            kept = selected.len(),
            dropped = self.len() - selected.len(),
            "removed node {removed}"
        );
        Ok(self.restrict_to(&selected))
    }

    /// Backward fixpoint closure of `seeds` over this dump's records.
    ///
    /// Seeds absent from the dump are ignored.
    pub(crate) fn ancestor_closure(&self, seeds: BTreeSet<Address>) -> BTreeSet<Address> {
        let index = self.graph();
        let total = self.len();

        let mut selected: BTreeSet<Address> = seeds
            .into_iter()
            .filter(|address| self.contains(address.as_str()))
            .collect();
        let mut frontier: Vec<Address> = selected.iter().cloned().collect();
        let mut round = 0usize;

        while !frontier.is_empty() {
            round += 1;
            tracing::debug!(round, "{}/{total} records selected so far", selected.len());

            let mut next = Vec::new();
            for address in &frontier {
                for parent in index.parents(address.as_str()) {
                    if self.contains(parent.as_str()) && selected.insert(parent.clone()) {
                        next.push(parent.clone());
                    }
                }
            }
            frontier = next;
        }

        tracing::debug!(rounds = round, "{}/{total} records selected", selected.len());
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;
    use crate::snapshot::fixtures::{addresses, chain, refs};
    use rstest::{fixture, rstest};

    #[fixture]
    fn dump() -> Dump {
        chain()
    }

    #[rstest]
    fn ancestors_of_leaf_is_whole_chain(dump: Dump) {
        let result = dump.ancestors_of("C").unwrap();
        assert_eq!(addresses(&result), ["A", "B", "C"]);
        assert_eq!(refs(&result, "A"), ["B"]);
        assert_eq!(refs(&result, "B"), ["C"]);
    }

    #[rstest]
    fn ancestors_of_root_is_singleton(dump: Dump) {
        assert_eq!(addresses(&dump.ancestors_of("A").unwrap()), ["A"]);
    }

    #[rstest]
    fn ancestors_of_unknown_address_fails(dump: Dump) {
        assert!(matches!(
            dump.ancestors_of("nope"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn ancestors_prune_references_leaving_the_closure() {
        let dump = Dump::from_records([
            Record::new("H").with_references(["T", "other"]),
            Record::new("T"),
            Record::new("other"),
        ]);
        let result = dump.ancestors_of("T").unwrap();
        assert_eq!(addresses(&result), ["H", "T"]);
        assert_eq!(refs(&result, "H"), ["T"]);
    }

    #[test]
    fn ancestors_terminate_on_cycles() {
        let dump = Dump::from_records([
            Record::new("A").with_references(["B"]),
            Record::new("B").with_references(["A", "C"]),
            Record::new("C"),
        ]);
        let result = dump.ancestors_of("C").unwrap();
        assert_eq!(addresses(&result), ["A", "B", "C"]);
        assert_eq!(refs(&result, "B"), ["A", "C"]);
    }

    #[rstest]
    fn diff_with_itself_is_empty(dump: Dump) {
        assert!(dump.diff(&dump).is_empty());
    }

    #[test]
    fn diff_selects_new_objects_and_their_holders() {
        let from = Dump::from_records([
            Record::new("root").with_references(["cache"]),
            Record::new("cache").with_references(["old"]),
            Record::new("old"),
            Record::new("unrelated"),
        ]);
        let to = Dump::from_records([
            Record::new("root").with_references(["cache"]),
            Record::new("cache").with_references(["leak1", "old"]),
            Record::new("leak1").with_references(["leak2"]),
            Record::new("leak2"),
            Record::new("old"),
            Record::new("unrelated"),
        ]);

        let result = from.diff(&to);
        assert_eq!(addresses(&result), ["cache", "leak1", "leak2", "root"]);
        assert_eq!(refs(&result, "cache"), ["leak1"]);
    }

    #[test]
    fn new_objects_leave_holders_out() {
        let from = Dump::from_records([Record::new("root").with_references(["cache"])]);
        let to = Dump::from_records([
            Record::new("root").with_references(["cache"]),
            Record::new("cache").with_references(["leak"]),
            Record::new("leak"),
        ]);

        let new = from.new_objects(&to);
        assert_eq!(addresses(&new), ["cache", "leak"]);
        assert_eq!(refs(&new, "cache"), ["leak"]);
        assert_eq!(addresses(&from.diff(&to)), ["cache", "leak", "root"]);
    }

    #[rstest]
    fn remove_node_drops_what_it_kept_alive(dump: Dump) {
        let result = dump.remove_node("B").unwrap();
        assert_eq!(addresses(&result), ["A", "Z"]);
        assert!(refs(&result, "A").is_empty());
    }

    #[test]
    fn remove_node_keeps_objects_with_another_path() {
        let dump = Dump::from_records([
            Record::new("R").with_references(["X", "Y"]),
            Record::new("X").with_references(["S"]),
            Record::new("Y").with_references(["S"]),
            Record::new("S"),
        ]);
        let result = dump.remove_node("X").unwrap();
        assert_eq!(addresses(&result), ["R", "S", "Y"]);
        assert_eq!(refs(&result, "R"), ["Y"]);
    }

    #[rstest]
    fn remove_node_of_unknown_address_fails(dump: Dump) {
        assert!(dump.remove_node("nope").is_err());
    }
}
