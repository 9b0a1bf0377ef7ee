//! Forward traversals: subgraphs, roots, components and dump boundaries.

use super::Dump;
use crate::domain::{Address, Record};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

impl Dump {
    /// Records reachable from `root` in at most `max_depth` hops.
    ///
    /// `None` means no depth limit. References are returned as found, not
    /// pruned to the visited set, so the boundary of the subgraph stays
    /// visible.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `root` is not in the dump.
    pub fn subgraph_of(&self, root: &str, max_depth: Option<usize>) -> Result<Dump> {
        if !self.contains(root) {
            return Err(Error::InvalidArgument(format!(
                "no record with address {root} in the dump"
            )));
        }

        let mut selected: BTreeMap<Address, Record> = BTreeMap::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(root, 0)]);
        while let Some((address, depth)) = queue.pop_front() {
            if selected.contains_key(address) {
                continue;
            }
            let Some(record) = self.find_by_address(address) else {
                continue;
            };
            selected.insert(record.address.clone(), record.clone());
            if max_depth.is_none_or(|max| depth < max) {
                queue.extend(record.references.iter().map(|r| (r.as_str(), depth + 1)));
            }
        }

        tracing::debug!(root, ?max_depth, selected = selected.len(), "extracted subgraph");
        Ok(selected.into())
    }

    /// Addresses of the records no record references.
    #[must_use]
    pub fn root_addresses(&self) -> BTreeSet<Address> {
        let referenced: HashSet<&Address> = self
            .each_record()
            .flat_map(|record| record.references.iter())
            .collect();
        self.addresses()
            .filter(|address| !referenced.contains(address))
            .cloned()
            .collect()
    }

    /// The records no record references.
    ///
    /// With `with_keepalive_count`, each is annotated with the number of
    /// distinct addresses reachable from it, itself included.
    #[must_use]
    pub fn roots(&self, with_keepalive_count: bool) -> Dump {
        let roots = self.root_addresses();
        self.filter_map(|mut record| {
            if !roots.contains(&record.address) {
                return None;
            }
            if with_keepalive_count {
                record.keepalive_count = Some(self.keepalive_count(record.address.as_str()));
            }
            Some(record)
        })
    }

    /// Number of distinct addresses reachable from `address`, itself
    /// included. Zero when the address is unknown.
    #[must_use]
    pub fn keepalive_count(&self, address: &str) -> usize {
        self.graph().reachable_count(address)
    }

    /// `roots` plus the records of this dump they directly reference.
    ///
    /// With `with_keepalive_count`, the added children are annotated with
    /// their keep-alive count in this dump.
    #[must_use]
    pub fn add_children(&self, roots: &Dump, with_keepalive_count: bool) -> Dump {
        let mut result: BTreeMap<Address, Record> = BTreeMap::new();
        for root in roots.each_record() {
            result.insert(root.address.clone(), root.clone());
            for reference in &root.references {
                let Some(child) = self.find_by_address(reference.as_str()) else {
                    continue;
                };
                let mut child = child.clone();
                if with_keepalive_count {
                    child.keepalive_count = Some(self.keepalive_count(reference.as_str()));
                }
                result.insert(reference.clone(), child);
            }
        }
        result.into()
    }

    /// Drop every root whose reachable set has at most `max_size` records,
    /// along with that set.
    ///
    /// Each root's component grows breadth-first and stops as soon as it
    /// exceeds `max_size`. Components are measured per root, so two small
    /// roots sharing records are each judged on their own.
    #[must_use]
    pub fn remove_small_components(&self, max_size: usize) -> Dump {
        let mut to_remove: BTreeSet<&Address> = BTreeSet::new();
        let roots = self.root_addresses();

        for root in &roots {
            let mut component: BTreeSet<&Address> = BTreeSet::new();
            let mut queue: VecDeque<&Address> = VecDeque::from([root]);
            while component.len() <= max_size {
                let Some(address) = queue.pop_front() else {
                    break;
                };
                let Some(record) = self.find_by_address(address.as_str()) else {
                    continue;
                };
                if component.insert(&record.address) {
                    queue.extend(record.references.iter());
                }
            }
            if component.len() <= max_size {
                to_remove.extend(component);
            }
        }

        tracing::debug!(
            roots = roots.len(),
            removed = to_remove.len(),
            max_size,
            "removed small components"
        );
        self.without_addresses(|address| to_remove.contains(address))
    }

    /// The boundary through which this dump keeps part of `other` alive.
    ///
    /// Returns the records of this dump referencing at least one record of
    /// `other`, plus those referenced records taken from `other` and
    /// annotated with their keep-alive count within `other`.
    #[must_use]
    pub fn interface_with(&self, other: &Dump) -> Dump {
        let mut result: BTreeMap<Address, Record> = BTreeMap::new();
        let mut border: BTreeSet<&Address> = BTreeSet::new();

        for record in self.each_record() {
            let mut found = false;
            for reference in &record.references {
                if let Some(child) = other.find_by_address(reference.as_str()) {
                    found = true;
                    border.insert(&child.address);
                }
            }
            if found {
                result.insert(record.address.clone(), record.clone());
            }
        }

        for address in border {
            if let Some(child) = other.find_by_address(address.as_str()) {
                let mut child = child.clone();
                child.keepalive_count = Some(other.keepalive_count(address.as_str()));
                result.insert(address.clone(), child);
            }
        }

        result.into()
    }

    /// Drop references to records absent from the dump.
    #[must_use]
    pub fn cleanup_references(&self) -> Dump {
        self.remove_invalid_references().0
    }
}
