//! Node contraction.
//!
//! Collapsing a set of records removes them from the dump while keeping
//! every path that went through them: a reference to a collapsed record is
//! replaced by whatever that record (transitively) references outside the
//! collapsed set.

use super::Dump;
use crate::config::AnalysisConfig;
use crate::domain::Address;
use std::collections::{BTreeMap, BTreeSet};

type Expansion = BTreeMap<Address, BTreeSet<Address>>;

impl Dump {
    /// Remove the records of `to_collapse`, rewiring references around them.
    ///
    /// The result never contains an address of `to_collapse`, neither as a
    /// record nor as a reference, and every record outside `to_collapse`
    /// still reaches what it reached before.
    #[must_use]
    pub fn collapse(&self, to_collapse: &Dump) -> Dump {
        let expanded = expand(to_collapse);

        self.filter_map(|mut record| {
            if expanded.contains_key(&record.address) {
                return None;
            }
            if record.references.iter().any(|r| expanded.contains_key(r)) {
                let mut references = BTreeSet::new();
                for reference in std::mem::take(&mut record.references) {
                    match expanded.get(&reference) {
                        Some(targets) => references.extend(targets.iter().cloned()),
                        None => {
                            references.insert(reference);
                        }
                    }
                }
                record.references = references;
            }
            Some(record)
        })
    }

    /// Collapse the structural records that rarely matter when reading a
    /// graph: types listed in `config.collapse_types` and classes listed in
    /// `config.collapse_classes`.
    #[must_use]
    pub fn common_cleanup(&self, config: &AnalysisConfig) -> Dump {
        let to_collapse = self.filter(|record| {
            record
                .record_type
                .as_ref()
                .is_some_and(|t| config.collapse_types.contains(t))
                || record
                    .class
                    .as_ref()
                    .is_some_and(|c| config.collapse_classes.contains(c))
        });
        tracing::debug!(collapsed = to_collapse.len(), "common cleanup");
        self.collapse(&to_collapse)
    }
}

/// Fully expanded references of every collapsed record.
///
/// Each pass reads the state left by the previous one and replaces, for
/// every record, its references into the collapsed set by their current
/// expansion. A per-record memo of what was already expanded into it
/// breaks cycles. At the fixpoint no expansion contains a collapsed
/// address.
fn expand(to_collapse: &Dump) -> Expansion {
    let mut expanded: Expansion = to_collapse
        .each_record()
        .map(|record| (record.address.clone(), record.references.clone()))
        .collect();
    let mut already_expanded: BTreeMap<Address, BTreeSet<Address>> = expanded
        .keys()
        .map(|address| (address.clone(), BTreeSet::from([address.clone()])))
        .collect();

    let mut pass = 0usize;
    loop {
        pass += 1;
        let mut changes: Vec<(Address, BTreeSet<Address>)> = Vec::new();

        for (address, references) in &expanded {
            let (inner, mut updated): (BTreeSet<&Address>, BTreeSet<&Address>) =
                references.iter().partition(|r| expanded.contains_key(*r));
            if inner.is_empty() {
                continue;
            }

            let memo = already_expanded.entry(address.clone()).or_default();
            for reference in inner {
                if memo.insert(reference.clone()) {
                    updated.extend(expanded.get(reference).into_iter().flatten());
                }
            }
            let updated: BTreeSet<Address> = updated
                .into_iter()
                .filter(|r| !memo.contains(*r))
                .cloned()
                .collect();
            changes.push((address.clone(), updated));
        }

        tracing::debug!(pass, changed = changes.len(), "collapse pass");
        if changes.is_empty() {
            break;
        }
        expanded.extend(changes);
    }

    expanded
}
