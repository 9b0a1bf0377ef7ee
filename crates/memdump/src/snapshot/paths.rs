//! Shortest keep-alive paths and spanning trees.

use super::Dump;
use super::graph::GraphIndex;
use crate::domain::Address;
use crate::error::{Error, Result};
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet, HashSet};

impl Dump {
    /// The union of the shortest paths from the roots to every record of
    /// `targets`.
    ///
    /// `roots` defaults to the super-root, i.e. every `ROOT` record. The
    /// result is the induced subgraph over the nodes of all realized paths,
    /// with references pruned to stay inside it. A record also present in
    /// `targets` is taken from `targets`, so annotations made there (say,
    /// a keep-alive count) survive.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `roots` is given but empty, or names an
    /// address absent from this dump.
    pub fn shortest_keepalive_subgraph(
        &self,
        targets: &Dump,
        roots: Option<&[Address]>,
    ) -> Result<Dump> {
        let index = self.graph();
        let sources: Vec<NodeIndex> = match roots {
            None => vec![index.super_root()],
            Some([]) => return Err(Error::InvalidArgument("no roots provided".to_string())),
            Some(roots) => roots
                .iter()
                .map(|root| {
                    index
                        .node(root.as_str())
                        .filter(|_| self.contains(root.as_str()))
                        .ok_or_else(|| {
                            Error::InvalidArgument(format!("root {root} is not in the dump"))
                        })
                })
                .collect::<Result<_>>()?,
        };

        let mut on_path: HashSet<NodeIndex> = HashSet::new();
        for &source in &sources {
            let prev = index.shortest_path_tree(source);
            for target in targets.addresses() {
                let Some(target) = index.node(target.as_str()) else {
                    continue;
                };
                if let Some(path) = GraphIndex::path_nodes(&prev, source, target) {
                    on_path.extend(path);
                }
            }
        }

        let selected: BTreeSet<Address> = on_path
            .into_iter()
            .map(|node| index.address(node).clone())
            .filter(|address| self.contains(address.as_str()))
            .collect();
        tracing::debug!(
            targets = targets.len(),
            roots = sources.len(),
            selected = selected.len(),
            "computed shortest keep-alive paths"
        );

        Ok(selected
            .iter()
            .filter_map(|address| {
                let record = targets
                    .find_by_address(address.as_str())
                    .or_else(|| self.find_by_address(address.as_str()))?;
                let mut record = record.clone();
                record.retain_references(|r| selected.contains(r));
                Some(record)
            })
            .collect())
    }

    /// Unit-weight minimum spanning tree rooted at the single address of
    /// `roots`.
    ///
    /// Every record reachable from the root appears once, its references
    /// reduced to its children in the tree.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] unless exactly one root is given and it
    /// is a record of this dump.
    pub fn minimum_spanning_tree(&self, roots: &[Address]) -> Result<Dump> {
        let [root] = roots else {
            return Err(Error::InvalidArgument(format!(
                "there should be exactly one root, got {}",
                roots.len()
            )));
        };
        if !self.contains(root.as_str()) {
            return Err(Error::InvalidArgument(format!(
                "no record with address {root} in the dump"
            )));
        }

        let index = self.graph();
        let root_node = index
            .node(root.as_str())
            .ok_or_else(|| Error::InvalidArgument(format!("{root} is not indexed")))?;

        let mut children: BTreeMap<Address, BTreeSet<Address>> = BTreeMap::new();
        children.insert(root.clone(), BTreeSet::new());
        for (from, to) in index.spanning_tree_edges(root_node) {
            let to = index.address(to).clone();
            children.entry(to.clone()).or_default();
            children
                .entry(index.address(from).clone())
                .or_default()
                .insert(to);
        }

        Ok(children
            .into_iter()
            .filter_map(|(address, tree_children)| {
                let mut record = self.find_by_address(address.as_str())?.clone();
                record.references = tree_children;
                Some(record)
            })
            .collect())
    }
}
