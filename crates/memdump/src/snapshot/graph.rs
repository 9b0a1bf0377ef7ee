//! Forward/backward adjacency over a dump, using petgraph.
//!
//! Nodes are addresses; an edge `a -> b` means record `a` references `b`.
//! Backward adjacency is the same graph walked along incoming edges.
//! A synthetic super-root node has an edge to every `ROOT` record so that
//! "reachable from any root" is a single-source question.
//!
//! Referenced addresses that have no record still get a node: shortest
//! paths and reachability counts may pass through them, and callers filter
//! the results back down to records.

use super::Dump;
use crate::domain::{Address, TYPE_ROOT};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

/// Name of the synthetic node connected to every `ROOT` record.
pub const SUPER_ROOT: &str = "ALL_ROOTS";

/// Unit edge weight used by the spanning-tree query.
pub(super) const EDGE_WEIGHT: u64 = 1;

/// Cached adjacency of one dump.
#[derive(Debug)]
pub struct GraphIndex {
    /// Edge direction: referencing record -> referenced address.
    graph: DiGraph<Address, ()>,
    /// Address to node. The super-root is deliberately absent.
    node_map: HashMap<Address, NodeIndex>,
    super_root: NodeIndex,
}

impl GraphIndex {
    /// Build the index of `dump`.
    #[must_use]
    pub fn build(dump: &Dump) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map: HashMap<Address, NodeIndex> = HashMap::with_capacity(dump.len());
        let super_root = graph.add_node(Address::new(SUPER_ROOT));

        let mut node_for = |graph: &mut DiGraph<Address, ()>, address: &Address| {
            *node_map
                .entry(address.clone())
                .or_insert_with(|| graph.add_node(address.clone()))
        };

        for record in dump.each_record() {
            let node = node_for(&mut graph, &record.address);
            if record.is_type(TYPE_ROOT) {
                graph.add_edge(super_root, node, ());
            }
            for reference in &record.references {
                let target = node_for(&mut graph, reference);
                graph.add_edge(node, target, ());
            }
        }

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built graph index"
        );

        Self {
            graph,
            node_map,
            super_root,
        }
    }

    /// Number of nodes, including the super-root and dangling targets.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges, including super-root edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The synthetic super-root node.
    #[must_use]
    pub fn super_root(&self) -> NodeIndex {
        self.super_root
    }

    /// Node of an address, if it appears in the dump.
    #[must_use]
    pub fn node(&self, address: &str) -> Option<NodeIndex> {
        self.node_map.get(address).copied()
    }

    /// Address of a node.
    #[must_use]
    pub fn address(&self, node: NodeIndex) -> &Address {
        &self.graph[node]
    }

    /// Addresses directly referenced by `address`.
    pub fn children(&self, address: &str) -> impl Iterator<Item = &Address> {
        self.neighbors(address, Direction::Outgoing)
    }

    /// Addresses directly referencing `address`. Never yields the super-root.
    pub fn parents(&self, address: &str) -> impl Iterator<Item = &Address> {
        self.neighbors(address, Direction::Incoming)
    }

    fn neighbors(&self, address: &str, direction: Direction) -> impl Iterator<Item = &Address> {
        self.node(address)
            .into_iter()
            .flat_map(move |node| self.graph.neighbors_directed(node, direction))
            .filter(move |&n| n != self.super_root)
            .map(move |n| &self.graph[n])
    }

    /// Number of distinct addresses reachable from `address`, itself included.
    ///
    /// Returns 0 for an address absent from the graph.
    #[must_use]
    pub fn reachable_count(&self, address: &str) -> usize {
        let Some(start) = self.node(address) else {
            return 0;
        };
        let mut dfs = Dfs::new(&self.graph, start);
        let mut count = 0;
        while dfs.next(&self.graph).is_some() {
            count += 1;
        }
        count
    }

    /// Breadth-first shortest paths from `source`, every edge counting as
    /// one hop.
    ///
    /// Returns the predecessor of every reached node except `source`. The
    /// first predecessor to reach a node is kept, which makes the result
    /// deterministic for a given dump.
    pub(super) fn shortest_path_tree(&self, source: NodeIndex) -> HashMap<NodeIndex, NodeIndex> {
        let mut prev: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited = HashSet::from([source]);
        let mut queue = VecDeque::from([source]);

        while let Some(node) = queue.pop_front() {
            for next in self.graph.neighbors(node) {
                if visited.insert(next) {
                    prev.insert(next, node);
                    queue.push_back(next);
                }
            }
        }

        prev
    }

    /// Nodes on the path `source -> target` recorded in `prev`.
    ///
    /// `None` when `target` was not reached.
    pub(super) fn path_nodes(
        prev: &HashMap<NodeIndex, NodeIndex>,
        source: NodeIndex,
        target: NodeIndex,
    ) -> Option<Vec<NodeIndex>> {
        if target != source && !prev.contains_key(&target) {
            return None;
        }
        let mut path = vec![target];
        let mut current = target;
        let mut seen = HashSet::from([target]);
        while current != source {
            current = *prev.get(&current)?;
            if !seen.insert(current) {
                return None;
            }
            path.push(current);
        }
        path.reverse();
        Some(path)
    }

    /// Prim's algorithm with unit weights, from `root`.
    ///
    /// Returns the tree edges `(parent, child)` in the order they were
    /// added. Only nodes reachable from `root` are spanned.
    pub(super) fn spanning_tree_edges(&self, root: NodeIndex) -> Vec<(NodeIndex, NodeIndex)> {
        let mut in_tree = HashSet::from([root]);
        let mut tree = Vec::new();
        let mut frontier = BinaryHeap::new();
        // The sequence number keeps equal-weight candidates in discovery order.
        let mut sequence = 0usize;

        let mut push_edges = |frontier: &mut BinaryHeap<_>, node: NodeIndex| {
            for edge in self.graph.edges(node) {
                frontier.push(Reverse((EDGE_WEIGHT, sequence, node, edge.target())));
                sequence += 1;
            }
        };
        push_edges(&mut frontier, root);

        while let Some(Reverse((_, _, from, to))) = frontier.pop() {
            if !in_tree.insert(to) {
                continue;
            }
            tree.push((from, to));
            push_edges(&mut frontier, to);
        }

        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;
    use crate::snapshot::fixtures::chain;

    fn with_roots() -> Dump {
        Dump::from_records([
            Record::new("vm").with_type(TYPE_ROOT).with_references(["A"]),
            Record::new("A").with_references(["B", "C"]),
            Record::new("B").with_references(["C"]),
            Record::new("C").with_references(["A", "missing"]),
        ])
    }

    #[test]
    fn indexes_records_dangling_targets_and_super_root() {
        let dump = with_roots();
        let index = dump.graph();
        // super-root + 4 records + "missing"
        assert_eq!(index.node_count(), 6);
        // 1 super-root edge + 6 references
        assert_eq!(index.edge_count(), 7);
        assert!(index.node("missing").is_some());
        assert!(index.node(SUPER_ROOT).is_none());
    }

    #[test]
    fn parents_follow_incoming_edges_without_super_root() {
        let dump = with_roots();
        let index = dump.graph();
        let mut parents: Vec<&str> = index.parents("C").map(Address::as_str).collect();
        parents.sort_unstable();
        assert_eq!(parents, ["A", "B"]);
        assert_eq!(index.parents("vm").count(), 0);
    }

    #[test]
    fn children_follow_references() {
        let dump = chain();
        let children: Vec<&str> = dump.graph().children("A").map(Address::as_str).collect();
        assert_eq!(children, ["B"]);
        assert_eq!(dump.graph().children("nope").count(), 0);
    }

    #[test]
    fn reachable_count_includes_start_and_dangling() {
        let dump = with_roots();
        assert_eq!(dump.graph().reachable_count("A"), 4);
        assert_eq!(dump.graph().reachable_count("nope"), 0);
    }

    #[test]
    fn shortest_path_prefers_fewer_hops() {
        let dump = with_roots();
        let index = dump.graph();
        let source = index.super_root();
        let prev = index.shortest_path_tree(source);
        let target = index.node("C").unwrap();
        let path: Vec<&str> = GraphIndex::path_nodes(&prev, source, target)
            .unwrap()
            .into_iter()
            .map(|n| index.address(n).as_str())
            .collect();
        assert_eq!(path, [SUPER_ROOT, "vm", "A", "C"]);
    }

    #[test]
    fn unreachable_target_has_no_path() {
        let dump = chain();
        let index = dump.graph();
        let source = index.node("B").unwrap();
        let prev = index.shortest_path_tree(source);
        assert!(GraphIndex::path_nodes(&prev, source, index.node("A").unwrap()).is_none());
        assert_eq!(
            GraphIndex::path_nodes(&prev, source, source),
            Some(vec![source])
        );
    }

    #[test]
    fn spanning_tree_covers_reachable_nodes_once() {
        let dump = with_roots();
        let index = dump.graph();
        let root = index.node("A").unwrap();
        let edges = index.spanning_tree_edges(root);
        // A, B, C, missing reachable: three tree edges.
        assert_eq!(edges.len(), 3);
        let children: HashSet<NodeIndex> = edges.iter().map(|&(_, to)| to).collect();
        assert_eq!(children.len(), 3);
        assert!(!children.contains(&root));
    }
}
