//! Graph builder with O(1) node lookup
//!
//! This module provides a mutable builder that interns node keys into dense
//! `u32` ids using FxHashMap, and records directed out-edges in insertion
//! order. Freeze it into a [`CsrGraph`](super::csr::CsrGraph) before ranking.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::errors::{RankError, Result};

/// Any hashable, comparable key can name a node.
pub trait NodeKey: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> NodeKey for T {}

/// A node in the graph builder
#[derive(Debug, Clone)]
pub struct BuilderNode<N> {
    /// The caller's key for this node
    pub key: N,
    /// Out-edges in insertion order (duplicates and self-loops kept)
    pub edges: Vec<u32>,
}

impl<N> BuilderNode<N> {
    /// Create a new node
    pub fn new(key: N) -> Self {
        Self {
            key,
            edges: Vec::new(),
        }
    }
}

/// A mutable directed graph builder optimized for incremental construction
#[derive(Debug)]
pub struct GraphBuilder<N> {
    /// Maps key -> node ID
    key_to_id: FxHashMap<N, u32>,
    /// Node storage
    nodes: Vec<BuilderNode<N>>,
}

impl<N: NodeKey> Default for GraphBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: NodeKey> GraphBuilder<N> {
    /// Create a new empty graph builder
    pub fn new() -> Self {
        Self {
            key_to_id: FxHashMap::default(),
            nodes: Vec::new(),
        }
    }

    /// Create a graph builder with pre-allocated capacity
    pub fn with_capacity(node_capacity: usize) -> Self {
        Self {
            key_to_id: FxHashMap::with_capacity_and_hasher(node_capacity, Default::default()),
            nodes: Vec::with_capacity(node_capacity),
        }
    }

    /// Get or create a node for the given key, returning its ID
    ///
    /// IDs are assigned in first-appearance order.
    pub fn add_node(&mut self, key: N) -> u32 {
        if let Some(&id) = self.key_to_id.get(&key) {
            return id;
        }

        let id = self.nodes.len() as u32;
        self.key_to_id.insert(key.clone(), id);
        self.nodes.push(BuilderNode::new(key));
        id
    }

    /// Append a directed edge between two existing node IDs
    ///
    /// Unknown IDs are ignored; use [`GraphBuilder::add_edge`] to register
    /// nodes on the fly.
    pub fn link(&mut self, from: u32, to: u32) {
        if (to as usize) >= self.nodes.len() {
            return;
        }
        if let Some(node) = self.nodes.get_mut(from as usize) {
            node.edges.push(to);
        }
    }

    /// Append a directed edge, registering both endpoints if needed
    ///
    /// The source is registered before the target, so node IDs follow the
    /// order in which keys first appear in the edge stream.
    pub fn add_edge(&mut self, source: N, target: N) {
        let from = self.add_node(source);
        let to = self.add_node(target);
        self.link(from, to);
    }

    /// Build a graph from `(source, target)` pairs
    ///
    /// Permissive: duplicate edges and self-loops are kept, and every target
    /// becomes a node even if it never appears as a source (a sink).
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (N, N)>,
    {
        let edges = edges.into_iter();
        let mut builder = Self::with_capacity(edges.size_hint().0);
        for (source, target) in edges {
            builder.add_edge(source, target);
        }
        builder
    }

    /// Build a graph from an adjacency mapping `node -> [targets]`
    ///
    /// Strict: every target must itself be declared as a key, otherwise the
    /// edge references missing data and [`RankError::MalformedInput`] is
    /// returned. Declaration order of the keys fixes the node IDs.
    pub fn try_from_adjacency<I, T>(adjacency: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, T)>,
        T: IntoIterator<Item = N>,
    {
        let entries: Vec<(N, Vec<N>)> = adjacency
            .into_iter()
            .map(|(key, targets)| (key, targets.into_iter().collect()))
            .collect();

        let mut builder = Self::with_capacity(entries.len());
        for (key, _) in &entries {
            builder.add_node(key.clone());
        }

        for (key, targets) in entries {
            let from = builder.add_node(key.clone());
            for target in targets {
                let to = builder.get_node_id(&target).ok_or_else(|| {
                    RankError::malformed(
                        None,
                        format!("edge {key:?} -> {target:?} references an undeclared node"),
                    )
                })?;
                builder.link(from, to);
            }
        }

        Ok(builder)
    }

    /// Get the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the total number of directed edges (duplicates counted)
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }

    /// Get a node by ID
    pub fn get_node(&self, id: u32) -> Option<&BuilderNode<N>> {
        self.nodes.get(id as usize)
    }

    /// Get a node ID by key
    pub fn get_node_id(&self, key: &N) -> Option<u32> {
        self.key_to_id.get(key).copied()
    }

    /// Iterate over all nodes
    pub fn nodes(&self) -> impl Iterator<Item = (u32, &BuilderNode<N>)> {
        self.nodes.iter().enumerate().map(|(i, n)| (i as u32, n))
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_builder_basic() {
        let mut builder = GraphBuilder::new();

        let id_a = builder.add_node("a.html");
        let id_b = builder.add_node("b.html");
        let id_c = builder.add_node("a.html"); // duplicate

        assert_eq!(id_a, id_c);
        assert_ne!(id_a, id_b);
        assert_eq!(builder.node_count(), 2);
    }

    #[test]
    fn test_targets_become_sink_nodes() {
        let builder = GraphBuilder::from_edges(vec![("a", "b"), ("b", "c")]);

        assert_eq!(builder.node_count(), 3);
        let c = builder.get_node_id(&"c").unwrap();
        assert!(builder.get_node(c).unwrap().edges.is_empty());
    }

    #[test]
    fn test_duplicates_and_self_loops_are_kept() {
        let builder = GraphBuilder::from_edges(vec![("a", "b"), ("a", "b"), ("a", "a")]);

        let a = builder.get_node_id(&"a").unwrap();
        let b = builder.get_node_id(&"b").unwrap();
        assert_eq!(builder.get_node(a).unwrap().edges, vec![b, b, a]);
        assert_eq!(builder.edge_count(), 3);
    }

    #[test]
    fn test_ids_follow_first_appearance() {
        let builder = GraphBuilder::from_edges(vec![(3u64, 1u64), (1, 2), (2, 3)]);

        assert_eq!(builder.get_node_id(&3), Some(0));
        assert_eq!(builder.get_node_id(&1), Some(1));
        assert_eq!(builder.get_node_id(&2), Some(2));
    }

    #[test]
    fn test_adjacency_preserves_declared_order() {
        let builder = GraphBuilder::try_from_adjacency(vec![
            ("a", vec!["c", "b"]),
            ("b", vec![]),
            ("c", vec!["a"]),
        ])
        .unwrap();

        let a = builder.get_node_id(&"a").unwrap();
        assert_eq!(a, 0);
        let targets: Vec<_> = builder.get_node(a).unwrap().edges.clone();
        assert_eq!(targets, vec![2, 1]);
    }

    #[test]
    fn test_adjacency_rejects_undeclared_target() {
        let err = GraphBuilder::try_from_adjacency(vec![("a", vec!["b"])]).unwrap_err();
        assert!(matches!(err, RankError::MalformedInput { .. }));
    }

    #[test]
    fn test_link_ignores_unknown_ids() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_node("a");
        builder.link(a, 42);
        builder.link(42, a);
        assert_eq!(builder.edge_count(), 0);
    }
}
