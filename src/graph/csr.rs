//! Compressed Sparse Row (CSR) graph representation
//!
//! CSR is optimized for iteration over out-neighbors, which is exactly what
//! both estimators need: the distribution estimator sweeps every edge once
//! per iteration and the walker reads one node's row per step.

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::builder::{GraphBuilder, NodeKey};
use crate::errors::Result;

/// A read-only directed graph in Compressed Sparse Row format
///
/// Node IDs are dense `u32` indices into [`CsrGraph::nodes`]. A node with an
/// empty row is a sink.
///
/// The storage cannot be changed once built:
///
/// ```compile_fail
/// use rapid_pagerank::CsrGraph;
///
/// let mut graph = CsrGraph::from_edges(vec![("a", "b"), ("b", "a")]);
/// graph.num_nodes = 3;
/// ```
#[derive(Debug, Clone)]
pub struct CsrGraph<N> {
    /// Number of nodes
    num_nodes: usize,
    /// Row pointers: node i's edges are at indices row_ptr[i]..row_ptr[i+1]
    row_ptr: Vec<usize>,
    /// Column indices (target nodes) for each edge, in insertion order
    col_idx: Vec<u32>,
    /// Key for each node
    keys: Vec<N>,
    /// Reverse lookup key -> node ID
    index: FxHashMap<N, u32>,
}

/// Node and edge counts for display by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub sinks: usize,
}

impl<N: NodeKey> CsrGraph<N> {
    /// Convert a GraphBuilder into CSR format
    pub fn from_builder(builder: &GraphBuilder<N>) -> Self {
        let num_nodes = builder.node_count();
        let mut row_ptr = Vec::with_capacity(num_nodes + 1);
        let mut col_idx = Vec::with_capacity(builder.edge_count());
        let mut keys = Vec::with_capacity(num_nodes);
        let mut index = FxHashMap::with_capacity_and_hasher(num_nodes, Default::default());

        row_ptr.push(0);

        for (id, node) in builder.nodes() {
            keys.push(node.key.clone());
            index.insert(node.key.clone(), id);
            col_idx.extend_from_slice(&node.edges);
            row_ptr.push(col_idx.len());
        }

        Self {
            num_nodes,
            row_ptr,
            col_idx,
            keys,
            index,
        }
    }

    /// Build directly from `(source, target)` pairs
    ///
    /// See [`GraphBuilder::from_edges`] for the construction rules.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (N, N)>,
    {
        Self::from_builder(&GraphBuilder::from_edges(edges))
    }

    /// Build from an adjacency mapping, rejecting undeclared targets
    ///
    /// See [`GraphBuilder::try_from_adjacency`].
    pub fn try_from_adjacency<I, T>(adjacency: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, T)>,
        T: IntoIterator<Item = N>,
    {
        GraphBuilder::try_from_adjacency(adjacency).map(|b| Self::from_builder(&b))
    }

    /// Out-neighbor IDs of a node, in edge order
    pub fn neighbors(&self, node: u32) -> &[u32] {
        let start = self.row_ptr[node as usize];
        let end = self.row_ptr[node as usize + 1];
        &self.col_idx[start..end]
    }

    /// Out-neighbors of a node by key, in edge order
    ///
    /// Returns `None` for a key that is not in the graph and an empty
    /// iterator for a sink.
    pub fn out_neighbors(&self, key: &N) -> Option<impl Iterator<Item = &N> + '_> {
        let id = self.node_id(key)?;
        Some(self.neighbors(id).iter().map(move |&t| &self.keys[t as usize]))
    }

    /// Get the out-degree of a node (duplicate edges counted)
    pub fn degree(&self, node: u32) -> usize {
        self.row_ptr[node as usize + 1] - self.row_ptr[node as usize]
    }

    /// Whether a node has no outgoing edges
    pub fn is_sink(&self, node: u32) -> bool {
        self.degree(node) == 0
    }

    /// All node keys, indexed by node ID
    pub fn nodes(&self) -> &[N] {
        &self.keys
    }

    /// Key of a node ID
    pub fn node(&self, node: u32) -> &N {
        &self.keys[node as usize]
    }

    /// Node ID of a key
    pub fn node_id(&self, key: &N) -> Option<u32> {
        self.index.get(key).copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.num_nodes
    }

    /// Get the total number of directed edges
    pub fn edge_count(&self) -> usize {
        self.col_idx.len()
    }

    /// Check if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.num_nodes == 0
    }

    /// Find dangling nodes (nodes with no outgoing edges)
    pub fn dangling_nodes(&self) -> Vec<u32> {
        (0..self.num_nodes as u32)
            .filter(|&n| self.is_sink(n))
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.node_count(),
            edges: self.edge_count(),
            sinks: self.dangling_nodes().len(),
        }
    }
}

impl<N> Default for CsrGraph<N> {
    fn default() -> Self {
        Self {
            num_nodes: 0,
            row_ptr: vec![0],
            col_idx: Vec::new(),
            keys: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}
