//! Per-run memo of neighbor rows for the random walker.
//!
//! Walks revisit the same hubs over and over. The cache resolves a node's
//! row once and hands back the borrowed slice and its out-degree on every
//! later visit. It is scoped to one estimation run: the borrow of the graph
//! ties its lifetime to that run, and [`SamplingCache::reset`] clears it for
//! reuse.

use crate::graph::{CsrGraph, NodeKey};

/// Memoized row of one visited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleCacheEntry<'g> {
    pub neighbors: &'g [u32],
}

impl SampleCacheEntry<'_> {
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_sink(&self) -> bool {
        self.neighbors.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SamplingCache<'g> {
    entries: Vec<Option<SampleCacheEntry<'g>>>,
    hits: u64,
    misses: u64,
}

impl<'g> SamplingCache<'g> {
    pub fn new(node_count: usize) -> Self {
        Self {
            entries: vec![None; node_count],
            hits: 0,
            misses: 0,
        }
    }

    pub fn for_graph<N: NodeKey>(graph: &'g CsrGraph<N>) -> Self {
        Self::new(graph.node_count())
    }

    /// Cached row for `node`, resolving it from `graph` on first use.
    pub fn entry<N: NodeKey>(&mut self, graph: &'g CsrGraph<N>, node: u32) -> SampleCacheEntry<'g> {
        if self.entries.len() < graph.node_count() {
            self.entries.resize(graph.node_count(), None);
        }

        let slot = &mut self.entries[node as usize];
        if let Some(entry) = *slot {
            self.hits += 1;
            return entry;
        }

        self.misses += 1;
        let entry = SampleCacheEntry {
            neighbors: graph.neighbors(node),
        };
        *slot = Some(entry);
        entry
    }

    /// Same sequence as `graph.neighbors(node)`.
    pub fn neighbors_of<N: NodeKey>(&mut self, graph: &'g CsrGraph<N>, node: u32) -> &'g [u32] {
        self.entry(graph, node).neighbors
    }

    /// Drop every entry and size the cache for a graph of `node_count` nodes.
    pub fn reset(&mut self, node_count: usize) {
        self.entries.clear();
        self.entries.resize(node_count, None);
        self.hits = 0;
        self.misses = 0;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Number of nodes currently memoized.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
