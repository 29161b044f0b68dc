//! PageRank estimators
//!
//! This module provides the stochastic (random walk) and distribution
//! (probability propagation) estimators together with the shared
//! convergence policy and sampling cache they rely on.

pub mod convergence;
pub mod distribution;
pub mod sampling_cache;
pub mod stochastic;

use std::cmp::Ordering;

use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::graph::{CsrGraph, NodeKey};
use crate::pipeline::observer::ProgressReporter;

pub use convergence::{
    ConvergenceConfig, ConvergenceController, ConvergenceState, DistanceMetric,
    NonConvergenceWarning, StopReason,
};
pub use distribution::DistributionPageRank;
pub use sampling_cache::{SampleCacheEntry, SamplingCache};
pub use stochastic::StochasticPageRank;

/// A probability distribution over the nodes of a graph
///
/// Entries are stored in node-ID order of the graph they were computed on.
#[derive(Debug, Clone, PartialEq)]
pub struct RankVector<N> {
    nodes: Vec<N>,
    scores: Vec<f64>,
}

impl<N: NodeKey> RankVector<N> {
    /// Pair the graph's nodes with per-node scores (indexed by node ID)
    pub fn from_scores(graph: &CsrGraph<N>, scores: Vec<f64>) -> Self {
        debug_assert_eq!(graph.node_count(), scores.len());
        Self {
            nodes: graph.nodes().to_vec(),
            scores,
        }
    }

    /// Score of a node (linear search - use sparingly)
    pub fn get(&self, node: &N) -> Option<f64> {
        self.nodes
            .iter()
            .position(|n| n == node)
            .map(|i| self.scores[i])
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    /// Scores indexed by node ID
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn iter(&self) -> impl Iterator<Item = (&N, f64)> + '_ {
        self.nodes.iter().zip(self.scores.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Total mass; 1.0 up to floating point error for estimator output
    pub fn sum(&self) -> f64 {
        self.scores.iter().sum()
    }

    /// All nodes by descending score; ties keep node-ID order
    pub fn sorted(&self) -> Vec<(&N, f64)> {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        pairs
    }

    /// Get top N nodes by score
    pub fn top_n(&self, n: usize) -> Vec<(&N, f64)> {
        let mut sorted = self.sorted();
        sorted.truncate(n);
        sorted
    }

    pub fn into_map(self) -> FxHashMap<N, f64> {
        self.nodes.into_iter().zip(self.scores).collect()
    }

    /// L1 distance to another vector over the same graph
    pub fn l1_distance(&self, other: &Self) -> f64 {
        DistanceMetric::L1.distance(&self.scores, &other.scores)
    }

    /// Largest per-node difference to another vector over the same graph
    pub fn max_distance(&self, other: &Self) -> f64 {
        DistanceMetric::Max.distance(&self.scores, &other.scores)
    }
}

/// Result of a PageRank estimation
#[derive(Debug, Clone)]
pub struct PageRankResult<N> {
    /// Final rank vector
    pub ranks: RankVector<N>,
    /// Iterations performed (distribution) or walks completed (stochastic)
    pub iterations: usize,
    /// Final convergence delta (0.0 for the stochastic estimator)
    pub delta: f64,
    /// False only when tolerance mode ran into its iteration ceiling
    pub converged: bool,
    /// Set when `converged` is false
    pub warning: Option<NonConvergenceWarning>,
}

impl<N: NodeKey> PageRankResult<N> {
    pub(crate) fn settled(ranks: RankVector<N>, iterations: usize, delta: f64) -> Self {
        Self {
            ranks,
            iterations,
            delta,
            converged: true,
            warning: None,
        }
    }

    /// Get the score for a specific node
    pub fn score(&self, node: &N) -> Option<f64> {
        self.ranks.get(node)
    }

    /// Get top N nodes by score
    pub fn top_n(&self, n: usize) -> Vec<(&N, f64)> {
        self.ranks.top_n(n)
    }
}

/// Common interface of both estimators
pub trait Estimator {
    /// Estimate ranks for every node of `graph`, reporting progress to
    /// `reporter`. The reporter never influences the result.
    fn estimate<N: NodeKey + Send + Sync>(
        &self,
        graph: &CsrGraph<N>,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<PageRankResult<N>>;
}
