//! Stochastic PageRank (random walk sampling)
//!
//! Visit frequencies of many short random walks approximate the stationary
//! distribution. A walker on a sink jumps to a uniformly random node, which
//! keeps it from getting trapped.
//!
//! Walks are grouped into chunks of [`WALKS_PER_CHUNK`]. Chunk `k` draws its
//! randomness from ChaCha8 stream `k` of the run seed, so the output depends
//! only on the graph, the walk parameters and the seed: sequential and
//! parallel runs agree exactly.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::sampling_cache::SamplingCache;
use super::{Estimator, PageRankResult, RankVector};
use crate::errors::{ErrorCode, RankError, Result, SpecError};
use crate::graph::{CsrGraph, NodeKey};
use crate::pipeline::observer::{NoopReporter, Progress, ProgressReporter};

/// Walks simulated per RNG stream (and per progress report).
pub const WALKS_PER_CHUNK: usize = 1024;

/// Random-walk PageRank estimator
#[derive(Debug, Clone)]
pub struct StochasticPageRank {
    /// Number of independent walks
    pub num_walks: usize,
    /// Steps taken after the starting node of each walk
    pub walk_length: usize,
    /// Seed for reproducible runs; drawn from the thread RNG when unset
    pub seed: Option<u64>,
}

impl Default for StochasticPageRank {
    fn default() -> Self {
        Self {
            num_walks: 1_000,
            walk_length: 1_000,
            seed: None,
        }
    }
}

impl StochasticPageRank {
    /// Create a new StochasticPageRank with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_walks(mut self, num_walks: usize) -> Self {
        self.num_walks = num_walks;
        self
    }

    pub fn with_walk_length(mut self, walk_length: usize) -> Self {
        self.walk_length = walk_length;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run the walks without progress reporting
    pub fn run<N: NodeKey>(&self, graph: &CsrGraph<N>) -> Result<PageRankResult<N>> {
        self.run_with_progress(graph, &mut NoopReporter)
    }

    /// Run the walks on the current thread, reporting after every chunk
    pub fn run_with_progress<N: NodeKey>(
        &self,
        graph: &CsrGraph<N>,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<PageRankResult<N>> {
        self.validate(graph)?;
        if graph.node_count() == 1 {
            return Ok(self.single_node(graph));
        }

        trace_stage!("stochastic_pagerank");
        let seed = self.resolve_seed();
        let mut tallies = vec![0u64; graph.node_count()];
        let mut cache = SamplingCache::for_graph(graph);
        let mut completed = 0;

        for (chunk, walks) in self.chunks().enumerate() {
            let mut rng = chunk_rng(seed, chunk);
            walk_chunk(graph, &mut cache, &mut rng, walks, self.walk_length, &mut tallies);
            completed += walks;

            #[cfg(feature = "tracing")]
            tracing::trace!(chunk, completed, total = self.num_walks, "walk chunk finished");

            reporter.report(Progress::Walks {
                completed,
                total: self.num_walks,
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            walks = self.num_walks,
            cache_hits = cache.hits(),
            cache_misses = cache.misses(),
            "stochastic estimation finished"
        );

        Ok(self.finish(graph, &tallies))
    }

    /// Run the chunks on the rayon pool
    ///
    /// Each chunk owns its tally buffer, sampling cache and RNG stream; the
    /// buffers are summed in a reduction step. The result is identical to
    /// [`StochasticPageRank::run_with_progress`] for the same seed. Progress
    /// is reported once, when all walks are done.
    pub fn run_parallel<N: NodeKey + Sync>(
        &self,
        graph: &CsrGraph<N>,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<PageRankResult<N>> {
        self.validate(graph)?;
        if graph.node_count() == 1 {
            return Ok(self.single_node(graph));
        }

        trace_stage!("stochastic_pagerank_parallel");
        let seed = self.resolve_seed();
        let n = graph.node_count();
        let chunks: Vec<(usize, usize)> = self.chunks().enumerate().collect();

        let tallies = chunks
            .par_iter()
            .map(|&(chunk, walks)| {
                let mut tallies = vec![0u64; n];
                let mut cache = SamplingCache::for_graph(graph);
                let mut rng = chunk_rng(seed, chunk);
                walk_chunk(graph, &mut cache, &mut rng, walks, self.walk_length, &mut tallies);
                tallies
            })
            .reduce(
                || vec![0u64; n],
                |mut acc, part| {
                    for (a, p) in acc.iter_mut().zip(part) {
                        *a += p;
                    }
                    acc
                },
            );

        reporter.report(Progress::Walks {
            completed: self.num_walks,
            total: self.num_walks,
        });

        Ok(self.finish(graph, &tallies))
    }

    fn validate<N: NodeKey>(&self, graph: &CsrGraph<N>) -> Result<()> {
        if self.num_walks == 0 {
            return Err(RankError::InvalidConfig(
                SpecError::new(ErrorCode::InvalidValue, "/num_walks", "num_walks must be greater than 0")
                    .with_hint("Use at least one walk"),
            ));
        }
        if self.walk_length == 0 {
            return Err(RankError::InvalidConfig(
                SpecError::new(
                    ErrorCode::InvalidValue,
                    "/walk_length",
                    "walk_length must be greater than 0",
                )
                .with_hint("Use at least one step per walk"),
            ));
        }
        if graph.is_empty() {
            return Err(RankError::EmptyGraph);
        }
        Ok(())
    }

    fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::rng().random())
    }

    /// Walk counts per chunk, in chunk order
    fn chunks(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_walks)
            .step_by(WALKS_PER_CHUNK)
            .map(move |start| WALKS_PER_CHUNK.min(self.num_walks - start))
    }

    /// Every walk would stay on the only node
    fn single_node<N: NodeKey>(&self, graph: &CsrGraph<N>) -> PageRankResult<N> {
        PageRankResult::settled(
            RankVector::from_scores(graph, vec![1.0]),
            self.num_walks,
            0.0,
        )
    }

    fn finish<N: NodeKey>(&self, graph: &CsrGraph<N>, tallies: &[u64]) -> PageRankResult<N> {
        let total: u64 = tallies.iter().sum();
        let scores = tallies
            .iter()
            .map(|&t| t as f64 / total as f64)
            .collect();
        PageRankResult::settled(RankVector::from_scores(graph, scores), self.num_walks, 0.0)
    }
}

impl Estimator for StochasticPageRank {
    fn estimate<N: NodeKey + Send + Sync>(
        &self,
        graph: &CsrGraph<N>,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<PageRankResult<N>> {
        self.run_with_progress(graph, reporter)
    }
}

fn chunk_rng(seed: u64, chunk: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(chunk as u64);
    rng
}

/// Simulate `walks` walks, adding every visited node to `tallies`
fn walk_chunk<'g, N: NodeKey>(
    graph: &'g CsrGraph<N>,
    cache: &mut SamplingCache<'g>,
    rng: &mut ChaCha8Rng,
    walks: usize,
    walk_length: usize,
    tallies: &mut [u64],
) {
    let n = graph.node_count();

    for _ in 0..walks {
        let mut current = rng.random_range(0..n) as u32;
        tallies[current as usize] += 1;

        for _ in 0..walk_length {
            let neighbors = cache.neighbors_of(graph, current);
            current = if neighbors.is_empty() {
                rng.random_range(0..n) as u32
            } else {
                neighbors[rng.random_range(0..neighbors.len())]
            };
            tallies[current as usize] += 1;
        }
    }
}
