//! Distribution PageRank (probability propagation)
//!
//! Starts from the uniform distribution and repeatedly pushes every node's
//! probability along its out-edges. Sinks have nowhere to push, so their
//! combined mass is spread uniformly over all nodes each iteration; without
//! that the total would leak away. No damping factor is applied.

use super::convergence::{ConvergenceConfig, ConvergenceController, DistanceMetric};
use super::{Estimator, PageRankResult, RankVector};
use crate::errors::{RankError, Result};
use crate::graph::{CsrGraph, NodeKey};
use crate::pipeline::observer::{NoopReporter, Progress, ProgressReporter};

/// Renormalize once the total drifts further than this from 1.0
const NORMALIZATION_DRIFT: f64 = 1e-12;

/// Power-iteration PageRank estimator
#[derive(Debug, Clone, Default)]
pub struct DistributionPageRank {
    /// Stop policy
    pub convergence: ConvergenceConfig,
}

impl DistributionPageRank {
    /// Create a new DistributionPageRank (100 fixed iterations)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_convergence(mut self, convergence: ConvergenceConfig) -> Self {
        self.convergence = convergence;
        self
    }

    /// Run exactly `max_iterations` iterations
    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        self.with_convergence(ConvergenceConfig::fixed(max_iterations))
    }

    /// Run until the L1 change between iterations is at most `epsilon`
    pub fn with_tolerance(self, epsilon: f64) -> Self {
        self.with_convergence(ConvergenceConfig::tolerance(epsilon))
    }

    /// Run without progress reporting
    pub fn run<N: NodeKey>(&self, graph: &CsrGraph<N>) -> Result<PageRankResult<N>> {
        self.run_with_progress(graph, &mut NoopReporter)
    }

    /// Run, reporting once per iteration
    ///
    /// Returns the last vector even when tolerance mode gives up at its
    /// ceiling; in that case `converged` is false and `warning` is set.
    pub fn run_with_progress<N: NodeKey>(
        &self,
        graph: &CsrGraph<N>,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<PageRankResult<N>> {
        self.convergence.validate()?;
        let n = graph.node_count();
        if n == 0 {
            return Err(RankError::EmptyGraph);
        }
        if n == 1 {
            return Ok(PageRankResult::settled(
                RankVector::from_scores(graph, vec![1.0]),
                0,
                0.0,
            ));
        }

        trace_stage!("distribution_pagerank");
        let dangling = graph.dangling_nodes();
        let cap = self.convergence.iteration_cap();
        let mut controller = ConvergenceController::new(self.convergence);
        let mut scores = vec![1.0 / n as f64; n];
        let mut next = vec![0.0; n];

        let reason = loop {
            propagate(graph, &dangling, &scores, &mut next);
            let reason = controller.observe(&scores, &next);
            let state = controller.state();

            #[cfg(feature = "tracing")]
            tracing::trace!(iteration = state.iteration, delta = state.delta, "distribution iteration");

            reporter.report(Progress::Iteration {
                iteration: state.iteration,
                delta: state.delta,
                cap,
            });

            std::mem::swap(&mut scores, &mut next);
            if let Some(reason) = reason {
                break reason;
            }
        };

        let state = controller.state();
        let warning = controller.warning(reason);
        #[cfg(feature = "tracing")]
        if let Some(warning) = &warning {
            tracing::warn!(
                iterations = warning.iterations,
                delta = warning.delta,
                epsilon = warning.epsilon,
                "distribution pagerank did not converge"
            );
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            iterations = state.iteration,
            delta = state.delta,
            ?reason,
            "distribution estimation finished"
        );

        Ok(PageRankResult {
            ranks: RankVector::from_scores(graph, scores),
            iterations: state.iteration,
            delta: state.delta,
            converged: warning.is_none(),
            warning,
        })
    }

    /// One propagation step from `scores`, returning the next vector
    ///
    /// Total mass is preserved: a vector summing to 1.0 maps to a vector
    /// summing to 1.0.
    ///
    /// # Panics
    ///
    /// If `scores` does not hold exactly one entry per node of `graph`.
    pub fn step<N: NodeKey>(graph: &CsrGraph<N>, scores: &[f64]) -> Vec<f64> {
        assert_eq!(
            scores.len(),
            graph.node_count(),
            "score vector length must equal the graph's node count"
        );
        let mut next = vec![0.0; scores.len()];
        propagate(graph, &graph.dangling_nodes(), scores, &mut next);
        next
    }

    /// L1 change a further step would make to `result`
    ///
    /// # Panics
    ///
    /// If `result` was computed on a graph with a different node count.
    pub fn residual<N: NodeKey>(graph: &CsrGraph<N>, result: &PageRankResult<N>) -> f64 {
        let scores = result.ranks.scores();
        DistanceMetric::L1.distance(scores, &Self::step(graph, scores))
    }
}

impl Estimator for DistributionPageRank {
    fn estimate<N: NodeKey + Send + Sync>(
        &self,
        graph: &CsrGraph<N>,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<PageRankResult<N>> {
        self.run_with_progress(graph, reporter)
    }
}

fn propagate<N: NodeKey>(graph: &CsrGraph<N>, dangling: &[u32], scores: &[f64], next: &mut [f64]) {
    let n = scores.len();
    let sink_mass: f64 = dangling.iter().map(|&d| scores[d as usize]).sum();
    next.fill(sink_mass / n as f64);

    for (node, &score) in scores.iter().enumerate() {
        let neighbors = graph.neighbors(node as u32);
        if neighbors.is_empty() {
            continue;
        }
        let share = score / neighbors.len() as f64;
        for &target in neighbors {
            next[target as usize] += share;
        }
    }

    let sum: f64 = next.iter().sum();
    if sum > 0.0 && (sum - 1.0).abs() > NORMALIZATION_DRIFT {
        for score in next.iter_mut() {
            *score /= sum;
        }
    }
}
