//! Spec runner: validates a [`RankSpec`] and dispatches to the estimator it
//! selects.
//!
//! # Example
//!
//! ```rust,ignore
//! use rapid_pagerank::graph::CsrGraph;
//! use rapid_pagerank::pipeline::observer::NoopReporter;
//! use rapid_pagerank::pipeline::runner::rank;
//! use rapid_pagerank::pipeline::spec::RankSpec;
//!
//! let graph = CsrGraph::from_edges(vec![("a", "b"), ("b", "a")]);
//! let spec = RankSpec::from_json(r#"{ "algorithm": "distribution" }"#)?;
//! let result = rank(&graph, &spec, &mut NoopReporter)?;
//! ```

use super::observer::ProgressReporter;
use super::spec::{Algorithm, RankSpec};
use super::validation::ValidationEngine;
use crate::errors::{RankError, Result};
use crate::graph::{CsrGraph, NodeKey};
use crate::pagerank::{DistributionPageRank, Estimator, PageRankResult, StochasticPageRank};

/// An estimator chosen at runtime from a [`RankSpec`].
#[derive(Debug, Clone)]
pub enum ConfiguredEstimator {
    Stochastic {
        estimator: StochasticPageRank,
        parallel: bool,
    },
    Distribution(DistributionPageRank),
}

impl ConfiguredEstimator {
    /// Build the estimator a spec describes, without validating it.
    pub fn from_spec(spec: &RankSpec) -> Self {
        match spec.algorithm {
            Algorithm::Stochastic => Self::Stochastic {
                estimator: spec.stochastic(),
                parallel: spec.parallel,
            },
            Algorithm::Distribution => Self::Distribution(spec.distribution()),
        }
    }

    /// Title for progress displays.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Stochastic { .. } => "Stochastic PageRank",
            Self::Distribution(_) => "Distribution PageRank",
        }
    }
}

impl Estimator for ConfiguredEstimator {
    fn estimate<N: NodeKey + Send + Sync>(
        &self,
        graph: &CsrGraph<N>,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<PageRankResult<N>> {
        match self {
            Self::Stochastic {
                estimator,
                parallel: true,
            } => estimator.run_parallel(graph, reporter),
            Self::Stochastic { estimator, .. } => estimator.run_with_progress(graph, reporter),
            Self::Distribution(estimator) => estimator.run_with_progress(graph, reporter),
        }
    }
}

/// Validate `spec` with the default rules, then build its estimator.
///
/// Errors are collected into [`RankError::InvalidSpec`]; warnings are
/// logged and otherwise ignored.
pub fn configure(spec: &RankSpec) -> Result<ConfiguredEstimator> {
    let report = ValidationEngine::with_defaults().validate(spec);

    #[cfg(feature = "tracing")]
    for warning in report.warnings() {
        tracing::warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
    }

    if report.has_errors() {
        return Err(RankError::InvalidSpec(report.into_errors()));
    }
    Ok(ConfiguredEstimator::from_spec(spec))
}

/// Validate `spec` and estimate the ranks of `graph` with the estimator it
/// selects.
pub fn rank<N: NodeKey + Send + Sync>(
    graph: &CsrGraph<N>,
    spec: &RankSpec,
    reporter: &mut dyn ProgressReporter,
) -> Result<PageRankResult<N>> {
    let estimator = configure(spec)?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        algorithm = spec.algorithm.as_str(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "estimating pagerank"
    );

    estimator.estimate(graph, reporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::pipeline::observer::{NoopReporter, Progress, ProgressLog};

    fn cycle() -> CsrGraph<u32> {
        CsrGraph::from_edges(vec![(1, 2), (2, 3), (3, 1)])
    }

    fn spec(json: &str) -> RankSpec {
        RankSpec::from_json(json).unwrap()
    }

    #[test]
    fn test_from_spec_selects_estimator() {
        let sto = ConfiguredEstimator::from_spec(&spec(r#"{ "parallel": true }"#));
        assert!(matches!(sto, ConfiguredEstimator::Stochastic { parallel: true, .. }));
        assert_eq!(sto.title(), "Stochastic PageRank");

        let dist = ConfiguredEstimator::from_spec(&spec(r#"{ "algorithm": "distribution" }"#));
        assert!(matches!(dist, ConfiguredEstimator::Distribution(_)));
    }

    #[test]
    fn test_rank_distribution() {
        let result = rank(
            &cycle(),
            &spec(r#"{ "algorithm": "distribution", "convergence_mode": "tolerance", "epsilon": 1e-10 }"#),
            &mut NoopReporter,
        )
        .unwrap();

        assert!(result.converged);
        for (_, score) in result.ranks.iter() {
            assert!((score - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rank_stochastic_reports_walks() {
        let mut log = ProgressLog::default();
        let result = rank(
            &cycle(),
            &spec(r#"{ "num_walks": 50, "walk_length": 20, "rng_seed": 5 }"#),
            &mut log,
        )
        .unwrap();

        assert_eq!(result.iterations, 50);
        assert!((result.ranks.sum() - 1.0).abs() < 1e-9);
        assert_eq!(
            log.events.last(),
            Some(&Progress::Walks {
                completed: 50,
                total: 50
            })
        );
    }

    #[test]
    fn test_parallel_spec_matches_sequential() {
        let g = cycle();
        let seq = rank(
            &g,
            &spec(r#"{ "num_walks": 3000, "walk_length": 10, "rng_seed": 11 }"#),
            &mut NoopReporter,
        )
        .unwrap();
        let par = rank(
            &g,
            &spec(r#"{ "num_walks": 3000, "walk_length": 10, "rng_seed": 11, "parallel": true }"#),
            &mut NoopReporter,
        )
        .unwrap();

        assert_eq!(seq.ranks, par.ranks);
    }

    #[test]
    fn test_invalid_spec_collects_all_errors() {
        let err = rank(
            &cycle(),
            &spec(r#"{ "num_walks": 0, "walk_length": 0 }"#),
            &mut NoopReporter,
        )
        .unwrap_err();

        match err {
            RankError::InvalidSpec(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.iter().all(|e| e.code == ErrorCode::InvalidValue));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_warnings_do_not_block() {
        let result = rank(
            &cycle(),
            &spec(r#"{ "algorithm": "distribution", "rng_seed": 1, "colour": "red" }"#),
            &mut NoopReporter,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_empty_graph_passes_through() {
        let g: CsrGraph<u32> = CsrGraph::default();
        let err = rank(&g, &RankSpec::default(), &mut NoopReporter).unwrap_err();
        assert!(matches!(err, RankError::EmptyGraph));
    }
}
