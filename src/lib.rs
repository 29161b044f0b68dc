//! # rapid-pagerank
//!
//! PageRank estimation for directed link graphs.
//!
//! Two estimators share one graph representation and one result type:
//!
//! - [`StochasticPageRank`]: simulates many random walks and reports visit
//!   frequencies. Seeded runs are reproducible, and the parallel runner
//!   produces the same output as the sequential one.
//! - [`DistributionPageRank`]: propagates a probability distribution until
//!   a fixed iteration count or a tolerance is reached.
//!
//! Sinks (nodes without out-links) redistribute uniformly over all nodes in
//! both estimators. No damping factor is applied.
//!
//! ## Quick start
//!
//! ```rust
//! use rapid_pagerank::{CsrGraph, DistributionPageRank};
//!
//! let graph = CsrGraph::from_edges(vec![("a", "b"), ("b", "c"), ("c", "a")]);
//! let result = DistributionPageRank::new()
//!     .with_tolerance(1e-10)
//!     .run(&graph)
//!     .unwrap();
//!
//! for (node, score) in result.top_n(3) {
//!     assert!((score - 1.0 / 3.0).abs() < 1e-9, "{node}");
//! }
//! ```
//!
//! Runs can also be described by a JSON [`RankSpec`] and executed through
//! [`pipeline::runner::rank`], which validates it first.

/// Enter a tracing span for an estimation stage (when the `tracing` feature
/// is enabled). When disabled, this is a no-op and the compiler eliminates it.
macro_rules! trace_stage {
    ($name:expr) => {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("estimation_stage", stage = $name).entered();
    };
}

pub mod edgelist;
pub mod errors;
pub mod graph;
pub mod pagerank;
pub mod pipeline;

pub use errors::{ErrorCode, RankError, Result, SpecError};
pub use graph::{CsrGraph, GraphBuilder, GraphStats, NodeKey};
pub use pagerank::{
    ConvergenceConfig, DistanceMetric, DistributionPageRank, Estimator, NonConvergenceWarning,
    PageRankResult, RankVector, StochasticPageRank,
};
pub use pipeline::{Progress, ProgressReporter, RankSpec};
