//! Rank specification types.
//!
//! A [`RankSpec`] selects the estimator and its parameters. It is the input
//! to the [`super::validation::ValidationEngine`] and to
//! [`super::runner::rank`].
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "algorithm": "distribution",
//!   "convergence_mode": "tolerance",
//!   "epsilon": 1e-8,
//!   "max_iterations": 500
//! }
//! ```
//!
//! ```json
//! {
//!   "algorithm": "stochastic",
//!   "num_walks": 10000,
//!   "walk_length": 100,
//!   "rng_seed": 42,
//!   "parallel": true
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::pagerank::convergence::{
    ConvergenceConfig, DistanceMetric, DEFAULT_ITERATION_CEILING, DEFAULT_MAX_ITERATIONS,
};
use crate::pagerank::{DistributionPageRank, StochasticPageRank};

/// Which estimator to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Random-walk sampling.
    #[default]
    Stochastic,
    /// Iterative probability propagation.
    Distribution,
}

impl Algorithm {
    /// Returns the user-facing name used in JSON and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stochastic => "stochastic",
            Self::Distribution => "distribution",
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "stochastic" | "random_walk" | "walk" => Ok(Self::Stochastic),
            "distribution" | "power" | "power_iteration" => Ok(Self::Distribution),
            other => Err(format!("unknown algorithm \"{other}\"")),
        }
    }
}

/// Stop policy of the distribution estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceMode {
    /// A fixed number of iterations.
    #[default]
    Fixed,
    /// Stop once successive vectors are within `epsilon`.
    Tolerance,
}

fn default_num_walks() -> usize {
    1_000
}

fn default_walk_length() -> usize {
    1_000
}

/// Estimator selection and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankSpec {
    #[serde(default)]
    pub algorithm: Algorithm,

    /// Stochastic: number of walks.
    #[serde(default = "default_num_walks")]
    pub num_walks: usize,

    /// Stochastic: steps per walk after the starting node.
    #[serde(default = "default_walk_length")]
    pub walk_length: usize,

    /// Distribution: stop policy.
    #[serde(default)]
    pub convergence_mode: ConvergenceMode,

    /// Distribution: iteration count in fixed mode, ceiling in tolerance
    /// mode. Defaults to 100 and 10 000 respectively.
    #[serde(default)]
    pub max_iterations: Option<usize>,

    /// Distribution: tolerance, required in tolerance mode.
    #[serde(default)]
    pub epsilon: Option<f64>,

    /// Distribution: distance between successive vectors.
    #[serde(default)]
    pub metric: DistanceMetric,

    /// Stochastic: seed for reproducible runs.
    #[serde(default)]
    pub rng_seed: Option<u64>,

    /// Stochastic: spread walks over the rayon pool.
    #[serde(default)]
    pub parallel: bool,

    /// If `true`, unrecognized fields are errors; if `false`, warnings.
    #[serde(default)]
    pub strict: bool,

    /// Captures any fields not recognized by the schema.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl Default for RankSpec {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            num_walks: default_num_walks(),
            walk_length: default_walk_length(),
            convergence_mode: ConvergenceMode::default(),
            max_iterations: None,
            epsilon: None,
            metric: DistanceMetric::default(),
            rng_seed: None,
            parallel: false,
            strict: false,
            unknown_fields: HashMap::new(),
        }
    }
}

impl RankSpec {
    /// Parse a spec from JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// The convergence policy this spec describes.
    ///
    /// A missing epsilon in tolerance mode maps to NaN, which
    /// [`ConvergenceConfig::validate`] rejects; run the validation engine
    /// first for a readable diagnostic.
    pub fn convergence(&self) -> ConvergenceConfig {
        match self.convergence_mode {
            ConvergenceMode::Fixed => {
                ConvergenceConfig::fixed(self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS))
            }
            ConvergenceMode::Tolerance => ConvergenceConfig::Tolerance {
                epsilon: self.epsilon.unwrap_or(f64::NAN),
                metric: self.metric,
                ceiling: self.max_iterations.unwrap_or(DEFAULT_ITERATION_CEILING),
            },
        }
    }

    pub fn stochastic(&self) -> StochasticPageRank {
        StochasticPageRank {
            num_walks: self.num_walks,
            walk_length: self.walk_length,
            seed: self.rng_seed,
        }
    }

    pub fn distribution(&self) -> DistributionPageRank {
        DistributionPageRank::new().with_convergence(self.convergence())
    }
}
