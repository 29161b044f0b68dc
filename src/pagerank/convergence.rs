//! Stop policy for iterative estimation.
//!
//! [`ConvergenceConfig`] is a tagged variant: either a fixed iteration count
//! or a tolerance on the distance between successive rank vectors. The
//! [`ConvergenceController`] owns the running [`ConvergenceState`] and turns
//! each new vector into a stop decision.
//!
//! Tolerance mode always carries a hard iteration ceiling. Hitting it is not
//! an error: the estimator returns its last vector together with a
//! [`NonConvergenceWarning`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorCode, RankError, Result, SpecError};

/// Iteration ceiling applied in tolerance mode when none is configured.
pub const DEFAULT_ITERATION_CEILING: usize = 10_000;

/// Iteration count used when fixed mode is selected without a count.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Distance between two aligned rank vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Sum of absolute differences.
    #[default]
    L1,
    /// Largest absolute difference.
    Max,
}

impl DistanceMetric {
    pub fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        let diffs = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs());
        match self {
            Self::L1 => diffs.sum(),
            Self::Max => diffs.fold(0.0, f64::max),
        }
    }
}

fn default_ceiling() -> usize {
    DEFAULT_ITERATION_CEILING
}

/// When to stop iterating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConvergenceConfig {
    /// Run exactly `max_iterations` iterations.
    Fixed { max_iterations: usize },
    /// Run until successive vectors are within `epsilon` of each other, or
    /// until `ceiling` iterations have been spent.
    Tolerance {
        epsilon: f64,
        #[serde(default)]
        metric: DistanceMetric,
        #[serde(default = "default_ceiling")]
        ceiling: usize,
    },
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self::fixed(DEFAULT_MAX_ITERATIONS)
    }
}

impl ConvergenceConfig {
    pub fn fixed(max_iterations: usize) -> Self {
        Self::Fixed { max_iterations }
    }

    /// Tolerance mode with the L1 metric and the default ceiling.
    pub fn tolerance(epsilon: f64) -> Self {
        Self::Tolerance {
            epsilon,
            metric: DistanceMetric::L1,
            ceiling: DEFAULT_ITERATION_CEILING,
        }
    }

    /// Replace the metric (tolerance mode only; fixed mode is unchanged).
    pub fn with_metric(self, metric: DistanceMetric) -> Self {
        match self {
            Self::Tolerance {
                epsilon, ceiling, ..
            } => Self::Tolerance {
                epsilon,
                metric,
                ceiling,
            },
            fixed => fixed,
        }
    }

    /// Replace the hard ceiling (tolerance mode only).
    pub fn with_ceiling(self, ceiling: usize) -> Self {
        match self {
            Self::Tolerance {
                epsilon, metric, ..
            } => Self::Tolerance {
                epsilon,
                metric,
                ceiling,
            },
            fixed => fixed,
        }
    }

    /// The most iterations this policy will ever allow.
    pub fn iteration_cap(&self) -> usize {
        match *self {
            Self::Fixed { max_iterations } => max_iterations,
            Self::Tolerance { ceiling, .. } => ceiling,
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        match *self {
            Self::Fixed { .. } => DistanceMetric::L1,
            Self::Tolerance { metric, .. } => metric,
        }
    }

    /// Reject configurations that could never stop or never run.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Fixed { max_iterations } if max_iterations == 0 => {
                Err(RankError::InvalidConfig(
                    SpecError::new(
                        ErrorCode::InvalidValue,
                        "/max_iterations",
                        "max_iterations must be greater than 0",
                    )
                    .with_hint("Use at least one iteration"),
                ))
            }
            Self::Tolerance { epsilon, .. } if !(epsilon.is_finite() && epsilon > 0.0) => {
                Err(RankError::InvalidConfig(SpecError::new(
                    ErrorCode::InvalidValue,
                    "/epsilon",
                    format!("epsilon must be a positive finite number, got {epsilon}"),
                )))
            }
            Self::Tolerance { ceiling, .. } if ceiling == 0 => {
                Err(RankError::InvalidConfig(SpecError::new(
                    ErrorCode::InvalidValue,
                    "/max_iterations",
                    "iteration ceiling must be greater than 0",
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Why iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Fixed mode ran its configured number of iterations.
    IterationLimit,
    /// Tolerance mode met its epsilon.
    Converged,
    /// Tolerance mode ran into the hard ceiling without meeting epsilon.
    Ceiling,
}

/// Tolerance mode gave up at its ceiling. The accompanying vector is the
/// last one computed and is still a valid distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NonConvergenceWarning {
    pub iterations: usize,
    pub delta: f64,
    pub epsilon: f64,
}

impl fmt::Display for NonConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "did not converge after {} iterations (delta {:.3e} > epsilon {:.3e})",
            self.iterations, self.delta, self.epsilon
        )
    }
}

/// Iteration count and most recent delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceState {
    pub iteration: usize,
    pub delta: f64,
}

impl Default for ConvergenceState {
    fn default() -> Self {
        Self {
            iteration: 0,
            delta: f64::INFINITY,
        }
    }
}

/// Applies a [`ConvergenceConfig`] to a sequence of rank vectors.
#[derive(Debug, Clone)]
pub struct ConvergenceController {
    config: ConvergenceConfig,
    state: ConvergenceState,
}

impl ConvergenceController {
    pub fn new(config: ConvergenceConfig) -> Self {
        Self {
            config,
            state: ConvergenceState::default(),
        }
    }

    pub fn config(&self) -> &ConvergenceConfig {
        &self.config
    }

    pub fn state(&self) -> ConvergenceState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = ConvergenceState::default();
    }

    /// Whether `current`, produced by iteration number `iteration`
    /// (1-based), ends the run.
    pub fn should_stop(&self, previous: &[f64], current: &[f64], iteration: usize) -> bool {
        self.stop_reason(previous, current, iteration).is_some()
    }

    pub fn stop_reason(
        &self,
        previous: &[f64],
        current: &[f64],
        iteration: usize,
    ) -> Option<StopReason> {
        let delta = self.config.metric().distance(previous, current);
        self.decide(delta, iteration)
    }

    /// Record one more iteration and decide whether to stop.
    pub fn observe(&mut self, previous: &[f64], current: &[f64]) -> Option<StopReason> {
        self.state.iteration += 1;
        self.state.delta = self.config.metric().distance(previous, current);
        self.decide(self.state.delta, self.state.iteration)
    }

    /// The warning to surface for a given stop reason, if any.
    pub fn warning(&self, reason: StopReason) -> Option<NonConvergenceWarning> {
        match (reason, self.config) {
            (StopReason::Ceiling, ConvergenceConfig::Tolerance { epsilon, .. }) => {
                Some(NonConvergenceWarning {
                    iterations: self.state.iteration,
                    delta: self.state.delta,
                    epsilon,
                })
            }
            _ => None,
        }
    }

    fn decide(&self, delta: f64, iteration: usize) -> Option<StopReason> {
        match self.config {
            ConvergenceConfig::Fixed { max_iterations } => {
                (iteration >= max_iterations).then_some(StopReason::IterationLimit)
            }
            ConvergenceConfig::Tolerance {
                epsilon, ceiling, ..
            } => {
                if delta <= epsilon {
                    Some(StopReason::Converged)
                } else if iteration >= ceiling {
                    Some(StopReason::Ceiling)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let a = [0.5, 0.25, 0.25];
        let b = [0.4, 0.35, 0.25];
        assert!((DistanceMetric::L1.distance(&a, &b) - 0.2).abs() < 1e-12);
        assert!((DistanceMetric::Max.distance(&a, &b) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_fixed_mode_stops_at_count() {
        let ctl = ConvergenceController::new(ConvergenceConfig::fixed(3));
        let v = [1.0];
        assert!(!ctl.should_stop(&v, &v, 1));
        assert!(!ctl.should_stop(&v, &v, 2));
        assert!(ctl.should_stop(&v, &v, 3));
        assert!(ctl.should_stop(&v, &v, 4));
    }

    #[test]
    fn test_fixed_mode_ignores_delta() {
        let ctl = ConvergenceController::new(ConvergenceConfig::fixed(10));
        assert!(!ctl.should_stop(&[0.5, 0.5], &[0.5, 0.5], 1));
    }

    #[test]
    fn test_tolerance_mode_stops_within_epsilon() {
        let ctl = ConvergenceController::new(ConvergenceConfig::tolerance(1e-3));
        assert!(!ctl.should_stop(&[0.5, 0.5], &[0.6, 0.4], 1));
        assert_eq!(
            ctl.stop_reason(&[0.5, 0.5], &[0.5004, 0.4996], 1),
            Some(StopReason::Converged)
        );
    }

    #[test]
    fn test_tolerance_mode_hits_ceiling_with_warning() {
        let config = ConvergenceConfig::tolerance(1e-12).with_ceiling(2);
        let mut ctl = ConvergenceController::new(config);

        assert_eq!(ctl.observe(&[1.0, 0.0], &[0.0, 1.0]), None);
        let reason = ctl.observe(&[0.0, 1.0], &[1.0, 0.0]);
        assert_eq!(reason, Some(StopReason::Ceiling));

        let warning = ctl.warning(StopReason::Ceiling).unwrap();
        assert_eq!(warning.iterations, 2);
        assert!((warning.delta - 2.0).abs() < 1e-12);
        assert!(warning.to_string().contains("did not converge after 2 iterations"));
    }

    #[test]
    fn test_no_warning_for_regular_stops() {
        let ctl = ConvergenceController::new(ConvergenceConfig::fixed(1));
        assert!(ctl.warning(StopReason::IterationLimit).is_none());
        assert!(ctl.warning(StopReason::Converged).is_none());
    }

    #[test]
    fn test_observe_tracks_state_and_reset() {
        let mut ctl = ConvergenceController::new(ConvergenceConfig::fixed(5));
        ctl.observe(&[0.5, 0.5], &[0.25, 0.75]);
        assert_eq!(ctl.state().iteration, 1);
        assert!((ctl.state().delta - 0.5).abs() < 1e-12);

        ctl.reset();
        assert_eq!(ctl.state(), ConvergenceState::default());
    }

    #[test]
    fn test_validate_rejects_degenerate_configs() {
        assert!(ConvergenceConfig::fixed(0).validate().is_err());
        assert!(ConvergenceConfig::tolerance(0.0).validate().is_err());
        assert!(ConvergenceConfig::tolerance(f64::NAN).validate().is_err());
        assert!(ConvergenceConfig::tolerance(1e-6)
            .with_ceiling(0)
            .validate()
            .is_err());
        assert!(ConvergenceConfig::tolerance(1e-6).validate().is_ok());
        assert!(ConvergenceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_with_metric_only_touches_tolerance() {
        let fixed = ConvergenceConfig::fixed(7).with_metric(DistanceMetric::Max);
        assert_eq!(fixed, ConvergenceConfig::fixed(7));

        let tol = ConvergenceConfig::tolerance(1e-4).with_metric(DistanceMetric::Max);
        assert_eq!(tol.metric(), DistanceMetric::Max);
        assert_eq!(tol.iteration_cap(), DEFAULT_ITERATION_CEILING);
    }

    #[test]
    fn test_config_serde_tagging() {
        let json = r#"{ "mode": "tolerance", "epsilon": 1e-8 }"#;
        let config: ConvergenceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config, ConvergenceConfig::tolerance(1e-8));

        let back = serde_json::to_value(ConvergenceConfig::fixed(12)).unwrap();
        assert_eq!(back["mode"], "fixed");
        assert_eq!(back["max_iterations"], 12);
    }
}
