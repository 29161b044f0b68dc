//! Configuration-driven estimation.
//!
//! - [`spec`]: serde types describing which estimator to run and how
//! - [`validation`]: rule engine that reports every problem in a spec
//! - [`runner`]: validates a spec and dispatches to the chosen estimator
//! - [`observer`]: progress reporting hooks shared by all estimators

pub mod observer;
pub mod runner;
pub mod spec;
pub mod validation;

pub use observer::{NoopReporter, Progress, ProgressBar, ProgressLog, ProgressReporter};
pub use runner::{configure, rank, ConfiguredEstimator};
pub use spec::{Algorithm, ConvergenceMode, RankSpec};
pub use validation::{
    Severity, ValidationDiagnostic, ValidationEngine, ValidationReport, ValidationRule,
};
