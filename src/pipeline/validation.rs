//! Validation engine for rank specifications.
//!
//! The engine runs all registered [`ValidationRule`]s against a
//! [`RankSpec`](super::spec::RankSpec) and collects every diagnostic into a
//! [`ValidationReport`]. It never stops at the first error, so users see all
//! problems at once.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use rapid_pagerank::pipeline::validation::ValidationEngine;
//!
//! let engine = ValidationEngine::with_defaults();
//! let report = engine.validate(&spec);
//! if report.has_errors() {
//!     for err in report.errors() {
//!         eprintln!("{err}");
//!     }
//! }
//! ```

use std::collections::HashMap;

use serde::Serialize;

use super::spec::{Algorithm, ConvergenceMode, RankSpec};
use crate::errors::{ErrorCode, SpecError};

// ─── Severity ───────────────────────────────────────────────────────────────

/// Whether a diagnostic is a hard error or a soft warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

// ─── Diagnostic ─────────────────────────────────────────────────────────────

/// A single validation finding: a [`SpecError`] plus its severity.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub error: SpecError,
}

impl ValidationDiagnostic {
    pub fn error(err: SpecError) -> Self {
        Self {
            severity: Severity::Error,
            error: err,
        }
    }

    pub fn warning(err: SpecError) -> Self {
        Self {
            severity: Severity::Warning,
            error: err,
        }
    }
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Collected diagnostics from running all validation rules.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    /// Iterate over error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &SpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| &d.error)
    }

    /// Iterate over warning-severity diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &SpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| &d.error)
    }

    /// Returns `true` if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Consume the report, keeping only the errors.
    pub fn into_errors(self) -> Vec<SpecError> {
        self.diagnostics
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.error)
            .collect()
    }
}

// ─── Rule trait ─────────────────────────────────────────────────────────────

/// A single validation rule that inspects a [`RankSpec`] and returns zero or
/// more diagnostics.
///
/// Rules are stateless and must be `Send + Sync` so a long-lived engine can
/// be shared across threads.
pub trait ValidationRule: Send + Sync {
    /// Short, stable identifier for this rule (e.g., `"walk_params"`).
    fn name(&self) -> &str;

    /// Inspect `spec` and return any findings.
    fn validate(&self, spec: &RankSpec) -> Vec<ValidationDiagnostic>;
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Runs a set of [`ValidationRule`]s against a [`RankSpec`] and collects all
/// diagnostics into a [`ValidationReport`].
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    /// Create an empty engine with no rules.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create an engine pre-loaded with the default rule set.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(WalkParamsRule));
        engine.add_rule(Box::new(ConvergenceRule));
        engine.add_rule(Box::new(IgnoredParamsRule));
        engine.add_rule(Box::new(UnknownFieldsRule));
        engine
    }

    /// Register an additional rule.
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Names of the registered rules, in run order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run all rules against `spec` and return the collected report.
    pub fn validate(&self, spec: &RankSpec) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            report.diagnostics.extend(rule.validate(spec));
        }
        report
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Concrete rules
// ═══════════════════════════════════════════════════════════════════════════

// ─── 1. Walk parameters must be positive ────────────────────────────────────

struct WalkParamsRule;

impl ValidationRule for WalkParamsRule {
    fn name(&self) -> &str {
        "walk_params"
    }

    fn validate(&self, spec: &RankSpec) -> Vec<ValidationDiagnostic> {
        if spec.algorithm != Algorithm::Stochastic {
            return vec![];
        }

        let checks: &[(&str, usize)] = &[
            ("num_walks", spec.num_walks),
            ("walk_length", spec.walk_length),
        ];

        checks
            .iter()
            .filter(|&&(_, value)| value == 0)
            .map(|&(field, _)| {
                ValidationDiagnostic::error(
                    SpecError::new(
                        ErrorCode::InvalidValue,
                        format!("/{field}"),
                        format!("{field} must be greater than 0"),
                    )
                    .with_hint(format!("Set {field} to a positive value")),
                )
            })
            .collect()
    }
}

// ─── 2. Convergence policy must be usable ───────────────────────────────────

struct ConvergenceRule;

impl ValidationRule for ConvergenceRule {
    fn name(&self) -> &str {
        "convergence"
    }

    fn validate(&self, spec: &RankSpec) -> Vec<ValidationDiagnostic> {
        if spec.algorithm != Algorithm::Distribution {
            return vec![];
        }

        let mut out = Vec::new();

        if spec.max_iterations == Some(0) {
            let message = match spec.convergence_mode {
                ConvergenceMode::Fixed => "max_iterations must be greater than 0",
                ConvergenceMode::Tolerance => "iteration ceiling must be greater than 0",
            };
            out.push(ValidationDiagnostic::error(
                SpecError::new(ErrorCode::InvalidValue, "/max_iterations", message)
                    .with_hint("Remove max_iterations to use the default, or set it to a positive value"),
            ));
        }

        if spec.convergence_mode == ConvergenceMode::Tolerance {
            match spec.epsilon {
                None => out.push(ValidationDiagnostic::error(
                    SpecError::new(
                        ErrorCode::MissingField,
                        "/epsilon",
                        "tolerance mode requires epsilon",
                    )
                    .with_hint("Add a small positive epsilon, e.g. 1e-8"),
                )),
                Some(epsilon) if !(epsilon.is_finite() && epsilon > 0.0) => {
                    out.push(ValidationDiagnostic::error(
                        SpecError::new(
                            ErrorCode::InvalidValue,
                            "/epsilon",
                            format!("epsilon must be positive and finite, got {epsilon}"),
                        )
                        .with_hint("Use a small positive epsilon, e.g. 1e-8"),
                    ))
                }
                Some(_) => {}
            }
        }

        out
    }
}

// ─── 3. Parameters the selected estimator does not read ─────────────────────

struct IgnoredParamsRule;

impl IgnoredParamsRule {
    fn ignored(field: &str, reason: &str) -> ValidationDiagnostic {
        ValidationDiagnostic::warning(
            SpecError::new(
                ErrorCode::InvalidCombo,
                format!("/{field}"),
                format!("{field} is ignored {reason}"),
            )
            .with_hint(format!("Remove {field}")),
        )
    }
}

impl ValidationRule for IgnoredParamsRule {
    fn name(&self) -> &str {
        "ignored_params"
    }

    fn validate(&self, spec: &RankSpec) -> Vec<ValidationDiagnostic> {
        let mut out = Vec::new();

        match spec.algorithm {
            Algorithm::Distribution => {
                if spec.rng_seed.is_some() {
                    out.push(Self::ignored("rng_seed", "by the distribution estimator"));
                }
                if spec.parallel {
                    out.push(Self::ignored("parallel", "by the distribution estimator"));
                }
                if spec.convergence_mode == ConvergenceMode::Fixed && spec.epsilon.is_some() {
                    out.push(Self::ignored("epsilon", "in fixed convergence mode"));
                }
            }
            Algorithm::Stochastic => {
                if spec.epsilon.is_some() {
                    out.push(Self::ignored("epsilon", "by the stochastic estimator"));
                }
                if spec.max_iterations.is_some() {
                    out.push(Self::ignored("max_iterations", "by the stochastic estimator"));
                }
            }
        }

        out
    }
}

// ─── 4. Unknown fields (strict → error, non-strict → warning) ──────────────

struct UnknownFieldsRule;

impl UnknownFieldsRule {
    /// Collect unknown-field diagnostics at the given JSON pointer `path`
    /// from a map of extra fields captured by `#[serde(flatten)]`.
    fn check_unknowns(
        path: &str,
        unknowns: &HashMap<String, serde_json::Value>,
        strict: bool,
    ) -> Vec<ValidationDiagnostic> {
        let mut keys: Vec<_> = unknowns.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|key| {
                let diag_fn = if strict {
                    ValidationDiagnostic::error
                } else {
                    ValidationDiagnostic::warning
                };
                diag_fn(
                    SpecError::new(
                        ErrorCode::UnknownField,
                        format!("{path}/{key}"),
                        format!("unrecognized field \"{key}\""),
                    )
                    .with_hint("Check spelling or remove this field"),
                )
            })
            .collect()
    }
}

impl ValidationRule for UnknownFieldsRule {
    fn name(&self) -> &str {
        "unknown_fields"
    }

    fn validate(&self, spec: &RankSpec) -> Vec<ValidationDiagnostic> {
        Self::check_unknowns("", &spec.unknown_fields, spec.strict)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════
