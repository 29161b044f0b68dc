//! Error types for graph construction, configuration and estimation.
//!
//! [`RankError`] is returned by every fallible operation in the crate.
//! Configuration problems are described by [`SpecError`], which carries a
//! stable [`ErrorCode`], a JSON-pointer path into the offending spec, a
//! message, and an optional hint. Non-convergence is *not* an error; see
//! [`crate::pagerank::NonConvergenceWarning`].

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Stable machine-readable codes for configuration diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A parameter required by the selected mode is absent.
    MissingField,
    /// A parameter is present but out of range (zero, negative, NaN).
    InvalidValue,
    /// Parameters that cannot be used together.
    InvalidCombo,
    /// A field the schema does not recognize.
    UnknownField,
    /// Generic failure raised by a custom rule.
    ValidationFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::InvalidValue => "invalid_value",
            Self::InvalidCombo => "invalid_combo",
            Self::UnknownField => "unknown_field",
            Self::ValidationFailed => "validation_failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single configuration problem, located by JSON pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("[{code}] {path}: {message}")]
pub struct SpecError {
    pub code: ErrorCode,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl SpecError {
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Errors produced while building graphs or estimating ranks.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RankError {
    /// Edge data is inconsistent (a target that was never declared, an
    /// edge-list line without a target, ...). Fatal for the run.
    #[error("malformed input{}: {message}", line_suffix(.line))]
    MalformedInput {
        line: Option<usize>,
        message: String,
    },

    /// The graph has no nodes, so there is nothing to rank.
    #[error("graph has no nodes to rank")]
    EmptyGraph,

    /// A single configuration parameter is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(SpecError),

    /// A configuration spec failed validation with one or more errors.
    #[error("invalid rank spec: {}", format_spec_errors(.0))]
    InvalidSpec(Vec<SpecError>),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl RankError {
    pub fn malformed(line: Option<usize>, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            line,
            message: message.into(),
        }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" at line {line}"),
        None => String::new(),
    }
}

fn format_spec_errors(errors: &[SpecError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, RankError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_input_mentions_line() {
        let err = RankError::malformed(Some(7), "missing target");
        assert_eq!(err.to_string(), "malformed input at line 7: missing target");

        let err = RankError::malformed(None, "unknown target \"x\"");
        assert_eq!(err.to_string(), "malformed input: unknown target \"x\"");
    }

    #[test]
    fn test_spec_error_display_and_hint() {
        let err = SpecError::new(ErrorCode::InvalidValue, "/num_walks", "must be positive")
            .with_hint("Use at least one walk");
        assert_eq!(err.to_string(), "[invalid_value] /num_walks: must be positive");
        assert_eq!(err.hint.as_deref(), Some("Use at least one walk"));
    }

    #[test]
    fn test_invalid_spec_joins_all_errors() {
        let err = RankError::InvalidSpec(vec![
            SpecError::new(ErrorCode::MissingField, "/epsilon", "required"),
            SpecError::new(ErrorCode::UnknownField, "/bogus", "unrecognized"),
        ]);
        let text = err.to_string();
        assert!(text.contains("/epsilon"));
        assert!(text.contains("/bogus"));
    }

    #[test]
    fn test_spec_error_serializes_without_empty_hint() {
        let err = SpecError::new(ErrorCode::UnknownField, "/x", "unrecognized field \"x\"");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "unknown_field");
        assert!(json.get("hint").is_none());
    }
}
