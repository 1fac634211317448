// =============================================================================
// Error Types
// =============================================================================
//
// Every fallible operation in the library returns `Result<T>`, which is an
// alias for `std::result::Result<T, HypotestError>`.
//
// WHAT COUNTS AS AN ERROR?
// ------------------------
// Only things the caller must act on:
//   - a test type or distribution name that does not exist
//   - resolver parameters that make no sense (alpha outside (0,1), df < 1)
//   - a test input that failed validation (carries the field-level records)
//
// Numeric corner cases inside the special functions are NOT errors. Those
// return sentinel values (0, 1, ∞, NaN) and the layers above guard against
// feeding them degenerate arguments in the first place.
//
// =============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field-level validation problem.
///
/// `field` uses the parameter name, with indexed paths for arrays
/// (`groups[1].sd`, `observed[0][2]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Main error type for the hypothesis testing library.
#[derive(Debug, Error)]
pub enum HypotestError {
    /// `test_type` is not one of the twelve supported procedures.
    #[error("unknown test type: {0}")]
    UnknownTestType(String),

    /// Distribution name is not one of z, t, chi2, f.
    #[error("unknown distribution: {0}")]
    UnknownDistribution(String),

    /// A parameter is outside its domain (alpha, df, ...).
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Array shapes do not line up (ragged contingency table, ...).
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A required collection is empty.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// The bundled critical-value tables could not be read.
    #[error("critical value table error: {0}")]
    TableData(String),

    /// The test input failed validation; see the individual field errors.
    #[error("input failed validation ({} problem(s))", .0.len())]
    Validation(Vec<FieldError>),

    /// Malformed JSON passed to one of the raw-JSON entry points.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HypotestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_counts_problems() {
        let err = HypotestError::Validation(vec![
            FieldError::new("n", "n must be an integer >= 2"),
            FieldError::new("sd", "sd must be positive"),
        ]);
        assert_eq!(err.to_string(), "input failed validation (2 problem(s))");
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: HypotestError = parse.unwrap_err().into();
        assert!(matches!(err, HypotestError::Json(_)));
    }
}
