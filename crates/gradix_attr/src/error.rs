//! Error types for attribution methods.

use thiserror::Error;

/// Result type alias for attribution operations.
pub type Result<T> = std::result::Result<T, AttrError>;

/// Errors that can occur while computing attributions.
#[derive(Error, Debug)]
pub enum AttrError {
    /// Core validation error (shape or parameter).
    #[error("Core error: {0}")]
    Core(#[from] gradix_core::CoreError),

    /// No gradient path exists from the selected output to the evaluation
    /// point.
    #[error("Non-differentiable model: {0}")]
    NonDifferentiableModel(String),

    /// Unknown noise aggregation mode.
    #[error("Unsupported aggregation: {0}")]
    UnsupportedAggregation(String),

    /// A completeness error estimate was requested from a method that does
    /// not satisfy the completeness axiom.
    #[error("Completeness unavailable: {0}")]
    CompletenessUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradix_core::CoreError;

    #[test]
    fn test_core_error_wraps() {
        let err: AttrError = CoreError::InvalidParameter("n_steps".to_string()).into();
        assert_eq!(err.to_string(), "Core error: Invalid parameter: n_steps");
    }

    #[test]
    fn test_unsupported_aggregation_display() {
        let err = AttrError::UnsupportedAggregation("meangrad".to_string());
        assert_eq!(err.to_string(), "Unsupported aggregation: meangrad");
    }
}
