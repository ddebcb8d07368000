//! Error types for gradix_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur while validating attribution inputs.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Shape mismatch between tensors.
    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        got: String,
    },

    /// Invalid parameter value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl CoreError {
    /// Build a [`CoreError::ShapeMismatch`] from two dimension arrays.
    pub fn shape_mismatch<const N: usize>(expected: [usize; N], got: [usize; N]) -> Self {
        Self::ShapeMismatch {
            expected: format!("{expected:?}"),
            got: format!("{got:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let err = CoreError::shape_mismatch([2, 3], [2, 4]);
        assert_eq!(err.to_string(), "Shape mismatch: expected [2, 3], got [2, 4]");
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = CoreError::InvalidParameter("n_steps must be >= 1, got 0".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid parameter: n_steps must be >= 1, got 0"
        );
    }
}
