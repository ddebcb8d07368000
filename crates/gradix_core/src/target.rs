//! Target selection for multi-output models.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Identifies which scalar output component to attribute.
///
/// Models may produce several scores per example (e.g. class logits); the
/// attribution target picks one column of the `(B, O)` output, either
/// batch-wide or per example.
///
/// # Example
///
/// ```rust,ignore
/// use gradix_core::TargetSpec;
///
/// // Attribute class 3 for every example in the batch.
/// let target = TargetSpec::Index(3);
///
/// // Attribute the predicted class of each example.
/// let target = TargetSpec::PerExample(vec![0, 2, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSpec {
    /// One output column for the whole batch.
    Index(usize),
    /// One output column per example; length must equal the batch size.
    PerExample(Vec<usize>),
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl TargetSpec {
    /// Select the targeted scalar per example from a `(B, O)` output batch.
    ///
    /// Returns a rank-1 tensor of length `B`.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidParameter`] if an index is out of range or the
    /// per-example list length does not match the batch size.
    pub fn select<B: Backend>(&self, output: Tensor<B, 2>) -> Result<Tensor<B, 1>> {
        let [batch, n_outputs] = output.dims();
        match self {
            Self::Index(index) => {
                if *index >= n_outputs {
                    return Err(CoreError::InvalidParameter(format!(
                        "target index {index} out of range for {n_outputs} model outputs"
                    )));
                }
                Ok(output.slice([0..batch, *index..*index + 1]).reshape([batch]))
            }
            Self::PerExample(indices) => {
                if indices.len() != batch {
                    return Err(CoreError::InvalidParameter(format!(
                        "expected {batch} per-example targets, got {}",
                        indices.len()
                    )));
                }
                if let Some(index) = indices.iter().find(|i| **i >= n_outputs) {
                    return Err(CoreError::InvalidParameter(format!(
                        "target index {index} out of range for {n_outputs} model outputs"
                    )));
                }
                let device = output.device();
                let index_data: Vec<i32> = indices.iter().map(|i| *i as i32).collect();
                let index_tensor =
                    Tensor::<B, 1, Int>::from_ints(index_data.as_slice(), &device)
                        .reshape([batch, 1]);
                Ok(output.gather(1, index_tensor).reshape([batch]))
            }
        }
    }

    /// Tile a per-example target across `n_steps` flattened step blocks.
    ///
    /// Path methods evaluate all interpolation steps as one `(n_steps * B, F)`
    /// batch laid out steps-major, so per-example targets repeat once per
    /// step block. Batch-wide targets are unaffected.
    #[must_use]
    pub fn expand_steps(&self, n_steps: usize) -> Self {
        match self {
            Self::Index(index) => Self::Index(*index),
            Self::PerExample(indices) => {
                let mut expanded = Vec::with_capacity(indices.len() * n_steps);
                for _ in 0..n_steps {
                    expanded.extend_from_slice(indices);
                }
                Self::PerExample(expanded)
            }
        }
    }
}
