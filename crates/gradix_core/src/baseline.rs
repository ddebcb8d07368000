//! Baseline validation and broadcasting.

use burn::prelude::*;

use crate::error::{CoreError, Result};

/// Broadcast a baseline to the shape of an input batch.
///
/// A baseline is either one reference example `(1, F)`, repeated across the
/// batch, or a full `(B, F)` batch of per-example baselines. Any other shape
/// is rejected before model evaluation.
///
/// # Errors
///
/// [`CoreError::ShapeMismatch`] if the feature dimension differs or the
/// baseline batch dimension is neither `1` nor `B`.
pub fn expand_baseline<B: Backend>(
    baseline: &Tensor<B, 2>,
    input: &Tensor<B, 2>,
) -> Result<Tensor<B, 2>> {
    let [batch, features] = input.dims();
    let [base_batch, base_features] = baseline.dims();

    if base_features != features {
        return Err(CoreError::shape_mismatch(
            [batch, features],
            [base_batch, base_features],
        ));
    }
    match base_batch {
        b if b == batch => Ok(baseline.clone()),
        1 => Ok(baseline.clone().repeat_dim(0, batch)),
        _ => Err(CoreError::shape_mismatch(
            [batch, features],
            [base_batch, base_features],
        )),
    }
}
