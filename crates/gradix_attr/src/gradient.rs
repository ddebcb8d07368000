//! Gradient plumbing over the model evaluation traits.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

use gradix_core::{DifferentiableModel, LayerId, LayerObservable, TargetSpec};

use crate::error::{AttrError, Result};

/// Gradient of the selected output scalar with respect to the input batch.
///
/// The input is re-rooted as a graph leaf so gradients land on the
/// evaluation points themselves; summing the per-example scalars seeds one
/// backward pass for the whole (possibly flattened) batch, since rows are
/// independent.
pub(crate) fn input_gradients<B, M>(
    model: &M,
    input: Tensor<B, 2>,
    target: &TargetSpec,
) -> Result<Tensor<B, 2>>
where
    B: AutodiffBackend,
    M: DifferentiableModel<B>,
{
    let input = input.require_grad();
    let output = model.forward(input.clone());
    let selected = target.select(output)?;
    let grads = selected.sum().backward();
    let grad = input.grad(&grads).ok_or_else(|| {
        AttrError::NonDifferentiableModel(
            "no gradient path from the selected output to the input batch".to_string(),
        )
    })?;
    Ok(Tensor::from_inner(grad))
}

/// Gradient of the selected output scalar with respect to the named layer's
/// activation, for an already-flattened batch.
///
/// The activation is detached and re-rooted, and the remainder of the
/// forward pass runs unmodified from it, so the returned gradient is exactly
/// d(output)/d(activation) at the interpolated inputs.
pub(crate) fn layer_gradients<B, M>(
    model: &M,
    input: Tensor<B, 2>,
    layer: &LayerId,
    target: &TargetSpec,
) -> Result<Tensor<B, 2>>
where
    B: AutodiffBackend,
    M: LayerObservable<B>,
{
    let activation = model
        .forward_to_layer(input, layer)?
        .detach()
        .require_grad();
    let output = model.forward_from_layer(activation.clone(), layer)?;
    let selected = target.select(output)?;
    let grads = selected.sum().backward();
    let grad = activation.grad(&grads).ok_or_else(|| {
        AttrError::NonDifferentiableModel(format!(
            "no gradient path from the selected output to layer `{layer}`"
        ))
    })?;
    Ok(Tensor::from_inner(grad))
}

/// Per-example completeness error:
/// `sum(attribution) - (output(input) - output(baseline))`.
///
/// Works for any attribution width: input features for Integrated Gradients
/// and GradientShap, layer neurons for Layer Conductance.
pub(crate) fn convergence_delta<B, M>(
    model: &M,
    attributions: &Tensor<B, 2>,
    input: &Tensor<B, 2>,
    baseline: &Tensor<B, 2>,
    target: &TargetSpec,
) -> Result<Tensor<B, 1>>
where
    B: AutodiffBackend,
    M: DifferentiableModel<B>,
{
    let [batch, _] = attributions.dims();
    let attr_sum = attributions.clone().sum_dim(1).reshape([batch]);
    let end = target.select(model.forward(input.clone()))?;
    let start = target.select(model.forward(baseline.clone()))?;
    Ok((attr_sum - (end - start)).detach())
}
