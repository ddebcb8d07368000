//! Neuron Conductance attribution.

use std::marker::PhantomData;

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

use gradix_core::{expand_baseline, CoreError, LayerId, LayerObservable, TargetSpec};

use crate::attribution::AttributionMap;
use crate::error::{AttrError, Result};
use crate::gradient::layer_gradients;
use crate::integrator::{PathConfig, PathIntegrator};

/// Path-integral attribution of input features through a single neuron.
///
/// Mechanics mirror [`crate::LayerConductance`], but the gradient flow is
/// restricted to one selected neuron: per interpolation step the product
/// (∂output/∂neuron) × (∂neuron/∂input) is formed, the products are averaged
/// with the rule weights and multiplied by `(input - baseline)`. The result
/// is input-shaped — the share of each input feature's contribution that
/// flows through the chosen neuron.
///
/// A single neuron's value is not the model output, so the completeness
/// axiom does not hold and no error estimate is defined; requesting one via
/// `PathConfig::return_error` raises
/// [`AttrError::CompletenessUnavailable`].
pub struct NeuronConductance<B, M> {
    model: M,
    layer: LayerId,
    marker: PhantomData<B>,
}

impl<B, M> NeuronConductance<B, M>
where
    B: AutodiffBackend,
    M: LayerObservable<B>,
{
    /// Bind the attribution method to a model and an observation point.
    pub fn new(model: M, layer: LayerId) -> Self {
        Self {
            model,
            layer,
            marker: PhantomData,
        }
    }

    /// The observed layer.
    #[must_use]
    pub fn layer(&self) -> &LayerId {
        &self.layer
    }

    /// Whether this method defines a completeness error estimate.
    #[must_use]
    pub const fn has_convergence_delta(&self) -> bool {
        false
    }

    /// Compute input attributions through neuron `neuron_index` of the
    /// bound layer.
    ///
    /// `neuron_index` addresses a column of the layer activation; its range
    /// is checked against the activation width at the first layer
    /// evaluation.
    ///
    /// # Errors
    ///
    /// [`AttrError::CompletenessUnavailable`] if `config.return_error` is
    /// set, plus the usual shape/parameter/gradient failures.
    pub fn attribute(
        &self,
        input: &Tensor<B, 2>,
        baseline: &Tensor<B, 2>,
        neuron_index: usize,
        target: &TargetSpec,
        config: &PathConfig,
    ) -> Result<AttributionMap<B>> {
        if config.return_error {
            return Err(AttrError::CompletenessUnavailable(
                "neuron conductance does not satisfy the completeness axiom".to_string(),
            ));
        }
        let integrator = PathIntegrator::new(config.n_steps, config.method)?;
        let baseline = expand_baseline(baseline, input)?;
        let [batch, features] = input.dims();
        let total = batch * config.n_steps;

        tracing::debug!(
            batch,
            features,
            layer = %self.layer,
            neuron_index,
            n_steps = config.n_steps,
            "computing neuron conductance"
        );

        let scaled = integrator.interpolate(&baseline, input);

        // d(neuron)/d(input) at every interpolation point.
        let scaled_leaf = scaled.clone().require_grad();
        let activation = self
            .model
            .forward_to_layer(scaled_leaf.clone(), &self.layer)?;
        let [_, n_neurons] = activation.dims();
        if neuron_index >= n_neurons {
            return Err(CoreError::InvalidParameter(format!(
                "neuron index {neuron_index} out of range for layer `{}` with {n_neurons} neurons",
                self.layer
            ))
            .into());
        }
        let neuron = activation.slice([0..total, neuron_index..neuron_index + 1]);
        let grads = neuron.sum().backward();
        let input_grads: Tensor<B, 2> =
            Tensor::from_inner(scaled_leaf.grad(&grads).ok_or_else(|| {
                AttrError::NonDifferentiableModel(format!(
                    "no gradient path from neuron {neuron_index} of layer `{}` to the input",
                    self.layer
                ))
            })?);

        // d(output)/d(neuron) at the same points, on a second graph.
        let layer_grads = layer_gradients(
            &self.model,
            scaled,
            &self.layer,
            &target.expand_steps(config.n_steps),
        )?;
        let mid_grads = layer_grads.slice([0..total, neuron_index..neuron_index + 1]);

        let averaged = integrator.average(input_grads * mid_grads, batch);
        let values = averaged * (input.clone() - baseline);
        Ok(AttributionMap::new(values))
    }
}
