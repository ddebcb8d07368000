//! Layer Conductance attribution.

use std::marker::PhantomData;

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

use gradix_core::{expand_baseline, LayerId, LayerObservable, TargetSpec};

use crate::attribution::AttributionMap;
use crate::error::Result;
use crate::gradient::{convergence_delta, layer_gradients};
use crate::integrator::{PathConfig, PathIntegrator};

/// Path-integral attribution expressed at a named intermediate layer.
///
/// The interpolation happens on the *input*, exactly as for
/// [`crate::IntegratedGradients`], but the integrand is the gradient of the
/// target output with respect to the observed layer activation; the averaged
/// gradient is multiplied by the activation delta between input and
/// baseline, yielding one attribution value per neuron. Completeness holds
/// at the layer: the neuron sum approximates the same output delta
/// Integrated Gradients reports over the path.
///
/// Reference: Dhamdhere et al., "How Important Is a Neuron?", 2018.
pub struct LayerConductance<B, M> {
    model: M,
    layer: LayerId,
    marker: PhantomData<B>,
}

impl<B, M> LayerConductance<B, M>
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
        true
    }

    /// Compute per-neuron attributions for `input` against `baseline`.
    ///
    /// Returns values shaped like the layer activation `(B, N)`. With
    /// `config.return_error` set, the per-example completeness delta over
    /// the neuron sum is attached.
    ///
    /// # Errors
    ///
    /// Shape or parameter validation failures, an unknown layer, or a
    /// missing gradient path.
    pub fn attribute(
        &self,
        input: &Tensor<B, 2>,
        baseline: &Tensor<B, 2>,
        target: &TargetSpec,
        config: &PathConfig,
    ) -> Result<AttributionMap<B>> {
        let integrator = PathIntegrator::new(config.n_steps, config.method)?;
        let baseline = expand_baseline(baseline, input)?;
        let [batch, features] = input.dims();

        tracing::debug!(
            batch,
            features,
            layer = %self.layer,
            n_steps = config.n_steps,
            method = %config.method,
            "computing layer conductance"
        );

        let scaled = integrator.interpolate(&baseline, input);
        let layer_grads = layer_gradients(
            &self.model,
            scaled,
            &self.layer,
            &target.expand_steps(config.n_steps),
        )?;
        let averaged = integrator.average(layer_grads, batch);

        let act_input = self
            .model
            .forward_to_layer(input.clone(), &self.layer)?
            .detach();
        let act_baseline = self
            .model
            .forward_to_layer(baseline.clone(), &self.layer)?
            .detach();
        let values = averaged * (act_input - act_baseline);

        let map = AttributionMap::new(values);
        if config.return_error {
            let delta = convergence_delta(&self.model, &map.values, input, &baseline, target)?;
            Ok(map.with_delta(delta))
        } else {
            Ok(map)
        }
    }
}
