//! Integrated Gradients attribution.

use std::marker::PhantomData;

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

use gradix_core::{expand_baseline, DifferentiableModel, TargetSpec};

use crate::attribution::AttributionMap;
use crate::error::Result;
use crate::gradient::{convergence_delta, input_gradients};
use crate::integrator::{PathConfig, PathIntegrator};

/// Path-integral attribution at the input level.
///
/// Approximates the integral of gradients along the straight path from a
/// baseline to the input and multiplies by `(input - baseline)`, so the
/// attribution of each feature sums to the output delta between input and
/// baseline (completeness). The approximation error shrinks as
/// `PathConfig::n_steps` grows; a delta comparable in magnitude to the
/// attribution values themselves is a signal to raise the step count, not a
/// silent success.
///
/// Reference: Sundararajan et al., "Axiomatic Attribution for Deep
/// Networks", ICML 2017.
///
/// # Example
///
/// ```rust,ignore
/// use gradix_attr::{IntegratedGradients, PathConfig};
///
/// let ig = IntegratedGradients::new(&model);
/// let map = ig.attribute(&input, &baseline, &target, &PathConfig::default())?;
/// ```
pub struct IntegratedGradients<B, M> {
    model: M,
    marker: PhantomData<B>,
}

impl<B, M> IntegratedGradients<B, M>
where
    B: AutodiffBackend,
    M: DifferentiableModel<B>,
{
    /// Bind the attribution method to a model.
    pub fn new(model: M) -> Self {
        Self {
            model,
            marker: PhantomData,
        }
    }

    /// Whether this method defines a completeness error estimate.
    #[must_use]
    pub const fn has_convergence_delta(&self) -> bool {
        true
    }

    /// Compute attributions for `input` against `baseline`.
    ///
    /// The baseline is one reference example `(1, F)` or a full `(B, F)`
    /// batch. All `n_steps` interpolation points are evaluated as one
    /// flattened batch. With `config.return_error` set, the per-example
    /// completeness delta is computed from two extra forward passes.
    ///
    /// # Errors
    ///
    /// Shape or parameter validation failures, or a missing gradient path
    /// (`NonDifferentiableModel`).
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
            n_steps = config.n_steps,
            method = %config.method,
            "computing integrated gradients"
        );

        let scaled = integrator.interpolate(&baseline, input);
        let grads = input_gradients(
            &self.model,
            scaled,
            &target.expand_steps(config.n_steps),
        )?;
        let averaged = integrator.average(grads, batch);
        let values = averaged * (input.clone() - baseline.clone());

        let map = AttributionMap::new(values);
        if config.return_error {
            let delta = convergence_delta(&self.model, &map.values, input, &baseline, target)?;
            Ok(map.with_delta(delta))
        } else {
            Ok(map)
        }
    }
}
