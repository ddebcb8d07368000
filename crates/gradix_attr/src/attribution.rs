//! Attribution results and the method capability.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

use crate::error::Result;

/// Attribution scores for one batch, one value per input feature or neuron.
///
/// `values` is shaped like the evaluation point the method attributed at:
/// the input `(B, F)` for input-level methods, the layer activation
/// `(B, N)` for layer methods. `delta` is the per-example signed
/// completeness error `sum(attribution) - (output(input) - output(baseline))`,
/// populated only by methods that satisfy the completeness axiom and only
/// when the caller asked for it.
#[derive(Debug, Clone)]
pub struct AttributionMap<B: Backend> {
    /// The attribution values.
    pub values: Tensor<B, 2>,
    /// Per-example completeness error, when computed.
    pub delta: Option<Tensor<B, 1>>,
}

impl<B: Backend> AttributionMap<B> {
    /// Create a new attribution map without an error estimate.
    pub fn new(values: Tensor<B, 2>) -> Self {
        Self {
            values,
            delta: None,
        }
    }

    /// Attach a per-example completeness error.
    #[must_use]
    pub fn with_delta(mut self, delta: Tensor<B, 1>) -> Self {
        self.delta = Some(delta);
        self
    }

    /// Get the shape of the attribution values.
    pub fn shape(&self) -> [usize; 2] {
        self.values.dims()
    }

    /// Normalize the attribution values to [0, 1].
    ///
    /// Used by downstream renderers; a constant map is returned unchanged
    /// to avoid division by zero.
    pub fn normalize(&self) -> Self {
        let min_val: f32 = self.values.clone().min().into_scalar().elem();
        let max_val: f32 = self.values.clone().max().into_scalar().elem();
        let range = max_val - min_val;

        let normalized = if range > 1e-8 {
            (self.values.clone() - min_val) / range
        } else {
            self.values.clone()
        };

        Self {
            values: normalized,
            delta: self.delta.clone(),
        }
    }
}

/// The one capability every attribution method exposes: produce
/// attributions for an input batch.
///
/// [`crate::NoiseTunnel`] composes over this capability rather than over
/// concrete methods. Any closure `Fn(&Tensor<B, 2>) -> Result<AttributionMap<B>>`
/// implements it, so a concrete method is wrapped by binding its remaining
/// arguments:
///
/// ```rust,ignore
/// let ig = IntegratedGradients::new(model);
/// let bound = |x: &Tensor<B, 2>| ig.attribute(x, &baseline, &target, &config);
/// let smoothed = tunnel.attribute(&bound, &input)?;
/// ```
pub trait AttributionMethod<B: AutodiffBackend> {
    /// Compute attributions for `input`.
    fn attribute(&self, input: &Tensor<B, 2>) -> Result<AttributionMap<B>>;
}

impl<B, F> AttributionMethod<B> for F
where
    B: AutodiffBackend,
    F: Fn(&Tensor<B, 2>) -> Result<AttributionMap<B>>,
{
    fn attribute(&self, input: &Tensor<B, 2>) -> Result<AttributionMap<B>> {
        self(input)
    }
}
