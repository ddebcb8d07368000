//! Model evaluation traits.
//!
//! Attribution methods consume the model through these traits only: a
//! forward pass over a `(B, F)` input batch, and, for layer/neuron methods,
//! a named observation point inside the forward pass.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;

use crate::error::Result;

/// Names an observation point inside a model.
///
/// Layer and neuron attribution methods identify the tapped intermediate
/// activation by this key, the way activations are keyed by layer name in
/// capture maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct LayerId(String);

impl LayerId {
    /// Create a new layer identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The layer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A differentiable model evaluated on batched inputs.
///
/// The forward pass must be a pure function of the input batch; gradient
/// computation through the autodiff backend never mutates model parameters.
pub trait DifferentiableModel<B: AutodiffBackend> {
    /// Forward pass returning output scores.
    ///
    /// # Arguments
    ///
    /// * `input` - Input tensor of shape `(batch, features)`
    ///
    /// # Returns
    ///
    /// Output tensor of shape `(batch, n_outputs)`
    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2>;
}

impl<B: AutodiffBackend, M: DifferentiableModel<B>> DifferentiableModel<B> for &M {
    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        (**self).forward(input)
    }
}

/// A model exposing named intermediate activations.
///
/// The forward pass is split at each observation point:
/// `forward_from_layer(forward_to_layer(x, l), l)` must equal `forward(x)`,
/// so the remainder of the forward pass is unmodified while the activation
/// itself becomes available for gradient capture. Re-rooting the returned
/// activation (`detach` + `require_grad`) yields the gradient of the output
/// with respect to the activation without any ambient hook state.
pub trait LayerObservable<B: AutodiffBackend>: DifferentiableModel<B> {
    /// Forward pass up to the named layer, returning its activation
    /// of shape `(batch, n_neurons)`.
    ///
    /// # Errors
    ///
    /// [`crate::CoreError::InvalidParameter`] if the layer is unknown.
    fn forward_to_layer(&self, input: Tensor<B, 2>, layer: &LayerId) -> Result<Tensor<B, 2>>;

    /// Forward pass from the named layer's activation to the output.
    ///
    /// # Errors
    ///
    /// [`crate::CoreError::InvalidParameter`] if the layer is unknown.
    fn forward_from_layer(&self, activation: Tensor<B, 2>, layer: &LayerId)
        -> Result<Tensor<B, 2>>;
}

impl<B: AutodiffBackend, M: LayerObservable<B>> LayerObservable<B> for &M {
    fn forward_to_layer(&self, input: Tensor<B, 2>, layer: &LayerId) -> Result<Tensor<B, 2>> {
        (**self).forward_to_layer(input, layer)
    }

    fn forward_from_layer(
        &self,
        activation: Tensor<B, 2>,
        layer: &LayerId,
    ) -> Result<Tensor<B, 2>> {
        (**self).forward_from_layer(activation, layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Autodiff, NdArray};
    use crate::error::CoreError;

    type TestBackend = Autodiff<NdArray>;

    /// One hidden linear layer observable at "hidden".
    struct TwoStage {
        w1: Tensor<TestBackend, 2>,
        w2: Tensor<TestBackend, 2>,
    }

    impl TwoStage {
        fn new() -> Self {
            let device = Default::default();
            Self {
                w1: Tensor::from_floats([[1.0, 0.0], [0.0, 2.0]], &device),
                w2: Tensor::from_floats([[1.0], [1.0]], &device),
            }
        }
    }

    impl DifferentiableModel<TestBackend> for TwoStage {
        fn forward(&self, input: Tensor<TestBackend, 2>) -> Tensor<TestBackend, 2> {
            input.matmul(self.w1.clone()).matmul(self.w2.clone())
        }
    }

    impl LayerObservable<TestBackend> for TwoStage {
        fn forward_to_layer(
            &self,
            input: Tensor<TestBackend, 2>,
            layer: &LayerId,
        ) -> Result<Tensor<TestBackend, 2>> {
            match layer.name() {
                "hidden" => Ok(input.matmul(self.w1.clone())),
                other => Err(CoreError::InvalidParameter(format!("unknown layer {other}"))),
            }
        }

        fn forward_from_layer(
            &self,
            activation: Tensor<TestBackend, 2>,
            layer: &LayerId,
        ) -> Result<Tensor<TestBackend, 2>> {
            match layer.name() {
                "hidden" => Ok(activation.matmul(self.w2.clone())),
                other => Err(CoreError::InvalidParameter(format!("unknown layer {other}"))),
            }
        }
    }

    #[test]
    fn test_split_forward_matches_forward() {
        let model = TwoStage::new();
        let device = Default::default();
        let input = Tensor::<TestBackend, 2>::from_floats([[3.0, 4.0]], &device);
        let layer = LayerId::new("hidden");

        let full: Vec<f32> = model.forward(input.clone()).into_data().to_vec().unwrap();
        let split: Vec<f32> = model
            .forward_from_layer(model.forward_to_layer(input, &layer).unwrap(), &layer)
            .unwrap()
            .into_data()
            .to_vec()
            .unwrap();
        assert_eq!(full, split);
    }

    #[test]
    fn test_unknown_layer_rejected() {
        let model = TwoStage::new();
        let device = Default::default();
        let input = Tensor::<TestBackend, 2>::zeros([1, 2], &device);

        let err = model
            .forward_to_layer(input, &LayerId::new("missing"))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidParameter(_)));
    }

    #[test]
    fn test_layer_id_display() {
        assert_eq!(LayerId::from("conv1").to_string(), "conv1");
    }
}
