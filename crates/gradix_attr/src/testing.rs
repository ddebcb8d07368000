//! Shared test models.
//!
//! Small fixed-weight models with hand-computable gradients, used across
//! the unit tests of this crate.

use burn::prelude::*;
use burn::tensor::activation::relu;

use gradix_core::backend::{Autodiff, NdArray};
use gradix_core::{CoreError, DifferentiableModel, LayerId, LayerObservable};

/// Autodiff CPU backend used by every unit test.
pub(crate) type TestBackend = Autodiff<NdArray>;

type Device = <TestBackend as Backend>::Device;

/// `output = input . w` for a fixed weight matrix `w` of shape `(F, O)`.
pub(crate) struct LinearModel {
    w: Tensor<TestBackend, 2>,
}

impl LinearModel {
    pub(crate) fn new<const F: usize, const O: usize>(
        weights: &[[f32; O]; F],
        device: &Device,
    ) -> Self {
        Self {
            w: Tensor::from_floats(*weights, device),
        }
    }
}

impl DifferentiableModel<TestBackend> for LinearModel {
    fn forward(&self, input: Tensor<TestBackend, 2>) -> Tensor<TestBackend, 2> {
        input.matmul(self.w.clone())
    }
}

/// `output = sum_i input_i^3`, one output column.
///
/// The gradient `3 x^2` is a quadratic integrand, so quadrature error is
/// visible for the Riemann rules and vanishes for Gauss-Legendre.
pub(crate) struct CubicModel;

impl DifferentiableModel<TestBackend> for CubicModel {
    fn forward(&self, input: Tensor<TestBackend, 2>) -> Tensor<TestBackend, 2> {
        (input.clone() * input.clone() * input).sum_dim(1)
    }
}

/// Linear -> ReLU -> linear, observable at the pre-activation layer
/// `"hidden"`.
pub(crate) struct TwoLayerModel {
    w1: Tensor<TestBackend, 2>,
    bias: Tensor<TestBackend, 2>,
    w2: Tensor<TestBackend, 2>,
}

impl TwoLayerModel {
    pub(crate) fn new<const F: usize, const H: usize, const O: usize>(
        w1: &[[f32; H]; F],
        bias: &[f32; H],
        w2: &[[f32; O]; H],
        device: &Device,
    ) -> Self {
        Self {
            w1: Tensor::from_floats(*w1, device),
            bias: Tensor::<TestBackend, 1>::from_floats(*bias, device).reshape([1, H]),
            w2: Tensor::from_floats(*w2, device),
        }
    }

    /// Three inputs, two hidden units, one output:
    /// `h = [x1 + x2 + x3 + 1, x1 - 2 x2 - 0.5]`, `y = relu(h) . [1, 2]`.
    ///
    /// For input `[3, 1, 2]` and a zero baseline the second unit crosses its
    /// kink exactly at the middle of the path, so the true attribution is
    /// `[6, -1, 2]` with `y(x) - y(0) = 7`.
    pub(crate) fn reference(device: &Device) -> Self {
        Self::new(
            &[[1.0, 1.0], [1.0, -2.0], [1.0, 0.0]],
            &[1.0, -0.5],
            &[[1.0], [2.0]],
            device,
        )
    }

    pub(crate) fn layer() -> LayerId {
        LayerId::new("hidden")
    }
}

impl DifferentiableModel<TestBackend> for TwoLayerModel {
    fn forward(&self, input: Tensor<TestBackend, 2>) -> Tensor<TestBackend, 2> {
        let hidden = input.matmul(self.w1.clone()) + self.bias.clone();
        relu(hidden).matmul(self.w2.clone())
    }
}

impl LayerObservable<TestBackend> for TwoLayerModel {
    fn forward_to_layer(
        &self,
        input: Tensor<TestBackend, 2>,
        layer: &LayerId,
    ) -> gradix_core::Result<Tensor<TestBackend, 2>> {
        match layer.name() {
            "hidden" => Ok(input.matmul(self.w1.clone()) + self.bias.clone()),
            other => Err(CoreError::InvalidParameter(format!("unknown layer {other}"))),
        }
    }

    fn forward_from_layer(
        &self,
        activation: Tensor<TestBackend, 2>,
        layer: &LayerId,
    ) -> gradix_core::Result<Tensor<TestBackend, 2>> {
        match layer.name() {
            "hidden" => Ok(relu(activation).matmul(self.w2.clone())),
            other => Err(CoreError::InvalidParameter(format!("unknown layer {other}"))),
        }
    }
}

/// A model whose forward pass severs the autodiff graph.
pub(crate) struct DetachedModel {
    w: Tensor<TestBackend, 2>,
}

impl DetachedModel {
    pub(crate) fn new<const F: usize, const O: usize>(
        weights: &[[f32; O]; F],
        device: &Device,
    ) -> Self {
        Self {
            w: Tensor::from_floats(*weights, device),
        }
    }
}

impl DifferentiableModel<TestBackend> for DetachedModel {
    fn forward(&self, input: Tensor<TestBackend, 2>) -> Tensor<TestBackend, 2> {
        input.detach().matmul(self.w.clone())
    }
}

/// Assert two slices match elementwise within a tolerance.
pub(crate) fn assert_close(actual: &[f32], expected: &[f32], tolerance: f32) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= tolerance,
            "element {i}: {a} != {e} (tolerance {tolerance}), actual {actual:?}, expected {expected:?}"
        );
    }
}
