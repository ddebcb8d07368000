//! # gradix_attr
//!
//! Gradient-integration attribution methods for differentiable models.
//!
//! This crate provides:
//! - [`PathIntegrator`] — Riemann/Gauss-Legendre integration of gradients
//!   along the straight path from a baseline to an input
//! - [`IntegratedGradients`] — input-level path attribution with a
//!   completeness error estimate
//! - [`LayerConductance`] / [`NeuronConductance`] — path attribution
//!   expressed at a named intermediate layer, or through a single neuron
//! - [`GradientShap`] — expected gradients over a distribution of baselines
//! - [`NoiseTunnel`] — smoothgrad/vargrad noise-averaging over any method
//!
//! Models are consumed through the evaluation traits in [`gradix_core`]:
//! [`gradix_core::DifferentiableModel`] for input-level methods and
//! [`gradix_core::LayerObservable`] for layer/neuron methods.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod attribution;
mod error;
mod gradient;
mod gradient_shap;
mod integrated_gradients;
mod integrator;
mod layer_conductance;
mod neuron_conductance;
mod noise_tunnel;

#[cfg(test)]
pub(crate) mod testing;

pub use attribution::{AttributionMap, AttributionMethod};
pub use error::{AttrError, Result};
pub use gradient_shap::{GradientShap, ShapConfig};
pub use integrated_gradients::IntegratedGradients;
pub use integrator::{ApproximationMethod, PathConfig, PathIntegrator};
pub use layer_conductance::LayerConductance;
pub use neuron_conductance::NeuronConductance;
pub use noise_tunnel::{NoiseAggregation, NoiseConfig, NoiseTunnel};
