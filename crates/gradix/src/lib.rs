//! # gradix
//!
//! Gradient-integration attribution for differentiable models.
//!
//! gradix explains a model's output in terms of its inputs, neurons, and
//! layers by integrating gradients along paths from a baseline:
//!
//! - **Integrated Gradients**: path-integral attribution at the input level,
//!   with a completeness error estimate
//! - **Layer / Neuron Conductance**: the same path integral expressed at a
//!   named intermediate layer, or through one selected neuron
//! - **GradientShap**: expected gradients over a distribution of baselines
//! - **NoiseTunnel**: smoothgrad / vargrad noise-averaging over any method
//!
//! Models are consumed through two traits: [`DifferentiableModel`] (batched
//! forward pass plus autodiff gradients) and [`LayerObservable`] (named
//! intermediate activations). Any Burn autodiff backend works.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gradix::prelude::*;
//!
//! let ig = IntegratedGradients::new(&model);
//! let config = PathConfig::default().with_n_steps(50).with_return_error(true);
//! let map = ig.attribute(&input, &baseline, &TargetSpec::Index(0), &config)?;
//!
//! // Smooth any method by wrapping its bound call.
//! let tunnel = NoiseTunnel::new(NoiseConfig::default().with_stdev(0.1));
//! let bound = |x: &_| ig.attribute(x, &baseline, &TargetSpec::Index(0), &config);
//! let smoothed = tunnel.attribute(&bound, &input)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub use gradix_attr::{
    ApproximationMethod, AttrError, AttributionMap, AttributionMethod, GradientShap,
    IntegratedGradients, LayerConductance, NeuronConductance, NoiseAggregation, NoiseConfig,
    NoiseTunnel, PathConfig, PathIntegrator, ShapConfig,
};
pub use gradix_core::{
    backend, expand_baseline, CoreError, DifferentiableModel, LayerId, LayerObservable, Seed,
    TargetSpec,
};

/// Convenience re-exports for the common attribution workflow.
pub mod prelude {
    pub use gradix_attr::{
        ApproximationMethod, AttributionMap, AttributionMethod, GradientShap,
        IntegratedGradients, LayerConductance, NeuronConductance, NoiseAggregation, NoiseConfig,
        NoiseTunnel, PathConfig, ShapConfig,
    };
    pub use gradix_core::{DifferentiableModel, LayerId, LayerObservable, Seed, TargetSpec};
}
