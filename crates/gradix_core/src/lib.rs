//! # gradix_core
//!
//! Core types and traits for gradix gradient attribution.
//!
//! This crate provides:
//! - [`Seed`] for deterministic random number generation
//! - [`TargetSpec`] for selecting the attributed output component
//! - [`DifferentiableModel`] and [`LayerObservable`] model evaluation traits
//! - Baseline broadcasting helpers
//! - Error types and common utilities
//!
//! ## Shape Convention
//!
//! Attribution inputs follow the convention `(B, F)`:
//! - `B`: Batch size (number of examples)
//! - `F`: Features (input features, or neurons for layer activations)
//!
//! Model outputs are `(B, O)` with `O` output scores per example.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod baseline;
mod error;
mod model;
mod seed;
mod target;

pub use baseline::expand_baseline;
pub use error::{CoreError, Result};
pub use model::{DifferentiableModel, LayerId, LayerObservable};
pub use seed::Seed;
pub use target::TargetSpec;

/// Backend type aliases for convenience
pub mod backend {
    #[cfg(feature = "backend-ndarray")]
    pub use burn_autodiff::Autodiff;

    #[cfg(feature = "backend-ndarray")]
    pub use burn_ndarray::NdArray;
}
