//! GradientShap attribution.

use std::marker::PhantomData;

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use rand::Rng;
use serde::{Deserialize, Serialize};

use gradix_core::{CoreError, DifferentiableModel, Seed, TargetSpec};

use crate::attribution::AttributionMap;
use crate::error::Result;
use crate::gradient::{convergence_delta, input_gradients};
use crate::noise_tunnel::gaussian_noise;

/// Configuration for [`GradientShap`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapConfig {
    /// Number of random path samples.
    pub n_samples: usize,
    /// Standard deviation of Gaussian noise added to each sampled point.
    pub stdevs: f32,
    /// Seed for the baseline/interpolation/noise draws; entropy when unset.
    pub seed: Option<Seed>,
    /// Whether to compute the per-example completeness error against the
    /// mean baseline.
    pub return_error: bool,
}

impl Default for ShapConfig {
    fn default() -> Self {
        Self {
            n_samples: 50,
            stdevs: 0.0,
            seed: None,
            return_error: false,
        }
    }
}

impl ShapConfig {
    /// Set the number of path samples.
    #[must_use]
    pub fn with_n_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    /// Set the input noise deviation.
    #[must_use]
    pub fn with_stdevs(mut self, stdevs: f32) -> Self {
        self.stdevs = stdevs;
        self
    }

    /// Fix the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Request the per-example completeness error.
    #[must_use]
    pub fn with_return_error(mut self, return_error: bool) -> Self {
        self.return_error = return_error;
        self
    }
}

/// Expected-gradient attribution over a distribution of baselines.
///
/// Replaces the fixed straight-line path of
/// [`crate::IntegratedGradients`] with a stochastic ensemble: per sample a
/// baseline row is drawn uniformly from the distribution and an
/// interpolation scalar uniformly from `[0, 1)`, the gradient is evaluated
/// at the interpolated point, and gradient × `(input - baseline)` is
/// accumulated; the attribution is the sample mean. This approximates the
/// same expected-gradient integral while trading determinism for robustness
/// to the baseline choice. A fixed [`Seed`] makes two calls bit-identical.
///
/// Reference: Lundberg & Lee, "A Unified Approach to Interpreting Model
/// Predictions", NeurIPS 2017.
pub struct GradientShap<B, M> {
    model: M,
    marker: PhantomData<B>,
}

impl<B, M> GradientShap<B, M>
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

    /// Compute attributions for `input` against a `(K, F)` batch of
    /// candidate baselines.
    ///
    /// All `n_samples * B` sampled points are evaluated as one flattened
    /// batch. The completeness delta, when requested, uses the mean of the
    /// baseline distribution for its output-delta term.
    ///
    /// # Errors
    ///
    /// Shape or parameter validation failures, or a missing gradient path.
    pub fn attribute(
        &self,
        input: &Tensor<B, 2>,
        baselines: &Tensor<B, 2>,
        target: &TargetSpec,
        config: &ShapConfig,
    ) -> Result<AttributionMap<B>> {
        if config.n_samples == 0 {
            return Err(CoreError::InvalidParameter(format!(
                "n_samples must be >= 1, got {}",
                config.n_samples
            ))
            .into());
        }
        if config.stdevs < 0.0 || !config.stdevs.is_finite() {
            return Err(CoreError::InvalidParameter(format!(
                "stdevs must be a finite non-negative number, got {}",
                config.stdevs
            ))
            .into());
        }
        let [batch, features] = input.dims();
        let [n_baselines, base_features] = baselines.dims();
        if base_features != features || n_baselines == 0 {
            return Err(CoreError::shape_mismatch([1, features], [n_baselines, base_features]).into());
        }

        let seed = config.seed.unwrap_or_else(Seed::from_entropy);
        let total = batch * config.n_samples;
        let device = input.device();

        tracing::debug!(
            batch,
            features,
            n_baselines,
            n_samples = config.n_samples,
            "computing gradient shap"
        );

        // One uniformly drawn baseline row and interpolation scalar per
        // flattened example.
        let mut baseline_rng = seed.derive("baselines").to_rng();
        let indices: Vec<i32> = (0..total)
            .map(|_| baseline_rng.gen_range(0..n_baselines) as i32)
            .collect();
        let chosen = baselines
            .clone()
            .select(0, Tensor::<B, 1, Int>::from_ints(indices.as_slice(), &device));

        let mut alpha_rng = seed.derive("alphas").to_rng();
        let alphas: Vec<f32> = (0..total).map(|_| alpha_rng.gen::<f32>()).collect();
        let alphas =
            Tensor::<B, 1>::from_floats(alphas.as_slice(), &device).reshape([total, 1]);

        let expanded_input = input.clone().repeat_dim(0, config.n_samples);
        let diffs = expanded_input - chosen.clone();
        let mut points = chosen + diffs.clone() * alphas;
        if config.stdevs > 0.0 {
            let mut noise_rng = seed.derive("noise").to_rng();
            points = points
                + gaussian_noise::<B>(&mut noise_rng, config.stdevs, [total, features], &device)?;
        }

        let grads = input_gradients(
            &self.model,
            points,
            &target.expand_steps(config.n_samples),
        )?;
        let values = (grads * diffs)
            .reshape([config.n_samples, batch, features])
            .mean_dim(0)
            .reshape([batch, features]);

        let map = AttributionMap::new(values);
        if config.return_error {
            let mean_baseline = baselines.clone().mean_dim(0).repeat_dim(0, batch);
            let delta =
                convergence_delta(&self.model, &map.values, input, &mean_baseline, target)?;
            Ok(map.with_delta(delta))
        } else {
            Ok(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_close, CubicModel, LinearModel, TestBackend};
    use crate::AttrError;

    #[test]
    fn test_linear_model_with_degenerate_distribution_is_exact() {
        let device = Default::default();
        let model = LinearModel::new(&[[2.0], [-1.0]], &device);
        let shap = GradientShap::new(model);
        let input = Tensor::<TestBackend, 2>::from_floats([[3.0, 1.0]], &device);
        // Two identical baseline rows: every draw yields the same path.
        let baselines =
            Tensor::<TestBackend, 2>::from_floats([[1.0, 1.0], [1.0, 1.0]], &device);

        let config = ShapConfig::default()
            .with_n_samples(8)
            .with_seed(Seed::new(7))
            .with_return_error(true);
        let map = shap
            .attribute(&input, &baselines, &TargetSpec::Index(0), &config)
            .unwrap();

        // Constant gradient: w * (x - b) regardless of the drawn alphas.
        let values: Vec<f32> = map.values.into_data().to_vec().unwrap();
        assert_close(&values, &[4.0, 0.0], 1e-5);

        let delta: Vec<f32> = map.delta.unwrap().into_data().to_vec().unwrap();
        assert!(delta[0].abs() < 1e-5);
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let device = Default::default();
        let shap = GradientShap::new(CubicModel);
        let input = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0]], &device);
        let baselines =
            Tensor::<TestBackend, 2>::from_floats([[0.0, 0.0], [0.5, 0.5]], &device);

        let config = ShapConfig::default()
            .with_n_samples(16)
            .with_stdevs(0.1)
            .with_seed(Seed::new(42));

        let first: Vec<f32> = shap
            .attribute(&input, &baselines, &TargetSpec::Index(0), &config)
            .unwrap()
            .values
            .into_data()
            .to_vec()
            .unwrap();
        let second: Vec<f32> = shap
            .attribute(&input, &baselines, &TargetSpec::Index(0), &config)
            .unwrap()
            .values
            .into_data()
            .to_vec()
            .unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_statistically_consistent_with_expected_gradients() {
        let device = Default::default();
        let shap = GradientShap::new(CubicModel);
        let input = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0]], &device);
        let baselines = Tensor::<TestBackend, 2>::zeros([1, 2], &device);

        let config = ShapConfig::default()
            .with_n_samples(200)
            .with_seed(Seed::new(3));
        let map = shap
            .attribute(&input, &baselines, &TargetSpec::Index(0), &config)
            .unwrap();

        // The expected-gradient integral from a zero baseline is x^3, the
        // same value Integrated Gradients converges to.
        let values: Vec<f32> = map.values.into_data().to_vec().unwrap();
        assert_close(&values, &[1.0, 8.0], 2.0);
    }

    #[test]
    fn test_baseline_identity_gives_zero_attribution() {
        let device = Default::default();
        let shap = GradientShap::new(CubicModel);
        let input = Tensor::<TestBackend, 2>::from_floats([[1.5, -0.5]], &device);

        let map = shap
            .attribute(
                &input,
                &input,
                &TargetSpec::Index(0),
                &ShapConfig::default().with_n_samples(4).with_seed(Seed::new(1)),
            )
            .unwrap();
        let values: Vec<f32> = map.values.into_data().to_vec().unwrap();
        assert_close(&values, &[0.0, 0.0], 1e-6);
    }

    #[test]
    fn test_zero_samples_rejected() {
        let device = Default::default();
        let model = LinearModel::new(&[[1.0]], &device);
        let shap = GradientShap::new(model);
        let input = Tensor::<TestBackend, 2>::zeros([1, 1], &device);

        let err = shap
            .attribute(
                &input,
                &input,
                &TargetSpec::Index(0),
                &ShapConfig::default().with_n_samples(0),
            )
            .unwrap_err();
        assert!(matches!(err, AttrError::Core(CoreError::InvalidParameter(_))));
    }

    #[test]
    fn test_negative_stdevs_rejected() {
        let device = Default::default();
        let model = LinearModel::new(&[[1.0]], &device);
        let shap = GradientShap::new(model);
        let input = Tensor::<TestBackend, 2>::zeros([1, 1], &device);

        let err = shap
            .attribute(
                &input,
                &input,
                &TargetSpec::Index(0),
                &ShapConfig::default().with_stdevs(-0.5),
            )
            .unwrap_err();
        assert!(matches!(err, AttrError::Core(CoreError::InvalidParameter(_))));
    }

    #[test]
    fn test_baseline_feature_mismatch_rejected() {
        let device = Default::default();
        let model = LinearModel::new(&[[1.0], [1.0]], &device);
        let shap = GradientShap::new(model);
        let input = Tensor::<TestBackend, 2>::zeros([1, 2], &device);
        let baselines = Tensor::<TestBackend, 2>::zeros([4, 3], &device);

        let err = shap
            .attribute(&input, &baselines, &TargetSpec::Index(0), &ShapConfig::default())
            .unwrap_err();
        assert!(matches!(err, AttrError::Core(CoreError::ShapeMismatch { .. })));
    }
}
