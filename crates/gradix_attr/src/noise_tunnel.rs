//! NoiseTunnel: noise-averaging over any attribution method.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use gradix_core::{CoreError, Seed};

use crate::attribution::{AttributionMap, AttributionMethod};
use crate::error::{AttrError, Result};

/// How per-sample attributions are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseAggregation {
    /// Elementwise mean of the sample attributions.
    Smoothgrad,
    /// Elementwise mean of the squared sample attributions.
    SmoothgradSq,
    /// Elementwise variance of the sample attributions.
    Vargrad,
}

impl std::fmt::Display for NoiseAggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Smoothgrad => "smoothgrad",
            Self::SmoothgradSq => "smoothgrad_sq",
            Self::Vargrad => "vargrad",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for NoiseAggregation {
    type Err = AttrError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "smoothgrad" => Ok(Self::Smoothgrad),
            "smoothgrad_sq" => Ok(Self::SmoothgradSq),
            "vargrad" => Ok(Self::Vargrad),
            other => Err(AttrError::UnsupportedAggregation(other.to_string())),
        }
    }
}

/// Configuration for [`NoiseTunnel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Number of noisy samples.
    pub n_samples: usize,
    /// Standard deviation of the zero-mean Gaussian input perturbation.
    pub stdev: f32,
    /// Aggregation mode.
    ///
    /// Completeness deltas from the wrapped method are aggregated by plain
    /// mean in *every* mode; they are not redefined to match the
    /// squared/variance semantics. Known limitation, kept so downstream
    /// consumers see stable numbers across modes.
    pub mode: NoiseAggregation,
    /// Seed for the noise draws; entropy when unset.
    pub seed: Option<Seed>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            n_samples: 5,
            stdev: 1.0,
            mode: NoiseAggregation::Smoothgrad,
            seed: None,
        }
    }
}

impl NoiseConfig {
    /// Set the number of noisy samples.
    #[must_use]
    pub fn with_n_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    /// Set the noise deviation.
    #[must_use]
    pub fn with_stdev(mut self, stdev: f32) -> Self {
        self.stdev = stdev;
        self
    }

    /// Set the aggregation mode.
    #[must_use]
    pub fn with_mode(mut self, mode: NoiseAggregation) -> Self {
        self.mode = mode;
        self
    }

    /// Fix the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Draw a `(rows, cols)` tensor of independent `N(0, stdev^2)` noise from a
/// host-side RNG, keeping stochastic methods reproducible per [`Seed`]
/// independently of backend state.
pub(crate) fn gaussian_noise<B: Backend>(
    rng: &mut ChaCha8Rng,
    stdev: f32,
    shape: [usize; 2],
    device: &B::Device,
) -> Result<Tensor<B, 2>> {
    let normal = Normal::new(0.0f32, stdev).map_err(|err| {
        CoreError::InvalidParameter(format!("invalid noise deviation {stdev}: {err}"))
    })?;
    let data: Vec<f32> = (0..shape[0] * shape[1])
        .map(|_| normal.sample(rng))
        .collect();
    Ok(Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape(shape))
}

/// Noise-averaging decorator over any attribution method.
///
/// For each of `n_samples` draws the input is perturbed with independent
/// zero-mean Gaussian noise and the wrapped method is invoked on the
/// perturbed input; sample attributions are then aggregated per
/// [`NoiseAggregation`]. The wrapped method is called once per sample so its
/// own per-call numerical behavior (including its internal batch expansion)
/// is preserved.
///
/// Works with any [`AttributionMethod`] value, including closures that bind
/// a concrete method's remaining arguments.
///
/// Reference: Smilkov et al., "SmoothGrad: removing noise by adding noise",
/// 2017.
#[derive(Debug, Clone, Default)]
pub struct NoiseTunnel {
    config: NoiseConfig,
}

impl NoiseTunnel {
    /// Create a new tunnel from a noise configuration.
    pub fn new(config: NoiseConfig) -> Self {
        Self { config }
    }

    /// The noise configuration.
    #[must_use]
    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// Run the wrapped method over noisy samples of `input` and aggregate.
    ///
    /// Deltas reported by the wrapped method are averaged (plain mean) and
    /// attached when every sample produced one.
    ///
    /// # Errors
    ///
    /// Parameter validation failures, or any error from the wrapped method.
    pub fn attribute<B, M>(&self, method: &M, input: &Tensor<B, 2>) -> Result<AttributionMap<B>>
    where
        B: AutodiffBackend,
        M: AttributionMethod<B>,
    {
        let n_samples = self.config.n_samples;
        if n_samples == 0 {
            return Err(CoreError::InvalidParameter(format!(
                "n_samples must be >= 1, got {n_samples}"
            ))
            .into());
        }
        if self.config.stdev < 0.0 || !self.config.stdev.is_finite() {
            return Err(CoreError::InvalidParameter(format!(
                "stdev must be a finite non-negative number, got {}",
                self.config.stdev
            ))
            .into());
        }

        let [batch, features] = input.dims();
        let device = input.device();
        let seed = self.config.seed.unwrap_or_else(Seed::from_entropy);
        let mut rng = seed.derive("noise").to_rng();

        tracing::debug!(
            batch,
            features,
            n_samples,
            stdev = self.config.stdev,
            mode = %self.config.mode,
            "running noise tunnel"
        );

        let mut samples: Vec<Tensor<B, 2>> = Vec::with_capacity(n_samples);
        let mut deltas: Vec<Tensor<B, 1>> = Vec::with_capacity(n_samples);
        for _ in 0..n_samples {
            let noise =
                gaussian_noise::<B>(&mut rng, self.config.stdev, [batch, features], &device)?;
            let result = method.attribute(&(input.clone() + noise))?;
            if let Some(delta) = result.delta {
                deltas.push(delta);
            }
            samples.push(result.values);
        }

        let inv = 1.0 / n_samples as f32;
        let mut sum = input.zeros_like();
        for sample in &samples {
            sum = sum + sample.clone();
        }
        let mean = sum * inv;

        let values = match self.config.mode {
            NoiseAggregation::Smoothgrad => mean,
            NoiseAggregation::SmoothgradSq => {
                let mut sum_sq = input.zeros_like();
                for sample in &samples {
                    sum_sq = sum_sq + sample.clone() * sample.clone();
                }
                sum_sq * inv
            }
            NoiseAggregation::Vargrad => {
                // Two-pass variance: squared deviations keep the result
                // elementwise non-negative.
                let mut sum_sq_dev = input.zeros_like();
                for sample in &samples {
                    let dev = sample.clone() - mean.clone();
                    sum_sq_dev = sum_sq_dev + dev.clone() * dev;
                }
                sum_sq_dev * inv
            }
        };

        let map = AttributionMap::new(values);
        if deltas.len() == n_samples {
            let mut delta_sum = Tensor::<B, 1>::zeros([batch], &device);
            for delta in &deltas {
                delta_sum = delta_sum + delta.clone();
            }
            Ok(map.with_delta(delta_sum * inv))
        } else {
            Ok(map)
        }
    }
}
