//! Path integration of gradients from a baseline to an input.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use gradix_core::CoreError;

use crate::error::Result;

/// Rule for approximating the path integral of gradients.
///
/// All rules produce abscissae in `[0, 1]` with weights summing to 1, so a
/// constant integrand (a linear model) is integrated exactly by every rule
/// at any step count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproximationMethod {
    /// Left Riemann sum.
    RiemannLeft,
    /// Right Riemann sum.
    RiemannRight,
    /// Midpoint Riemann sum.
    RiemannMiddle,
    /// Trapezoid rule; degenerates to the midpoint for a single step.
    RiemannTrapezoid,
    /// Gauss-Legendre quadrature, exact for polynomial integrands of
    /// degree <= 2n - 1.
    #[serde(rename = "gausslegendre")]
    GaussLegendre,
}

impl std::fmt::Display for ApproximationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RiemannLeft => "riemann_left",
            Self::RiemannRight => "riemann_right",
            Self::RiemannMiddle => "riemann_middle",
            Self::RiemannTrapezoid => "riemann_trapezoid",
            Self::GaussLegendre => "gausslegendre",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ApproximationMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "riemann_left" => Ok(Self::RiemannLeft),
            "riemann_right" => Ok(Self::RiemannRight),
            "riemann_middle" => Ok(Self::RiemannMiddle),
            "riemann_trapezoid" => Ok(Self::RiemannTrapezoid),
            "gausslegendre" => Ok(Self::GaussLegendre),
            other => Err(CoreError::InvalidParameter(format!(
                "unknown approximation method `{other}`"
            ))),
        }
    }
}

/// Configuration shared by the path-integration methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Number of integration steps along the path.
    pub n_steps: usize,
    /// Integration rule.
    pub method: ApproximationMethod,
    /// Whether to compute the per-example completeness error.
    pub return_error: bool,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            n_steps: 50,
            method: ApproximationMethod::GaussLegendre,
            return_error: false,
        }
    }
}

impl PathConfig {
    /// Set the number of integration steps.
    #[must_use]
    pub fn with_n_steps(mut self, n_steps: usize) -> Self {
        self.n_steps = n_steps;
        self
    }

    /// Set the integration rule.
    #[must_use]
    pub fn with_method(mut self, method: ApproximationMethod) -> Self {
        self.method = method;
        self
    }

    /// Request the per-example completeness error.
    #[must_use]
    pub fn with_return_error(mut self, return_error: bool) -> Self {
        self.return_error = return_error;
        self
    }
}

/// Riemann-sum approximation of the line integral of gradients along the
/// straight path from a baseline to an input.
///
/// The integrator expands all steps into one flattened `(n_steps * B, F)`
/// evaluation batch (steps-major) so the model is evaluated once per
/// attribution call rather than once per step; the batched numerical
/// behavior is the behavior this engine preserves.
#[derive(Debug, Clone)]
pub struct PathIntegrator {
    n_steps: usize,
    method: ApproximationMethod,
}

impl PathIntegrator {
    /// Create a new integrator.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidParameter`] if `n_steps` is zero.
    pub fn new(n_steps: usize, method: ApproximationMethod) -> Result<Self> {
        if n_steps == 0 {
            return Err(CoreError::InvalidParameter(format!(
                "n_steps must be >= 1, got {n_steps}"
            ))
            .into());
        }
        Ok(Self { n_steps, method })
    }

    /// Number of integration steps.
    #[must_use]
    pub const fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// The integration rule in use.
    #[must_use]
    pub const fn method(&self) -> ApproximationMethod {
        self.method
    }

    /// Abscissae of the rule, ascending in `[0, 1]`.
    #[must_use]
    pub fn alphas(&self) -> Vec<f64> {
        let n = self.n_steps;
        match self.method {
            ApproximationMethod::RiemannLeft => {
                (0..n).map(|i| i as f64 / n as f64).collect()
            }
            ApproximationMethod::RiemannRight => {
                (0..n).map(|i| (i + 1) as f64 / n as f64).collect()
            }
            ApproximationMethod::RiemannMiddle => {
                (0..n).map(|i| (i as f64 + 0.5) / n as f64).collect()
            }
            ApproximationMethod::RiemannTrapezoid => {
                if n == 1 {
                    vec![0.5]
                } else {
                    (0..n).map(|i| i as f64 / (n - 1) as f64).collect()
                }
            }
            ApproximationMethod::GaussLegendre => gauss_legendre(n).0,
        }
    }

    /// Weights of the rule, summing to 1.
    #[must_use]
    pub fn step_sizes(&self) -> Vec<f64> {
        let n = self.n_steps;
        match self.method {
            ApproximationMethod::RiemannLeft
            | ApproximationMethod::RiemannRight
            | ApproximationMethod::RiemannMiddle => vec![1.0 / n as f64; n],
            ApproximationMethod::RiemannTrapezoid => {
                if n == 1 {
                    vec![1.0]
                } else {
                    let h = 1.0 / (n - 1) as f64;
                    let mut weights = vec![h; n];
                    weights[0] = h / 2.0;
                    weights[n - 1] = h / 2.0;
                    weights
                }
            }
            ApproximationMethod::GaussLegendre => gauss_legendre(n).1,
        }
    }

    /// Expand the path into the flattened evaluation batch `(n_steps * B, F)`.
    ///
    /// Row `step * B + example` holds
    /// `baseline + alpha_step * (input - baseline)` for that example. The
    /// baseline must already be expanded to the input's shape.
    pub fn interpolate<B: Backend>(
        &self,
        baseline: &Tensor<B, 2>,
        input: &Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let diff = input.clone() - baseline.clone();
        let rows: Vec<Tensor<B, 2>> = self
            .alphas()
            .into_iter()
            .map(|alpha| baseline.clone() + diff.clone() * alpha as f32)
            .collect();
        Tensor::cat(rows, 0)
    }

    /// Reduce per-step values `(n_steps * B, X)` to their weighted average
    /// `(B, X)` under the rule's weights.
    pub fn average<B: Backend>(&self, step_values: Tensor<B, 2>, batch: usize) -> Tensor<B, 2> {
        let [_, width] = step_values.dims();
        let device = step_values.device();

        let weights: Vec<f32> = self.step_sizes().into_iter().map(|w| w as f32).collect();
        let weights = Tensor::<B, 1>::from_floats(weights.as_slice(), &device)
            .reshape([self.n_steps, 1, 1]);

        let stacked = step_values.reshape([self.n_steps, batch, width]);
        (stacked * weights).sum_dim(0).reshape([batch, width])
    }
}

/// Gauss-Legendre abscissae and weights on `[0, 1]`.
///
/// Nodes on `[-1, 1]` are found by Newton iteration on the Legendre
/// recurrence, then mapped affinely onto the unit interval.
fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    let n_f = n as f64;

    // Roots are symmetric about zero; solve for the first half.
    for i in 0..n.div_ceil(2) {
        let mut z = (std::f64::consts::PI * (i as f64 + 0.75) / (n_f + 0.5)).cos();
        let mut pp;
        loop {
            // Legendre polynomial P_n(z) and its derivative via recurrence.
            let mut p1 = 1.0;
            let mut p2 = 0.0;
            for j in 0..n {
                let p3 = p2;
                p2 = p1;
                p1 = ((2 * j + 1) as f64 * z * p2 - j as f64 * p3) / (j as f64 + 1.0);
            }
            pp = n_f * (z * p1 - p2) / (z * z - 1.0);
            let step = p1 / pp;
            z -= step;
            if step.abs() < 1e-14 {
                break;
            }
        }
        nodes[i] = -z;
        nodes[n - 1 - i] = z;
        weights[i] = 2.0 / ((1.0 - z * z) * pp * pp);
        weights[n - 1 - i] = weights[i];
    }

    // Shift from [-1, 1] to [0, 1].
    for node in &mut nodes {
        *node = 0.5 * (*node + 1.0);
    }
    for weight in &mut weights {
        *weight *= 0.5;
    }
    (nodes, weights)
}
