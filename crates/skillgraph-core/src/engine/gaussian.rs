//! One-dimensional Gaussian in natural parameters.
//!
//! A [`Gaussian`] is stored as precision `π = 1/σ²` and precision-mean
//! `τ = π·μ`. In this parameterization the product of two densities is the
//! sum of their natural parameters and the quotient is the difference, which
//! is all message passing needs:
//!
//! ```text
//! N(π₁, τ₁) · N(π₂, τ₂) = N(π₁ + π₂, τ₁ + τ₂)
//! N(π₁, τ₁) / N(π₂, τ₂) = N(π₁ − π₂, τ₁ − τ₂)
//! ```
//!
//! `π = 0` is the vacuous Gaussian (σ = ∞, no information). It is the identity
//! of the product and every accessor handles it without dividing by zero.

use std::fmt;
use std::ops::{Div, Mul};

/// A normal distribution in natural parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gaussian {
    /// Precision (π = 1/σ²)
    pub pi: f64,
    /// Precision-adjusted mean (τ = π·μ)
    pub tau: f64,
}

impl Gaussian {
    /// The vacuous Gaussian: no information, identity of the product.
    pub const VACUOUS: Gaussian = Gaussian { pi: 0.0, tau: 0.0 };

    /// Builds a Gaussian from natural parameters.
    #[inline]
    pub const fn from_precision(pi: f64, tau: f64) -> Self {
        Self { pi, tau }
    }

    /// Builds a Gaussian from mean and standard deviation.
    ///
    /// `sigma = ∞` yields the vacuous Gaussian.
    #[inline]
    pub fn from_mean_sigma(mu: f64, sigma: f64) -> Self {
        let pi = 1.0 / (sigma * sigma);
        Self { pi, tau: pi * mu }
    }

    /// Mean μ = τ/π, or 0 for the vacuous Gaussian.
    #[inline]
    pub fn mean(&self) -> f64 {
        if self.pi == 0.0 {
            0.0
        } else {
            self.tau / self.pi
        }
    }

    /// Standard deviation σ = 1/√π, or ∞ for the vacuous Gaussian.
    #[inline]
    pub fn sigma(&self) -> f64 {
        if self.pi == 0.0 {
            f64::INFINITY
        } else {
            (1.0 / self.pi).sqrt()
        }
    }

    /// Variance σ² = 1/π, or ∞ for the vacuous Gaussian.
    #[inline]
    pub fn variance(&self) -> f64 {
        if self.pi == 0.0 {
            f64::INFINITY
        } else {
            1.0 / self.pi
        }
    }

    /// Returns true when the Gaussian carries no information.
    #[inline]
    pub fn is_vacuous(&self) -> bool {
        self.pi == 0.0 && self.tau == 0.0
    }

    /// Largest absolute difference between the natural parameters of two Gaussians.
    #[inline]
    pub fn max_abs_delta(&self, other: &Gaussian) -> f64 {
        (self.pi - other.pi).abs().max((self.tau - other.tau).abs())
    }
}

impl Mul for Gaussian {
    type Output = Gaussian;

    #[inline]
    fn mul(self, rhs: Gaussian) -> Gaussian {
        Gaussian::from_precision(self.pi + rhs.pi, self.tau + rhs.tau)
    }
}

impl Div for Gaussian {
    type Output = Gaussian;

    #[inline]
    fn div(self, rhs: Gaussian) -> Gaussian {
        Gaussian::from_precision(self.pi - rhs.pi, self.tau - rhs.tau)
    }
}

impl fmt::Display for Gaussian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N(mu={:.3}, sigma={:.3}, pi={:.3}, tau={:.3})",
            self.mean(),
            self.sigma(),
            self.pi,
            self.tau
        )
    }
}
