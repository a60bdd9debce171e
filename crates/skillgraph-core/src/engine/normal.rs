//! Standard normal primitives and truncation correction functions.
//!
//! The truncation factors divide pdf by cdf deep in the tails, so `cdf` is
//! built on `libm::erfc` (full double precision) and `ppf` on `statrs`'
//! `erfc_inv` rather than a low-order approximation. [`verify_primitives`] pins fixed reference values and must
//! pass before any contest is rated.
//!
//! ## Correction functions
//!
//! For a latent difference `x ~ N(t, 1)` and margin `e`:
//!
//! ```text
//! win  (x > e):   V = φ(t−e) / Φ(t−e)
//!                 W = V·(V + t − e)
//! draw (|x| < e): V = (φ(−e−t) − φ(e−t)) / (Φ(e−t) − Φ(−e−t))
//!                 W = V² + ((e−t)·φ(e−t) + (e+t)·φ(e+t)) / (Φ(e−t) − Φ(−e−t))
//! ```
//!
//! `t + V` is the mean and `1 − W` the variance of the truncated normal. When
//! the cdf denominator underflows the functions return their asymptotic
//! limits: the truncated mass collapses onto the nearest boundary, so
//! `t + V` is that boundary and `W = 1`.

use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

use statrs::function::erf::erfc_inv;

use crate::engine::errors::RatingError;

/// 1/√(2π)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Absolute tolerance of the primitive self-check.
pub const SELF_CHECK_TOLERANCE: f64 = 1e-12;

/// Fixed reference points `(name, function, input, expected)` for the self-check.
pub const REFERENCE_VALUES: [(&str, fn(f64) -> f64, f64, f64); 3] = [
    ("cdf", cdf, 1.4, 0.919_243_340_766_228_934),
    ("pdf", pdf, 1.4, 0.149_727_465_635_744_877),
    ("ppf", ppf, 0.4, -0.253_347_103_135_799_723),
];

/// Standard normal density.
#[inline]
pub fn pdf(x: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal cumulative distribution.
#[inline]
pub fn cdf(x: f64) -> f64 {
    0.5 * libm::erfc(-x * FRAC_1_SQRT_2)
}

/// Standard normal quantile (inverse cdf). `ppf(0) = −∞`, `ppf(1) = ∞`.
#[inline]
pub fn ppf(p: f64) -> f64 {
    -SQRT_2 * erfc_inv(2.0 * p)
}

/// Compares the primitives against [`REFERENCE_VALUES`].
///
/// A mismatch means every truncation update would be silently wrong, so it
/// is reported as a fatal [`RatingError::Configuration`].
pub fn verify_primitives() -> Result<(), RatingError> {
    for (name, function, input, expected) in REFERENCE_VALUES {
        let actual = function(input);
        if (actual - expected).abs() > SELF_CHECK_TOLERANCE || !actual.is_finite() {
            return Err(RatingError::Configuration(format!(
                "normal primitive self-check failed: {}({}) = {:.18}, expected {:.18}",
                name, input, actual, expected
            )));
        }
    }
    Ok(())
}

/// Additive mean correction for a one-sided truncation `x > e`.
pub fn v_win(t: f64, e: f64) -> f64 {
    let x = t - e;
    let denom = cdf(x);
    if denom < f64::MIN_POSITIVE {
        return -x;
    }
    pdf(x) / denom
}

/// Multiplicative variance correction for a one-sided truncation `x > e`.
pub fn w_win(t: f64, e: f64) -> f64 {
    let x = t - e;
    if cdf(x) < f64::MIN_POSITIVE {
        return 1.0;
    }
    let v = v_win(t, e);
    v * (v + x)
}

/// Additive mean correction for a two-sided truncation `|x| < e`.
///
/// Odd in `t`; negative `t` is evaluated through its mirror so the cdf
/// difference is always taken between two lower tails.
pub fn v_draw(t: f64, e: f64) -> f64 {
    if t < 0.0 {
        return -v_draw(-t, e);
    }
    let denom = cdf(e - t) - cdf(-e - t);
    if denom < f64::MIN_POSITIVE {
        return e - t;
    }
    (pdf(-e - t) - pdf(e - t)) / denom
}

/// Multiplicative variance correction for a two-sided truncation `|x| < e`.
///
/// Even in `t`.
pub fn w_draw(t: f64, e: f64) -> f64 {
    let t = t.abs();
    let denom = cdf(e - t) - cdf(-e - t);
    if denom < f64::MIN_POSITIVE {
        return 1.0;
    }
    let v = v_draw(t, e);
    v * v + ((e - t) * pdf(e - t) + (e + t) * pdf(e + t)) / denom
}

/// True when the win correction at `(t, e)` is the asymptotic limit.
pub(crate) fn win_is_asymptotic(t: f64, e: f64) -> bool {
    cdf(t - e) < f64::MIN_POSITIVE
}

/// True when the draw correction at `(t, e)` is the asymptotic limit.
pub(crate) fn draw_is_asymptotic(t: f64, e: f64) -> bool {
    let t = t.abs();
    cdf(e - t) - cdf(-e - t) < f64::MIN_POSITIVE
}
