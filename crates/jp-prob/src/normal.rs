//! Standard normal distribution utilities.
//!
//! Φ, φ, Φ⁻¹ and the tail-stable helpers the sequential-conditioning recursion
//! needs (`log Φ`, inverse Mills ratio `φ/Φ`).

use statrs::function::erf::{erfc, erfc_inv};
use std::f64::consts::SQRT_2;

/// Natural log of `sqrt(2π)`.
///
/// `ln(sqrt(2π)) = 0.5*ln(2π)` (precomputed to keep this crate const-friendly).
const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

/// Below this `z`, `Φ(z)` is evaluated through its asymptotic expansion
/// (`erfc` underflows around `z = -37.5`).
const ASYMPTOTIC_TAIL: f64 = -30.0;

/// Standard normal PDF `φ(x)`.
#[inline]
pub fn pdf(x: f64) -> f64 {
    (-0.5 * x * x - LN_SQRT_2PI).exp()
}

/// Standard normal CDF `Φ(x)`.
#[inline]
pub fn cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal survival function `1 - Φ(x)`.
#[inline]
pub fn sf(x: f64) -> f64 {
    0.5 * erfc(x / SQRT_2)
}

/// Standard normal quantile `Φ⁻¹(p)`.
///
/// `p <= 0` maps to `-∞`, `p >= 1` to `+∞`, NaN propagates.
pub fn quantile(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    -SQRT_2 * erfc_inv(2.0 * p)
}

/// Asymptotic series `Φ(z)/φ(z) · (-z) = 1 - 1/z² + 3/z⁴ - 15/z⁶` for `z → -∞`.
#[inline]
fn mills_series(z: f64) -> f64 {
    let inv2 = 1.0 / (z * z);
    1.0 - inv2 * (1.0 - inv2 * (3.0 - 15.0 * inv2))
}

/// `ln Φ(z)`, finite down to `z ≈ -1e150`.
pub fn log_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z == f64::INFINITY {
        return 0.0;
    }
    if z < ASYMPTOTIC_TAIL {
        if z == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }
        // Φ(z) ≈ φ(z)/(-z) · series
        return -0.5 * z * z - LN_SQRT_2PI - (-z).ln() + mills_series(z).ln();
    }
    if z > 5.0 {
        // Φ close to 1: ln(1 - sf) keeps the small complement.
        return (-sf(z)).ln_1p();
    }
    cdf(z).ln()
}

/// Inverse Mills ratio `φ(z)/Φ(z)` (mean shift of a normal truncated above at `z`).
///
/// Tends to 0 as `z → +∞` and to `-z` as `z → -∞`.
pub fn inverse_mills_ratio(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z == f64::INFINITY {
        return 0.0;
    }
    if z == f64::NEG_INFINITY {
        return f64::INFINITY;
    }
    if z < ASYMPTOTIC_TAIL {
        return -z / mills_series(z);
    }
    pdf(z) / cdf(z)
}
