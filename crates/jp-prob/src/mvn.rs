//! Multivariate normal CDF `P(Z <= b)` for a standardized normal vector `Z`
//! with correlation matrix `R`.
//!
//! ## Method
//!
//! - `+∞` bounds are marginalized out, any `-∞` bound gives 0.
//! - 1 and 2 remaining dimensions are evaluated in closed form / by the
//!   bivariate routine.
//! - 3+ dimensions: Genz (1992) separation of variables on a prioritized
//!   Cholesky factor (Genz & Bretz 2002 variable ordering), integrated with a
//!   randomized Richtmyer lattice (baker's transform) and `n_shifts`
//!   independent random shifts for the error estimate. The number of lattice
//!   points doubles until `3·SE <= absolute_tolerance` or the evaluation budget
//!   is exhausted.
//! - The Cholesky factors are computed here rather than with `nalgebra`, whose
//!   `cholesky()` rejects singular matrices; perfectly correlated events need
//!   zero pivots.
//!
//! ## Reproducibility
//!
//! Shifts come from `StdRng::seed_from_u64(config.seed)`, re-seeded on every
//! call: identical inputs give bit-identical estimates, independent of threading.

use crate::{bivariate, normal};
use jp_core::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Pivots at or below this are treated as exact zeros (singular PSD matrix).
const PIVOT_TOLERANCE: f64 = 1e-10;
/// Negative Schur complements above `-PSD_TOLERANCE` are rounding noise.
const PSD_TOLERANCE: f64 = 1e-8;
/// Largest off-diagonal residual allowed under a zero pivot.
const SINGULAR_RESIDUAL_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Config / result
// ---------------------------------------------------------------------------

/// Configuration for the quasi-Monte-Carlo integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MvnConfig {
    /// Target absolute error (3 standard errors across shifts). Default 1e-6.
    pub absolute_tolerance: f64,
    /// Number of random lattice shifts per pass (>= 2). Default 12.
    pub n_shifts: usize,
    /// Lattice points per shift in the first pass. Default 500.
    pub initial_points: usize,
    /// Integrand evaluation budget across all passes. Default 1,000,000.
    pub max_evaluations: usize,
    /// RNG seed for the lattice shifts.
    pub seed: u64,
}

impl Default for MvnConfig {
    fn default() -> Self {
        Self {
            absolute_tolerance: 1e-6,
            n_shifts: 12,
            initial_points: 500,
            max_evaluations: 1_000_000,
            seed: 42,
        }
    }
}

impl MvnConfig {
    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.absolute_tolerance.is_finite() && self.absolute_tolerance > 0.0) {
            return Err(Error::Validation(format!(
                "absolute_tolerance must be finite and > 0, got {}",
                self.absolute_tolerance
            )));
        }
        if self.n_shifts < 2 {
            return Err(Error::Validation(format!("n_shifts must be >= 2, got {}", self.n_shifts)));
        }
        if self.initial_points == 0 {
            return Err(Error::Validation("initial_points must be > 0".to_string()));
        }
        Ok(())
    }
}

/// MVN CDF estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MvnEstimate {
    /// Probability estimate, in `[0, 1]`.
    pub value: f64,
    /// Error estimate (0 for closed-form paths).
    pub error: f64,
    /// Integrand evaluations spent (0 for closed-form paths).
    pub n_evaluations: usize,
}

impl MvnEstimate {
    fn exact(value: f64) -> Self {
        Self { value, error: 0.0, n_evaluations: 0 }
    }
}

// ---------------------------------------------------------------------------
// Cholesky
// ---------------------------------------------------------------------------

/// Lower Cholesky factor (row-major) of a positive semi-definite matrix.
///
/// Zero pivots are allowed (columns set to zero) as long as the matrix stays
/// consistent with PSD; otherwise returns `Error::Computation`.
pub fn cholesky_psd(matrix: &[f64], n: usize) -> Result<Vec<f64>> {
    if matrix.len() != n * n {
        return Err(Error::Validation(format!(
            "matrix length {} does not match {}x{}",
            matrix.len(),
            n,
            n
        )));
    }
    let mut l = vec![0.0; n * n];
    for j in 0..n {
        let d = matrix[j * n + j] - (0..j).map(|k| l[j * n + k] * l[j * n + k]).sum::<f64>();
        if d < -PSD_TOLERANCE {
            return Err(not_psd(j, d));
        }
        if d <= PIVOT_TOLERANCE {
            for i in (j + 1)..n {
                let s = matrix[i * n + j] - (0..j).map(|k| l[i * n + k] * l[j * n + k]).sum::<f64>();
                if s.abs() > SINGULAR_RESIDUAL_TOLERANCE {
                    return Err(not_psd(j, d));
                }
            }
            continue;
        }
        let djj = d.sqrt();
        l[j * n + j] = djj;
        for i in (j + 1)..n {
            let s = matrix[i * n + j] - (0..j).map(|k| l[i * n + k] * l[j * n + k]).sum::<f64>();
            l[i * n + j] = s / djj;
        }
    }
    Ok(l)
}

/// `Ok(())` if `matrix` (row-major, `n`×`n`) is positive semi-definite.
pub fn check_positive_semidefinite(matrix: &[f64], n: usize) -> Result<()> {
    cholesky_psd(matrix, n).map(|_| ())
}

fn not_psd(pivot: usize, value: f64) -> Error {
    Error::Computation(format!(
        "correlation matrix is not positive semi-definite (pivot {} = {:.3e})",
        pivot, value
    ))
}

/// Cholesky factor and bounds after Genz–Bretz reordering.
struct Factor {
    n: usize,
    l: Vec<f64>,
    upper: Vec<f64>,
}

fn swap_symmetric(c: &mut [f64], n: usize, a: usize, b: usize) {
    for k in 0..n {
        c.swap(a * n + k, b * n + k);
    }
    for k in 0..n {
        c.swap(k * n + a, k * n + b);
    }
}

/// Cholesky with variable prioritization: at each step the remaining variable
/// with the smallest conditional probability goes next.
fn prioritized_cholesky(upper: &[f64], correlation: &[f64], n: usize) -> Result<Factor> {
    let mut c = correlation.to_vec();
    let mut b = upper.to_vec();
    let mut l = vec![0.0; n * n];
    let mut y = vec![0.0; n];

    for i in 0..n {
        let mut best = i;
        let mut best_p = f64::INFINITY;
        for j in i..n {
            let var = c[j * n + j] - (0..i).map(|k| l[j * n + k] * l[j * n + k]).sum::<f64>();
            let p = if var > PIVOT_TOLERANCE {
                let mean: f64 = (0..i).map(|k| l[j * n + k] * y[k]).sum();
                normal::cdf((b[j] - mean) / var.sqrt())
            } else {
                1.0
            };
            if p < best_p {
                best_p = p;
                best = j;
            }
        }
        if best != i {
            swap_symmetric(&mut c, n, i, best);
            for k in 0..n {
                l.swap(i * n + k, best * n + k);
            }
            b.swap(i, best);
        }

        let var = c[i * n + i] - (0..i).map(|k| l[i * n + k] * l[i * n + k]).sum::<f64>();
        if var < -PSD_TOLERANCE {
            return Err(not_psd(i, var));
        }
        if var <= PIVOT_TOLERANCE {
            for r in (i + 1)..n {
                let s = c[r * n + i] - (0..i).map(|k| l[r * n + k] * l[i * n + k]).sum::<f64>();
                if s.abs() > SINGULAR_RESIDUAL_TOLERANCE {
                    return Err(not_psd(i, var));
                }
            }
            y[i] = 0.0;
            continue;
        }
        let d = var.sqrt();
        l[i * n + i] = d;
        for r in (i + 1)..n {
            let s = c[r * n + i] - (0..i).map(|k| l[r * n + k] * l[i * n + k]).sum::<f64>();
            l[r * n + i] = s / d;
        }
        let u = (b[i] - (0..i).map(|k| l[i * n + k] * y[k]).sum::<f64>()) / d;
        // Mean of a standard normal truncated above at u.
        y[i] = -normal::inverse_mills_ratio(u);
    }

    Ok(Factor { n, l, upper: b })
}

// ---------------------------------------------------------------------------
// Integration
// ---------------------------------------------------------------------------

/// Separation-of-variables integrand at lattice point `w ∈ [0,1]^(n-1)`.
fn integrand(f: &Factor, w: &[f64], y: &mut [f64]) -> f64 {
    let n = f.n;
    let mut prod = 1.0;
    for i in 0..n {
        let s: f64 = (0..i).map(|k| f.l[i * n + k] * y[k]).sum();
        let d = f.l[i * n + i];
        let e = if d > 0.0 {
            normal::cdf((f.upper[i] - s) / d)
        } else if f.upper[i] - s >= 0.0 {
            1.0
        } else {
            0.0
        };
        prod *= e;
        if prod == 0.0 {
            return 0.0;
        }
        if i + 1 < n {
            y[i] = if d > 0.0 {
                normal::quantile((w[i] * e).clamp(f64::MIN_POSITIVE, 1.0 - f64::EPSILON))
            } else {
                0.0
            };
        }
    }
    prod
}

fn lattice_qmc(f: &Factor, config: &MvnConfig) -> MvnEstimate {
    let dim = f.n - 1;
    // Richtmyer generators 2^(k/n).
    let q: Vec<f64> = (1..=dim).map(|k| 2f64.powf(k as f64 / f.n as f64)).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut shift = vec![0.0; dim];
    let mut w = vec![0.0; dim];
    let mut y = vec![0.0; f.n];

    let mut n_points = config.initial_points;
    let mut n_evaluations = 0usize;
    loop {
        let mut means = Vec::with_capacity(config.n_shifts);
        for _ in 0..config.n_shifts {
            for s in shift.iter_mut() {
                *s = rng.random::<f64>();
            }
            let mut acc = 0.0;
            for j in 1..=n_points {
                for k in 0..dim {
                    let t = (j as f64 * q[k] + shift[k]).fract();
                    // Baker's (tent) transform.
                    w[k] = (2.0 * t - 1.0).abs();
                }
                acc += integrand(f, &w, &mut y);
            }
            means.push(acc / n_points as f64);
        }
        n_evaluations += config.n_shifts * n_points;

        let ns = means.len() as f64;
        let mean = means.iter().sum::<f64>() / ns;
        let var = means.iter().map(|m| (m - mean) * (m - mean)).sum::<f64>() / (ns * (ns - 1.0));
        let error = 3.0 * var.sqrt();

        if error <= config.absolute_tolerance {
            log::debug!(
                "mvn_cdf: dim={} converged, value={:.6e} error={:.2e} evaluations={}",
                f.n,
                mean,
                error,
                n_evaluations
            );
            return MvnEstimate { value: mean.clamp(0.0, 1.0), error, n_evaluations };
        }
        if n_evaluations + 2 * config.n_shifts * n_points > config.max_evaluations {
            log::warn!(
                "mvn_cdf: dim={} evaluation budget {} exhausted, error={:.2e} > tolerance {:.2e}",
                f.n,
                config.max_evaluations,
                error,
                config.absolute_tolerance
            );
            return MvnEstimate { value: mean.clamp(0.0, 1.0), error, n_evaluations };
        }
        n_points *= 2;
    }
}

/// `P(Z_i <= upper_i ∀ i)` for `Z ~ N(0, R)`, `R` given row-major.
///
/// `+∞` entries are unconstrained. `R` must be a correlation matrix that is
/// positive semi-definite on the constrained coordinates.
pub fn mvn_cdf(upper: &[f64], correlation: &[f64], config: &MvnConfig) -> Result<MvnEstimate> {
    let n = upper.len();
    if n == 0 {
        return Err(Error::Validation("upper bounds must be non-empty".to_string()));
    }
    if correlation.len() != n * n {
        return Err(Error::Validation(format!(
            "correlation length {} does not match {} bounds",
            correlation.len(),
            n
        )));
    }
    if upper.iter().any(|b| b.is_nan()) {
        return Err(Error::Validation("upper bounds must not be NaN".to_string()));
    }
    config.validate()?;

    if upper.iter().any(|&b| b == f64::NEG_INFINITY) {
        return Ok(MvnEstimate::exact(0.0));
    }
    let active: Vec<usize> = (0..n).filter(|&i| upper[i] < f64::INFINITY).collect();
    match active.as_slice() {
        [] => Ok(MvnEstimate::exact(1.0)),
        [i] => Ok(MvnEstimate::exact(normal::cdf(upper[*i]))),
        [i, j] => {
            let rho = correlation[i * n + j];
            Ok(MvnEstimate::exact(bivariate::bivariate_cdf(upper[*i], upper[*j], rho)))
        }
        _ => {
            let m = active.len();
            let b: Vec<f64> = active.iter().map(|&i| upper[i]).collect();
            let mut sub = Vec::with_capacity(m * m);
            for &i in &active {
                for &j in &active {
                    sub.push(correlation[i * n + j]);
                }
            }
            let factor = prioritized_cholesky(&b, &sub, m)?;
            Ok(lattice_qmc(&factor, config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn equicorrelated(n: usize, rho: f64) -> Vec<f64> {
        let mut m = vec![rho; n * n];
        for i in 0..n {
            m[i * n + i] = 1.0;
        }
        m
    }

    #[test]
    fn test_trivariate_orthant_closed_form() {
        // P(Z <= 0) for equicorrelated trivariate: 1/8 + 3·asin(ρ)/(4π).
        for &rho in &[-0.3, 0.2, 0.5, 0.8] {
            let exact = 0.125 + 3.0 * f64::asin(rho) / (4.0 * PI);
            let est = mvn_cdf(&[0.0; 3], &equicorrelated(3, rho), &MvnConfig::default()).unwrap();
            assert!((est.value - exact).abs() < 5e-5, "rho={} est={} exact={}", rho, est.value, exact);
        }
    }

    #[test]
    fn test_identity_is_product() {
        let b = [normal::quantile(0.25), normal::quantile(0.35), normal::quantile(0.5), 0.3];
        let est = mvn_cdf(&b, &equicorrelated(4, 0.0), &MvnConfig::default()).unwrap();
        let exact: f64 = b.iter().map(|&x| normal::cdf(x)).product();
        assert_abs_diff_eq!(est.value, exact, epsilon = 1e-12);
    }

    #[test]
    fn test_unbounded_coordinates_are_marginalized() {
        let r = [1.0, 0.4, 0.2, 0.4, 1.0, 0.3, 0.2, 0.3, 1.0];
        let est = mvn_cdf(&[0.5, f64::INFINITY, -0.2], &r, &MvnConfig::default()).unwrap();
        assert_eq!(est.n_evaluations, 0);
        assert_abs_diff_eq!(est.value, bivariate::bivariate_cdf(0.5, -0.2, 0.2), epsilon = 1e-15);

        let est = mvn_cdf(&[f64::INFINITY; 3], &r, &MvnConfig::default()).unwrap();
        assert_eq!(est.value, 1.0);
        let est = mvn_cdf(&[0.5, f64::NEG_INFINITY, 0.1], &r, &MvnConfig::default()).unwrap();
        assert_eq!(est.value, 0.0);
    }

    #[test]
    fn test_singular_perfect_correlation() {
        let b: Vec<f64> = [0.1, 0.2, 0.3].iter().map(|&p| normal::quantile(p)).collect();
        let est = mvn_cdf(&b, &equicorrelated(3, 1.0), &MvnConfig::default()).unwrap();
        assert_abs_diff_eq!(est.value, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_negative_equicorrelation_reference() {
        // Trivariate slice of ρ = -0.33 with p = (0.25, 0.35, 0.5).
        let b: Vec<f64> = [0.25, 0.35, 0.5].iter().map(|&p| normal::quantile(p)).collect();
        let est = mvn_cdf(&b, &equicorrelated(3, -0.33), &MvnConfig::default()).unwrap();
        assert!((est.value - 0.005_963_096).abs() < 1e-5, "got {}", est.value);
    }

    #[test]
    fn test_deterministic() {
        let b = [0.2, -0.1, 0.4, 0.0];
        let r = equicorrelated(4, 0.35);
        let a = mvn_cdf(&b, &r, &MvnConfig::default()).unwrap();
        let c = mvn_cdf(&b, &r, &MvnConfig::default()).unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn test_not_psd_is_error() {
        let r = equicorrelated(3, -0.9);
        assert!(matches!(mvn_cdf(&[0.0; 3], &r, &MvnConfig::default()), Err(Error::Computation(_))));
        assert!(check_positive_semidefinite(&r, 3).is_err());
        assert!(check_positive_semidefinite(&equicorrelated(4, -0.33), 4).is_ok());
        assert!(check_positive_semidefinite(&equicorrelated(3, 1.0), 3).is_ok());
    }

    #[test]
    fn test_invalid_inputs() {
        let cfg = MvnConfig::default();
        assert!(mvn_cdf(&[], &[], &cfg).is_err());
        assert!(mvn_cdf(&[0.0, 0.0], &[1.0], &cfg).is_err());
        assert!(mvn_cdf(&[f64::NAN], &[1.0], &cfg).is_err());
        let bad = MvnConfig { n_shifts: 1, ..MvnConfig::default() };
        assert!(mvn_cdf(&[0.0], &[1.0], &bad).is_err());
    }
}
