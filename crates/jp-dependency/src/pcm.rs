//! Product of Conditional Marginals (PCM).
//!
//! Approximates the normal-copula orthant probability `P(∩ on events)` by
//! sequential Gaussian conditioning (Mendell & Elston 1974) instead of an
//! N-dimensional integral.
//!
//! ## Working matrix
//!
//! Each call owns one N×N scratch array:
//! - diagonal: the unconditional thresholds `z_i = Φ⁻¹(p_i)` (`+∞` for events
//!   that are off or certain),
//! - lower triangle `w[k][j]`: threshold of event `k` after conditioning on
//!   events `0..=j`,
//! - upper triangle `w[i][c]`: conditional correlation of `i` and `c` given the
//!   events processed so far.
//!
//! At step `j` with threshold `z`, `a = φ(z)/Φ(z)` and `b = a(z + a)` are the
//! mean shift and variance reduction of the truncated normal. The result is
//! `exp(Σ_j ln Φ(z_j))`.

use jp_core::{CorrelationMatrix, Indicator, JointProbabilityEvaluator, Result};
use jp_prob::{math::clamp_probability, normal};

/// Sequential-conditioning evaluator. Stateless; scratch space lives in each call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pcm;

impl JointProbabilityEvaluator for Pcm {
    fn joint_probability(
        &self,
        probabilities: &[f64],
        indicator: Indicator,
        correlation: &CorrelationMatrix,
    ) -> Result<f64> {
        Ok(pcm_joint_probability(probabilities, indicator, correlation))
    }

    fn name(&self) -> &str {
        "PCM"
    }
}

/// PCM approximation of `P(∩ events on in indicator)`.
///
/// Off events are unconstrained. Near-unit correlations degrade precision
/// gracefully (conditional variances are floored at machine epsilon).
pub fn pcm_joint_probability(
    probabilities: &[f64],
    indicator: Indicator,
    correlation: &CorrelationMatrix,
) -> f64 {
    let n = probabilities.len();
    debug_assert_eq!(indicator.n_events(), n);
    debug_assert_eq!(correlation.dim(), n);

    if indicator.on_indices().any(|i| probabilities[i] <= 0.0) {
        return 0.0;
    }

    let mut w = vec![0.0; n * n];
    for r in 0..n {
        let p = probabilities[r];
        w[r * n + r] = if indicator.is_on(r) && p < 1.0 { normal::quantile(p) } else { f64::INFINITY };
        for c in (r + 1)..n {
            w[r * n + c] = correlation.get(r, c);
        }
    }

    let mut log_p = 0.0;
    for j in 0..n {
        let z = if j == 0 { w[0] } else { w[j * n + j - 1] };
        let (a, b) = if z == f64::INFINITY {
            (0.0, 0.0)
        } else {
            log_p += normal::log_cdf(z);
            if log_p == f64::NEG_INFINITY {
                return 0.0;
            }
            let a = normal::inverse_mills_ratio(z);
            (a, a * (z + a))
        };

        for k in (j + 1)..n {
            let prev = if j == 0 { w[k * n + k] } else { w[k * n + j - 1] };
            let rho = w[j * n + k];
            w[k * n + j] = (prev + rho * a) / conditional_sd(rho, b);
        }
        if b == 0.0 {
            continue;
        }
        for ir in (j + 1)..n {
            let r_jr = w[j * n + ir];
            for ic in (ir + 1)..n {
                let r_jc = w[j * n + ic];
                let num = w[ir * n + ic] - r_jr * r_jc * b;
                let r = num / (conditional_sd(r_jr, b) * conditional_sd(r_jc, b));
                w[ir * n + ic] = if r.is_nan() { 0.0 } else { r.clamp(-1.0, 1.0) };
            }
        }
    }

    clamp_probability(log_p.exp())
}

/// `sqrt(1 - ρ² b)`, floored away from zero.
#[inline]
fn conditional_sd(rho: f64, b: f64) -> f64 {
    (1.0 - rho * rho * b).max(f64::EPSILON).sqrt()
}
