//! Closed-form dependence policies.
//!
//! N-event building blocks for independent, perfectly positive (comonotonic)
//! and perfectly negative (counter-monotonic) events, two-event formulas
//! parameterized by one correlation coefficient, and the common-cause /
//! mutually-exclusive adjustment ratios.

use jp_core::{CorrelationMatrix, Error, Indicator, JointProbabilityEvaluator, Result, validate_probabilities};
use jp_prob::math::{clamp_probability, masked_max, masked_min, masked_product, masked_sum};

// ---------------------------------------------------------------------------
// N-event joint probabilities and unions
// ---------------------------------------------------------------------------

/// `Π p_i` over the selected events (1 when none are selected).
pub fn independent_joint_probability(probabilities: &[f64], mask: Option<Indicator>) -> f64 {
    clamp_probability(masked_product(probabilities, mask))
}

/// `min p_i` over the selected events: nested events all occur iff the rarest does.
pub fn positive_joint_probability(probabilities: &[f64], mask: Option<Indicator>) -> f64 {
    masked_min(probabilities, mask).unwrap_or(1.0)
}

/// Fréchet lower bound `max(0, Σ p_i - (k - 1))` over the `k` selected events.
///
/// For two events this is `max(0, p_a + p_b - 1)`.
pub fn negative_joint_probability(probabilities: &[f64], mask: Option<Indicator>) -> f64 {
    let k = mask.map_or(probabilities.len(), |m| m.count());
    if k == 0 {
        return 1.0;
    }
    clamp_probability(masked_sum(probabilities, mask) - (k as f64 - 1.0))
}

/// `1 - Π (1 - p_i)`.
pub fn independent_union(probabilities: &[f64]) -> f64 {
    clamp_probability(1.0 - probabilities.iter().map(|p| 1.0 - p).product::<f64>())
}

/// `max p_i`.
pub fn positive_union(probabilities: &[f64]) -> f64 {
    masked_max(probabilities, None).unwrap_or(0.0)
}

/// `min(1, Σ p_i)`.
pub fn negative_union(probabilities: &[f64]) -> f64 {
    clamp_probability(masked_sum(probabilities, None))
}

// ---------------------------------------------------------------------------
// Two events
// ---------------------------------------------------------------------------

fn check_pair(pa: f64, pb: f64, rho: f64) -> Result<()> {
    validate_probabilities(&[pa, pb])?;
    if !rho.is_finite() || rho.abs() > 1.0 {
        return Err(Error::Validation(format!("correlation must be in [-1,1], got {}", rho)));
    }
    Ok(())
}

/// `P(A ∧ B)` for two events linked by correlation `rho`.
///
/// `rho = 0, 1, -1` use the product, min and Fréchet shortcuts; any other value
/// goes through `evaluator`.
pub fn a_and_b<E: JointProbabilityEvaluator + ?Sized>(evaluator: &E, pa: f64, pb: f64, rho: f64) -> Result<f64> {
    check_pair(pa, pb, rho)?;
    let p = [pa, pb];
    if rho == 0.0 {
        return Ok(independent_joint_probability(&p, None));
    }
    if rho == 1.0 {
        return Ok(positive_joint_probability(&p, None));
    }
    if rho == -1.0 {
        return Ok(negative_joint_probability(&p, None));
    }
    let r = CorrelationMatrix::equicorrelated(2, rho)?;
    evaluator.joint_probability(&p, Indicator::all(2)?, &r)
}

/// `P(A ∨ B) = p_a + p_b - P(A ∧ B)`.
pub fn a_or_b<E: JointProbabilityEvaluator + ?Sized>(evaluator: &E, pa: f64, pb: f64, rho: f64) -> Result<f64> {
    let both = a_and_b(evaluator, pa, pb, rho)?;
    Ok(clamp_probability(pa + pb - both))
}

/// `P(A ∧ ¬B)`.
pub fn a_not_b<E: JointProbabilityEvaluator + ?Sized>(evaluator: &E, pa: f64, pb: f64, rho: f64) -> Result<f64> {
    let both = a_and_b(evaluator, pa, pb, rho)?;
    Ok(clamp_probability(pa - both))
}

/// `P(B ∧ ¬A)`.
pub fn b_not_a<E: JointProbabilityEvaluator + ?Sized>(evaluator: &E, pa: f64, pb: f64, rho: f64) -> Result<f64> {
    let both = a_and_b(evaluator, pa, pb, rho)?;
    Ok(clamp_probability(pb - both))
}

/// `P(A | B)`; 0 when `p_b = 0`.
pub fn a_given_b<E: JointProbabilityEvaluator + ?Sized>(evaluator: &E, pa: f64, pb: f64, rho: f64) -> Result<f64> {
    let both = a_and_b(evaluator, pa, pb, rho)?;
    Ok(if pb == 0.0 { 0.0 } else { clamp_probability(both / pb) })
}

/// `P(B | A)`; 0 when `p_a = 0`.
pub fn b_given_a<E: JointProbabilityEvaluator + ?Sized>(evaluator: &E, pa: f64, pb: f64, rho: f64) -> Result<f64> {
    let both = a_and_b(evaluator, pa, pb, rho)?;
    Ok(if pa == 0.0 { 0.0 } else { clamp_probability(both / pa) })
}

// ---------------------------------------------------------------------------
// Adjustments
// ---------------------------------------------------------------------------

/// `union / Σ p_i`, or 1 when every marginal is 0.
pub fn common_cause_ratio(union: f64, probabilities: &[f64]) -> f64 {
    let total = masked_sum(probabilities, None);
    if total > 0.0 { union / total } else { 1.0 }
}

/// `1 / Σ p_i` when `Σ p_i > 1`, else 1.
pub fn mutually_exclusive_adjustment(probabilities: &[f64]) -> Result<f64> {
    validate_probabilities(probabilities)?;
    let total = masked_sum(probabilities, None);
    Ok(if total > 1.0 { 1.0 / total } else { 1.0 })
}
