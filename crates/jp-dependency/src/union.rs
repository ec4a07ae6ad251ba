//! Probability that at least one event occurs.

use crate::cache::JointProbabilityCache;
use crate::combinations::IndicatorTable;
use crate::config::InclusionExclusionConfig;
use jp_core::{CorrelationMatrix, JointProbabilityEvaluator, Result};
use serde::{Deserialize, Serialize};

/// Union probability with inclusion–exclusion diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnionResult {
    /// `P(at least one event)`, in `[0, 1]`.
    pub probability: f64,
    /// Smaller of the last odd/even partial sums (equals `probability` when exact).
    pub lower_bound: f64,
    /// Larger of the last odd/even partial sums.
    pub upper_bound: f64,
    /// Joint-probability evaluations performed (0 for closed forms).
    pub rows_evaluated: usize,
    /// Highest population-count level evaluated (0 for closed forms).
    pub levels_evaluated: usize,
    /// `true` if `probability` is the odd/even midpoint of an early exit.
    pub converged_early: bool,
}

impl UnionResult {
    pub(crate) fn exact(probability: f64) -> Self {
        Self {
            probability,
            lower_bound: probability,
            upper_bound: probability,
            rows_evaluated: 0,
            levels_evaluated: 0,
            converged_early: false,
        }
    }

    pub(crate) fn from_cache(cache: &JointProbabilityCache) -> Self {
        Self {
            probability: cache.union(),
            lower_bound: cache.lower_bound(),
            upper_bound: cache.upper_bound(),
            rows_evaluated: cache.rows_evaluated(),
            levels_evaluated: cache.levels(),
            converged_early: cache.converged_early(),
        }
    }
}

/// `U = Σ_k (-1)^(k+1) Σ_{|S|=k} P(∩ S)`, level by level with optional early exit.
pub fn inclusion_exclusion_union<E: JointProbabilityEvaluator>(
    evaluator: &E,
    probabilities: &[f64],
    correlation: &CorrelationMatrix,
    config: &InclusionExclusionConfig,
) -> Result<UnionResult> {
    let table = IndicatorTable::new(probabilities.len())?;
    let cache = JointProbabilityCache::build(evaluator, probabilities, correlation, &table, config)?;
    Ok(UnionResult::from_cache(&cache))
}
