//! Joint-probability cache filled level by level, with inclusion–exclusion
//! early exit.
//!
//! Each population-count level of the [`IndicatorTable`] is evaluated in
//! parallel (rayon), then folded into the alternating partial sum sequentially
//! in table order, so results do not depend on thread scheduling.
//!
//! Values are stored by mask (`values[mask]`, slot 0 unused), which makes the
//! superset sums used by the exclusive partition a single in-place transform.

use crate::combinations::IndicatorTable;
use crate::config::InclusionExclusionConfig;
use jp_core::{CorrelationMatrix, Indicator, JointProbabilityEvaluator, Result};
use jp_prob::math::clamp_probability;
use rayon::prelude::*;

/// Entries below this after the superset transform indicate incoherent joint
/// probabilities rather than rounding noise.
const NEGATIVE_MASS_WARNING: f64 = -1e-9;

/// Joint probabilities `P(∩ on)` for the table rows of levels `1..=levels`.
#[derive(Debug, Clone)]
pub struct JointProbabilityCache {
    n: usize,
    values: Vec<f64>,
    levels: usize,
    rows_evaluated: usize,
    union: f64,
    lower_bound: f64,
    upper_bound: f64,
    converged_early: bool,
}

impl JointProbabilityCache {
    /// Evaluate the table level by level, stopping early when `config` allows.
    ///
    /// Calls `evaluator.prepare` once before the first level.
    pub fn build<E: JointProbabilityEvaluator>(
        evaluator: &E,
        probabilities: &[f64],
        correlation: &CorrelationMatrix,
        table: &IndicatorTable,
        config: &InclusionExclusionConfig,
    ) -> Result<Self> {
        let n = table.n_events();
        evaluator.prepare(correlation)?;

        let mut values = vec![0.0; 1usize << n];
        let mut running = 0.0;
        let mut odd: Option<f64> = None;
        let mut even: Option<f64> = None;
        let mut rows_evaluated = 0;

        for k in 1..=n {
            let level = table.level(k);
            let joint: Vec<f64> = level
                .par_iter()
                .with_min_len(16)
                .map(|&m| evaluator.joint_probability(probabilities, Indicator::from_parts(m, n), correlation))
                .collect::<Result<Vec<f64>>>()?;

            let mut level_sum = 0.0;
            for (&m, &v) in level.iter().zip(&joint) {
                values[m as usize] = v;
                level_sum += v;
            }
            rows_evaluated += joint.len();

            if k % 2 == 1 {
                running += level_sum;
                odd = Some(running);
            } else {
                running -= level_sum;
                even = Some(running);
            }

            let check = config.early_exit && (k < n || !config.exact_final_level);
            let converged = match (odd, even) {
                (Some(o), Some(e)) if check && config.is_converged(o, e) => Some((o, e)),
                _ => None,
            };
            if let Some((o, e)) = converged {
                log::debug!(
                    "{}: inclusion-exclusion converged at level {}/{} after {} rows (odd={:.10e}, even={:.10e})",
                    evaluator.name(),
                    k,
                    n,
                    rows_evaluated,
                    o,
                    e
                );
                return Ok(Self {
                    n,
                    values,
                    levels: k,
                    rows_evaluated,
                    union: clamp_probability(0.5 * (o + e)),
                    lower_bound: clamp_probability(o.min(e)),
                    upper_bound: clamp_probability(o.max(e)),
                    converged_early: true,
                });
            }
        }

        let union = clamp_probability(running);
        Ok(Self {
            n,
            values,
            levels: n,
            rows_evaluated,
            union,
            lower_bound: union,
            upper_bound: union,
            converged_early: false,
        })
    }

    /// Number of events N.
    pub fn n_events(&self) -> usize {
        self.n
    }

    /// Highest population count evaluated.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Evaluator calls made.
    pub fn rows_evaluated(&self) -> usize {
        self.rows_evaluated
    }

    /// Union estimate: exact alternating sum, or the odd/even midpoint on early exit.
    pub fn union(&self) -> f64 {
        self.union
    }

    /// Smaller of the last odd/even partial sums (the union itself after full enumeration).
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    /// Larger of the last odd/even partial sums.
    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// `true` if the odd/even midpoint was returned. Levels above
    /// [`Self::levels`] were skipped unless convergence came at level N.
    pub fn converged_early(&self) -> bool {
        self.converged_early
    }

    /// Cached `P(∩ on)` for `mask`, `None` if its level was not evaluated.
    pub fn get(&self, mask: u64) -> Option<f64> {
        let level = mask.count_ones() as usize;
        if mask == 0 || level > self.levels || (mask >> self.n) != 0 {
            return None;
        }
        Some(self.values[mask as usize])
    }

    /// Sum of cached joint probabilities over the supersets of `on` with
    /// exactly `level` events on.
    pub fn superset_level_sum(&self, on: u64, level: usize) -> f64 {
        if level > self.levels || level < on.count_ones() as usize {
            return 0.0;
        }
        let full = (1u64 << self.n) - 1;
        let off = full & !on;
        let extra = level - on.count_ones() as usize;
        jp_prob::combinatorics::combinations(off.count_ones() as usize, extra)
            .map(|c| self.values[(on | jp_prob::combinatorics::scatter_bits(c, off)) as usize])
            .sum()
    }

    /// Exclusive mass of every combination: for on-set `S` at level `k`,
    /// `Σ_{m=k}^{levels} (-1)^(m-k) Σ_{T ⊇ S, |T| = m} P(∩ T)`.
    ///
    /// Indexed by mask like the cache. Slightly negative results from
    /// cancellation are clamped to 0.
    pub fn exclusive_masses(&self) -> Vec<f64> {
        let mut g = self.values.clone();
        // Superset Möbius inversion; levels above `self.levels` are zero.
        for bit in 0..self.n {
            let b = 1usize << bit;
            for m in 1..g.len() {
                if m & b == 0 {
                    g[m] -= g[m | b];
                }
            }
        }
        let mut worst = 0.0f64;
        for v in g.iter_mut() {
            if *v < 0.0 {
                worst = worst.min(*v);
                *v = 0.0;
            } else if v.is_nan() {
                *v = 0.0;
            }
        }
        if worst < NEGATIVE_MASS_WARNING {
            log::warn!(
                "exclusive partition clamped negative mass {:.3e}; joint probabilities are not coherent",
                worst
            );
        }
        g[0] = 0.0;
        g
    }
}
