//! Mutually exclusive partition of the event space.
//!
//! Every nonempty on/off combination gets the probability that exactly its on
//! events occur. Entries are non-negative and sum to the union.

use crate::cache::JointProbabilityCache;
use crate::combinations::IndicatorTable;
use crate::config::InclusionExclusionConfig;
use jp_core::{CorrelationMatrix, Indicator, JointProbabilityEvaluator, Result};
use jp_prob::math::clamp_probability;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Exclusive combination probabilities in indicator-table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusiveResult {
    /// `P(exactly the on events of indicators[i] occur)`.
    pub probabilities: Vec<f64>,
    /// Combinations, parallel to `probabilities`.
    pub indicators: Vec<Indicator>,
    /// `union - Σ probabilities` when the odd/even midpoint was returned, else 0.
    /// Covers the combinations not listed; negative when the last evaluated
    /// level overshoots the midpoint.
    pub remainder: f64,
    /// Union probability the partition decomposes.
    pub union: f64,
    /// Joint-probability evaluations performed (0 for closed forms).
    pub rows_evaluated: usize,
    /// `true` if `union` is the odd/even midpoint of an early exit.
    pub converged_early: bool,
}

impl ExclusiveResult {
    fn closed_form(table: &IndicatorTable, probabilities: Vec<f64>) -> Self {
        let union = clamp_probability(probabilities.iter().sum());
        Self {
            probabilities,
            indicators: table.indicators().collect(),
            remainder: 0.0,
            union,
            rows_evaluated: 0,
            converged_early: false,
        }
    }

    /// Number of listed combinations.
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    /// `true` if no combination is listed.
    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// `Σ probabilities + remainder`.
    pub fn total(&self) -> f64 {
        self.probabilities.iter().sum::<f64>() + self.remainder
    }

    /// `(indicator, probability)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Indicator, f64)> + '_ {
        self.indicators.iter().copied().zip(self.probabilities.iter().copied())
    }
}

fn map_rows(table: &IndicatorTable, f: impl Fn(Indicator) -> f64 + Send + Sync) -> Vec<f64> {
    let n = table.n_events();
    table.masks().par_iter().with_min_len(64).map(|&m| f(Indicator::from_parts(m, n))).collect()
}

/// `Π_on p_i · Π_off (1 - p_i)` for every combination.
pub fn independent_exclusive(probabilities: &[f64], table: &IndicatorTable) -> ExclusiveResult {
    let values = map_rows(table, |ind| {
        probabilities
            .iter()
            .enumerate()
            .map(|(i, &p)| if ind.is_on(i) { p } else { 1.0 - p })
            .product()
    });
    ExclusiveResult::closed_form(table, values)
}

/// `max(min_on p - max_off p, 0)` for every combination (`max_off` is 0 with nothing off).
pub fn positive_exclusive(probabilities: &[f64], table: &IndicatorTable) -> ExclusiveResult {
    let values = map_rows(table, |ind| {
        let min_on = ind.on_indices().map(|i| probabilities[i]).fold(f64::INFINITY, f64::min);
        let max_off = ind.off_indices().map(|i| probabilities[i]).fold(0.0, f64::max);
        (min_on - max_off).max(0.0)
    });
    ExclusiveResult::closed_form(table, values)
}

/// Counter-monotonic partition.
///
/// Event `i` occupies the arc `[s_i, s_i + p_i)` of a unit circle with
/// `s_i = Σ_{j<i} p_j (mod 1)`; a combination gets the length covered by exactly
/// its on events. Overlaps appear only once `Σ p > 1`.
pub fn negative_exclusive(probabilities: &[f64], table: &IndicatorTable) -> ExclusiveResult {
    let mut starts = Vec::with_capacity(probabilities.len());
    let mut acc = 0.0f64;
    for &p in probabilities {
        starts.push(acc.rem_euclid(1.0));
        acc += p;
    }

    let mut cuts = vec![0.0, 1.0];
    for (&s, &p) in starts.iter().zip(probabilities) {
        cuts.push(s);
        cuts.push((s + p).rem_euclid(1.0));
    }
    cuts.sort_by(f64::total_cmp);
    cuts.dedup();

    let mut mass: HashMap<u64, f64> = HashMap::new();
    for w in cuts.windows(2) {
        let len = w[1] - w[0];
        if len <= 0.0 {
            continue;
        }
        let mid = 0.5 * (w[0] + w[1]);
        let mask = starts
            .iter()
            .zip(probabilities)
            .enumerate()
            .filter(|(_, (s, p))| (mid - **s).rem_euclid(1.0) < **p)
            .fold(0u64, |m, (i, _)| m | (1u64 << i));
        if mask != 0 {
            *mass.entry(mask).or_insert(0.0) += len;
        }
    }

    let values = table.masks().iter().map(|m| mass.get(m).copied().unwrap_or(0.0)).collect();
    ExclusiveResult::closed_form(table, values)
}

/// Nested inclusion–exclusion over the joint-probability cache.
///
/// With early exit only the combinations at the evaluated levels are listed and
/// `remainder` closes the gap to the midpoint, so [`ExclusiveResult::total`]
/// equals the union returned for the same settings.
pub fn inclusion_exclusion_exclusive<E: JointProbabilityEvaluator>(
    evaluator: &E,
    probabilities: &[f64],
    correlation: &CorrelationMatrix,
    config: &InclusionExclusionConfig,
) -> Result<ExclusiveResult> {
    let table = IndicatorTable::new(probabilities.len())?;
    let cache = JointProbabilityCache::build(evaluator, probabilities, correlation, &table, config)?;
    let masses = cache.exclusive_masses();

    let end = table.levels_end(cache.levels());
    let rows = &table.masks()[..end];
    let values: Vec<f64> = rows.iter().map(|&m| masses[m as usize]).collect();
    let listed: f64 = values.iter().sum();
    let union = cache.union();
    let remainder = if cache.converged_early() { union - listed } else { 0.0 };

    Ok(ExclusiveResult {
        probabilities: values,
        indicators: table.indicators().take(end).collect(),
        remainder,
        union,
        rows_evaluated: cache.rows_evaluated(),
        converged_early: cache.converged_early(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pcm;
    use crate::combinations::all_indicators;
    use crate::policies::{independent_union, negative_union, positive_union};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_independent_two_events() {
        let t = all_indicators(2).unwrap();
        let r = independent_exclusive(&[0.25, 0.35], &t);
        let expected = [0.1625, 0.2625, 0.0875];
        for (got, want) in r.probabilities.iter().zip(expected) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-15);
        }
        assert_eq!(r.indicators[2].to_string(), "11");
        assert_abs_diff_eq!(r.union, 0.5125, epsilon = 1e-15);
    }

    #[test]
    fn test_positive_partition_is_nested() {
        let p = [0.25, 0.35, 0.5];
        let t = all_indicators(3).unwrap();
        let r = positive_exclusive(&p, &t);
        let by_label: HashMap<String, f64> = r.iter().map(|(i, v)| (i.to_string(), v)).collect();
        assert_abs_diff_eq!(by_label["111"], 0.25, epsilon = 1e-15);
        assert_abs_diff_eq!(by_label["011"], 0.10, epsilon = 1e-15);
        assert_abs_diff_eq!(by_label["001"], 0.15, epsilon = 1e-15);
        assert_eq!(by_label["100"], 0.0);
        assert_abs_diff_eq!(r.total(), positive_union(&p), epsilon = 1e-15);
    }

    #[test]
    fn test_negative_partition() {
        let t = all_indicators(2).unwrap();
        let r = negative_exclusive(&[0.7, 0.6], &t);
        assert_abs_diff_eq!(r.probabilities[0], 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(r.probabilities[1], 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(r.probabilities[2], 0.3, epsilon = 1e-12);

        let p = [0.25, 0.35, 0.5, 0.5];
        let t = all_indicators(4).unwrap();
        let r = negative_exclusive(&p, &t);
        assert_abs_diff_eq!(r.total(), negative_union(&p), epsilon = 1e-12);
        assert!(r.probabilities.iter().all(|&v| v >= 0.0));

        // Disjoint when Σp <= 1.
        let t = all_indicators(3).unwrap();
        let r = negative_exclusive(&[0.2, 0.3, 0.1], &t);
        assert_abs_diff_eq!(r.probabilities[0], 0.2, epsilon = 1e-12);
        assert!(r.probabilities[3..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_general_matches_independent_closed_form() {
        let p = [0.25, 0.35, 0.5, 0.5];
        let t = all_indicators(4).unwrap();
        let closed = independent_exclusive(&p, &t);
        let r = CorrelationMatrix::identity(4).unwrap();
        let general = inclusion_exclusion_exclusive(&Pcm, &p, &r, &InclusionExclusionConfig::full()).unwrap();
        assert_eq!(general.len(), 15);
        for (a, b) in general.probabilities.iter().zip(&closed.probabilities) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(general.union, independent_union(&p), epsilon = 1e-12);
        assert_eq!(general.remainder, 0.0);
    }

    /// Every pair is more likely than its single events.
    struct PairHeavy;

    impl JointProbabilityEvaluator for PairHeavy {
        fn joint_probability(&self, probabilities: &[f64], indicator: Indicator, _: &CorrelationMatrix) -> Result<f64> {
            Ok(match indicator.count() {
                1 => indicator.on_indices().map(|i| probabilities[i]).sum(),
                2 => 0.3,
                _ => 0.0,
            })
        }

        fn name(&self) -> &str {
            "pair-heavy"
        }
    }

    #[test]
    fn test_incoherent_joint_probabilities_stay_non_negative() {
        let p = [0.1, 0.2, 0.15, 0.25];
        let r = CorrelationMatrix::identity(4).unwrap();
        let x = inclusion_exclusion_exclusive(&PairHeavy, &p, &r, &InclusionExclusionConfig::full()).unwrap();
        assert_eq!(x.len(), 15);
        assert!(x.probabilities.iter().all(|v| v.is_finite() && *v >= 0.0));
        // Singles 0.1 - 3 * 0.3 clamp to 0; the alternating sum itself clamps to 0.
        assert_eq!(x.probabilities[0], 0.0);
        assert_eq!(x.union, 0.0);
        assert!(x.total().is_finite());
        assert_abs_diff_eq!(x.total(), 6.0 * 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_early_exit_lists_low_levels_and_remainder() {
        let p: Vec<f64> = (0..10).map(|i| 0.01 + 0.004 * i as f64).collect();
        let r = CorrelationMatrix::equicorrelated(10, 0.1).unwrap();
        let early = inclusion_exclusion_exclusive(&Pcm, &p, &r, &InclusionExclusionConfig::default()).unwrap();
        assert!(early.converged_early);
        assert!(early.len() < 1023);
        let gap = 1e-8 + 1e-4 * early.union;
        assert!(early.remainder.abs() <= gap);
        assert_abs_diff_eq!(early.total(), early.union, epsilon = 1e-14);
        assert!(early.probabilities.iter().all(|&v| v >= 0.0));
        assert!(early.indicators.iter().all(|i| i.count() <= early.indicators[early.len() - 1].count()));
    }
}
