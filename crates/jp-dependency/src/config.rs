//! Inclusion–exclusion convergence control.

use jp_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Early-exit tolerances for level-by-level inclusion–exclusion.
///
/// After each complete level the latest odd-level and even-level partial sums
/// are compared; once `|odd - even| <= absolute + relative * min(odd, even)` the
/// midpoint is returned instead of enumerating the remaining levels. The check
/// also runs after the last level, so a first convergence at level N returns
/// the midpoint as well unless `exact_final_level` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InclusionExclusionConfig {
    /// Absolute part of the convergence threshold.
    pub absolute_tolerance: f64,
    /// Relative part, scaled by the smaller partial sum.
    pub relative_tolerance: f64,
    /// `false` forces full `2^N - 1` enumeration.
    pub early_exit: bool,
    /// Skip the convergence check after level N and return the exact
    /// alternating sum there. Default `false`.
    #[serde(default)]
    pub exact_final_level: bool,
}

impl Default for InclusionExclusionConfig {
    fn default() -> Self {
        Self { absolute_tolerance: 1e-8, relative_tolerance: 1e-4, early_exit: true, exact_final_level: false }
    }
}

impl InclusionExclusionConfig {
    /// Full enumeration, no early exit.
    pub fn full() -> Self {
        Self { early_exit: false, ..Self::default() }
    }

    /// Single combined tolerance: stop once the odd/even partial sums are
    /// within `tolerance` of each other.
    pub fn strict(tolerance: f64) -> Self {
        Self { absolute_tolerance: tolerance, relative_tolerance: 0.0, ..Self::default() }
    }

    /// Same tolerances, but the last level always yields the exact sum.
    pub fn with_exact_final_level(self) -> Self {
        Self { exact_final_level: true, ..self }
    }

    /// Tolerances must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (name, v) in
            [("absolute_tolerance", self.absolute_tolerance), ("relative_tolerance", self.relative_tolerance)]
        {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::Validation(format!("{} must be finite and >= 0, got {}", name, v)));
            }
        }
        Ok(())
    }

    /// Convergence test on the latest odd/even partial sums.
    #[inline]
    pub fn is_converged(&self, odd: f64, even: f64) -> bool {
        (odd - even).abs() <= self.absolute_tolerance + self.relative_tolerance * odd.min(even)
    }
}
