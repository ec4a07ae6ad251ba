//! Common data types for joint-probability computations

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest number of events a single [`Indicator`] can address (one bit per event).
pub const MAX_EVENTS: usize = 63;

/// Absolute tolerance used when checking symmetry, unit diagonal and `[-1, 1]` range
/// of a correlation matrix.
pub const CORRELATION_TOLERANCE: f64 = 1e-10;

#[inline]
fn full_mask(len: usize) -> u64 {
    (1u64 << len) - 1
}

/// Check that every marginal probability is finite and in `[0, 1]`.
pub fn validate_probabilities(probabilities: &[f64]) -> Result<()> {
    if probabilities.is_empty() {
        return Err(Error::Validation("probabilities must be non-empty".to_string()));
    }
    if probabilities.len() > MAX_EVENTS {
        return Err(Error::Validation(format!(
            "at most {} events are supported, got {}",
            MAX_EVENTS,
            probabilities.len()
        )));
    }
    for (i, &p) in probabilities.iter().enumerate() {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(Error::Validation(format!(
                "probability {} must be finite and in [0,1], got {}",
                i, p
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Indicator
// ---------------------------------------------------------------------------

/// One on/off combination of `n_events` binary events, stored as a bitset.
///
/// Bit `i` set means event `i` is required to occur. A cleared bit leaves the
/// event unconstrained when the indicator is used for a joint probability, and
/// means "does not occur" when it labels a mutually exclusive combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Indicator {
    mask: u64,
    len: usize,
}

impl Indicator {
    /// Build from a raw mask. Fails if `len` is out of range or `mask` has bits at or above `len`.
    pub fn new(mask: u64, len: usize) -> Result<Self> {
        if len == 0 || len > MAX_EVENTS {
            return Err(Error::Validation(format!(
                "indicator length must be in 1..={}, got {}",
                MAX_EVENTS, len
            )));
        }
        if mask & !full_mask(len) != 0 {
            return Err(Error::Validation(format!(
                "indicator mask {:#x} has bits beyond length {}",
                mask, len
            )));
        }
        Ok(Self { mask, len })
    }

    /// Build from a mask the caller already knows to be in range (enumeration hot paths).
    #[inline]
    pub fn from_parts(mask: u64, len: usize) -> Self {
        debug_assert!((1..=MAX_EVENTS).contains(&len));
        debug_assert!(mask & !full_mask(len) == 0);
        Self { mask, len }
    }

    /// All `len` events on.
    pub fn all(len: usize) -> Result<Self> {
        if len == 0 || len > MAX_EVENTS {
            return Err(Error::Validation(format!(
                "indicator length must be in 1..={}, got {}",
                MAX_EVENTS, len
            )));
        }
        Ok(Self { mask: full_mask(len), len })
    }

    /// From per-event flags (`true` = on).
    pub fn from_flags(flags: &[bool]) -> Result<Self> {
        let mask = flags
            .iter()
            .enumerate()
            .fold(0u64, |m, (i, &on)| if on && i < MAX_EVENTS { m | (1u64 << i) } else { m });
        Self::new(mask, flags.len())
    }

    /// From a 0/1 vector. Any value other than 0 or 1 is rejected.
    pub fn from_bits(bits: &[u8]) -> Result<Self> {
        if let Some((i, b)) = bits.iter().enumerate().find(|(_, b)| **b > 1) {
            return Err(Error::Validation(format!("indicator entry {} must be 0 or 1, got {}", i, b)));
        }
        let flags: Vec<bool> = bits.iter().map(|&b| b == 1).collect();
        Self::from_flags(&flags)
    }

    /// Raw bitset.
    #[inline]
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Number of events the indicator spans (N).
    #[inline]
    pub fn n_events(&self) -> usize {
        self.len
    }

    /// Whether event `i` is on.
    #[inline]
    pub fn is_on(&self, i: usize) -> bool {
        i < self.len && (self.mask >> i) & 1 == 1
    }

    /// Population count: number of events on.
    #[inline]
    pub fn count(&self) -> usize {
        self.mask.count_ones() as usize
    }

    /// Indices of the events that are on, ascending.
    pub fn on_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.is_on(i))
    }

    /// Indices of the events that are off, ascending.
    pub fn off_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| !self.is_on(i))
    }

    /// Flip every event.
    pub fn complement(&self) -> Self {
        Self { mask: !self.mask & full_mask(self.len), len: self.len }
    }

    /// `true` if every event on in `other` is also on in `self`.
    #[inline]
    pub fn is_superset_of(&self, other: &Indicator) -> bool {
        self.mask & other.mask == other.mask
    }

    /// Per-event flags.
    pub fn to_flags(&self) -> Vec<bool> {
        (0..self.len).map(|i| self.is_on(i)).collect()
    }

    /// 0/1 vector.
    pub fn to_bits(&self) -> Vec<u8> {
        (0..self.len).map(|i| u8::from(self.is_on(i))).collect()
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            f.write_str(if self.is_on(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Validated N×N correlation matrix (row-major) of the latent normal copula.
///
/// Symmetric, unit diagonal, entries in `[-1, 1]`. Positive semi-definiteness is
/// not checked here; evaluators that need it check it themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCorrelationMatrix", into = "RawCorrelationMatrix")]
pub struct CorrelationMatrix {
    n: usize,
    data: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct RawCorrelationMatrix {
    n: usize,
    data: Vec<f64>,
}

impl TryFrom<RawCorrelationMatrix> for CorrelationMatrix {
    type Error = Error;

    fn try_from(raw: RawCorrelationMatrix) -> Result<Self> {
        CorrelationMatrix::new(raw.n, raw.data)
    }
}

impl From<CorrelationMatrix> for RawCorrelationMatrix {
    fn from(m: CorrelationMatrix) -> Self {
        RawCorrelationMatrix { n: m.n, data: m.data }
    }
}

impl CorrelationMatrix {
    /// Build from row-major data, validating shape and entries.
    ///
    /// Diagonal entries within [`CORRELATION_TOLERANCE`] of 1 are snapped to exactly 1.
    pub fn new(n: usize, mut data: Vec<f64>) -> Result<Self> {
        if n == 0 {
            return Err(Error::Validation("correlation matrix must be at least 1x1".to_string()));
        }
        if data.len() != n * n {
            return Err(Error::Validation(format!(
                "correlation matrix data length mismatch: expected {} ({}x{}), got {}",
                n * n,
                n,
                n,
                data.len()
            )));
        }
        for i in 0..n {
            let d = data[i * n + i];
            if !d.is_finite() || (d - 1.0).abs() > CORRELATION_TOLERANCE {
                return Err(Error::Validation(format!(
                    "correlation diagonal ({},{}) must be 1, got {}",
                    i, i, d
                )));
            }
            data[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let a = data[i * n + j];
                let b = data[j * n + i];
                if !a.is_finite() || !b.is_finite() {
                    return Err(Error::Validation(format!(
                        "correlation ({},{}) must be finite",
                        i, j
                    )));
                }
                if a.abs() > 1.0 + CORRELATION_TOLERANCE {
                    return Err(Error::Validation(format!(
                        "correlation ({},{}) must be in [-1,1], got {}",
                        i, j, a
                    )));
                }
                if (a - b).abs() > CORRELATION_TOLERANCE {
                    return Err(Error::Validation(format!(
                        "correlation matrix must be symmetric: ({},{})={} but ({},{})={}",
                        i, j, a, j, i, b
                    )));
                }
                let r = a.clamp(-1.0, 1.0);
                data[i * n + j] = r;
                data[j * n + i] = r;
            }
        }
        Ok(Self { n, data })
    }

    /// Build from nested rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        if let Some((i, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(Error::Validation(format!(
                "correlation row {} has length {}, expected {}",
                i,
                r.len(),
                n
            )));
        }
        Self::new(n, rows.concat())
    }

    /// Identity (independent latent normals).
    pub fn identity(n: usize) -> Result<Self> {
        Self::equicorrelated(n, 0.0)
    }

    /// Every off-diagonal entry equal to `rho`.
    pub fn equicorrelated(n: usize, rho: f64) -> Result<Self> {
        let mut data = vec![rho; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self::new(n, data)
    }

    /// Dimension N.
    #[inline]
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Entry `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Row-major entries.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Principal submatrix over `indices` (in the given order).
    pub fn submatrix(&self, indices: &[usize]) -> CorrelationMatrix {
        let m = indices.len();
        let mut data = Vec::with_capacity(m * m);
        for &i in indices {
            for &j in indices {
                data.push(self.get(i, j));
            }
        }
        CorrelationMatrix { n: m, data }
    }

    /// `true` if every off-diagonal entry is exactly zero.
    pub fn is_identity(&self) -> bool {
        (0..self.n).all(|i| ((i + 1)..self.n).all(|j| self.get(i, j) == 0.0))
    }
}

// ---------------------------------------------------------------------------
// Dependence
// ---------------------------------------------------------------------------

/// Dependence assumption linking the N events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Dependence {
    /// Events are mutually independent.
    Independent,
    /// Comonotonic: events are nested, the rarest implies all others.
    PerfectlyPositive,
    /// Counter-monotonic: events overlap as little as their marginals allow.
    PerfectlyNegative,
    /// Normal copula with the given pairwise correlations.
    Correlated(CorrelationMatrix),
}

impl Dependence {
    /// Check the dependence is usable with `n_events` events.
    pub fn validate_for(&self, n_events: usize) -> Result<()> {
        match self {
            Dependence::Correlated(m) if m.dim() != n_events => {
                Err(Error::Validation(format!(
                    "correlation matrix is {}x{} but there are {} probabilities",
                    m.dim(),
                    m.dim(),
                    n_events
                )))
            }
            _ => Ok(()),
        }
    }

    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Dependence::Independent => "independent",
            Dependence::PerfectlyPositive => "perfectly-positive",
            Dependence::PerfectlyNegative => "perfectly-negative",
            Dependence::Correlated(_) => "correlated",
        }
    }
}

impl From<CorrelationMatrix> for Dependence {
    fn from(m: CorrelationMatrix) -> Self {
        Dependence::Correlated(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_from_bits_and_display() {
        let ind = Indicator::from_bits(&[1, 0, 1, 1]).unwrap();
        assert_eq!(ind.mask(), 0b1101);
        assert_eq!(ind.n_events(), 4);
        assert_eq!(ind.count(), 3);
        assert_eq!(ind.to_string(), "1011");
        assert_eq!(ind.on_indices().collect::<Vec<_>>(), vec![0, 2, 3]);
        assert_eq!(ind.off_indices().collect::<Vec<_>>(), vec![1]);
        assert_eq!(ind.to_bits(), vec![1, 0, 1, 1]);
    }

    #[test]
    fn test_indicator_complement_and_superset() {
        let a = Indicator::new(0b0101, 4).unwrap();
        assert_eq!(a.complement().mask(), 0b1010);
        let b = Indicator::new(0b0001, 4).unwrap();
        assert!(a.is_superset_of(&b));
        assert!(!b.is_superset_of(&a));
    }

    #[test]
    fn test_indicator_invalid() {
        assert!(Indicator::new(0b100, 2).is_err());
        assert!(Indicator::new(0, 0).is_err());
        assert!(Indicator::all(MAX_EVENTS + 1).is_err());
        assert!(Indicator::from_bits(&[1, 2]).is_err());
        assert_eq!(Indicator::all(MAX_EVENTS).unwrap().count(), MAX_EVENTS);
    }

    #[test]
    fn test_validate_probabilities() {
        assert!(validate_probabilities(&[0.0, 0.5, 1.0]).is_ok());
        assert!(validate_probabilities(&[]).is_err());
        assert!(validate_probabilities(&[0.2, 1.2]).is_err());
        assert!(validate_probabilities(&[-0.1]).is_err());
        assert!(validate_probabilities(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_correlation_validation() {
        assert!(CorrelationMatrix::new(2, vec![1.0, 0.3, 0.3, 1.0]).is_ok());
        // wrong size
        assert!(CorrelationMatrix::new(2, vec![1.0, 0.3, 0.3]).is_err());
        // asymmetric
        assert!(CorrelationMatrix::new(2, vec![1.0, 0.3, 0.2, 1.0]).is_err());
        // diagonal
        assert!(CorrelationMatrix::new(2, vec![0.9, 0.3, 0.3, 1.0]).is_err());
        // range
        assert!(CorrelationMatrix::new(2, vec![1.0, 1.5, 1.5, 1.0]).is_err());
        assert!(CorrelationMatrix::from_rows(&[vec![1.0, 0.0], vec![0.0]]).is_err());
    }

    #[test]
    fn test_correlation_accessors() {
        let m = CorrelationMatrix::equicorrelated(3, -0.25).unwrap();
        assert_eq!(m.dim(), 3);
        assert_eq!(m.get(0, 0), 1.0);
        assert_eq!(m.get(2, 1), -0.25);
        assert!(!m.is_identity());
        assert!(CorrelationMatrix::identity(4).unwrap().is_identity());

        let rows = vec![vec![1.0, 0.1, 0.2], vec![0.1, 1.0, 0.3], vec![0.2, 0.3, 1.0]];
        let m = CorrelationMatrix::from_rows(&rows).unwrap();
        let sub = m.submatrix(&[2, 0]);
        assert_eq!(sub.as_slice(), &[1.0, 0.2, 0.2, 1.0]);
    }

    #[test]
    fn test_correlation_serde_validates() {
        let m = CorrelationMatrix::equicorrelated(2, 0.5).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: CorrelationMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);

        let bad = r#"{"n":2,"data":[1.0,0.5,0.4,1.0]}"#;
        assert!(serde_json::from_str::<CorrelationMatrix>(bad).is_err());
    }

    #[test]
    fn test_dependence_dimension_check() {
        let dep = Dependence::from(CorrelationMatrix::identity(3).unwrap());
        assert!(dep.validate_for(3).is_ok());
        assert!(dep.validate_for(2).is_err());
        assert!(Dependence::Independent.validate_for(5).is_ok());
        assert_eq!(dep.name(), "correlated");
    }
}
