//! Indicator table: every nonempty on/off combination of N events, grouped by
//! population count.
//!
//! Row order is deterministic: level `k = 1..=N` holds the `C(N, k)` combinations
//! with `k` events on, in lexicographic order of their sorted on-index lists.
//! Level boundaries come from [`BinomialCounts`].

use jp_core::{Error, Indicator, Result};
use jp_prob::combinatorics::{binomial, combinations};
use std::ops::Range;

/// Largest N accepted for union / exclusive enumeration (`2^N - 1` rows).
pub const MAX_ENUMERATED_EVENTS: usize = 24;

/// Per-level counts `C(N,1)..C(N,N)` and their cumulative offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinomialCounts {
    counts: Vec<usize>,
    offsets: Vec<usize>,
}

impl BinomialCounts {
    /// Counts for `n` events.
    pub fn new(n: usize) -> Self {
        let counts: Vec<usize> = (1..=n).map(|k| binomial(n as u64, k as u64) as usize).collect();
        let mut offsets = Vec::with_capacity(n + 1);
        offsets.push(0);
        for &c in &counts {
            offsets.push(offsets[offsets.len() - 1] + c);
        }
        Self { counts, offsets }
    }

    /// `[C(N,1), .., C(N,N)]`.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// `C(N, k)` for `1 <= k <= N`.
    pub fn count(&self, k: usize) -> usize {
        self.counts[k - 1]
    }

    /// Rows of level `k` inside the table.
    pub fn level_range(&self, k: usize) -> Range<usize> {
        self.offsets[k - 1]..self.offsets[k]
    }

    /// Total rows, `2^N - 1`.
    pub fn total(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }
}

/// `[C(N,1), .., C(N,N)]`.
pub fn binomial_counts(n: usize) -> Result<Vec<usize>> {
    check_size(n)?;
    Ok(BinomialCounts::new(n).counts)
}

fn check_size(n: usize) -> Result<()> {
    if n == 0 || n > MAX_ENUMERATED_EVENTS {
        return Err(Error::Validation(format!(
            "enumeration needs 1..={} events, got {}",
            MAX_ENUMERATED_EVENTS, n
        )));
    }
    Ok(())
}

/// The ordered table of all `2^N - 1` nonempty indicators.
#[derive(Debug, Clone)]
pub struct IndicatorTable {
    n: usize,
    masks: Vec<u64>,
    counts: BinomialCounts,
}

impl IndicatorTable {
    /// Build the table for `n` events.
    pub fn new(n: usize) -> Result<Self> {
        check_size(n)?;
        let counts = BinomialCounts::new(n);
        let mut masks = Vec::with_capacity(counts.total());
        for k in 1..=n {
            masks.extend(combinations(n, k));
        }
        debug_assert_eq!(masks.len(), counts.total());
        Ok(Self { n, masks, counts })
    }

    /// Number of events N.
    pub fn n_events(&self) -> usize {
        self.n
    }

    /// Number of rows, `2^N - 1`.
    pub fn len(&self) -> usize {
        self.masks.len()
    }

    /// `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Row masks in table order.
    pub fn masks(&self) -> &[u64] {
        &self.masks
    }

    /// Row `i` as an [`Indicator`].
    pub fn row(&self, i: usize) -> Indicator {
        Indicator::from_parts(self.masks[i], self.n)
    }

    /// Binomial bookkeeping for this table.
    pub fn counts(&self) -> &BinomialCounts {
        &self.counts
    }

    /// Masks of level `k` (exactly `k` events on).
    pub fn level(&self, k: usize) -> &[u64] {
        &self.masks[self.counts.level_range(k)]
    }

    /// Rows `0..end` cover levels `1..=k`.
    pub fn levels_end(&self, k: usize) -> usize {
        if k == 0 { 0 } else { self.counts.level_range(k).end }
    }

    /// Indicators in table order.
    pub fn indicators(&self) -> impl Iterator<Item = Indicator> + '_ {
        self.masks.iter().map(move |&m| Indicator::from_parts(m, self.n))
    }
}

/// The ordered indicator table for `n` events.
pub fn all_indicators(n: usize) -> Result<IndicatorTable> {
    IndicatorTable::new(n)
}
