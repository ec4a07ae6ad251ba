//! Combinatorics utilities: binomial coefficients and size-k subset enumeration.
//!
//! Subsets are produced as `u64` bitsets (bit `i` = item `i`), so `n <= 63`.

use jp_core::MAX_EVENTS;

/// Exact binomial coefficient `C(n, k)`; 0 when `k > n`.
///
/// Saturates at `u64::MAX` (only reachable for `n > 67`).
pub fn binomial(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        // acc * (n - i) is divisible by (i + 1) at every step.
        acc = acc * u128::from(n - i) / u128::from(i + 1);
        if acc > u128::from(u64::MAX) {
            return u64::MAX;
        }
    }
    acc as u64
}

/// Iterator over all size-`k` subsets of `{0, .., n-1}` in lexicographic order of
/// their sorted index lists: `{0,1}, {0,2}, .., {0,n-1}, {1,2}, ..`.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

/// Size-`k` subsets of `n` items as bitsets. `k == 0` yields the empty set once;
/// `k > n` yields nothing.
pub fn combinations(n: usize, k: usize) -> Combinations {
    debug_assert!(n <= MAX_EVENTS);
    Combinations { n, indices: (0..k).collect(), done: k > n }
}

impl Iterator for Combinations {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.done {
            return None;
        }
        let mask = self.indices.iter().fold(0u64, |m, &i| m | (1u64 << i));

        let k = self.indices.len();
        match (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) {
            Some(i) => {
                self.indices[i] += 1;
                for j in (i + 1)..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }
        Some(mask)
    }
}

/// Scatter the low bits of `compact` onto the set bits of `positions`:
/// bit `j` of `compact` selects the `j`-th lowest set bit of `positions`.
///
/// Maps a subset of `{0, .., positions.count_ones()-1}` onto a subset of `positions`.
#[inline]
pub fn scatter_bits(compact: u64, positions: u64) -> u64 {
    let mut out = 0u64;
    let mut rest = positions;
    let mut j = 0;
    while rest != 0 {
        let low = rest & rest.wrapping_neg();
        if (compact >> j) & 1 == 1 {
            out |= low;
        }
        rest ^= low;
        j += 1;
    }
    out
}
