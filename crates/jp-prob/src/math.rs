//! Small numeric helpers shared by the probability code: clamping and
//! elementwise reductions over a probability list, optionally masked by an
//! [`Indicator`] (only entries whose event is on take part).

use jp_core::Indicator;

/// Clamp to `[0, 1]`, mapping NaN to 0.
///
/// Used wherever cancellation or a degenerate conditional variance can push a
/// probability slightly out of range.
#[inline]
pub fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

#[inline]
fn selected<'a>(values: &'a [f64], mask: Option<Indicator>) -> impl Iterator<Item = f64> + 'a {
    values.iter().enumerate().filter_map(move |(i, &v)| match mask {
        Some(m) if !m.is_on(i) => None,
        _ => Some(v),
    })
}

/// Sum of the selected entries (0 when nothing is selected).
pub fn masked_sum(values: &[f64], mask: Option<Indicator>) -> f64 {
    selected(values, mask).sum()
}

/// Product of the selected entries (1 when nothing is selected).
pub fn masked_product(values: &[f64], mask: Option<Indicator>) -> f64 {
    selected(values, mask).product()
}

/// Minimum of the selected entries, `None` when nothing is selected.
pub fn masked_min(values: &[f64], mask: Option<Indicator>) -> Option<f64> {
    selected(values, mask).reduce(f64::min)
}

/// Maximum of the selected entries, `None` when nothing is selected.
pub fn masked_max(values: &[f64], mask: Option<Indicator>) -> Option<f64> {
    selected(values, mask).reduce(f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_probability() {
        assert_eq!(clamp_probability(f64::NAN), 0.0);
        assert_eq!(clamp_probability(-1e-17), 0.0);
        assert_eq!(clamp_probability(1.0 + 1e-12), 1.0);
        assert_eq!(clamp_probability(0.3), 0.3);
    }

    #[test]
    fn test_unmasked_reductions() {
        let p = [0.25, 0.35, 0.5];
        assert!((masked_sum(&p, None) - 1.1).abs() < 1e-15);
        assert!((masked_product(&p, None) - 0.04375).abs() < 1e-15);
        assert_eq!(masked_min(&p, None), Some(0.25));
        assert_eq!(masked_max(&p, None), Some(0.5));
    }

    #[test]
    fn test_masked_reductions() {
        let p = [0.25, 0.35, 0.5, 0.9];
        let m = Indicator::from_bits(&[0, 1, 0, 1]).unwrap();
        assert!((masked_sum(&p, Some(m)) - 1.25).abs() < 1e-15);
        assert!((masked_product(&p, Some(m)) - 0.315).abs() < 1e-15);
        assert_eq!(masked_min(&p, Some(m)), Some(0.35));
        assert_eq!(masked_max(&p, Some(m.complement())), Some(0.5));
    }

    #[test]
    fn test_empty_selection() {
        let p = [0.25, 0.35];
        let none = Indicator::new(0, 2).unwrap();
        assert_eq!(masked_sum(&p, Some(none)), 0.0);
        assert_eq!(masked_product(&p, Some(none)), 1.0);
        assert_eq!(masked_min(&p, Some(none)), None);
        assert_eq!(masked_max(&p, Some(none)), None);
    }
}
