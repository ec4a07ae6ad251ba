//! Universally quantified properties over random marginals.
//!
//! Correlated cases stay in the domain where PCM joint probabilities are
//! coherent (small non-negative equicorrelation), so exclusive entries need no
//! clamping.

use jp_dependency::{
    CorrelationMatrix, Dependence, Indicator, InclusionExclusionConfig, exclusive, exclusive_with_config,
    pcm_joint_probability, union, union_with_config,
};
use proptest::prelude::*;

fn marginals() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(0.01f64..0.9, 1..=6)
}

fn policies(n: usize, rho: f64) -> Vec<Dependence> {
    vec![
        Dependence::Independent,
        Dependence::PerfectlyPositive,
        Dependence::PerfectlyNegative,
        Dependence::Correlated(CorrelationMatrix::equicorrelated(n, rho).unwrap()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_independent_union_closed_form(p in marginals()) {
        let expected = 1.0 - p.iter().map(|x| 1.0 - x).product::<f64>();
        let identity = Dependence::Correlated(CorrelationMatrix::identity(p.len()).unwrap());
        let full = InclusionExclusionConfig::full();
        let via_pcm = union_with_config(&p, &identity, &full).unwrap().probability;
        prop_assert!((union(&p, &Dependence::Independent).unwrap() - expected).abs() < 1e-9);
        prop_assert!((via_pcm - expected).abs() < 1e-9);
    }

    #[test]
    fn prop_exclusive_sums_to_union(p in marginals(), rho in 0.0f64..0.3) {
        for dep in policies(p.len(), rho) {
            let x = exclusive(&p, &dep).unwrap();
            let u = union(&p, &dep).unwrap();
            prop_assert!(x.probabilities.iter().all(|&v| v >= 0.0));
            prop_assert!((x.total() - u).abs() < 1e-6, "{}: {} vs {}", dep.name(), x.total(), u);
        }
    }

    #[test]
    fn prop_full_exclusive_lists_every_combination(p in marginals(), rho in 0.0f64..0.3) {
        let full = InclusionExclusionConfig::full();
        for dep in policies(p.len(), rho) {
            let x = exclusive_with_config(&p, &dep, &full).unwrap();
            let u = union_with_config(&p, &dep, &full).unwrap().probability;
            prop_assert_eq!(x.len(), (1usize << p.len()) - 1);
            prop_assert_eq!(x.remainder, 0.0);
            prop_assert!((x.total() - u).abs() < 1e-6, "{}: {} vs {}", dep.name(), x.total(), u);
        }
    }

    #[test]
    fn prop_perfect_dependence_unions(p in marginals()) {
        let max = p.iter().cloned().fold(0.0, f64::max);
        let sum: f64 = p.iter().sum();
        prop_assert_eq!(union(&p, &Dependence::PerfectlyPositive).unwrap(), max);
        prop_assert!((union(&p, &Dependence::PerfectlyNegative).unwrap() - sum.min(1.0)).abs() < 1e-15);
    }

    #[test]
    fn prop_pcm_zero_correlation_is_product(p in marginals()) {
        let all = Indicator::all(p.len()).unwrap();
        let r = CorrelationMatrix::identity(p.len()).unwrap();
        let product: f64 = p.iter().product();
        prop_assert!((pcm_joint_probability(&p, all, &r) - product).abs() < 1e-6);
    }

    #[test]
    fn prop_pcm_joint_below_smallest_marginal(p in marginals(), rho in 0.0f64..0.3) {
        let all = Indicator::all(p.len()).unwrap();
        let r = CorrelationMatrix::equicorrelated(p.len(), rho).unwrap();
        let min = p.iter().cloned().fold(1.0, f64::min);
        prop_assert!(pcm_joint_probability(&p, all, &r) <= min + 1e-12);
    }
}
