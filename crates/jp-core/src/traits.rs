//! Core traits
//!
//! Union and exclusive-partition engines are written once against
//! [`JointProbabilityEvaluator`]; the sequential-conditioning approximation and
//! the multivariate-normal oracle are interchangeable implementations.

use crate::Result;
use crate::types::{CorrelationMatrix, Indicator};

/// Joint probability of a set of events under a normal copula.
///
/// Implementations must be stateless with respect to a call: any scratch space is
/// owned by the call itself, so one evaluator can be shared across rayon tasks.
pub trait JointProbabilityEvaluator: Send + Sync {
    /// `P(∩ events on in indicator)`, in `[0, 1]`.
    ///
    /// Inputs are assumed validated by the caller: `probabilities.len() ==
    /// indicator.n_events() == correlation.dim()`. Events that are off are
    /// unconstrained. The caller's matrix is never modified.
    fn joint_probability(
        &self,
        probabilities: &[f64],
        indicator: Indicator,
        correlation: &CorrelationMatrix,
    ) -> Result<f64>;

    /// Evaluator-specific checks on the correlation matrix, run once before a batch.
    fn prepare(&self, correlation: &CorrelationMatrix) -> Result<()> {
        let _ = correlation;
        Ok(())
    }

    /// Evaluator name (e.g. "PCM", "MVN oracle")
    fn name(&self) -> &str;
}

impl<E: JointProbabilityEvaluator + ?Sized> JointProbabilityEvaluator for &E {
    fn joint_probability(
        &self,
        probabilities: &[f64],
        indicator: Indicator,
        correlation: &CorrelationMatrix,
    ) -> Result<f64> {
        (**self).joint_probability(probabilities, indicator, correlation)
    }

    fn prepare(&self, correlation: &CorrelationMatrix) -> Result<()> {
        (**self).prepare(correlation)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Independent product regardless of correlation.
    struct ProductEvaluator;

    impl JointProbabilityEvaluator for ProductEvaluator {
        fn joint_probability(
            &self,
            probabilities: &[f64],
            indicator: Indicator,
            _correlation: &CorrelationMatrix,
        ) -> Result<f64> {
            Ok(indicator.on_indices().map(|i| probabilities[i]).product())
        }

        fn name(&self) -> &str {
            "Product"
        }
    }

    #[test]
    fn test_dummy_evaluator() {
        let e = ProductEvaluator;
        let corr = CorrelationMatrix::identity(3).unwrap();
        let ind = Indicator::from_bits(&[1, 0, 1]).unwrap();
        let p = e.joint_probability(&[0.5, 0.9, 0.2], ind, &corr).unwrap();
        assert!((p - 0.1).abs() < 1e-15);
        assert!(e.prepare(&corr).is_ok());
        assert_eq!(e.name(), "Product");
    }

    #[test]
    fn test_reference_forwards() {
        fn name_of(e: impl JointProbabilityEvaluator) -> String {
            e.name().to_string()
        }
        let e = ProductEvaluator;
        assert_eq!(name_of(&e), "Product");
    }
}
