//! Top-level API: dispatch on the dependence policy, validate first, then run
//! the closed form or the evaluator-backed inclusion–exclusion.

use crate::combinations::{IndicatorTable, MAX_ENUMERATED_EVENTS};
use crate::config::InclusionExclusionConfig;
use crate::exclusive::{
    ExclusiveResult, inclusion_exclusion_exclusive, independent_exclusive, negative_exclusive,
    positive_exclusive,
};
use crate::oracle::Oracle;
use crate::pcm::Pcm;
use crate::policies::{
    common_cause_ratio, independent_joint_probability, independent_union, negative_joint_probability,
    negative_union, positive_joint_probability, positive_union,
};
use crate::union::{UnionResult, inclusion_exclusion_union};
use jp_core::{Dependence, Error, Indicator, JointProbabilityEvaluator, Result, validate_probabilities};
use jp_prob::MvnConfig;

/// Union / exclusive / joint-probability engine over one evaluator.
///
/// The evaluator is only used for [`Dependence::Correlated`]; the other
/// policies have closed forms.
#[derive(Debug, Clone)]
pub struct DependencyEngine<E = Pcm> {
    evaluator: E,
    config: InclusionExclusionConfig,
}

impl Default for DependencyEngine<Pcm> {
    fn default() -> Self {
        Self::new(Pcm)
    }
}

impl DependencyEngine<Oracle> {
    /// Engine backed by the multivariate-normal oracle.
    pub fn oracle(config: MvnConfig) -> Self {
        Self::new(Oracle::new(config))
    }
}

impl<E: JointProbabilityEvaluator> DependencyEngine<E> {
    /// Engine with the default inclusion–exclusion tolerances.
    pub fn new(evaluator: E) -> Self {
        Self { evaluator, config: InclusionExclusionConfig::default() }
    }

    /// Replace the inclusion–exclusion settings.
    pub fn with_config(mut self, config: InclusionExclusionConfig) -> Self {
        self.config = config;
        self
    }

    /// The joint-probability evaluator.
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Inclusion–exclusion settings.
    pub fn config(&self) -> &InclusionExclusionConfig {
        &self.config
    }

    /// `P(∩ events on in indicator)`. Off events are unconstrained.
    pub fn joint_probability(
        &self,
        probabilities: &[f64],
        indicator: Indicator,
        dependence: &Dependence,
    ) -> Result<f64> {
        validate_inputs(probabilities, dependence)?;
        if indicator.n_events() != probabilities.len() {
            return Err(Error::Validation(format!(
                "indicator has {} events but there are {} probabilities",
                indicator.n_events(),
                probabilities.len()
            )));
        }
        match dependence {
            Dependence::Independent => Ok(independent_joint_probability(probabilities, Some(indicator))),
            Dependence::PerfectlyPositive => Ok(positive_joint_probability(probabilities, Some(indicator))),
            Dependence::PerfectlyNegative => Ok(negative_joint_probability(probabilities, Some(indicator))),
            Dependence::Correlated(r) => {
                self.evaluator.prepare(r)?;
                self.evaluator.joint_probability(probabilities, indicator, r)
            }
        }
    }

    /// `P(at least one event)`.
    pub fn union(&self, probabilities: &[f64], dependence: &Dependence) -> Result<f64> {
        Ok(self.union_with_details(probabilities, dependence)?.probability)
    }

    /// Union with inclusion–exclusion diagnostics.
    pub fn union_with_details(&self, probabilities: &[f64], dependence: &Dependence) -> Result<UnionResult> {
        validate_inputs(probabilities, dependence)?;
        self.config.validate()?;
        match dependence {
            Dependence::Independent => Ok(UnionResult::exact(independent_union(probabilities))),
            Dependence::PerfectlyPositive => Ok(UnionResult::exact(positive_union(probabilities))),
            Dependence::PerfectlyNegative => Ok(UnionResult::exact(negative_union(probabilities))),
            Dependence::Correlated(r) => {
                check_enumerable(probabilities.len())?;
                inclusion_exclusion_union(&self.evaluator, probabilities, r, &self.config)
            }
        }
    }

    /// Mutually exclusive partition over all `2^N - 1` combinations (fewer with early exit).
    pub fn exclusive(&self, probabilities: &[f64], dependence: &Dependence) -> Result<ExclusiveResult> {
        validate_inputs(probabilities, dependence)?;
        self.config.validate()?;
        check_enumerable(probabilities.len())?;
        match dependence {
            Dependence::Correlated(r) => {
                inclusion_exclusion_exclusive(&self.evaluator, probabilities, r, &self.config)
            }
            Dependence::Independent => {
                Ok(independent_exclusive(probabilities, &IndicatorTable::new(probabilities.len())?))
            }
            Dependence::PerfectlyPositive => {
                Ok(positive_exclusive(probabilities, &IndicatorTable::new(probabilities.len())?))
            }
            Dependence::PerfectlyNegative => {
                Ok(negative_exclusive(probabilities, &IndicatorTable::new(probabilities.len())?))
            }
        }
    }

    /// `P(union) / Σ p_i` (1 when every marginal is 0).
    pub fn common_cause_adjustment(&self, probabilities: &[f64], dependence: &Dependence) -> Result<f64> {
        let union = self.union(probabilities, dependence)?;
        Ok(common_cause_ratio(union, probabilities))
    }
}

fn validate_inputs(probabilities: &[f64], dependence: &Dependence) -> Result<()> {
    validate_probabilities(probabilities)?;
    dependence.validate_for(probabilities.len())
}

fn check_enumerable(n: usize) -> Result<()> {
    if n > MAX_ENUMERATED_EVENTS {
        return Err(Error::Validation(format!(
            "union/exclusive enumeration supports at most {} events, got {}",
            MAX_ENUMERATED_EVENTS, n
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Free functions (PCM-backed)
// ---------------------------------------------------------------------------

/// `P(∩ events on in indicator)` with the PCM evaluator for correlated events.
pub fn joint_probability(probabilities: &[f64], indicator: Indicator, dependence: &Dependence) -> Result<f64> {
    DependencyEngine::<Pcm>::default().joint_probability(probabilities, indicator, dependence)
}

/// Union with default early-exit tolerances.
pub fn union(probabilities: &[f64], dependence: &Dependence) -> Result<f64> {
    DependencyEngine::<Pcm>::default().union(probabilities, dependence)
}

/// Union with explicit inclusion–exclusion settings.
pub fn union_with_config(
    probabilities: &[f64],
    dependence: &Dependence,
    config: &InclusionExclusionConfig,
) -> Result<UnionResult> {
    DependencyEngine::<Pcm>::default().with_config(config.clone()).union_with_details(probabilities, dependence)
}

/// Exclusive partition with the same default early-exit tolerances as [`union`].
pub fn exclusive(probabilities: &[f64], dependence: &Dependence) -> Result<ExclusiveResult> {
    DependencyEngine::<Pcm>::default().exclusive(probabilities, dependence)
}

/// Exclusive partition with explicit inclusion–exclusion settings.
pub fn exclusive_with_config(
    probabilities: &[f64],
    dependence: &Dependence,
    config: &InclusionExclusionConfig,
) -> Result<ExclusiveResult> {
    DependencyEngine::<Pcm>::default().with_config(config.clone()).exclusive(probabilities, dependence)
}

/// `P(union) / Σ p_i`.
pub fn common_cause_adjustment(probabilities: &[f64], dependence: &Dependence) -> Result<f64> {
    DependencyEngine::<Pcm>::default().common_cause_adjustment(probabilities, dependence)
}
