//! Multivariate-normal oracle evaluator.
//!
//! Maps on events to `Φ⁻¹(p_i)` and off events to `+∞`, then evaluates
//! `P(Z <= bounds)` with [`jp_prob::mvn_cdf`]. Slower than [`crate::Pcm`] but
//! accurate to the configured tolerance; used as ground truth.

use jp_core::{CorrelationMatrix, Indicator, JointProbabilityEvaluator, Result};
use jp_prob::math::clamp_probability;
use jp_prob::mvn::{MvnConfig, check_positive_semidefinite, mvn_cdf};
use jp_prob::normal;

/// Evaluator backed by the multivariate normal CDF.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Oracle {
    config: MvnConfig,
}

impl Oracle {
    /// Oracle with the given integration settings.
    pub fn new(config: MvnConfig) -> Self {
        Self { config }
    }

    /// Integration settings.
    pub fn config(&self) -> &MvnConfig {
        &self.config
    }
}

impl JointProbabilityEvaluator for Oracle {
    fn joint_probability(
        &self,
        probabilities: &[f64],
        indicator: Indicator,
        correlation: &CorrelationMatrix,
    ) -> Result<f64> {
        let bounds: Vec<f64> = probabilities
            .iter()
            .enumerate()
            .map(|(i, &p)| if indicator.is_on(i) { normal::quantile(p) } else { f64::INFINITY })
            .collect();
        let estimate = mvn_cdf(&bounds, correlation.as_slice(), &self.config)?;
        Ok(clamp_probability(estimate.value))
    }

    fn prepare(&self, correlation: &CorrelationMatrix) -> Result<()> {
        self.config.validate()?;
        check_positive_semidefinite(correlation.as_slice(), correlation.dim())
    }

    fn name(&self) -> &str {
        "MVN oracle"
    }
}
