//! Joint, union and mutually exclusive probabilities of correlated binary events.
//!
//! Events are linked by a [`Dependence`] policy: independent, perfectly
//! positive, perfectly negative, or a normal copula with a correlation matrix.
//! Correlated events go through a [`JointProbabilityEvaluator`]:
//! - [`Pcm`]: sequential-conditioning approximation (fast, default)
//! - [`Oracle`]: multivariate normal CDF by quasi-Monte-Carlo (ground truth)
//!
//! Unions and exclusive partitions are built by level-by-level inclusion–exclusion
//! over the [`IndicatorTable`], with optional early exit.
//!
//! ```
//! use jp_dependency::{CorrelationMatrix, Dependence};
//!
//! let p = [0.25, 0.35];
//! let u = jp_dependency::union(&p, &Dependence::Independent).unwrap();
//! assert!((u - 0.5125).abs() < 1e-12);
//!
//! let r = CorrelationMatrix::equicorrelated(2, 0.0).unwrap();
//! let x = jp_dependency::exclusive(&p, &Dependence::Correlated(r)).unwrap();
//! assert_eq!(x.len(), 3);
//! ```

pub mod cache;
pub mod combinations;
pub mod config;
pub mod engine;
pub mod exclusive;
pub mod oracle;
pub mod pcm;
pub mod policies;
pub mod union;

pub use cache::JointProbabilityCache;
pub use combinations::{BinomialCounts, IndicatorTable, MAX_ENUMERATED_EVENTS, all_indicators, binomial_counts};
pub use config::InclusionExclusionConfig;
pub use engine::{
    DependencyEngine, common_cause_adjustment, exclusive, exclusive_with_config, joint_probability, union,
    union_with_config,
};
pub use exclusive::ExclusiveResult;
pub use oracle::Oracle;
pub use pcm::{Pcm, pcm_joint_probability};
pub use policies::mutually_exclusive_adjustment;
pub use union::UnionResult;

pub use jp_core::{CorrelationMatrix, Dependence, Error, Indicator, JointProbabilityEvaluator, Result};
pub use jp_prob::MvnConfig;
