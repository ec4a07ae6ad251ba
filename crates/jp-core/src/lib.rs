//! # jp-core
//!
//! Shared vocabulary for the joint-probability crates:
//! - [`Error`] / [`Result`]
//! - event-combination and dependence types ([`Indicator`], [`CorrelationMatrix`], [`Dependence`])
//! - the [`JointProbabilityEvaluator`] seam that union/exclusive engines are written against

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error type and result alias.
pub mod error;
/// Evaluator trait.
pub mod traits;
/// Indicators, correlation matrices, dependence policies.
pub mod types;

pub use error::{Error, Result};
pub use traits::JointProbabilityEvaluator;
pub use types::{
    CORRELATION_TOLERANCE, CorrelationMatrix, Dependence, Indicator, MAX_EVENTS,
    validate_probabilities,
};
