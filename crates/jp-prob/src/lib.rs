//! Probability building blocks for the joint-probability engines.
//!
//! - standard normal primitives (Φ, φ, Φ⁻¹, tail-stable `ln Φ` and inverse Mills ratio)
//! - bivariate and multivariate normal CDFs
//! - combinatorics over event subsets (binomials, lexicographic bitset enumeration)
//! - small numeric helpers (clamping, masked reductions)

pub mod bivariate;
pub mod combinatorics;
pub mod math;
pub mod mvn;
pub mod normal;

pub use mvn::{MvnConfig, MvnEstimate, mvn_cdf};
