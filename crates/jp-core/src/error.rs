//! Error types for joint-probability computations

use thiserror::Error;

/// Joint-probability error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid input: dimensions, probability ranges, malformed correlation matrices.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A numerical routine could not produce a result for otherwise valid input.
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
