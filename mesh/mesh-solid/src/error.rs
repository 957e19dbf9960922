//! Error types for solid construction.

use thiserror::Error;

/// Result type for solid operations.
pub type SolidResult<T> = Result<T, SolidError>;

/// Errors raised when a solid or estimator is built from bad parameters.
#[derive(Debug, Error)]
pub enum SolidError {
    /// Radius is zero, negative or not finite.
    #[error("invalid radius: {radius}")]
    InvalidRadius {
        /// The radius provided.
        radius: f64,
    },

    /// A corner coordinate is NaN or infinite.
    #[error("bounds must be finite")]
    InvalidBounds,

    /// Cylinder end points coincide.
    #[error("cylinder axis has zero length")]
    DegenerateAxis,

    /// A union or intersection was given no operands.
    #[error("{operation} needs at least one operand")]
    EmptyCombination {
        /// Name of the combinator.
        operation: &'static str,
    },

    /// Estimator parameters are out of range.
    #[error("invalid estimator configuration: {0}")]
    InvalidConfig(String),
}
