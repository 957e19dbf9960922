//! Error types for isosurface extraction.

use mesh_types::Point3;
use thiserror::Error;

/// Result type for extraction operations.
pub type IsoResult<T> = Result<T, IsoError>;

/// Errors detected before extraction starts.
///
/// A solid that reports "inside" on the padded border of its own bounds is
/// not reported here: extraction panics with
/// `"solid is true outside of bounds"` as soon as it sees one.
#[derive(Debug, Error)]
pub enum IsoError {
    /// Grid spacing is zero, negative or not finite.
    #[error("invalid grid spacing: {0}")]
    InvalidDelta(f64),

    /// Solid bounds contain NaN/Inf or have min > max.
    #[error("invalid solid bounds: min {min}, max {max}")]
    InvalidBounds {
        /// Reported minimum corner.
        min: Point3<f64>,
        /// Reported maximum corner.
        max: Point3<f64>,
    },

    /// A configuration parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Surface estimator configuration was rejected.
    #[error("surface estimator: {0}")]
    Estimator(#[from] mesh_solid::SolidError),
}
