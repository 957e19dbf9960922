//! Error types for collider and SDF construction.

use thiserror::Error;

/// Result type for collider and SDF operations.
pub type SdfResult<T> = Result<T, SdfError>;

/// Errors that can occur while building colliders or distance fields.
#[derive(Debug, Error)]
pub enum SdfError {
    /// Mesh has no triangles.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Collider has no extent to search.
    #[error("collider has empty bounds")]
    EmptyCollider,

    /// Search tolerance is not a positive finite number.
    #[error("invalid epsilon: {0} (must be positive and finite)")]
    InvalidEpsilon(f64),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
