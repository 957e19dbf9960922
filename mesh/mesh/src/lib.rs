//! Geometry kernel: implicit solids in, closed triangle meshes and spatial
//! queries out.
//!
//! This umbrella crate re-exports the `mesh-*` crates under short module
//! names and collects the most common items in a [`prelude`].
//!
//! # Quick Start
//!
//! ```
//! use mesh::prelude::*;
//!
//! // Describe a solid implicitly.
//! let ball = Sphere::new(Point3::origin(), 1.0)?;
//!
//! // Extract a closed surface.
//! let config = MarchingCubesConfig::new(0.1).with_search_iterations(8);
//! let surface = marching_cubes(&ball, &config)?;
//! assert!(surface.is_manifold());
//!
//! // Query it.
//! let sdf = MeshSdf::new(&surface)?;
//! assert!(sdf.sdf(&Point3::origin()) > 0.9);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Module Organization
//!
//! - [`types`] - `Mesh`, `Triangle`, `Aabb`, and the `Bounded`/`Solid` traits
//! - [`solid`] - Primitive solids, boolean combinators, surface estimation
//! - [`isosurface`] - Marching cubes and dual contouring
//! - [`sdf`] - BVH, colliders and signed distance fields
//!
//! # Feature Flags
//!
//! - `serde` - Serialization for the plain geometry types

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

// =============================================================================
// Re-exports
// =============================================================================

/// Core data structures: `Mesh`, `Triangle`, `Aabb`, `Solid`.
pub use mesh_types as types;

/// Primitive solids, boolean combinators and surface estimation.
pub use mesh_solid as solid;

/// Marching cubes and dual contouring.
pub use mesh_isosurface as isosurface;

/// Bounding volume hierarchies, colliders and signed distance fields.
pub use mesh_sdf as sdf;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports.
///
/// # Usage
///
/// ```
/// use mesh::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use mesh_types::{Aabb, Bounded, Mesh, Point3, Solid, Triangle, Vector3};

    // Solids
    pub use mesh_solid::{Cuboid, Cylinder, Difference, Intersection, Sphere, Union};

    // Extraction
    pub use mesh_isosurface::{
        DualContourConfig, MarchingCubesConfig, dual_contour, marching_cubes,
    };

    // Queries
    pub use mesh_sdf::{
        Bvh, Collider, ColliderSolid, JoinedCollider, MeshCollider, MeshSdf, PointSdf, Ray, Sdf,
    };
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use prelude::*;

        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert!(Sphere::new(Point3::origin(), 1.0).is_ok());
    }

    #[test]
    fn test_module_reexports() {
        let _ = types::Mesh::new();
        let _ = solid::SurfaceEstimatorConfig::default();
        let _ = isosurface::DualContourConfig::default();
        let _ = sdf::ApproxSdfConfig::default();
    }
}
