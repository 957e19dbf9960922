//! Core geometry types shared by the mesh crates.
//!
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`Triangle`] - A concrete triangle with vertex positions
//! - [`Mesh`] - A set of triangles with stable [`TriangleId`] handles
//! - [`Bounded`] / [`Solid`] - The capability traits every extractor,
//!   hierarchy and collider is written against
//!
//! # Coordinate System
//!
//! Right-handed. Face winding is **counter-clockwise (CCW) when viewed
//! from outside**, so normals point outward by the right-hand rule.
//!
//! # Example
//!
//! ```
//! use mesh_types::{box_mesh, Point3};
//!
//! let mesh = box_mesh(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
//! assert!((mesh.area() - 24.0).abs() < 1e-12);
//! assert!(mesh.is_manifold());
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bounds;
mod mesh;
mod traits;
mod triangle;

pub use bounds::Aabb;
pub use mesh::{box_mesh, segment_key, Mesh, SegmentKey, TriangleId, VertexKey};
pub use traits::{Bounded, Solid};
pub use triangle::Triangle;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
