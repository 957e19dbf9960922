//! Spatial queries over triangle meshes.
//!
//! This crate groups bounded objects into bounding volume hierarchies and
//! answers three kinds of question against the result:
//!
//! - **Ray casting**: every crossing of a ray with a surface, or the first
//!   one ([`Collider`]).
//! - **Sphere collision**: whether a sphere touches a surface.
//! - **Signed distance**: how far a point is from a closed surface,
//!   positive inside ([`Sdf`], [`PointSdf`]).
//!
//! # Example
//!
//! ```
//! use mesh_sdf::{Collider, MeshCollider, MeshSdf, Ray, Sdf};
//! use mesh_types::{box_mesh, Point3, Vector3};
//!
//! let cube = box_mesh(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
//!
//! let collider = MeshCollider::new(&cube)?;
//! let ray = Ray::new(Point3::new(0.2, 0.7, 2.0), -Vector3::z());
//! assert_eq!(collider.ray_collisions(&ray, &mut |_| {}), 2);
//!
//! let sdf = MeshSdf::new(&cube)?;
//! assert!((sdf.sdf(&Point3::new(0.5, 0.5, 0.9)) - 0.1).abs() < 1e-12);
//! # Ok::<(), mesh_sdf::SdfError>(())
//! ```
//!
//! # Use Cases
//!
//! - **Re-extraction**: wrap a mesh in a [`ColliderSolid`] to treat it as a
//!   solid again
//! - **Collision detection**: quick inside/outside and proximity tests
//! - **Ray tracing**: nearest hit with normal and barycentric coordinates

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod bvh;
mod collider;
mod error;
mod query;
mod ray;
mod sdf;
mod solid;
mod tree;

pub use bvh::{group_bounded, Bvh};
pub use collider::{Collider, JoinedCollider, MeshCollider};
pub use error::{SdfError, SdfResult};
pub use query::{closest_point_on_triangle, ray_triangle_intersect};
pub use ray::{Ray, RayCollision, TriangleHit};
pub use sdf::{ApproxSdfConfig, ColliderSdf, MeshSdf, PointSdf, Sdf};
pub use solid::ColliderSolid;
