//! Implicit solids for isosurface extraction.
//!
//! A [`Solid`](mesh_types::Solid) is nothing more than a bounding box and a
//! containment test. This crate provides:
//!
//! - Primitives: [`Sphere`], [`Cuboid`], [`Cylinder`]
//! - Boolean combinators: [`Union`], [`Intersection`], [`Difference`]
//! - [`bisect`] and [`SolidSurfaceEstimator`], which recover surface points
//!   and outward normals using only containment queries
//!
//! # Example
//!
//! ```
//! use mesh_solid::{Cuboid, Difference, Sphere};
//! use mesh_types::{Point3, Solid};
//!
//! let block = Cuboid::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))?;
//! let hole = Sphere::new(Point3::origin(), 0.8)?;
//! let shell = Difference::new(Box::new(block), Box::new(hole));
//!
//! assert!(!shell.contains(&Point3::origin()));
//! assert!(shell.contains(&Point3::new(0.9, 0.9, 0.9)));
//! # Ok::<(), mesh_solid::SolidError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod combinators;
mod error;
mod estimator;
mod primitives;

pub use combinators::{Difference, Intersection, Union};
pub use error::{SolidError, SolidResult};
pub use estimator::{bisect, SolidSurfaceEstimator, SurfaceEstimatorConfig};
pub use primitives::{Cuboid, Cylinder, Sphere};
