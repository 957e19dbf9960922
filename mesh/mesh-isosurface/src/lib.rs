//! Isosurface extraction from implicit solids.
//!
//! Two extractors turn a [`Solid`](mesh_types::Solid) into a closed,
//! outward-oriented [`Mesh`](mesh_types::Mesh):
//!
//! - [`marching_cubes`] samples the solid on a regular grid and triangulates
//!   each cell from a case table. Vertices can optionally be pulled onto the
//!   true surface by bisection ([`refine_vertices`]).
//! - [`dual_contour`] places one vertex per crossed cell by solving a small
//!   least-squares problem over Hermite data (surface points and normals),
//!   which preserves sharp features. It streams through the grid with a
//!   bounded memory window.
//!
//! Both sample one cell beyond the solid's bounds and panic with
//! `"solid is true outside of bounds"` if the solid claims any of those
//! samples, since the surface could not be closed.
//!
//! # Example
//!
//! ```
//! use mesh_isosurface::{marching_cubes, MarchingCubesConfig};
//! use mesh_solid::Sphere;
//! use mesh_types::Point3;
//!
//! let ball = Sphere::new(Point3::origin(), 1.0)?;
//! let config = MarchingCubesConfig::new(0.1).with_search_iterations(8);
//! let mesh = marching_cubes(&ball, &config)?;
//!
//! assert!(mesh.is_manifold());
//! assert!((mesh.volume() - 4.0 / 3.0 * std::f64::consts::PI).abs() < 0.1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod config;
mod dual_contour;
mod error;
mod grid;
mod marching_cubes;
mod table;

pub use config::{DualContourConfig, MarchingCubesConfig};
pub use dual_contour::{dual_contour, dual_contour_with, solve_qef};
pub use error::{IsoError, IsoResult};
pub use grid::Grid;
pub use marching_cubes::{marching_cubes, refine_vertices};
pub use table::{rotations, EdgeTriangle, McIntersections, McTable, Rotation, EDGES};
