//! Streaming dual contouring.
//!
//! Every cube crossed by the surface gets exactly one vertex, placed by
//! minimising the distance to the tangent planes of the surface crossings on
//! its edges. Every crossed grid edge then becomes a quad joining the
//! vertices of its four surrounding cubes.
//!
//! The grid is swept along z through a fixed number of resident layers, so
//! memory stays bounded however deep the solid is.

mod layout;
mod qef;

pub use qef::solve_qef;

use mesh_solid::SolidSurfaceEstimator;
use mesh_types::{Mesh, Solid};
use tracing::info;

use crate::config::DualContourConfig;
use crate::error::IsoResult;
use crate::grid::{install, Grid};
use layout::Layout;

/// Extract the surface of a solid with dual contouring.
///
/// Hermite data is estimated from containment queries using
/// `config.estimator`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the solid's bounds are
/// not finite, or the worker pool cannot be created.
///
/// # Panics
///
/// Panics with `"solid is true outside of bounds"` if the solid reports a
/// point inside on the padded border of its bounds.
///
/// # Example
///
/// ```
/// use mesh_isosurface::{dual_contour, DualContourConfig};
/// use mesh_solid::Sphere;
/// use mesh_types::Point3;
///
/// let ball = Sphere::new(Point3::origin(), 1.0)?;
/// let mesh = dual_contour(&ball, &DualContourConfig::new(0.2))?;
/// assert!(mesh.is_manifold());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn dual_contour<S: Solid + ?Sized>(solid: &S, config: &DualContourConfig) -> IsoResult<Mesh> {
    config.validate()?;
    let estimator = SolidSurfaceEstimator::new(solid, &config.estimator)?;
    dual_contour_with(&estimator, config)
}

/// Extract a surface using an existing estimator.
///
/// `config.estimator` is ignored in favour of `estimator`.
///
/// # Errors
///
/// Same as [`dual_contour`].
pub fn dual_contour_with<S: Solid + ?Sized>(
    estimator: &SolidSurfaceEstimator<'_, S>,
    config: &DualContourConfig,
) -> IsoResult<Mesh> {
    config.validate()?;
    let grid = Grid::from_bounds(&estimator.solid().bounds(), config.delta)?;
    let rows = Layout::<S>::rows_for_budget(&grid, config.max_memory_bytes);

    let triangles = install(config.workers, || {
        Layout::new(&grid, estimator, config.regularization, config.clip, rows).run()
    })?;
    let mesh: Mesh = triangles.into_iter().collect();

    info!(
        triangles = mesh.len(),
        grid = ?grid.dimensions(),
        rows,
        delta = config.delta,
        "dual contouring extracted"
    );
    Ok(mesh)
}
