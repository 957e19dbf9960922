//! Signed distance fields, positive inside.
//!
//! [`MeshSdf`] is exact: it finds the nearest surface point by
//! branch-and-bound over a triangle hierarchy. [`ColliderSdf`] works for any
//! [`Collider`] by searching for the smallest sphere that touches the
//! surface, and is only as accurate as its configured tolerance.
//!
//! Both take their sign from the even-odd rule, so the surface must be
//! closed for the sign to mean anything.

use mesh_types::{Bounded, Mesh, Point3};
use rayon::prelude::*;
use tracing::debug;

use crate::collider::{Collider, MeshCollider};
use crate::error::{SdfError, SdfResult};

/// A signed distance function, positive inside the surface.
pub trait Sdf: Bounded + Send + Sync {
    /// Signed distance from `point` to the surface.
    fn sdf(&self, point: &Point3<f64>) -> f64;
}

/// An SDF that also reports where the nearest surface point is.
pub trait PointSdf: Sdf {
    /// The nearest surface point and the signed distance to it.
    fn point_sdf(&self, point: &Point3<f64>) -> (Point3<f64>, f64);
}

/// Exact signed distance to a triangle mesh.
///
/// # Example
///
/// ```
/// use mesh_sdf::{MeshSdf, PointSdf, Sdf};
/// use mesh_types::{box_mesh, Point3};
///
/// let cube = box_mesh(Point3::origin(), Point3::new(2.0, 2.0, 2.0));
/// let sdf = MeshSdf::new(&cube)?;
///
/// // Positive inside, negative outside.
/// assert!((sdf.sdf(&Point3::new(1.0, 1.0, 0.5)) - 0.5).abs() < 1e-12);
/// assert!((sdf.sdf(&Point3::new(1.0, 1.0, -3.0)) + 3.0).abs() < 1e-12);
///
/// let (nearest, _) = sdf.point_sdf(&Point3::new(5.0, 1.0, 1.0));
/// assert!((nearest - Point3::new(2.0, 1.0, 1.0)).norm() < 1e-12);
/// # Ok::<(), mesh_sdf::SdfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MeshSdf {
    collider: MeshCollider,
}

impl MeshSdf {
    /// Build the SDF of a closed mesh.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::EmptyMesh`] if the mesh has no triangles.
    pub fn new(mesh: &Mesh) -> SdfResult<Self> {
        Ok(Self {
            collider: MeshCollider::new(mesh)?,
        })
    }

    /// Wrap an existing mesh collider.
    #[must_use]
    pub const fn from_collider(collider: MeshCollider) -> Self {
        Self { collider }
    }

    /// The collider used for sign tests.
    #[must_use]
    pub const fn collider(&self) -> &MeshCollider {
        &self.collider
    }

    /// Nearest surface point and its squared distance.
    fn nearest(&self, point: &Point3<f64>) -> (Point3<f64>, f64) {
        let mut best = (*point, f64::INFINITY);
        self.collider.root().nearest(point, &mut best);
        best
    }

    /// Signed distances for many points, evaluated in parallel.
    ///
    /// The output order matches `points`.
    #[must_use]
    pub fn sdfs(&self, points: &[Point3<f64>]) -> Vec<f64> {
        let out: Vec<f64> = points.par_iter().map(|p| self.sdf(p)).collect();
        debug!(points = points.len(), "evaluated mesh sdf batch");
        out
    }
}

impl Bounded for MeshSdf {
    fn min(&self) -> Point3<f64> {
        self.collider.min()
    }

    fn max(&self) -> Point3<f64> {
        self.collider.max()
    }
}

impl Sdf for MeshSdf {
    fn sdf(&self, point: &Point3<f64>) -> f64 {
        self.point_sdf(point).1
    }
}

impl PointSdf for MeshSdf {
    fn point_sdf(&self, point: &Point3<f64>) -> (Point3<f64>, f64) {
        let (nearest, d2) = self.nearest(point);
        let distance = d2.sqrt();
        if self.collider.contains_by_parity(point) {
            (nearest, distance)
        } else {
            (nearest, -distance)
        }
    }
}

/// Settings for [`ColliderSdf`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproxSdfConfig {
    /// Width of the final distance bracket. Default: 1e-6.
    pub epsilon: f64,
    /// Upper bound on sphere queries per evaluation. Default: 128.
    pub max_iterations: usize,
}

impl Default for ApproxSdfConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            max_iterations: 128,
        }
    }
}

impl ApproxSdfConfig {
    /// Create a configuration with the given tolerance.
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            ..Self::default()
        }
    }

    /// Coarse, fast settings.
    #[must_use]
    pub fn preview() -> Self {
        Self {
            epsilon: 1e-3,
            max_iterations: 64,
        }
    }

    /// Set the bracket width.
    #[must_use]
    pub const fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the sphere query budget.
    #[must_use]
    pub const fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `epsilon` is not positive and finite or the
    /// iteration budget is zero.
    pub fn validate(&self) -> SdfResult<()> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(SdfError::InvalidEpsilon(self.epsilon));
        }
        if self.max_iterations == 0 {
            return Err(SdfError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Approximate signed distance to any collider.
///
/// The unsigned distance is the radius of the smallest sphere around the
/// query point that touches the surface. It is bracketed between the
/// distance to the collider's bounding box and the distance to the box's
/// farthest corner, then bisected with sphere queries until the bracket is
/// narrower than `epsilon` or `max_iterations` queries have been spent.
/// The midpoint of the final bracket is returned.
///
/// # Example
///
/// ```
/// use mesh_sdf::{ApproxSdfConfig, ColliderSdf, MeshCollider, Sdf};
/// use mesh_types::{box_mesh, Point3};
///
/// let cube = box_mesh(Point3::origin(), Point3::new(2.0, 2.0, 2.0));
/// let sdf = ColliderSdf::new(MeshCollider::new(&cube)?, ApproxSdfConfig::new(1e-6))?;
/// assert!((sdf.sdf(&Point3::new(1.0, 1.0, 0.25)) - 0.25).abs() < 1e-6);
/// # Ok::<(), mesh_sdf::SdfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ColliderSdf<C> {
    collider: C,
    config: ApproxSdfConfig,
}

impl<C: Collider> ColliderSdf<C> {
    /// Wrap a collider.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the collider's
    /// bounds are empty.
    pub fn new(collider: C, config: ApproxSdfConfig) -> SdfResult<Self> {
        config.validate()?;
        if collider.bounds().is_empty() {
            return Err(SdfError::EmptyCollider);
        }
        Ok(Self { collider, config })
    }

    /// The wrapped collider.
    pub const fn collider(&self) -> &C {
        &self.collider
    }

    /// Unsigned distance to the surface.
    fn distance(&self, point: &Point3<f64>) -> f64 {
        let bounds = self.collider.bounds();
        let touches = |r: f64| self.collider.sphere_collision(point, r);

        // No sphere smaller than the gap to the box can touch; one that
        // reaches the farthest corner encloses the whole surface.
        let mut lo = bounds.distance_squared_to(point).sqrt();
        let mut hi = bounds
            .corners()
            .iter()
            .map(|c| (c - point).norm())
            .fold(lo, f64::max);

        for _ in 0..self.config.max_iterations {
            if hi - lo <= self.config.epsilon {
                break;
            }
            let mid = 0.5 * (lo + hi);
            if touches(mid) {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        0.5 * (lo + hi)
    }
}

impl<C: Collider> Bounded for ColliderSdf<C> {
    fn min(&self) -> Point3<f64> {
        self.collider.min()
    }

    fn max(&self) -> Point3<f64> {
        self.collider.max()
    }
}

impl<C: Collider> Sdf for ColliderSdf<C> {
    fn sdf(&self, point: &Point3<f64>) -> f64 {
        let distance = self.distance(point);
        if self.collider.contains_by_parity(point) {
            distance
        } else {
            -distance
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::box_mesh;

    fn cube_sdf() -> MeshSdf {
        MeshSdf::new(&box_mesh(Point3::origin(), Point3::new(2.0, 2.0, 2.0))).expect("non-empty")
    }

    #[test]
    fn inside_is_positive() {
        let sdf = cube_sdf();
        assert_relative_eq!(sdf.sdf(&Point3::new(1.0, 1.0, 1.0)), 1.0, epsilon = 1e-12);
        assert_relative_eq!(sdf.sdf(&Point3::new(0.3, 1.0, 1.2)), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn outside_is_negative() {
        let sdf = cube_sdf();
        assert_relative_eq!(sdf.sdf(&Point3::new(1.0, 1.0, 5.0)), -3.0, epsilon = 1e-12);
        // Nearest feature is the corner.
        let corner = sdf.sdf(&Point3::new(3.0, 3.0, 3.0));
        assert_relative_eq!(corner, -(3.0_f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn nearest_point_matches_distance() {
        let sdf = cube_sdf();
        for p in [
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(-0.5, 0.7, 1.9),
            Point3::new(2.5, 2.5, -1.0),
            Point3::new(0.1, 1.3, 0.4),
        ] {
            let (nearest, d) = sdf.point_sdf(&p);
            assert_relative_eq!(d.abs(), (nearest - p).norm(), epsilon = 1e-12);
            assert!(sdf.sdf(&nearest).abs() < 1e-12);
        }
    }

    #[test]
    fn batch_matches_single_queries() {
        let sdf = cube_sdf();
        let points: Vec<Point3<f64>> = (0..50)
            .map(|i| {
                let t = f64::from(i) * 0.1;
                Point3::new(t - 1.0, 1.3 - 0.05 * t, 0.7 + 0.02 * t)
            })
            .collect();
        let batch = sdf.sdfs(&points);
        for (p, d) in points.iter().zip(&batch) {
            assert_eq!(*d, sdf.sdf(p));
        }
    }

    #[test]
    fn empty_mesh_is_an_error() {
        assert!(matches!(MeshSdf::new(&Mesh::new()), Err(SdfError::EmptyMesh)));
    }

    #[test]
    fn approximate_tracks_exact() {
        let exact = cube_sdf();
        let approx_sdf =
            ColliderSdf::new(exact.collider().clone(), ApproxSdfConfig::new(1e-7)).expect("valid");
        for p in [
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.2, 1.1, 0.9),
            Point3::new(-1.5, 1.0, 1.0),
            Point3::new(4.0, -3.0, 2.5),
        ] {
            assert_relative_eq!(approx_sdf.sdf(&p), exact.sdf(&p), epsilon = 1e-6);
        }
    }

    #[test]
    fn approximate_respects_budget() {
        let collider = cube_sdf().collider().clone();
        let config = ApproxSdfConfig::new(1e-9).with_max_iterations(4);
        let sdf = ColliderSdf::new(collider, config).expect("valid");
        // Four bisection steps over a bracket of width sqrt(3).
        let d = sdf.sdf(&Point3::new(1.0, 1.0, 1.0));
        assert!((d - 1.0).abs() < 0.1, "{d}");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let collider = cube_sdf().collider().clone();
        assert!(matches!(
            ColliderSdf::new(collider.clone(), ApproxSdfConfig::new(0.0)),
            Err(SdfError::InvalidEpsilon(_))
        ));
        assert!(matches!(
            ColliderSdf::new(collider, ApproxSdfConfig::default().with_max_iterations(0)),
            Err(SdfError::InvalidConfig(_))
        ));
    }
}
