//! Quadratic error function minimisation.

use nalgebra::{Matrix3, Point3, Vector3};

/// Find the point best fitting a set of tangent planes.
///
/// Each sample `(p, n)` defines the plane through `p` with normal `n`. The
/// result minimises
///
/// ```text
/// Σ (n · (x - p))² + regularization · |x - c|²
/// ```
///
/// where `c` is the centroid of the sample points. The regularisation term
/// keeps the system well posed when the planes are nearly parallel (flat
/// regions and sharp edges). When the normal equations still cannot be
/// factorised the centroid is returned.
///
/// Returns `None` for an empty sample set.
///
/// # Example
///
/// ```
/// use mesh_isosurface::solve_qef;
/// use mesh_types::{Point3, Vector3};
///
/// // Three orthogonal planes meeting at (1, 2, 3).
/// let samples = [
///     (Point3::new(1.0, 0.0, 0.0), Vector3::x()),
///     (Point3::new(0.0, 2.0, 0.0), Vector3::y()),
///     (Point3::new(0.0, 0.0, 3.0), Vector3::z()),
/// ];
/// let x = solve_qef(&samples, 0.0).unwrap();
/// assert!((x - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-12);
/// ```
#[must_use]
pub fn solve_qef(samples: &[(Point3<f64>, Vector3<f64>)], regularization: f64) -> Option<Point3<f64>> {
    if samples.is_empty() {
        return None;
    }
    let centroid = Point3::from(
        samples.iter().map(|(p, _)| p.coords).sum::<Vector3<f64>>() / samples.len() as f64,
    );

    // Solve for the offset from the centroid so the regulariser pulls
    // toward zero.
    let mut ata = Matrix3::identity() * regularization;
    let mut atb = Vector3::zeros();
    for (p, n) in samples {
        ata += n * n.transpose();
        atb += n * n.dot(&(p - centroid));
    }

    let offset = ata
        .cholesky()
        .map(|c| c.solve(&atb))
        .filter(|x| x.iter().all(|v| v.is_finite()))
        .unwrap_or_else(Vector3::zeros);
    Some(centroid + offset)
}
