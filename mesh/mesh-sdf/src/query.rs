//! Point and ray queries against single triangles.

use mesh_types::{Point3, Triangle, Vector3};

/// Closest point of `triangle` to `point`.
///
/// Follows the Voronoi-region walk from "Real-Time Collision Detection"
/// (Ericson): vertex regions, then edge regions, then the face.
/// Degenerate triangles still yield a point on one of their edges.
///
/// # Arguments
///
/// * `point` - The query point
/// * `triangle` - The triangle to project onto
///
/// # Returns
///
/// The point of `triangle` nearest to `point`.
#[must_use]
pub fn closest_point_on_triangle(point: &Point3<f64>, triangle: &Triangle) -> Point3<f64> {
    let [a, b, c] = triangle.vertices();
    let ab = b - a;
    let ac = c - a;

    let ap = point - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = point - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = point - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = va + vb + vc;
    if denom.abs() <= f64::MIN_POSITIVE {
        // Collinear vertices fall through every region test above.
        return a;
    }
    a + ab * (vb / denom) + ac * (vc / denom)
}

/// Intersect a ray with a triangle (Möller–Trumbore).
///
/// Rays parallel to the plane and degenerate triangles never hit. Edges
/// are inclusive.
///
/// # Arguments
///
/// * `origin` - Origin of the ray
/// * `direction` - Direction of the ray, not necessarily normalized
/// * `triangle` - The triangle to test
///
/// # Returns
///
/// `Some((t, u, v))` where `t > 0` is the ray parameter, in units of
/// `direction`, and `(u, v)` are the barycentric weights of `v1` and `v2`.
///
/// # Example
///
/// ```
/// use mesh_sdf::ray_triangle_intersect;
/// use mesh_types::{Point3, Triangle, Vector3};
///
/// let t = Triangle::from_arrays([0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]);
/// let hit = ray_triangle_intersect(&Point3::new(0.5, 0.5, 4.0), &Vector3::new(0.0, 0.0, -2.0), &t);
/// let (scale, u, v) = hit.unwrap();
/// assert!((scale - 2.0).abs() < 1e-12);
/// assert!((u - 0.25).abs() < 1e-12 && (v - 0.25).abs() < 1e-12);
///
/// // Pointing away never hits.
/// assert!(ray_triangle_intersect(&Point3::new(0.5, 0.5, 4.0), &Vector3::z(), &t).is_none());
/// ```
#[must_use]
pub fn ray_triangle_intersect(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    triangle: &Triangle,
) -> Option<(f64, f64, f64)> {
    const EPSILON: f64 = 1e-12;

    let edge1 = triangle.v1 - triangle.v0;
    let edge2 = triangle.v2 - triangle.v0;

    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < EPSILON * edge1.norm() * edge2.norm() * direction.norm() {
        return None;
    }

    let f = a.recip();
    let s = origin - triangle.v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > 0.0).then_some((t, u, v))
}
