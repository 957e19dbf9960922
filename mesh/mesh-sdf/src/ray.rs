//! Rays and the hits they report.

use mesh_types::{Aabb, Point3, Triangle, Vector3};

/// A half-line `origin + t * direction` for `t >= 0`.
///
/// The direction does not need to be normalized, but must be non-zero.
/// Collision scales are measured in multiples of `direction`.
///
/// # Example
///
/// ```
/// use mesh_sdf::Ray;
/// use mesh_types::{Point3, Vector3};
///
/// let ray = Ray::new(Point3::origin(), Vector3::new(2.0, 0.0, 0.0));
/// assert_eq!(ray.at(1.5), Point3::new(3.0, 0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin of the ray.
    pub origin: Point3<f64>,
    /// The direction of the ray (not necessarily normalized).
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Creates a new ray with the given origin and direction.
    #[must_use]
    pub const fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// The point at parameter `t`.
    #[inline]
    #[must_use]
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Parameter interval over which the ray is inside `aabb`.
    ///
    /// Uses the slab method. The interval is clipped to `t >= 0`; `None`
    /// means the ray misses the box entirely. Axes along which the
    /// direction is zero only reject origins outside that slab, so rays
    /// grazing a face still count.
    #[must_use]
    pub fn box_interval(&self, aabb: &Aabb) -> Option<(f64, f64)> {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];
            if d == 0.0 {
                if o < aabb.min[axis] || o > aabb.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = d.recip();
            let (near, far) = {
                let a = (aabb.min[axis] - o) * inv;
                let b = (aabb.max[axis] - o) * inv;
                if a <= b { (a, b) } else { (b, a) }
            };
            t_min = t_min.max(near);
            t_max = t_max.min(far);
            if t_min > t_max {
                return None;
            }
        }
        Some((t_min, t_max))
    }
}

/// Where a ray struck a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// The triangle that was hit.
    pub triangle: Triangle,
    /// Barycentric weights of the hit point for `v0`, `v1` and `v2`.
    pub barycentric: [f64; 3],
}

/// One intersection of a ray with a collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCollision {
    /// Ray parameter of the hit; the point is `ray.at(scale)`.
    pub scale: f64,
    /// Unit surface normal at the hit, following the surface's own
    /// orientation (not flipped toward the ray).
    pub normal: Vector3<f64>,
    /// Extra detail when the hit surface is a triangle.
    pub extra: Option<TriangleHit>,
}
