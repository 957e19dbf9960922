//! Triangles with owned vertex positions.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Bounded;

/// A triangle stored by value.
///
/// The front face is the one from which `v0, v1, v2` wind counter-clockwise.
/// Extracted surfaces keep their front faces outside the solid.
///
/// ```
/// use mesh_types::{Point3, Triangle};
///
/// let t = Triangle::from_arrays([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
/// assert!((t.area() - 0.5).abs() < 1e-12);
/// assert_eq!(t.normal().map(|n| n.z), Some(1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// First corner.
    pub v0: Point3<f64>,
    /// Second corner.
    pub v1: Point3<f64>,
    /// Third corner.
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Triangle with the given corners in winding order.
    #[inline]
    #[must_use]
    pub const fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Triangle from raw coordinates.
    #[inline]
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::from is not const in nalgebra
    pub fn from_arrays(v0: [f64; 3], v1: [f64; 3], v2: [f64; 3]) -> Self {
        Self::new(v0.into(), v1.into(), v2.into())
    }

    /// Corners in winding order.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> [Point3<f64>; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// `(v1 - v0) x (v2 - v0)`: twice the area, pointing out of the front.
    #[inline]
    #[must_use]
    pub fn cross(&self) -> Vector3<f64> {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Unit normal of the front face, `None` when the triangle has no area.
    ///
    /// ```
    /// use mesh_types::Triangle;
    ///
    /// let sliver = Triangle::from_arrays([0.0; 3], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]);
    /// assert!(sliver.normal().is_none());
    /// ```
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.cross();
        let len_sq = n.norm_squared();
        (len_sq > f64::MIN_POSITIVE).then(|| n / len_sq.sqrt())
    }

    /// Area.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        0.5 * self.cross().norm()
    }

    /// Mean of the corners.
    #[inline]
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Directed edges `v0->v1`, `v1->v2`, `v2->v0`.
    #[must_use]
    pub const fn edges(&self) -> [(Point3<f64>, Point3<f64>); 3] {
        [(self.v0, self.v1), (self.v1, self.v2), (self.v2, self.v0)]
    }

    /// Signed volume of the tetrahedron `(origin, v0, v1, v2)`.
    ///
    /// Summing this over a closed surface with outward front faces gives
    /// the enclosed volume.
    #[inline]
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        self.v0.coords.dot(&self.v1.coords.cross(&self.v2.coords)) / 6.0
    }

    /// Triangle with `f` applied to each corner.
    #[must_use]
    pub fn map(&self, mut f: impl FnMut(Point3<f64>) -> Point3<f64>) -> Self {
        Self::new(f(self.v0), f(self.v1), f(self.v2))
    }
}

impl Bounded for Triangle {
    fn min(&self) -> Point3<f64> {
        self.v0.inf(&self.v1).inf(&self.v2)
    }

    fn max(&self) -> Point3<f64> {
        self.v0.sup(&self.v1).sup(&self.v2)
    }
}
