//! Axis-aligned bounding boxes.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Bounded;

/// A closed axis-aligned box `[min, max]`.
///
/// A box with `min > max` on some axis is empty. [`Aabb::empty`] is the
/// identity of [`Aabb::union`], so bounds of a collection fold from it.
///
/// # Example
///
/// ```
/// use mesh_types::{Aabb, Point3};
///
/// let cell = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(0.5, 0.5, 0.5));
/// assert_eq!(cell.size(), Point3::new(0.5, 0.5, 0.5).coords);
/// assert!(cell.contains(&Point3::new(0.5, 0.25, 0.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Lower corner.
    pub min: Point3<f64>,
    /// Upper corner.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Box spanned by two opposite corners, in either order.
    #[must_use]
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// The empty box, with `min = +inf` and `max = -inf`.
    ///
    /// ```
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let unit = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
    /// assert!(Aabb::empty().is_empty());
    /// assert_eq!(Aabb::empty().union(&unit), unit);
    /// ```
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Bounds of anything [`Bounded`].
    #[must_use]
    pub fn of<B: Bounded + ?Sized>(object: &B) -> Self {
        Self {
            min: object.min(),
            max: object.max(),
        }
    }

    /// True when `min > max` on any axis.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// True when every coordinate is finite and the box is not empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|c| c.is_finite()) && !self.is_empty()
    }

    /// Edge lengths.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Midpoint of the diagonal.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Enclosed volume, 0 for empty boxes.
    #[must_use]
    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.size().product()
    }

    /// Total face area, 0 for empty boxes.
    #[must_use]
    pub fn surface_area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let s = self.size();
        2.0 * s.z.mul_add(s.x, s.x.mul_add(s.y, s.y * s.z))
    }

    /// The eight corners, corner `c` taking `max` on axis `a` when bit `a`
    /// of `c` is set.
    #[must_use]
    pub fn corners(&self) -> [Point3<f64>; 8] {
        std::array::from_fn(|c| {
            Point3::new(
                if c & 1 == 0 { self.min.x } else { self.max.x },
                if c & 2 == 0 { self.min.y } else { self.max.y },
                if c & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Closed containment test; the faces belong to the box.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|a| point[a] >= self.min[a] && point[a] <= self.max[a])
    }

    /// Overlap of two boxes, empty when they are disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            min: self.min.sup(&other.min),
            max: self.max.inf(&other.max),
        }
    }

    /// Smallest box enclosing both. Empty operands are ignored.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Squared distance from `point` to the box, 0 inside.
    #[must_use]
    pub fn distance_squared_to(&self, point: &Point3<f64>) -> f64 {
        let clamped = point.sup(&self.min).inf(&self.max);
        (point - clamped).norm_squared()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounded for Aabb {
    fn min(&self) -> Point3<f64> {
        self.min
    }

    fn max(&self) -> Point3<f64> {
        self.max
    }
}
