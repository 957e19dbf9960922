//! Primitive solids.

use mesh_types::{Aabb, Bounded, Point3, Solid, Vector3};

use crate::error::{SolidError, SolidResult};

fn check_radius(radius: f64) -> SolidResult<()> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(SolidError::InvalidRadius { radius })
    }
}

fn check_point(p: &Point3<f64>) -> SolidResult<()> {
    if p.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(SolidError::InvalidBounds)
    }
}

/// A closed ball.
///
/// # Example
///
/// ```
/// use mesh_solid::Sphere;
/// use mesh_types::{Point3, Solid};
///
/// let ball = Sphere::new(Point3::origin(), 1.0)?;
/// assert!(ball.contains(&Point3::new(0.5, 0.5, 0.5)));
/// assert!(!ball.contains(&Point3::new(1.0, 1.0, 0.0)));
/// # Ok::<(), mesh_solid::SolidError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    center: Point3<f64>,
    radius: f64,
}

impl Sphere {
    /// Create a sphere.
    ///
    /// # Errors
    ///
    /// Returns an error if the center is not finite or the radius is not
    /// a positive finite number.
    pub fn new(center: Point3<f64>, radius: f64) -> SolidResult<Self> {
        check_point(&center)?;
        check_radius(radius)?;
        Ok(Self { center, radius })
    }

    /// Center of the sphere.
    #[must_use]
    pub const fn center(&self) -> Point3<f64> {
        self.center
    }

    /// Radius of the sphere.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        self.radius
    }
}

impl Bounded for Sphere {
    fn min(&self) -> Point3<f64> {
        self.center - Vector3::repeat(self.radius)
    }

    fn max(&self) -> Point3<f64> {
        self.center + Vector3::repeat(self.radius)
    }
}

impl Solid for Sphere {
    fn contains(&self, point: &Point3<f64>) -> bool {
        (point - self.center).norm_squared() <= self.radius * self.radius
    }
}

/// An axis-aligned box, closed on every face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cuboid {
    bounds: Aabb,
}

impl Cuboid {
    /// Create a box spanning two opposite corners, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`SolidError::InvalidBounds`] if a coordinate is not finite.
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> SolidResult<Self> {
        check_point(&a)?;
        check_point(&b)?;
        Ok(Self {
            bounds: Aabb::new(a, b),
        })
    }
}

impl Bounded for Cuboid {
    fn min(&self) -> Point3<f64> {
        self.bounds.min
    }

    fn max(&self) -> Point3<f64> {
        self.bounds.max
    }
}

impl Solid for Cuboid {
    fn contains(&self, point: &Point3<f64>) -> bool {
        self.bounds.contains(point)
    }
}

/// A capped cylinder around the segment `p1`–`p2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    p1: Point3<f64>,
    p2: Point3<f64>,
    radius: f64,
    bounds: Aabb,
}

impl Cylinder {
    /// Create a cylinder.
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite end points, coincident end points or
    /// an invalid radius.
    pub fn new(p1: Point3<f64>, p2: Point3<f64>, radius: f64) -> SolidResult<Self> {
        check_point(&p1)?;
        check_point(&p2)?;
        check_radius(radius)?;
        let Some(axis) = (p2 - p1).try_normalize(f64::EPSILON) else {
            return Err(SolidError::DegenerateAxis);
        };

        // A disc of radius r with unit normal n extends r * sqrt(1 - n_i^2)
        // along axis i.
        let extent = axis.map(|n| radius * (1.0 - n * n).max(0.0).sqrt());
        let bounds = Aabb::new(p1.inf(&p2) - extent, p1.sup(&p2) + extent);
        Ok(Self {
            p1,
            p2,
            radius,
            bounds,
        })
    }
}

impl Bounded for Cylinder {
    fn min(&self) -> Point3<f64> {
        self.bounds.min
    }

    fn max(&self) -> Point3<f64> {
        self.bounds.max
    }
}

impl Solid for Cylinder {
    fn contains(&self, point: &Point3<f64>) -> bool {
        if !self.bounds.contains(point) {
            return false;
        }
        let axis = self.p2 - self.p1;
        let rel = point - self.p1;
        let t = rel.dot(&axis) / axis.norm_squared();
        if !(0.0..=1.0).contains(&t) {
            return false;
        }
        (rel - axis * t).norm_squared() <= self.radius * self.radius
    }
}
