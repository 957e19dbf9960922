//! Capability traits shared by every stage of the pipeline.

use nalgebra::Point3;

use crate::Aabb;

/// Anything with an axis-aligned bounding box.
///
/// Bounding-volume hierarchies group arbitrary `Bounded` objects; solids,
/// colliders and SDFs all report their extent through this trait.
pub trait Bounded {
    /// Minimum corner of the bounding box.
    fn min(&self) -> Point3<f64>;

    /// Maximum corner of the bounding box.
    fn max(&self) -> Point3<f64>;

    /// The bounding box as an [`Aabb`].
    fn bounds(&self) -> Aabb {
        Aabb {
            min: self.min(),
            max: self.max(),
        }
    }
}

/// An implicit solid: a boolean containment function with declared bounds.
///
/// `contains` must return `false` for every point outside
/// `[min(), max()]`. The extractors sample one grid cell beyond the bounds
/// and panic when this contract is broken, since the resulting surface
/// could not be closed.
///
/// Implementations are queried from many threads at once.
///
/// # Example
///
/// ```
/// use mesh_types::{Bounded, Point3, Solid};
///
/// struct Slab;
///
/// impl Bounded for Slab {
///     fn min(&self) -> Point3<f64> { Point3::new(-1.0, -1.0, -0.1) }
///     fn max(&self) -> Point3<f64> { Point3::new(1.0, 1.0, 0.1) }
/// }
///
/// impl Solid for Slab {
///     fn contains(&self, p: &Point3<f64>) -> bool {
///         self.bounds().contains(p)
///     }
/// }
///
/// assert!(Slab.contains(&Point3::origin()));
/// assert!(!Slab.contains(&Point3::new(0.0, 0.0, 0.5)));
/// ```
pub trait Solid: Bounded + Send + Sync {
    /// Whether `point` lies inside the solid.
    fn contains(&self, point: &Point3<f64>) -> bool;
}

impl<T: Bounded + ?Sized> Bounded for &T {
    fn min(&self) -> Point3<f64> {
        (**self).min()
    }

    fn max(&self) -> Point3<f64> {
        (**self).max()
    }
}

impl<T: Solid + ?Sized> Solid for &T {
    fn contains(&self, point: &Point3<f64>) -> bool {
        (**self).contains(point)
    }
}

impl<T: Bounded + ?Sized> Bounded for Box<T> {
    fn min(&self) -> Point3<f64> {
        (**self).min()
    }

    fn max(&self) -> Point3<f64> {
        (**self).max()
    }
}

impl<T: Solid + ?Sized> Solid for Box<T> {
    fn contains(&self, point: &Point3<f64>) -> bool {
        (**self).contains(point)
    }
}

impl<T: Bounded + ?Sized> Bounded for std::sync::Arc<T> {
    fn min(&self) -> Point3<f64> {
        (**self).min()
    }

    fn max(&self) -> Point3<f64> {
        (**self).max()
    }
}

impl<T: Solid + ?Sized> Solid for std::sync::Arc<T> {
    fn contains(&self, point: &Point3<f64>) -> bool {
        (**self).contains(point)
    }
}
