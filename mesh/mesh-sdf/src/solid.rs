//! Solids backed by colliders.

use mesh_types::{Bounded, Point3, Solid};

use crate::collider::Collider;

/// The interior of a closed collider, as a [`Solid`].
///
/// Containment is decided by the even-odd rule, so an extracted mesh can
/// be wrapped in a [`MeshCollider`](crate::MeshCollider) and extracted
/// again.
///
/// # Example
///
/// ```
/// use mesh_sdf::{ColliderSolid, MeshCollider};
/// use mesh_types::{box_mesh, Point3, Solid};
///
/// let cube = box_mesh(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
/// let solid = ColliderSolid::new(MeshCollider::new(&cube)?);
/// assert!(solid.contains(&Point3::new(0.5, 0.5, 0.5)));
/// assert!(!solid.contains(&Point3::new(1.5, 0.5, 0.5)));
/// # Ok::<(), mesh_sdf::SdfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ColliderSolid<C> {
    collider: C,
}

impl<C: Collider> ColliderSolid<C> {
    /// Wrap a collider.
    pub const fn new(collider: C) -> Self {
        Self { collider }
    }

    /// The wrapped collider.
    pub const fn collider(&self) -> &C {
        &self.collider
    }
}

impl<C: Collider> Bounded for ColliderSolid<C> {
    fn min(&self) -> Point3<f64> {
        self.collider.min()
    }

    fn max(&self) -> Point3<f64> {
        self.collider.max()
    }
}

impl<C: Collider> Solid for ColliderSolid<C> {
    fn contains(&self, point: &Point3<f64>) -> bool {
        self.collider.bounds().contains(point) && self.collider.contains_by_parity(point)
    }
}
