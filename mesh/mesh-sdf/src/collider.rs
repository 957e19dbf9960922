//! Ray and sphere collision queries.
//!
//! A [`Collider`] is anything that can report where a ray crosses its
//! surface and whether a sphere touches it. Triangles are colliders on
//! their own; [`MeshCollider`] accelerates a whole mesh with a BVH and
//! [`JoinedCollider`] combines arbitrary colliders under one bounding box.

use std::sync::{Arc, OnceLock};

use mesh_types::{Aabb, Bounded, Mesh, Point3, Triangle, Vector3};
use tracing::debug;

use crate::bvh::Bvh;
use crate::error::{SdfError, SdfResult};
use crate::query::{closest_point_on_triangle, ray_triangle_intersect};
use crate::ray::{Ray, RayCollision, TriangleHit};
use crate::tree::Node;

/// Direction used for even-odd containment tests.
///
/// Skewed off every axis and every lattice diagonal so that rays from grid
/// points do not run along mesh edges.
fn parity_direction() -> Vector3<f64> {
    static DIRECTION: OnceLock<Vector3<f64>> = OnceLock::new();
    *DIRECTION.get_or_init(|| Vector3::new(0.314_159_265, 0.577_215_665, 0.754_877_666).normalize())
}

/// A surface that answers ray and sphere queries.
///
/// Colliders are immutable once built and are queried from many threads.
pub trait Collider: Bounded + Send + Sync {
    /// Report every point where `ray` crosses the surface.
    ///
    /// `f` is called once per hit, in no particular order. Returns the
    /// number of hits.
    fn ray_collisions(&self, ray: &Ray, f: &mut dyn FnMut(RayCollision)) -> usize;

    /// The hit with the smallest scale, if any.
    fn first_ray_collision(&self, ray: &Ray) -> Option<RayCollision>;

    /// Whether any part of the surface lies within `radius` of `center`.
    fn sphere_collision(&self, center: &Point3<f64>, radius: f64) -> bool;

    /// The joined collider behind this one, if it is one.
    ///
    /// [`JoinedCollider::new`] uses this to flatten nested joins.
    fn as_joined(&self) -> Option<&JoinedCollider> {
        None
    }

    /// Whether `point` is enclosed by the surface, by the even-odd rule.
    ///
    /// Casts one ray and counts its crossings. Only meaningful for closed
    /// surfaces.
    fn contains_by_parity(&self, point: &Point3<f64>) -> bool {
        let ray = Ray::new(*point, parity_direction());
        self.ray_collisions(&ray, &mut |_| {}) % 2 == 1
    }
}

impl Collider for Triangle {
    fn ray_collisions(&self, ray: &Ray, f: &mut dyn FnMut(RayCollision)) -> usize {
        match self.first_ray_collision(ray) {
            Some(hit) => {
                f(hit);
                1
            }
            None => 0,
        }
    }

    fn first_ray_collision(&self, ray: &Ray) -> Option<RayCollision> {
        let (scale, u, v) = ray_triangle_intersect(&ray.origin, &ray.direction, self)?;
        Some(RayCollision {
            scale,
            normal: self.normal()?,
            extra: Some(TriangleHit {
                triangle: *self,
                barycentric: [1.0 - u - v, u, v],
            }),
        })
    }

    fn sphere_collision(&self, center: &Point3<f64>, radius: f64) -> bool {
        (closest_point_on_triangle(center, self) - center).norm_squared() <= radius * radius
    }
}

/// A BVH-accelerated collider over the triangles of a mesh.
///
/// # Example
///
/// ```
/// use mesh_sdf::{Collider, MeshCollider, Ray};
/// use mesh_types::{box_mesh, Point3, Vector3};
///
/// let cube = box_mesh(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
/// let collider = MeshCollider::new(&cube)?;
///
/// let ray = Ray::new(Point3::new(0.3, 0.6, -1.0), Vector3::z());
/// let hit = collider.first_ray_collision(&ray).unwrap();
/// assert!((hit.scale - 1.0).abs() < 1e-12);
/// assert!(collider.contains_by_parity(&Point3::new(0.5, 0.5, 0.5)));
/// # Ok::<(), mesh_sdf::SdfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MeshCollider {
    root: Node,
    len: usize,
}

impl MeshCollider {
    /// Build a collider over every triangle of `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::EmptyMesh`] if the mesh has no triangles.
    pub fn new(mesh: &Mesh) -> SdfResult<Self> {
        Self::from_triangles(mesh.triangles().copied().collect())
    }

    /// Build a collider over a list of triangles.
    ///
    /// # Errors
    ///
    /// Returns [`SdfError::EmptyMesh`] if `triangles` is empty.
    pub fn from_triangles(triangles: Vec<Triangle>) -> SdfResult<Self> {
        let len = triangles.len();
        let bvh = Bvh::build(triangles).ok_or(SdfError::EmptyMesh)?;
        let root = Node::from_bvh(bvh);
        debug!(triangles = len, depth = root.depth(), "built mesh collider");
        Ok(Self { root, len })
    }

    /// Number of triangles.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; construction rejects empty meshes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Depth of the underlying hierarchy.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub(crate) const fn root(&self) -> &Node {
        &self.root
    }
}

impl Bounded for MeshCollider {
    fn min(&self) -> Point3<f64> {
        self.root.bounds().min
    }

    fn max(&self) -> Point3<f64> {
        self.root.bounds().max
    }
}

impl Collider for MeshCollider {
    fn ray_collisions(&self, ray: &Ray, f: &mut dyn FnMut(RayCollision)) -> usize {
        self.root.ray_collisions(ray, f)
    }

    fn first_ray_collision(&self, ray: &Ray) -> Option<RayCollision> {
        self.root.first_ray_collision(ray, f64::INFINITY)
    }

    fn sphere_collision(&self, center: &Point3<f64>, radius: f64) -> bool {
        self.root.sphere_collision(center, radius)
    }
}

/// Several colliders queried as one.
///
/// The combined bounds are computed once; queries that miss them are
/// rejected without visiting any child. Hits are merged: every child's
/// crossings for [`ray_collisions`](Collider::ray_collisions), the smallest
/// scale for [`first_ray_collision`](Collider::first_ray_collision), and any
/// child for [`sphere_collision`](Collider::sphere_collision).
#[derive(Clone)]
pub struct JoinedCollider {
    bounds: Aabb,
    children: Vec<Arc<dyn Collider>>,
}

impl std::fmt::Debug for JoinedCollider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinedCollider")
            .field("bounds", &self.bounds)
            .field("children", &self.children.len())
            .finish()
    }
}

impl JoinedCollider {
    /// Join colliders under one bounding box.
    ///
    /// A child that is itself a [`JoinedCollider`] with exactly the combined
    /// bounds is replaced by its own children, so repeated wrapping does not
    /// deepen the tree.
    #[must_use]
    pub fn new(children: Vec<Arc<dyn Collider>>) -> Self {
        let bounds = children
            .iter()
            .fold(Aabb::empty(), |acc, c| acc.union(&c.bounds()));
        let mut flat: Vec<Arc<dyn Collider>> = Vec::with_capacity(children.len());
        for child in children {
            match child.as_joined() {
                Some(joined) if joined.bounds == bounds => {
                    flat.extend(joined.children.iter().cloned());
                }
                _ => flat.push(child),
            }
        }
        Self {
            bounds,
            children: flat,
        }
    }

    /// Join the leaves of a hierarchy, one joined node per branch.
    #[must_use]
    pub fn from_bvh<C: Collider + 'static>(bvh: Bvh<C>) -> Self {
        match into_collider(bvh) {
            Joined::Node(joined) => joined,
            Joined::Leaf(leaf) => Self::new(vec![leaf]),
        }
    }

    /// The colliders this one forwards to.
    #[must_use]
    pub fn children(&self) -> &[Arc<dyn Collider>] {
        &self.children
    }
}

enum Joined {
    Node(JoinedCollider),
    Leaf(Arc<dyn Collider>),
}

fn into_collider<C: Collider + 'static>(bvh: Bvh<C>) -> Joined {
    match bvh {
        Bvh::Leaf(c) => Joined::Leaf(Arc::new(c)),
        Bvh::Branch(children) => {
            let [a, b] = *children;
            let arc = |j: Joined| -> Arc<dyn Collider> {
                match j {
                    Joined::Node(n) => Arc::new(n),
                    Joined::Leaf(l) => l,
                }
            };
            Joined::Node(JoinedCollider::new(vec![
                arc(into_collider(a)),
                arc(into_collider(b)),
            ]))
        }
    }
}

impl Bounded for JoinedCollider {
    fn min(&self) -> Point3<f64> {
        self.bounds.min
    }

    fn max(&self) -> Point3<f64> {
        self.bounds.max
    }
}

impl Collider for JoinedCollider {
    fn ray_collisions(&self, ray: &Ray, f: &mut dyn FnMut(RayCollision)) -> usize {
        if ray.box_interval(&self.bounds).is_none() {
            return 0;
        }
        self.children.iter().map(|c| c.ray_collisions(ray, f)).sum()
    }

    fn first_ray_collision(&self, ray: &Ray) -> Option<RayCollision> {
        ray.box_interval(&self.bounds)?;
        self.children
            .iter()
            .filter_map(|c| c.first_ray_collision(ray))
            .min_by(|a, b| a.scale.total_cmp(&b.scale))
    }

    fn sphere_collision(&self, center: &Point3<f64>, radius: f64) -> bool {
        self.bounds.distance_squared_to(center) <= radius * radius
            && self.children.iter().any(|c| c.sphere_collision(center, radius))
    }

    fn as_joined(&self) -> Option<&JoinedCollider> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::box_mesh;

    fn unit_cube() -> Mesh {
        box_mesh(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    fn scales(collider: &dyn Collider, ray: &Ray) -> Vec<f64> {
        let mut out = Vec::new();
        let n = collider.ray_collisions(ray, &mut |c| out.push(c.scale));
        assert_eq!(n, out.len());
        out.sort_by(f64::total_cmp);
        out
    }

    #[test]
    fn triangle_hit_carries_barycentrics() {
        let t = Triangle::from_arrays([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let ray = Ray::new(Point3::new(0.25, 0.5, 1.0), -Vector3::z());
        let hit = t.first_ray_collision(&ray).expect("hits");
        assert_relative_eq!(hit.scale, 1.0);
        assert_relative_eq!(hit.normal, Vector3::z());
        let bary = hit.extra.expect("triangle detail").barycentric;
        assert_relative_eq!(bary[0], 0.25, epsilon = 1e-12);
        assert_relative_eq!(bary[1], 0.25, epsilon = 1e-12);
        assert_relative_eq!(bary[2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn triangle_sphere_collision() {
        let t = Triangle::from_arrays([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert!(t.sphere_collision(&Point3::new(0.2, 0.2, 0.5), 0.5));
        assert!(!t.sphere_collision(&Point3::new(0.2, 0.2, 0.5), 0.49));
    }

    #[test]
    fn ray_through_cube_hits_twice() {
        let collider = MeshCollider::new(&unit_cube()).expect("non-empty");
        let ray = Ray::new(Point3::new(-1.0, 0.3, 0.6), Vector3::x());
        let hits = scales(&collider, &ray);
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(hits[1], 2.0, epsilon = 1e-12);

        let first = collider.first_ray_collision(&ray).expect("hits");
        assert_relative_eq!(first.scale, 1.0, epsilon = 1e-12);
        assert_relative_eq!(first.normal, -Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn parity_inside_and_outside() {
        let collider = MeshCollider::new(&unit_cube()).expect("non-empty");
        assert!(collider.contains_by_parity(&Point3::new(0.5, 0.5, 0.5)));
        assert!(collider.contains_by_parity(&Point3::new(0.01, 0.99, 0.5)));
        assert!(!collider.contains_by_parity(&Point3::new(1.5, 0.5, 0.5)));
        assert!(!collider.contains_by_parity(&Point3::new(-0.5, -0.5, -0.5)));
    }

    #[test]
    fn sphere_against_cube_surface() {
        let collider = MeshCollider::new(&unit_cube()).expect("non-empty");
        assert!(collider.sphere_collision(&Point3::new(1.5, 0.5, 0.5), 0.6));
        assert!(!collider.sphere_collision(&Point3::new(1.5, 0.5, 0.5), 0.4));
        // Deep inside, the sphere does not reach any face.
        assert!(!collider.sphere_collision(&Point3::new(0.5, 0.5, 0.5), 0.4));
    }

    #[test]
    fn empty_mesh_is_an_error() {
        assert!(matches!(
            MeshCollider::new(&Mesh::new()),
            Err(SdfError::EmptyMesh)
        ));
    }

    #[test]
    fn joined_matches_mesh_collider() {
        let cube = unit_cube();
        let mesh_collider = MeshCollider::new(&cube).expect("non-empty");
        let bvh = Bvh::build(cube.triangles().copied().collect()).expect("non-empty");
        let joined = JoinedCollider::from_bvh(bvh);

        for ray in [
            Ray::new(Point3::new(-1.0, 0.3, 0.6), Vector3::x()),
            Ray::new(Point3::new(0.5, 0.5, 0.5), Vector3::new(0.2, -0.3, 1.0)),
            Ray::new(Point3::new(3.0, 3.0, 3.0), Vector3::new(1.0, 1.0, 1.0)),
        ] {
            assert_eq!(scales(&joined, &ray), scales(&mesh_collider, &ray));
            let a = joined.first_ray_collision(&ray).map(|c| c.scale);
            let b = mesh_collider.first_ray_collision(&ray).map(|c| c.scale);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn nested_joins_with_same_bounds_flatten() {
        let t1: Arc<dyn Collider> = Arc::new(Triangle::from_arrays(
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ));
        let t2: Arc<dyn Collider> = Arc::new(Triangle::from_arrays(
            [1.0, 1.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
        ));
        let inner = JoinedCollider::new(vec![t1.clone(), t2.clone()]);
        let outer = JoinedCollider::new(vec![Arc::new(inner), t1.clone()]);
        assert_eq!(outer.children().len(), 3);

        // A join that only covers part of the bounds is kept whole.
        let small = JoinedCollider::new(vec![t1]);
        let far: Arc<dyn Collider> = Arc::new(Triangle::from_arrays(
            [5.0, 5.0, 5.0],
            [6.0, 5.0, 5.0],
            [5.0, 6.0, 5.0],
        ));
        let mixed = JoinedCollider::new(vec![Arc::new(small), far, t2]);
        assert_eq!(mixed.children().len(), 3);
        assert!(mixed.children()[0].as_joined().is_some());
    }

    #[test]
    fn joined_rejects_outside_queries() {
        let t: Arc<dyn Collider> = Arc::new(Triangle::from_arrays(
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ));
        let joined = JoinedCollider::new(vec![t]);
        let ray = Ray::new(Point3::new(5.0, 5.0, 1.0), -Vector3::z());
        assert_eq!(joined.ray_collisions(&ray, &mut |_| {}), 0);
        assert!(joined.first_ray_collision(&ray).is_none());
        assert!(!joined.sphere_collision(&Point3::new(5.0, 5.0, 0.0), 1.0));
    }

    #[test]
    fn empty_join_never_collides() {
        let joined = JoinedCollider::new(Vec::new());
        let ray = Ray::new(Point3::origin(), Vector3::x());
        assert_eq!(joined.ray_collisions(&ray, &mut |_| {}), 0);
        assert!(!joined.sphere_collision(&Point3::origin(), 100.0));
    }
}
