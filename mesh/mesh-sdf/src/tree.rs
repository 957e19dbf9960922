//! Triangle hierarchy with cached bounds, shared by the mesh collider and
//! the exact SDF.

use mesh_types::{Aabb, Bounded, Point3, Triangle};

use crate::bvh::Bvh;
use crate::collider::Collider;
use crate::query::closest_point_on_triangle;
use crate::ray::{Ray, RayCollision};

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf(Triangle),
    Branch { bounds: Aabb, children: Box<[Node; 2]> },
}

impl Node {
    pub(crate) fn from_bvh(bvh: Bvh<Triangle>) -> Self {
        match bvh {
            Bvh::Leaf(t) => Self::Leaf(t),
            Bvh::Branch(children) => {
                let [a, b] = *children;
                let (a, b) = (Self::from_bvh(a), Self::from_bvh(b));
                Self::Branch {
                    bounds: a.bounds().union(&b.bounds()),
                    children: Box::new([a, b]),
                }
            }
        }
    }

    pub(crate) fn bounds(&self) -> Aabb {
        match self {
            Self::Leaf(t) => t.bounds(),
            Self::Branch { bounds, .. } => *bounds,
        }
    }

    pub(crate) fn ray_collisions(&self, ray: &Ray, f: &mut dyn FnMut(RayCollision)) -> usize {
        match self {
            Self::Leaf(t) => t.ray_collisions(ray, f),
            Self::Branch { bounds, children } => {
                if ray.box_interval(bounds).is_none() {
                    return 0;
                }
                children[0].ray_collisions(ray, f) + children[1].ray_collisions(ray, f)
            }
        }
    }

    /// Nearest hit with a scale below `limit`.
    pub(crate) fn first_ray_collision(&self, ray: &Ray, limit: f64) -> Option<RayCollision> {
        match self {
            Self::Leaf(t) => t.first_ray_collision(ray).filter(|c| c.scale < limit),
            Self::Branch { children, .. } => {
                let entry = |n: &Self| {
                    ray.box_interval(&n.bounds())
                        .map_or(f64::INFINITY, |(t0, _)| t0)
                };
                let mut near = [
                    (entry(&children[0]), &children[0]),
                    (entry(&children[1]), &children[1]),
                ];
                if near[1].0 < near[0].0 {
                    near.swap(0, 1);
                }

                // Missed children enter at infinity and end the loop.
                let mut best: Option<RayCollision> = None;
                for (t0, node) in near {
                    let bound = best.map_or(limit, |b| b.scale);
                    if t0 >= bound {
                        break;
                    }
                    if let Some(hit) = node.first_ray_collision(ray, bound) {
                        best = Some(hit);
                    }
                }
                best
            }
        }
    }

    pub(crate) fn sphere_collision(&self, center: &Point3<f64>, radius: f64) -> bool {
        match self {
            Self::Leaf(t) => t.sphere_collision(center, radius),
            Self::Branch { bounds, children } => {
                bounds.distance_squared_to(center) <= radius * radius
                    && (children[0].sphere_collision(center, radius)
                        || children[1].sphere_collision(center, radius))
            }
        }
    }

    /// Branch-and-bound nearest surface point.
    ///
    /// `best` carries the closest point found so far and its squared
    /// distance; subtrees whose box is already farther are skipped and the
    /// nearer child is always searched first.
    pub(crate) fn nearest(&self, point: &Point3<f64>, best: &mut (Point3<f64>, f64)) {
        match self {
            Self::Leaf(t) => {
                let candidate = closest_point_on_triangle(point, t);
                let d2 = (candidate - point).norm_squared();
                if d2 < best.1 {
                    *best = (candidate, d2);
                }
            }
            Self::Branch { bounds, children } => {
                if bounds.distance_squared_to(point) >= best.1 {
                    return;
                }
                let d0 = children[0].bounds().distance_squared_to(point);
                let d1 = children[1].bounds().distance_squared_to(point);
                let (first, second) = if d0 <= d1 {
                    (&children[0], &children[1])
                } else {
                    (&children[1], &children[0])
                };
                first.nearest(point, best);
                second.nearest(point, best);
            }
        }
    }

    pub(crate) fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch { children, .. } => 1 + children[0].depth().max(children[1].depth()),
        }
    }
}
