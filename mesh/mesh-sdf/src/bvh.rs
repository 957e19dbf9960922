//! Bounding volume hierarchies over arbitrary bounded objects.
//!
//! Two builders are provided:
//!
//! - [`Bvh::build`] chooses every split by *area density*: for each axis the
//!   objects are sorted by box centre and every split index is scored as
//!   `area(left) * |left| + area(right) * |right|`, the usual proxy for the
//!   expected cost of a ray traversal. Prefix and suffix boxes make each
//!   axis O(n) after sorting.
//! - [`Bvh::build_balanced`] always splits at the median and only picks the
//!   axis, giving a tree of minimal depth whose leaf order groups nearby
//!   objects (see [`group_bounded`]).

use mesh_types::{Aabb, Bounded};

/// A binary tree of bounded objects.
///
/// Branches always have exactly two children; bounds are not cached on the
/// nodes, so consumers that query repeatedly convert the tree into their
/// own node type (see [`JoinedCollider::from_bvh`](crate::JoinedCollider::from_bvh)).
#[derive(Debug, Clone, PartialEq)]
pub enum Bvh<B> {
    /// A single object.
    Leaf(B),
    /// Two subtrees.
    Branch(Box<[Bvh<B>; 2]>),
}

impl<B: Bounded> Bvh<B> {
    /// Build a tree minimising area density at every split.
    ///
    /// Ties between split positions along one axis go to the split with
    /// the larger left group; ties between axes keep the earlier axis
    /// (X, then Y, then Z). Returns `None` when `objects` is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_sdf::Bvh;
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let unit = |x: f64| Aabb::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0));
    /// let bvh = Bvh::build(vec![unit(0.0), unit(2.0), unit(20.0)]).unwrap();
    ///
    /// // The two close boxes share a subtree.
    /// let Bvh::Branch(children) = &bvh else { panic!("three objects make a branch") };
    /// assert_eq!(children[0].len(), 2);
    /// assert!(matches!(children[1], Bvh::Leaf(_)));
    /// ```
    #[must_use]
    pub fn build(objects: Vec<B>) -> Option<Self> {
        (!objects.is_empty()).then(|| build_area_density(objects))
    }

    /// Build a median-split tree over [`group_bounded`] order.
    ///
    /// Returns `None` when `objects` is empty.
    #[must_use]
    pub fn build_balanced(mut objects: Vec<B>) -> Option<Self> {
        if objects.is_empty() {
            return None;
        }
        group_bounded(&mut objects);
        Some(from_ordered(objects))
    }

    /// Bounding box of every object in the tree.
    ///
    /// Walks the whole tree.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        match self {
            Self::Leaf(object) => Aabb::of(object),
            Self::Branch(children) => children[0].bounds().union(&children[1].bounds()),
        }
    }
}

impl<B> Bvh<B> {
    /// Objects in left-to-right order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&B> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Leaf(object) => out.push(object),
                Self::Branch(children) => {
                    stack.push(&children[1]);
                    stack.push(&children[0]);
                }
            }
        }
        out
    }

    /// Consume the tree, returning its objects in left-to-right order.
    #[must_use]
    pub fn into_leaves(self) -> Vec<B> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Leaf(object) => out.push(object),
                Self::Branch(children) => {
                    let [left, right] = *children;
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        out
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch(children) => children[0].len() + children[1].len(),
        }
    }

    /// Always `false`; a tree holds at least one object.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Number of nodes on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch(children) => 1 + children[0].depth().max(children[1].depth()),
        }
    }
}

fn center(aabb: &Aabb, axis: usize) -> f64 {
    (aabb.min[axis] + aabb.max[axis]) * 0.5
}

/// Indices of `boxes` sorted by centre along `axis`.
///
/// The sort is stable so equal centres keep their input order.
fn sorted_along(boxes: &[Aabb], axis: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&a, &b| center(&boxes[a], axis).total_cmp(&center(&boxes[b], axis)));
    order
}

struct Split {
    score: f64,
    index: usize,
    order: Vec<usize>,
}

/// Best split of `boxes` sorted along one axis.
fn best_split(boxes: &[Aabb], order: Vec<usize>) -> Split {
    let n = order.len();

    let mut suffix = vec![Aabb::empty(); n];
    let mut acc = Aabb::empty();
    for i in (0..n).rev() {
        acc = acc.union(&boxes[order[i]]);
        suffix[i] = acc;
    }

    let mut best = (f64::INFINITY, 1);
    let mut prefix = Aabb::empty();
    for split in 1..n {
        prefix = prefix.union(&boxes[order[split - 1]]);
        let score = prefix.surface_area() * split as f64
            + suffix[split].surface_area() * (n - split) as f64;
        if score <= best.0 {
            best = (score, split);
        }
    }

    Split {
        score: best.0,
        index: best.1,
        order,
    }
}

fn build_area_density<B: Bounded>(objects: Vec<B>) -> Bvh<B> {
    if objects.len() <= 2 {
        return from_ordered(objects);
    }

    let boxes: Vec<Aabb> = objects.iter().map(Aabb::of).collect();
    let mut best: Option<Split> = None;
    for axis in 0..3 {
        let split = best_split(&boxes, sorted_along(&boxes, axis));
        if best.as_ref().is_none_or(|b| split.score < b.score) {
            best = Some(split);
        }
    }
    let Some(Split { index, order, .. }) = best else {
        return from_ordered(objects);
    };

    let mut left = permute(objects, &order);
    let right = left.split_off(index);
    Bvh::Branch(Box::new([build_area_density(left), build_area_density(right)]))
}

/// Reorder `objects` so that `out[i] = objects[order[i]]`.
fn permute<B>(objects: Vec<B>, order: &[usize]) -> Vec<B> {
    let mut slots: Vec<Option<B>> = objects.into_iter().map(Some).collect();
    order.iter().filter_map(|&i| slots[i].take()).collect()
}

/// Median-split tree over objects in their current order.
fn from_ordered<B>(mut objects: Vec<B>) -> Bvh<B> {
    if objects.len() <= 1 {
        return match objects.pop() {
            Some(object) => Bvh::Leaf(object),
            None => unreachable!("trees are never built from zero objects"),
        };
    }
    let right = objects.split_off(objects.len() / 2);
    Bvh::Branch(Box::new([from_ordered(objects), from_ordered(right)]))
}

/// Reorder objects in place so that nearby objects are adjacent.
///
/// The slice is recursively halved at its median: at each level the
/// objects are sorted by box centre along whichever axis gives the smallest
/// combined surface area of the two halves, then each half is grouped in
/// turn. Any power-of-two-aligned run of the result is a compact cluster,
/// which is what [`Bvh::build_balanced`] relies on.
///
/// # Arguments
///
/// * `objects` - The objects to reorder; slices of two or fewer are left
///   as they are
///
/// # Example
///
/// ```
/// use mesh_sdf::group_bounded;
/// use mesh_types::{Aabb, Point3};
///
/// let at = |x: f64, y: f64| Aabb::new(Point3::new(x, y, 0.0), Point3::new(x + 1.0, y + 1.0, 1.0));
/// let mut boxes = vec![at(0.0, 0.0), at(50.0, 50.0), at(0.0, 2.0), at(50.0, 52.0)];
/// group_bounded(&mut boxes);
///
/// // The two boxes near the origin end up next to each other.
/// assert!(boxes[0].min.x < 10.0 && boxes[1].min.x < 10.0);
/// ```
pub fn group_bounded<B: Bounded>(objects: &mut [B]) {
    if objects.len() <= 2 {
        return;
    }
    let mid = objects.len() / 2;

    let mut best_axis = 0;
    let mut best_area = f64::INFINITY;
    for axis in 0..3 {
        sort_by_center(objects, axis);
        let area = union_of(&objects[..mid]).surface_area() + union_of(&objects[mid..]).surface_area();
        if area < best_area {
            best_area = area;
            best_axis = axis;
        }
    }
    // The slice is currently sorted along Z.
    if best_axis != 2 {
        sort_by_center(objects, best_axis);
    }

    let (left, right) = objects.split_at_mut(mid);
    group_bounded(left);
    group_bounded(right);
}

fn sort_by_center<B: Bounded>(objects: &mut [B], axis: usize) {
    objects.sort_by(|a, b| axis_center(a, axis).total_cmp(&axis_center(b, axis)));
}

fn axis_center<B: Bounded>(object: &B, axis: usize) -> f64 {
    (object.min()[axis] + object.max()[axis]) * 0.5
}

fn union_of<B: Bounded>(objects: &[B]) -> Aabb {
    objects
        .iter()
        .fold(Aabb::empty(), |acc, object| acc.union(&Aabb::of(object)))
}
