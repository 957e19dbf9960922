//! Identity-based triangle mesh.

use std::sync::OnceLock;

use hashbrown::{HashMap, HashSet};
use nalgebra::Point3;
use smallvec::SmallVec;

use crate::{Aabb, Triangle};

/// Stable handle to a triangle stored in a [`Mesh`].
///
/// Handles are never reused: removing a triangle retires its handle, so two
/// geometrically identical triangles added separately stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriangleId(u32);

impl TriangleId {
    /// The raw slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Exact, hashable key for a vertex coordinate.
///
/// Two points map to the same key only if their coordinates are bitwise
/// equal (with `-0.0` folded onto `0.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexKey([u64; 3]);

impl VertexKey {
    /// Build the key for a point.
    #[must_use]
    pub fn new(point: &Point3<f64>) -> Self {
        // Adding 0.0 turns -0.0 into +0.0.
        Self([
            (point.x + 0.0).to_bits(),
            (point.y + 0.0).to_bits(),
            (point.z + 0.0).to_bits(),
        ])
    }

    /// Recover the point this key was built from.
    #[must_use]
    pub fn point(&self) -> Point3<f64> {
        Point3::new(
            f64::from_bits(self.0[0]),
            f64::from_bits(self.0[1]),
            f64::from_bits(self.0[2]),
        )
    }
}

/// Undirected segment between two vertices, endpoints in sorted order.
pub type SegmentKey = (VertexKey, VertexKey);

type VertexIndex = HashMap<VertexKey, SmallVec<[TriangleId; 8]>>;

/// A triangle mesh stored as a set of triangles.
///
/// Triangles are held in an arena addressed by [`TriangleId`]. A map from
/// vertex coordinate to incident triangles is built lazily on the first
/// [`Mesh::find`] and discarded by every structural edit, so callers that
/// edit in bulk pay for one rebuild rather than one update per edit.
///
/// # Example
///
/// ```
/// use mesh_types::{Mesh, Point3, Triangle};
///
/// let mut mesh = Mesh::new();
/// let a = Point3::new(0.0, 0.0, 0.0);
/// let id = mesh.add(Triangle::new(a, Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)));
///
/// assert_eq!(mesh.len(), 1);
/// assert_eq!(mesh.find(&a), &[id]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    slots: Vec<Option<Triangle>>,
    live: usize,
    vertex_index: OnceLock<VertexIndex>,
}

impl Mesh {
    /// Create a new empty mesh.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            vertex_index: OnceLock::new(),
        }
    }

    /// Create an empty mesh with room for `capacity` triangles.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            live: 0,
            vertex_index: OnceLock::new(),
        }
    }

    /// Add a triangle, returning its handle.
    ///
    /// # Panics
    ///
    /// Panics if the mesh already holds `u32::MAX` triangle slots.
    pub fn add(&mut self, triangle: Triangle) -> TriangleId {
        let id = u32::try_from(self.slots.len())
            .map(TriangleId)
            .unwrap_or_else(|_| panic!("mesh exceeds {} triangle slots", u32::MAX));
        self.slots.push(Some(triangle));
        self.live += 1;
        self.invalidate_index();
        id
    }

    /// Remove a triangle. Returns `None` if the handle was already removed.
    pub fn remove(&mut self, id: TriangleId) -> Option<Triangle> {
        let removed = self.slots.get_mut(id.index())?.take();
        if removed.is_some() {
            self.live -= 1;
            self.invalidate_index();
        }
        removed
    }

    /// Look up a triangle by handle.
    #[must_use]
    pub fn get(&self, id: TriangleId) -> Option<&Triangle> {
        self.slots.get(id.index())?.as_ref()
    }

    /// Number of live triangles.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Whether the mesh has no triangles.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate over live triangles with their handles, in insertion order.
    #[allow(clippy::cast_possible_truncation)] // add() bounds slots by u32::MAX
    pub fn iter(&self) -> impl Iterator<Item = (TriangleId, &Triangle)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|t| (TriangleId(i as u32), t)))
    }

    /// Iterate over live triangles in insertion order.
    pub fn triangles(&self) -> impl Iterator<Item = &Triangle> {
        self.slots.iter().flatten()
    }

    /// Handles of every triangle touching the vertex at `point`.
    ///
    /// Builds the vertex index on first use.
    #[must_use]
    pub fn find(&self, point: &Point3<f64>) -> &[TriangleId] {
        self.index()
            .get(&VertexKey::new(point))
            .map(SmallVec::as_slice)
            .unwrap_or_default()
    }

    /// Unique vertex coordinates in order of first appearance.
    #[must_use]
    pub fn vertices(&self) -> Vec<Point3<f64>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for t in self.triangles() {
            for v in t.vertices() {
                if seen.insert(VertexKey::new(&v)) {
                    out.push(v);
                }
            }
        }
        out
    }

    /// Rewrite every vertex coordinate in place.
    ///
    /// Triangle handles are preserved; the vertex index is discarded.
    pub fn map_coords(&mut self, mut f: impl FnMut(Point3<f64>) -> Point3<f64>) {
        for t in self.slots.iter_mut().flatten() {
            *t = t.map(&mut f);
        }
        self.invalidate_index();
    }

    /// Total surface area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.triangles().map(Triangle::area).sum()
    }

    /// Enclosed volume, assuming the mesh is closed and outward-oriented.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.triangles().map(Triangle::signed_volume).sum()
    }

    /// Bounding box of all vertices. Empty for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.triangles()
            .fold(Aabb::empty(), |acc, t| acc.union(&Aabb::of(t)))
    }

    /// Number of triangles touching each undirected segment.
    #[must_use]
    pub fn edge_usage(&self) -> HashMap<SegmentKey, usize> {
        let mut usage = HashMap::with_capacity(self.live * 3 / 2);
        for t in self.triangles() {
            for (a, b) in t.edges() {
                *usage.entry(segment_key(&a, &b)).or_insert(0) += 1;
            }
        }
        usage
    }

    /// Whether every segment is shared by exactly two triangles.
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.edge_usage().values().all(|&count| count == 2)
    }

    /// Vertices whose incident triangles form more than one fan.
    ///
    /// Two triangles around a vertex belong to the same fan when they share
    /// a segment ending at that vertex.
    #[must_use]
    pub fn singular_vertices(&self) -> Vec<Point3<f64>> {
        let mut singular: Vec<(VertexKey, Point3<f64>)> = self
            .index()
            .iter()
            .filter(|(key, ids)| self.fan_count(key, ids) > 1)
            .map(|(key, _)| (*key, key.point()))
            .collect();
        singular.sort_by_key(|(key, _)| *key);
        singular.into_iter().map(|(_, p)| p).collect()
    }

    /// Convert to shared vertices plus index triples.
    ///
    /// Vertices are numbered in order of first appearance.
    #[must_use]
    pub fn to_indexed(&self) -> (Vec<Point3<f64>>, Vec<[u32; 3]>) {
        let mut lookup: HashMap<VertexKey, u32> = HashMap::new();
        let mut vertices = Vec::new();
        let mut faces = Vec::with_capacity(self.live);
        for t in self.triangles() {
            let mut face = [0u32; 3];
            for (slot, v) in face.iter_mut().zip(t.vertices()) {
                *slot = *lookup.entry(VertexKey::new(&v)).or_insert_with(|| {
                    vertices.push(v);
                    #[allow(clippy::cast_possible_truncation)] // bounded by triangle slots
                    let next = (vertices.len() - 1) as u32;
                    next
                });
            }
            faces.push(face);
        }
        (vertices, faces)
    }

    fn index(&self) -> &VertexIndex {
        self.vertex_index.get_or_init(|| {
            let mut index: VertexIndex = HashMap::with_capacity(self.live / 2 + 1);
            for (id, t) in self.iter() {
                for v in t.vertices() {
                    let entry = index.entry(VertexKey::new(&v)).or_default();
                    if !entry.contains(&id) {
                        entry.push(id);
                    }
                }
            }
            index
        })
    }

    fn invalidate_index(&mut self) {
        self.vertex_index.take();
    }

    fn fan_count(&self, center: &VertexKey, ids: &[TriangleId]) -> usize {
        // Other vertex keys of each incident triangle.
        let rims: Vec<SmallVec<[VertexKey; 2]>> = ids
            .iter()
            .filter_map(|&id| self.get(id))
            .map(|t| {
                t.vertices()
                    .iter()
                    .map(VertexKey::new)
                    .filter(|k| k != center)
                    .collect()
            })
            .collect();

        let mut visited = vec![false; rims.len()];
        let mut fans = 0;
        for start in 0..rims.len() {
            if visited[start] {
                continue;
            }
            fans += 1;
            visited[start] = true;
            let mut stack = vec![start];
            while let Some(i) = stack.pop() {
                for j in 0..rims.len() {
                    if !visited[j] && rims[i].iter().any(|k| rims[j].contains(k)) {
                        visited[j] = true;
                        stack.push(j);
                    }
                }
            }
        }
        fans
    }
}

impl FromIterator<Triangle> for Mesh {
    fn from_iter<I: IntoIterator<Item = Triangle>>(iter: I) -> Self {
        let mut mesh = Self::new();
        mesh.extend(iter);
        mesh
    }
}

impl Extend<Triangle> for Mesh {
    fn extend<I: IntoIterator<Item = Triangle>>(&mut self, iter: I) {
        let before = self.slots.len();
        self.slots.extend(iter.into_iter().map(Some));
        assert!(
            u32::try_from(self.slots.len()).is_ok(),
            "mesh exceeds {} triangle slots",
            u32::MAX
        );
        self.live += self.slots.len() - before;
        self.invalidate_index();
    }
}

/// Key for the undirected segment `a`–`b`.
#[must_use]
pub fn segment_key(a: &Point3<f64>, b: &Point3<f64>) -> SegmentKey {
    let (ka, kb) = (VertexKey::new(a), VertexKey::new(b));
    if ka <= kb { (ka, kb) } else { (kb, ka) }
}

/// An axis-aligned box as 12 outward-facing triangles.
///
/// # Example
///
/// ```
/// use mesh_types::{box_mesh, Point3};
///
/// let mesh = box_mesh(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
/// assert_eq!(mesh.len(), 12);
/// assert!((mesh.volume() - 1.0).abs() < 1e-12);
/// assert!(mesh.is_manifold());
/// ```
#[must_use]
pub fn box_mesh(min: Point3<f64>, max: Point3<f64>) -> Mesh {
    let c = Aabb::new(min, max).corners();
    // Quads are listed counter-clockwise when viewed from outside.
    let quads = [
        [0, 2, 3, 1], // -z
        [4, 5, 7, 6], // +z
        [0, 1, 5, 4], // -y
        [2, 6, 7, 3], // +y
        [0, 4, 6, 2], // -x
        [1, 3, 7, 5], // +x
    ];
    quads
        .iter()
        .flat_map(|q| {
            [
                Triangle::new(c[q[0]], c[q[1]], c[q[2]]),
                Triangle::new(c[q[0]], c[q[2]], c[q[3]]),
            ]
        })
        .collect()
}
