//! Marching cubes case table.
//!
//! Cube corners are numbered `c = x + 2y + 4z` for `x, y, z` in `{0, 1}`.
//! The 12 cube edges are listed in [`EDGES`]: four along x, four along y,
//! four along z.
//!
//! The table is derived rather than hand-written. Masks are visited in
//! ascending order; each mask not already covered becomes a base case and is
//! triangulated directly, then copied to every rotation of itself through the
//! 24 proper rotations of the cube. The result is deterministic and every
//! case is closed and consistently wound.
//!
//! Direct triangulation walks the six faces. On each face, every maximal run
//! of inside corners contributes one directed segment from the crossing
//! where the run starts to the crossing where it ends. Diagonally opposite
//! inside corners on a face therefore stay separate, which is a
//! rotation-invariant rule and agrees between the two cubes sharing the
//! face. The segments chain into closed loops, each fanned into triangles.

use std::collections::VecDeque;
use std::sync::OnceLock;

use tracing::debug;

/// Corner pairs of the 12 cube edges.
pub const EDGES: [[u8; 2]; 12] = [
    [0, 1],
    [2, 3],
    [4, 5],
    [6, 7],
    [0, 2],
    [1, 3],
    [4, 6],
    [5, 7],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// Corner cycles of the six faces, counter-clockwise seen from outside.
const FACES: [[u8; 4]; 6] = [
    [0, 2, 3, 1],
    [4, 5, 7, 6],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
    [0, 4, 6, 2],
    [1, 3, 7, 5],
];

/// A permutation of cube corners.
pub type Rotation = [u8; 8];

/// A triangle given by three edge indices into [`EDGES`].
pub type EdgeTriangle = [u8; 3];

/// Which corners of a cube are inside the solid, one bit per corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct McIntersections(pub u8);

impl McIntersections {
    /// Build the mask from eight corner samples in corner order.
    #[must_use]
    pub fn from_corners(corners: [bool; 8]) -> Self {
        Self(
            corners
                .iter()
                .enumerate()
                .fold(0, |mask, (c, &inside)| mask | (u8::from(inside) << c)),
        )
    }

    /// Whether corner `c` is inside.
    #[must_use]
    pub const fn inside(self, c: u8) -> bool {
        self.0 & (1 << c) != 0
    }

    /// Apply a corner permutation.
    #[must_use]
    pub fn rotate(self, rotation: &Rotation) -> Self {
        Self(
            (0..8u8)
                .filter(|&c| self.inside(c))
                .fold(0, |mask, c| mask | (1 << rotation[c as usize])),
        )
    }

    /// Whether edge `e` joins an inside corner to an outside one.
    #[must_use]
    pub fn crosses(self, e: usize) -> bool {
        let [a, b] = EDGES[e];
        self.inside(a) != self.inside(b)
    }
}

/// Index of the edge joining corners `a` and `b`, in either order.
fn edge_between(a: u8, b: u8) -> Option<u8> {
    EDGES
        .iter()
        .position(|&[p, q]| (p, q) == (a, b) || (p, q) == (b, a))
        .and_then(|i| u8::try_from(i).ok())
}

fn corner_coords(c: u8) -> [u8; 3] {
    [c & 1, (c >> 1) & 1, (c >> 2) & 1]
}

fn corner_index([x, y, z]: [u8; 3]) -> u8 {
    x | (y << 1) | (z << 2)
}

fn rotation_from(f: impl Fn([u8; 3]) -> [u8; 3]) -> Rotation {
    std::array::from_fn(|c| {
        #[allow(clippy::cast_possible_truncation)] // c < 8
        let c = c as u8;
        corner_index(f(corner_coords(c)))
    })
}

fn compose(outer: &Rotation, inner: &Rotation) -> Rotation {
    std::array::from_fn(|c| outer[inner[c] as usize])
}

/// The 24 proper rotations of the cube, identity first.
///
/// Generated by breadth-first closure over a quarter turn about x and a
/// quarter turn about z.
#[must_use]
pub fn rotations() -> Vec<Rotation> {
    let about_x = rotation_from(|[x, y, z]| [x, 1 - z, y]);
    let about_z = rotation_from(|[x, y, z]| [1 - y, x, z]);
    let identity: Rotation = std::array::from_fn(|c| {
        #[allow(clippy::cast_possible_truncation)] // c < 8
        let c = c as u8;
        c
    });

    let mut group = vec![identity];
    let mut queue = VecDeque::from([identity]);
    while let Some(r) = queue.pop_front() {
        for generator in [&about_x, &about_z] {
            let next = compose(generator, &r);
            if !group.contains(&next) {
                group.push(next);
                queue.push_back(next);
            }
        }
    }
    group
}

/// Triangulate a mask directly by walking its faces.
fn triangulate(mask: McIntersections) -> Vec<EdgeTriangle> {
    // next[e] is the crossing edge following e around its loop.
    let mut next: [Option<u8>; 12] = [None; 12];
    for face in &FACES {
        for start in 0..4 {
            let prev = face[(start + 3) % 4];
            if !mask.inside(face[start]) || mask.inside(prev) {
                continue;
            }
            let mut end = start;
            while mask.inside(face[(end + 1) % 4]) {
                end = (end + 1) % 4;
            }
            let entering = edge_between(prev, face[start]);
            let leaving = edge_between(face[end], face[(end + 1) % 4]);
            if let (Some(entering), Some(leaving)) = (entering, leaving) {
                next[entering as usize] = Some(leaving);
            }
        }
    }

    let mut triangles = Vec::new();
    let mut visited = [false; 12];
    for first in 0..12 {
        if visited[first] || next[first].is_none() {
            continue;
        }
        let mut cycle = Vec::with_capacity(6);
        let mut e = first;
        while !visited[e] {
            visited[e] = true;
            #[allow(clippy::cast_possible_truncation)] // e < 12
            cycle.push(e as u8);
            match next[e] {
                Some(n) => e = n as usize,
                None => break,
            }
        }
        for i in 1..cycle.len().saturating_sub(1) {
            triangles.push([cycle[0], cycle[i], cycle[i + 1]]);
        }
    }
    triangles
}

/// Triangulations for all 256 corner masks.
///
/// # Example
///
/// ```
/// use mesh_isosurface::{McIntersections, McTable};
///
/// let table = McTable::global();
/// assert!(table.get(McIntersections(0)).is_empty());
/// assert_eq!(table.get(McIntersections(1)).len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McTable {
    cases: Vec<Vec<EdgeTriangle>>,
    base_cases: usize,
}

impl McTable {
    /// Build the table from scratch.
    #[must_use]
    pub fn generate() -> Self {
        let group = rotations();
        let mut cases: Vec<Option<Vec<EdgeTriangle>>> = vec![None; 256];
        let mut base_cases = 0;

        for mask in 0..=u8::MAX {
            if cases[mask as usize].is_some() {
                continue;
            }
            base_cases += 1;
            let base = McIntersections(mask);
            let triangles = triangulate(base);
            for rotation in &group {
                let rotated = base.rotate(rotation);
                let slot = &mut cases[rotated.0 as usize];
                if slot.is_some() {
                    continue;
                }
                *slot = Some(
                    triangles
                        .iter()
                        .map(|t| t.map(|e| rotate_edge(e, rotation)))
                        .collect(),
                );
            }
        }
        debug!(base_cases, "generated marching cubes table");

        Self {
            cases: cases.into_iter().map(Option::unwrap_or_default).collect(),
            base_cases,
        }
    }

    /// The process-wide table, generated on first use.
    pub fn global() -> &'static Self {
        static TABLE: OnceLock<McTable> = OnceLock::new();
        TABLE.get_or_init(Self::generate)
    }

    /// Triangles for a corner mask.
    #[must_use]
    pub fn get(&self, mask: McIntersections) -> &[EdgeTriangle] {
        &self.cases[mask.0 as usize]
    }

    /// Number of masks triangulated directly; every other mask is a
    /// rotation of one of these.
    #[must_use]
    pub const fn base_case_count(&self) -> usize {
        self.base_cases
    }
}

fn rotate_edge(e: u8, rotation: &Rotation) -> u8 {
    let [a, b] = EDGES[e as usize];
    // Rotations map edges to edges.
    edge_between(rotation[a as usize], rotation[b as usize]).unwrap_or(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    fn corner_point(c: u8) -> [f64; 3] {
        corner_coords(c).map(f64::from)
    }

    fn edge_point(e: u8) -> [f64; 3] {
        let [a, b] = EDGES[e as usize];
        let (pa, pb) = (corner_point(a), corner_point(b));
        [0, 1, 2].map(|i| (pa[i] + pb[i]) / 2.0)
    }

    fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    #[test]
    fn rotation_group_has_24_distinct_permutations() {
        let group = rotations();
        assert_eq!(group.len(), 24);
        assert_eq!(group[0], [0, 1, 2, 3, 4, 5, 6, 7]);
        for (i, r) in group.iter().enumerate() {
            let mut sorted = *r;
            sorted.sort_unstable();
            assert_eq!(sorted, [0, 1, 2, 3, 4, 5, 6, 7]);
            assert!(!group[..i].contains(r));
        }
    }

    #[test]
    fn rotations_keep_edges_as_edges() {
        for r in rotations() {
            for [a, b] in EDGES {
                assert!(edge_between(r[a as usize], r[b as usize]).is_some());
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let a = McTable::generate();
        let b = McTable::generate();
        assert_eq!(a, b);
        assert_eq!(&a, McTable::global());
    }

    #[test]
    fn base_cases_are_rotation_classes() {
        assert_eq!(McTable::global().base_case_count(), 23);
    }

    #[test]
    fn single_corner_points_away() {
        let table = McTable::global();
        let tris = table.get(McIntersections(1));
        assert_eq!(tris.len(), 1);
        let [a, b, c] = tris[0].map(edge_point);
        let n = cross(sub(b, a), sub(c, a));
        assert!(n.iter().all(|&x| x > 0.0), "normal {n:?}");
    }

    #[test]
    fn triangles_use_only_crossing_edges() {
        let table = McTable::global();
        for mask in 0..=u8::MAX {
            let mask = McIntersections(mask);
            let used: Vec<u8> = table.get(mask).iter().flatten().copied().collect();
            for e in 0..12 {
                assert_eq!(
                    used.contains(&e),
                    mask.crosses(e as usize),
                    "mask {:#010b} edge {e}",
                    mask.0
                );
            }
        }
    }

    #[test]
    fn every_case_is_closed_against_faces() {
        // Inside a cube, each directed triangle side must be cancelled by the
        // reverse side of another triangle, unless it lies on a cube face.
        let table = McTable::global();
        for mask in 0..=u8::MAX {
            let mut open: HashMap<(u8, u8), i32> = HashMap::new();
            for t in table.get(McIntersections(mask)) {
                for i in 0..3 {
                    let (a, b) = (t[i], t[(i + 1) % 3]);
                    *open.entry((a, b)).or_insert(0) += 1;
                    *open.entry((b, a)).or_insert(0) -= 1;
                }
            }
            for ((a, b), count) in open {
                if count == 0 {
                    continue;
                }
                let (pa, pb) = (edge_point(a), edge_point(b));
                let on_face = (0..3).any(|i| pa[i] == pb[i] && (pa[i] == 0.0 || pa[i] == 1.0));
                assert!(on_face, "mask {mask:#010b}: dangling side {a}-{b}");
            }
        }
    }

    #[test]
    fn complement_has_matching_edges() {
        let table = McTable::global();
        for mask in 0..=u8::MAX {
            let a: Vec<u8> = table.get(McIntersections(mask)).iter().flatten().copied().collect();
            let b: Vec<u8> = table.get(McIntersections(!mask)).iter().flatten().copied().collect();
            for e in 0..12u8 {
                assert_eq!(a.contains(&e), b.contains(&e));
            }
        }
    }

    #[test]
    fn from_corners_matches_bits() {
        let mask = McIntersections::from_corners([true, false, false, true, false, false, false, true]);
        assert_eq!(mask.0, 0b1000_1001);
        assert!(mask.inside(3));
        assert!(!mask.inside(4));
    }
}
