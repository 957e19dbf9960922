//! Sliding-window storage for dual contouring.
//!
//! Corners, edges and cubes are addressed by integer grid coordinates. Each
//! z-layer `k` holds:
//!
//! - corners `(i, j, k)`, indexed `i + nx * j`
//! - x-edges from `(i, j, k)` to `(i + 1, j, k)`, indexed `i + (nx - 1) * j`
//! - y-edges from `(i, j, k)` to `(i, j + 1, k)`, indexed `i + nx * j`
//! - z-edges from `(i, j, k)` to `(i, j, k + 1)`, indexed `i + nx * j`
//! - cubes spanning `(i, j, k)` to `(i + 1, j + 1, k + 1)`, indexed
//!   `i + (nx - 1) * j`
//!
//! Only `rows` consecutive layers `[z0, wend)` are resident; layer `k` lives
//! in slot `k % rows`. Every slot is memoized: a corner, edge or cube is
//! computed once and reused until its slot is recycled.

use mesh_solid::SolidSurfaceEstimator;
use mesh_types::{Aabb, Point3, Solid, Triangle, Vector3};
use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::debug;

use super::qef::solve_qef;
use crate::grid::{Grid, OUTSIDE_BOUNDS};

/// Surface crossing on an active edge.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Hermite {
    point: Point3<f64>,
    normal: Vector3<f64>,
    /// Whether the lower-coordinate end of the edge is inside.
    low_inside: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum EdgeState {
    #[default]
    Unset,
    Inactive,
    Active { hermite: Hermite, emitted: bool },
}

impl EdgeState {
    const fn hermite(&self) -> Option<&Hermite> {
        match self {
            Self::Active { hermite, .. } => Some(hermite),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum CubeState {
    #[default]
    Unset,
    Empty,
    Vertex(Point3<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
}

#[derive(Debug, Clone, Default)]
struct EdgeLayer {
    x: Vec<EdgeState>,
    y: Vec<EdgeState>,
    z: Vec<EdgeState>,
}

impl EdgeLayer {
    fn axis(&self, axis: Axis) -> &[EdgeState] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut Vec<EdgeState> {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

/// Resident range of layers and their slot mapping.
#[derive(Debug, Clone, Copy)]
struct Window {
    rows: usize,
    z0: usize,
    wend: usize,
}

impl Window {
    const fn slot(self, k: usize) -> usize {
        k % self.rows
    }

    /// Logical layer stored in `slot`, if it is resident.
    const fn layer(self, slot: usize) -> Option<usize> {
        let k = self.z0 + (slot + self.rows - self.z0 % self.rows) % self.rows;
        if k < self.wend { Some(k) } else { None }
    }
}

/// Streaming dual contouring state for one extraction.
pub(crate) struct Layout<'a, S: Solid + ?Sized> {
    grid: &'a Grid,
    estimator: &'a SolidSurfaceEstimator<'a, S>,
    regularization: f64,
    clip: bool,
    nx: usize,
    ny: usize,
    nz: usize,
    window: Window,
    corners: Vec<Vec<Option<bool>>>,
    edges: Vec<EdgeLayer>,
    cubes: Vec<Vec<CubeState>>,
}

impl<'a, S: Solid + ?Sized> Layout<'a, S> {
    /// Bytes of state kept per resident layer.
    pub(crate) const fn layer_bytes(nx: usize, ny: usize) -> usize {
        nx * ny
            * (size_of::<Option<bool>>() + 3 * size_of::<EdgeState>() + size_of::<CubeState>())
    }

    /// Resident layer count for a memory budget: at least 4, at most `nz`.
    pub(crate) fn rows_for_budget(grid: &Grid, max_memory_bytes: usize) -> usize {
        let (nx, ny, nz) = grid.dimensions();
        (max_memory_bytes / Self::layer_bytes(nx, ny).max(1))
            .max(4)
            .min(nz)
    }

    pub(crate) fn new(
        grid: &'a Grid,
        estimator: &'a SolidSurfaceEstimator<'a, S>,
        regularization: f64,
        clip: bool,
        rows: usize,
    ) -> Self {
        let (nx, ny, nz) = grid.dimensions();
        // Fewer than 4 rows cannot make progress when shifting by rows - 2.
        let rows = rows.max(4).min(nz);
        Self {
            grid,
            estimator,
            regularization,
            clip,
            nx,
            ny,
            nz,
            window: Window {
                rows,
                z0: 0,
                wend: rows,
            },
            corners: vec![vec![None; nx * ny]; rows],
            edges: vec![
                EdgeLayer {
                    x: vec![EdgeState::Unset; (nx - 1) * ny],
                    y: vec![EdgeState::Unset; nx * (ny - 1)],
                    z: vec![EdgeState::Unset; nx * ny],
                };
                rows
            ],
            cubes: vec![vec![CubeState::Unset; (nx - 1) * (ny - 1)]; rows],
        }
    }

    /// Sweep the whole grid, returning every emitted triangle.
    pub(crate) fn run(mut self) -> Vec<Triangle> {
        let mut triangles = Vec::new();
        loop {
            self.populate_corners();
            self.populate_edges();
            self.populate_cubes();
            let before = triangles.len();
            self.emit(&mut triangles);
            debug!(
                z0 = self.window.z0,
                wend = self.window.wend,
                triangles = triangles.len() - before,
                "dual contouring window"
            );
            if self.window.wend == self.nz {
                break;
            }
            self.shift();
        }
        triangles
    }

    /// Slide the window so the last two layers become the first two.
    fn shift(&mut self) {
        let old_wend = self.window.wend;
        self.window.z0 = old_wend - 2;
        self.window.wend = (self.window.z0 + self.window.rows).min(self.nz);
        for k in old_wend..self.window.wend {
            let slot = self.window.slot(k);
            self.corners[slot].fill(None);
            let layer = &mut self.edges[slot];
            layer.x.fill(EdgeState::Unset);
            layer.y.fill(EdgeState::Unset);
            layer.z.fill(EdgeState::Unset);
            self.cubes[slot].fill(CubeState::Unset);
        }
    }

    fn populate_corners(&mut self) {
        let (grid, nx) = (self.grid, self.nx);
        let solid = self.estimator.solid();
        for slot in 0..self.window.rows {
            let Some(k) = self.window.layer(slot) else {
                continue;
            };
            self.corners[slot]
                .par_iter_mut()
                .enumerate()
                .filter(|(_, c)| c.is_none())
                .for_each(|(idx, c)| {
                    let (i, j) = (idx % nx, idx / nx);
                    let inside = solid.contains(&grid.position(i, j, k));
                    assert!(!(inside && grid.is_border(i, j, k)), "{OUTSIDE_BOUNDS}");
                    *c = Some(inside);
                });
        }
    }

    fn populate_edges(&mut self) {
        let (grid, nx, window) = (self.grid, self.nx, self.window);
        let estimator = self.estimator;
        let corners = &self.corners;
        let inside = |[i, j, k]: [usize; 3]| corners[window.slot(k)][i + nx * j] == Some(true);

        for k in window.z0..window.wend {
            let layer = &mut self.edges[window.slot(k)];
            let mut axes = vec![(Axis::X, nx - 1), (Axis::Y, nx)];
            if k + 1 < window.wend {
                axes.push((Axis::Z, nx));
            }
            for (axis, width) in axes {
                layer
                    .axis_mut(axis)
                    .par_iter_mut()
                    .enumerate()
                    .filter(|(_, e)| **e == EdgeState::Unset)
                    .for_each(|(idx, e)| {
                        let low = [idx % width, idx / width, k];
                        let high = step(low, axis);
                        let low_inside = inside(low);
                        if low_inside == inside(high) {
                            *e = EdgeState::Inactive;
                            return;
                        }
                        let (a, b) = (at(grid, low), at(grid, high));
                        let (inner, outer) = if low_inside { (a, b) } else { (b, a) };
                        let point = estimator.surface_point(inner, outer);
                        *e = EdgeState::Active {
                            hermite: Hermite {
                                point,
                                normal: estimator.normal(&point),
                                low_inside,
                            },
                            emitted: false,
                        };
                    });
            }
        }
    }

    fn populate_cubes(&mut self) {
        let (grid, nx, window) = (self.grid, self.nx, self.window);
        let (regularization, clip) = (self.regularization, self.clip);
        let edges = &self.edges;
        let edge = |axis: Axis, [i, j, k]: [usize; 3]| {
            let width = if axis == Axis::X { nx - 1 } else { nx };
            edges[window.slot(k)].axis(axis)[i + width * j].hermite().copied()
        };

        // Cube layer k reads z-edges of layer k, so the last resident layer
        // has no cubes yet.
        for k in window.z0..window.wend.saturating_sub(1) {
            self.cubes[window.slot(k)]
                .par_iter_mut()
                .enumerate()
                .filter(|(_, c)| **c == CubeState::Unset)
                .for_each(|(idx, c)| {
                    let (i, j) = (idx % (nx - 1), idx / (nx - 1));
                    let around: [(Axis, [usize; 3]); 12] = [
                        (Axis::X, [i, j, k]),
                        (Axis::X, [i, j + 1, k]),
                        (Axis::X, [i, j, k + 1]),
                        (Axis::X, [i, j + 1, k + 1]),
                        (Axis::Y, [i, j, k]),
                        (Axis::Y, [i + 1, j, k]),
                        (Axis::Y, [i, j, k + 1]),
                        (Axis::Y, [i + 1, j, k + 1]),
                        (Axis::Z, [i, j, k]),
                        (Axis::Z, [i + 1, j, k]),
                        (Axis::Z, [i, j + 1, k]),
                        (Axis::Z, [i + 1, j + 1, k]),
                    ];
                    let samples: SmallVec<[(Point3<f64>, Vector3<f64>); 12]> = around
                        .iter()
                        .filter_map(|&(axis, coord)| edge(axis, coord))
                        .map(|h| (h.point, h.normal))
                        .collect();

                    *c = match solve_qef(&samples, regularization) {
                        None => CubeState::Empty,
                        Some(v) if clip => {
                            let cell = Aabb::new(at(grid, [i, j, k]), at(grid, [i + 1, j + 1, k + 1]));
                            CubeState::Vertex(v.sup(&cell.min).inf(&cell.max))
                        }
                        Some(v) => CubeState::Vertex(v),
                    };
                });
        }
    }

    /// Emit the quad around every active edge whose four cubes are resolved.
    fn emit(&mut self, out: &mut Vec<Triangle>) {
        let (nx, ny, window) = (self.nx, self.ny, self.window);
        let cubes = &self.cubes;
        let vertex = |[i, j, k]: [Option<usize>; 3]| -> Point3<f64> {
            let (Some(i), Some(j), Some(k)) = (i, j, k) else {
                panic!("{OUTSIDE_BOUNDS}");
            };
            assert!(i + 1 < nx && j + 1 < ny, "{OUTSIDE_BOUNDS}");
            match cubes[window.slot(k)][i + (nx - 1) * j] {
                CubeState::Vertex(v) => v,
                state => panic!("cube ({i}, {j}, {k}) around an active edge is {state:?}"),
            }
        };

        // Cube layers z0..=wend-2 are resolved. x/y-edges on layer k touch
        // cube layers k-1 and k; z-edges only layer k.
        let last_cube = window.wend.saturating_sub(2);
        for k in window.z0..window.wend {
            let layer = &mut self.edges[window.slot(k)];
            for (axis, width) in [(Axis::X, nx - 1), (Axis::Y, nx), (Axis::Z, nx)] {
                let ready = match axis {
                    Axis::X | Axis::Y => k > window.z0 && k <= last_cube,
                    Axis::Z => k <= last_cube,
                };
                if !ready {
                    continue;
                }
                let quads: Vec<[Triangle; 2]> = layer
                    .axis_mut(axis)
                    .par_iter_mut()
                    .enumerate()
                    .filter_map(|(idx, e)| {
                        let EdgeState::Active { hermite, emitted } = e else {
                            return None;
                        };
                        if *emitted {
                            return None;
                        }
                        *emitted = true;
                        let ring = cube_ring(axis, [idx % width, idx / width, k]);
                        let mut v = ring.map(&vertex);
                        if !hermite.low_inside {
                            v.reverse();
                        }
                        Some([
                            Triangle::new(v[0], v[1], v[2]),
                            Triangle::new(v[0], v[2], v[3]),
                        ])
                    })
                    .collect();
                out.extend(quads.into_iter().flatten());
            }
        }
    }
}

/// The four cubes sharing an edge, counter-clockwise around the edge's
/// positive direction.
fn cube_ring(axis: Axis, [i, j, k]: [usize; 3]) -> [[Option<usize>; 3]; 4] {
    let (i0, j0, k0) = (i.checked_sub(1), j.checked_sub(1), k.checked_sub(1));
    let (i, j, k) = (Some(i), Some(j), Some(k));
    match axis {
        Axis::X => [[i, j0, k0], [i, j, k0], [i, j, k], [i, j0, k]],
        Axis::Y => [[i0, j, k0], [i0, j, k], [i, j, k], [i, j, k0]],
        Axis::Z => [[i0, j0, k], [i, j0, k], [i, j, k], [i0, j, k]],
    }
}

const fn step([i, j, k]: [usize; 3], axis: Axis) -> [usize; 3] {
    match axis {
        Axis::X => [i + 1, j, k],
        Axis::Y => [i, j + 1, k],
        Axis::Z => [i, j, k + 1],
    }
}

fn at(grid: &Grid, [i, j, k]: [usize; 3]) -> Point3<f64> {
    grid.position(i, j, k)
}
