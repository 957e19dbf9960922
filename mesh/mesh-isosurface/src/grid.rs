//! Sampling grid shared by both extractors.

use std::sync::mpsc::sync_channel;
use std::thread;

use mesh_types::{Aabb, Point3, Solid};
use tracing::debug;

use crate::error::{IsoError, IsoResult};

/// Panic message for a solid that is inside on its padded border.
pub(crate) const OUTSIDE_BOUNDS: &str = "solid is true outside of bounds";

/// A regular lattice of sample points covering a solid's bounds.
///
/// The lattice starts one cell below the minimum corner and ends at least
/// one cell above the maximum corner, so every border sample lies strictly
/// outside the bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    dimensions: (usize, usize, usize),
    origin: Point3<f64>,
    cell_size: f64,
}

impl Grid {
    /// Create the grid covering `bounds` at spacing `cell_size`.
    ///
    /// # Errors
    ///
    /// Returns [`IsoError::InvalidDelta`] for a non-positive or non-finite
    /// spacing and [`IsoError::InvalidBounds`] for bounds with NaN/Inf or
    /// min > max.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_isosurface::Grid;
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let grid = Grid::from_bounds(&Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)), 0.5)?;
    /// assert_eq!(grid.dimensions(), (5, 5, 5));
    /// assert_eq!(grid.origin(), Point3::new(-0.5, -0.5, -0.5));
    /// # Ok::<(), mesh_isosurface::IsoError>(())
    /// ```
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_bounds(bounds: &Aabb, cell_size: f64) -> IsoResult<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(IsoError::InvalidDelta(cell_size));
        }
        if !bounds.is_valid() {
            return Err(IsoError::InvalidBounds {
                min: bounds.min,
                max: bounds.max,
            });
        }
        let extent = bounds.size();
        let count = |e: f64| (e / cell_size).ceil() as usize + 3;
        Ok(Self {
            dimensions: (count(extent.x), count(extent.y), count(extent.z)),
            origin: bounds.min - mesh_types::Vector3::repeat(cell_size),
            cell_size,
        })
    }

    /// Sample counts along x, y and z.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize, usize) {
        self.dimensions
    }

    /// Position of sample `(0, 0, 0)`.
    #[must_use]
    pub const fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// Spacing between samples.
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// World position of a sample.
    #[must_use]
    pub fn position(&self, ix: usize, iy: usize, iz: usize) -> Point3<f64> {
        Point3::new(
            self.origin.x + ix as f64 * self.cell_size,
            self.origin.y + iy as f64 * self.cell_size,
            self.origin.z + iz as f64 * self.cell_size,
        )
    }

    /// World position in half-cell units.
    ///
    /// Even coordinates land on samples, odd ones on edge midpoints. Two
    /// cubes sharing an edge compute bitwise identical midpoints.
    #[must_use]
    pub fn half_position(&self, hx: usize, hy: usize, hz: usize) -> Point3<f64> {
        let half = self.cell_size * 0.5;
        Point3::new(
            self.origin.x + hx as f64 * half,
            self.origin.y + hy as f64 * half,
            self.origin.z + hz as f64 * half,
        )
    }

    /// Nearest half-cell coordinates of a point, or `None` outside the grid.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn half_index(&self, p: &Point3<f64>) -> Option<[usize; 3]> {
        let half = self.cell_size * 0.5;
        let rel = (p - self.origin) / half;
        let dims = [self.dimensions.0, self.dimensions.1, self.dimensions.2];
        let mut out = [0usize; 3];
        for axis in 0..3 {
            let h = rel[axis].round();
            if !(h >= 0.0 && h <= (2 * (dims[axis] - 1)) as f64) {
                return None;
            }
            out[axis] = h as usize;
        }
        Some(out)
    }

    /// Whether a sample lies on the outermost layer.
    #[must_use]
    pub const fn is_border(&self, ix: usize, iy: usize, iz: usize) -> bool {
        let (nx, ny, nz) = self.dimensions;
        ix == 0 || iy == 0 || iz == 0 || ix + 1 == nx || iy + 1 == ny || iz + 1 == nz
    }

    fn sample_slice<S: Solid + ?Sized>(&self, solid: &S, iz: usize) -> Vec<bool> {
        let (nx, ny, _) = self.dimensions;
        let mut slice = Vec::with_capacity(nx * ny);
        for iy in 0..ny {
            for ix in 0..nx {
                slice.push(solid.contains(&self.position(ix, iy, iz)));
            }
        }
        slice
    }

    fn check_slice(&self, iz: usize, slice: &[bool]) {
        let (nx, ny, _) = self.dimensions;
        let violated = slice.iter().enumerate().any(|(i, &inside)| {
            inside && self.is_border(i % nx, i / nx, iz)
        });
        assert!(!violated, "{OUTSIDE_BOUNDS}");
        debug_assert_eq!(slice.len(), nx * ny);
    }

    /// Sample every z-slice of the grid and hand adjacent pairs to `f`.
    ///
    /// Slices are indexed `x + nx * y`. `f(iz, bottom, top)` is called in
    /// order for `iz` in `0..nz - 1`, with `bottom` at layer `iz` and `top`
    /// at `iz + 1`.
    ///
    /// Slice `iz` is computed by worker `iz % workers`. Each worker hands
    /// its slices over a single-slot channel, so at most two slices per
    /// worker are alive besides the pair being consumed.
    ///
    /// # Panics
    ///
    /// Panics with `"solid is true outside of bounds"` if any border sample
    /// is inside the solid.
    pub(crate) fn for_each_slice_pair<S, F>(&self, solid: &S, workers: usize, mut f: F)
    where
        S: Solid + ?Sized,
        F: FnMut(usize, &[bool], &[bool]),
    {
        let nz = self.dimensions.2;
        let workers = resolve_workers(workers).min(nz).max(1);
        debug!(workers, slices = nz, "sampling grid");

        thread::scope(|scope| {
            let receivers: Vec<_> = (0..workers)
                .map(|w| {
                    let (tx, rx) = sync_channel::<Vec<bool>>(1);
                    scope.spawn(move || {
                        for iz in (w..nz).step_by(workers) {
                            if tx.send(self.sample_slice(solid, iz)).is_err() {
                                break;
                            }
                        }
                    });
                    rx
                })
                .collect();

            let mut bottom: Option<Vec<bool>> = None;
            for iz in 0..nz {
                let Ok(top) = receivers[iz % workers].recv() else {
                    panic!("grid sampling worker stopped before slice {iz}");
                };
                self.check_slice(iz, &top);
                if let Some(bottom) = &bottom {
                    f(iz - 1, bottom, &top);
                }
                bottom = Some(top);
            }
        });
    }
}

/// Thread count for a `workers` setting of zero meaning "all cores".
pub(crate) fn resolve_workers(workers: usize) -> usize {
    if workers > 0 {
        workers
    } else {
        thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }
}

/// Run `f` on a dedicated rayon pool of `workers` threads, or on the global
/// pool when `workers` is zero.
pub(crate) fn install<R, F>(workers: usize, f: F) -> IsoResult<R>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    if workers == 0 {
        return Ok(f());
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| IsoError::InvalidConfig(format!("thread pool: {e}")))?;
    Ok(pool.install(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_solid::{Cuboid, Sphere};
    use mesh_types::Bounded;

    #[test]
    fn grid_pads_bounds() {
        let bounds = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let grid = Grid::from_bounds(&bounds, 0.3).expect("valid");
        let (nx, ny, nz) = grid.dimensions();
        assert_eq!((nx, ny, nz), (10, 10, 10));
        assert_relative_eq!(grid.origin(), Point3::new(-1.3, -1.3, -1.3));
        let last = grid.position(nx - 1, ny - 1, nz - 1);
        assert!(last.x > 1.0 && last.y > 1.0 && last.z > 1.0);
    }

    #[test]
    fn rejects_bad_input() {
        let bounds = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!(matches!(
            Grid::from_bounds(&bounds, 0.0),
            Err(IsoError::InvalidDelta(_))
        ));
        assert!(Grid::from_bounds(&bounds, f64::NAN).is_err());

        let inverted = Aabb {
            min: Point3::new(1.0, 0.0, 0.0),
            max: Point3::origin(),
        };
        assert!(matches!(
            Grid::from_bounds(&inverted, 0.1),
            Err(IsoError::InvalidBounds { .. })
        ));
        let nan = Aabb {
            min: Point3::new(f64::NAN, 0.0, 0.0),
            max: Point3::new(1.0, 1.0, 1.0),
        };
        assert!(Grid::from_bounds(&nan, 0.1).is_err());
    }

    #[test]
    fn half_positions_agree_with_samples() {
        let bounds = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let grid = Grid::from_bounds(&bounds, 0.1).expect("valid");
        for i in 0..grid.dimensions().0 {
            assert_eq!(grid.half_position(2 * i, 2 * i, 0), grid.position(i, i, 0));
        }
        let mid = grid.half_position(5, 4, 2);
        assert_eq!(grid.half_index(&mid), Some([5, 4, 2]));
        assert_eq!(grid.half_index(&Point3::new(-5.0, 0.0, 0.0)), None);
    }

    #[test]
    fn slice_pairs_arrive_in_order() {
        let ball = Sphere::new(Point3::origin(), 1.0).expect("valid");
        let grid = Grid::from_bounds(&ball.bounds(), 0.25).expect("valid");
        let (nx, ny, nz) = grid.dimensions();

        for workers in [1, 3, 16] {
            let mut seen = Vec::new();
            let mut inside = 0;
            grid.for_each_slice_pair(&ball, workers, |iz, bottom, top| {
                assert_eq!(bottom.len(), nx * ny);
                assert_eq!(top.len(), nx * ny);
                assert_eq!(
                    top[nx * (ny / 2) + nx / 2],
                    ball.contains(&grid.position(nx / 2, ny / 2, iz + 1))
                );
                inside += bottom.iter().filter(|&&b| b).count();
                seen.push(iz);
            });
            assert_eq!(seen, (0..nz - 1).collect::<Vec<_>>());
            assert!(inside > 0);
        }
    }

    struct Leaky(Cuboid);

    impl Bounded for Leaky {
        fn min(&self) -> Point3<f64> {
            self.0.min()
        }
        fn max(&self) -> Point3<f64> {
            self.0.max()
        }
    }

    impl Solid for Leaky {
        fn contains(&self, p: &Point3<f64>) -> bool {
            p.z < 0.5
        }
    }

    #[test]
    #[should_panic(expected = "solid is true outside of bounds")]
    fn border_violation_panics() {
        let leaky = Leaky(Cuboid::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).expect("valid"));
        let grid = Grid::from_bounds(&leaky.bounds(), 0.25).expect("valid");
        grid.for_each_slice_pair(&leaky, 2, |_, _, _| {});
    }

    #[test]
    fn install_runs_closure() {
        assert_eq!(install(0, || 7).expect("global pool"), 7);
        assert_eq!(install(2, rayon::current_num_threads).expect("pool"), 2);
    }
}
