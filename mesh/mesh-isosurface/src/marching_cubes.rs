//! Marching cubes extraction and bisection refinement.

use hashbrown::HashMap;
use mesh_solid::bisect;
use mesh_types::{Mesh, Point3, Solid, Triangle, VertexKey};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::MarchingCubesConfig;
use crate::error::IsoResult;
use crate::grid::{install, Grid};
use crate::table::{McIntersections, McTable, EDGES};

/// Extract the surface of a solid with marching cubes.
///
/// Vertices sit on edge midpoints unless `config.search_iterations` is
/// non-zero, in which case each vertex is then moved toward the true surface
/// by that many bisection steps (see [`refine_vertices`]).
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the solid's bounds are
/// not finite, or the worker pool cannot be created.
///
/// # Panics
///
/// Panics with `"solid is true outside of bounds"` if the solid reports a
/// point inside on the padded border of its bounds.
///
/// # Example
///
/// ```
/// use mesh_isosurface::{marching_cubes, MarchingCubesConfig};
/// use mesh_solid::Sphere;
/// use mesh_types::Point3;
///
/// let ball = Sphere::new(Point3::origin(), 1.0)?;
/// let mesh = marching_cubes(&ball, &MarchingCubesConfig::new(0.2))?;
/// assert!(mesh.is_manifold());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn marching_cubes<S: Solid + ?Sized>(
    solid: &S,
    config: &MarchingCubesConfig,
) -> IsoResult<Mesh> {
    config.validate()?;
    let grid = Grid::from_bounds(&solid.bounds(), config.delta)?;
    let table = McTable::global();

    let mut mesh = Mesh::new();
    grid.for_each_slice_pair(solid, config.workers, |iz, bottom, top| {
        mesh.extend(cubes_in_layer(&grid, table, iz, bottom, top));
    });

    let (nx, ny, nz) = grid.dimensions();
    info!(
        triangles = mesh.len(),
        grid = ?(nx, ny, nz),
        delta = config.delta,
        "marching cubes extracted"
    );

    if config.search_iterations > 0 {
        install(config.workers, || {
            refine_vertices(&mut mesh, solid, &grid, config.search_iterations);
        })?;
    }
    Ok(mesh)
}

/// Triangles of every cube between two adjacent slices.
fn cubes_in_layer(
    grid: &Grid,
    table: &McTable,
    iz: usize,
    bottom: &[bool],
    top: &[bool],
) -> Vec<Triangle> {
    let (nx, ny, _) = grid.dimensions();
    (0..ny - 1)
        .into_par_iter()
        .flat_map_iter(|iy| {
            (0..nx - 1).flat_map(move |ix| {
                let corners: [bool; 8] = std::array::from_fn(|c| {
                    let (dx, dy, dz) = (c & 1, (c >> 1) & 1, c >> 2);
                    let slice = if dz == 0 { bottom } else { top };
                    slice[(ix + dx) + nx * (iy + dy)]
                });
                let mask = McIntersections::from_corners(corners);
                table.get(mask).iter().map(move |t| {
                    let [a, b, c] = t.map(|e| edge_midpoint(grid, ix, iy, iz, e));
                    Triangle::new(a, b, c)
                })
            })
        })
        .collect()
}

fn edge_midpoint(grid: &Grid, ix: usize, iy: usize, iz: usize, edge: u8) -> Point3<f64> {
    let [a, b] = EDGES[edge as usize];
    // Doubled corner offsets summed give the half-cell offset of the midpoint.
    let h = |axis: u8| usize::from((a >> axis) & 1) + usize::from((b >> axis) & 1);
    grid.half_position(2 * ix + h(0), 2 * iy + h(1), 2 * iz + h(2))
}

/// Move every edge-midpoint vertex toward the surface along its edge.
///
/// Each vertex is matched to the grid edge it lies on, and `iterations`
/// bisection steps are run between that edge's two samples. The error
/// halves with every step. Coordinates are substituted in place, so
/// triangle handles survive while the mesh's vertex index is rebuilt on
/// next use. Vertices that do not sit on an edge midpoint of `grid`, or
/// whose edge does not cross the surface, are left alone.
pub fn refine_vertices<S: Solid + ?Sized>(
    mesh: &mut Mesh,
    solid: &S,
    grid: &Grid,
    iterations: usize,
) {
    let vertices = mesh.vertices();
    let targets: Vec<(VertexKey, Point3<f64>)> = vertices
        .par_iter()
        .filter_map(|v| {
            let target = refine_vertex(solid, grid, v, iterations)?;
            Some((VertexKey::new(v), target))
        })
        .collect();
    let moved: HashMap<VertexKey, Point3<f64>> = targets.into_iter().collect();
    debug!(
        vertices = vertices.len(),
        moved = moved.len(),
        iterations,
        "refined marching cubes vertices"
    );
    mesh.map_coords(|p| moved.get(&VertexKey::new(&p)).copied().unwrap_or(p));
}

fn refine_vertex<S: Solid + ?Sized>(
    solid: &S,
    grid: &Grid,
    v: &Point3<f64>,
    iterations: usize,
) -> Option<Point3<f64>> {
    let h = grid.half_index(v)?;
    let mut odd = (0..3).filter(|&axis| h[axis] % 2 == 1);
    let axis = odd.next()?;
    if odd.next().is_some() {
        return None;
    }
    let (mut lo, mut hi) = (h, h);
    lo[axis] -= 1;
    hi[axis] += 1;
    let a = grid.half_position(lo[0], lo[1], lo[2]);
    let b = grid.half_position(hi[0], hi[1], hi[2]);
    match (solid.contains(&a), solid.contains(&b)) {
        (true, false) => Some(bisect(solid, a, b, iterations)),
        (false, true) => Some(bisect(solid, b, a, iterations)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_solid::{Cuboid, Sphere};
    use mesh_types::Bounded;
    use std::f64::consts::PI;

    fn unit_ball() -> Sphere {
        Sphere::new(Point3::origin(), 1.0).expect("valid")
    }

    fn max_radius_error(mesh: &Mesh) -> f64 {
        mesh.vertices()
            .iter()
            .map(|v| (v.coords.norm() - 1.0).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn sphere_is_closed() {
        let mesh = marching_cubes(&unit_ball(), &MarchingCubesConfig::new(0.1)).expect("valid");
        assert!(!mesh.is_empty());
        assert!(mesh.is_manifold());
        assert!(mesh.singular_vertices().is_empty());
        assert!(mesh.volume() > 0.0);
    }

    #[test]
    fn worker_count_does_not_change_output() {
        let ball = unit_ball();
        let one = marching_cubes(&ball, &MarchingCubesConfig::new(0.2).with_workers(1))
            .expect("valid");
        let many = marching_cubes(&ball, &MarchingCubesConfig::new(0.2).with_workers(5))
            .expect("valid");
        let a: Vec<_> = one.triangles().copied().collect();
        let b: Vec<_> = many.triangles().copied().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn refinement_converges() {
        let ball = unit_ball();
        let mut errors = Vec::new();
        for k in [0, 2, 4, 8] {
            let config = MarchingCubesConfig::new(0.1).with_search_iterations(k);
            let mesh = marching_cubes(&ball, &config).expect("valid");
            assert!(mesh.is_manifold());
            errors.push(max_radius_error(&mesh));
        }
        for pair in errors.windows(2) {
            assert!(pair[1] < pair[0], "errors {errors:?}");
        }
        // One edge is at most 0.1 long, so 8 steps leave < 0.1 / 2^9.
        assert!(errors[3] < 0.1 / 512.0 + 1e-12, "errors {errors:?}");
    }

    #[test]
    fn refined_sphere_volume() {
        let config = MarchingCubesConfig::new(0.05).with_search_iterations(8);
        let mesh = marching_cubes(&unit_ball(), &config).expect("valid");
        let expected = 4.0 / 3.0 * PI;
        assert_relative_eq!(mesh.volume(), expected, max_relative = 0.01);
    }

    #[test]
    fn refinement_keeps_triangle_count() {
        let ball = unit_ball();
        let plain = marching_cubes(&ball, &MarchingCubesConfig::new(0.2)).expect("valid");
        let grid = Grid::from_bounds(&ball.bounds(), 0.2).expect("valid");
        let mut refined = plain.clone();
        refine_vertices(&mut refined, &ball, &grid, 6);
        assert_eq!(refined.len(), plain.len());
        assert_eq!(refined.vertices().len(), plain.vertices().len());
        let some_vertex = plain.vertices()[0];
        assert!(refined.find(&some_vertex).is_empty());
    }

    #[test]
    fn refine_vertices_moves_every_crossing_onto_the_sphere() {
        let ball = unit_ball();
        let mut mesh = marching_cubes(&ball, &MarchingCubesConfig::new(0.1)).expect("valid");
        let grid = Grid::from_bounds(&ball.bounds(), 0.1).expect("valid");
        let before = max_radius_error(&mesh);
        refine_vertices(&mut mesh, &ball, &grid, 10);
        let after = max_radius_error(&mesh);
        assert!(after < before, "{after} vs {before}");
        assert!(after <= 0.1 / 2048.0 + 1e-12, "{after}");
        assert!(mesh.is_manifold());
    }

    #[test]
    fn cube_surface() {
        let cube = Cuboid::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).expect("valid");
        let config = MarchingCubesConfig::new(0.5).with_search_iterations(16);
        let mesh = marching_cubes(&cube, &config).expect("valid");
        assert!(mesh.is_manifold());
        assert!(mesh.singular_vertices().is_empty());
        // Refined vertices converge onto the faces; only the chamfers along
        // edges and corners remain.
        assert_relative_eq!(mesh.volume(), 1.0, max_relative = 1e-3);
        assert_relative_eq!(mesh.area(), 6.0, max_relative = 1e-3);
    }

    #[test]
    fn invalid_delta_is_an_error() {
        assert!(marching_cubes(&unit_ball(), &MarchingCubesConfig::new(-1.0)).is_err());
    }
}
