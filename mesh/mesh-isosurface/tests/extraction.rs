//! End-to-end extraction tests over composite solids.
//!
//! Run with: cargo test -p mesh-isosurface --test extraction

use approx::assert_relative_eq;
use mesh_isosurface::{DualContourConfig, MarchingCubesConfig, dual_contour, marching_cubes};
use mesh_solid::{Cuboid, Cylinder, Difference, Sphere};
use mesh_types::{Bounded, Mesh, Point3, Solid};
use std::f64::consts::PI;

// =============================================================================
// Fixtures
// =============================================================================

/// Capped cylinder along z whose caps and side fall between grid samples at
/// `delta = 0.08`.
fn rod() -> Cylinder {
    Cylinder::new(Point3::new(0.0, 0.0, -0.93), Point3::new(0.0, 0.0, 0.93), 0.5)
        .expect("valid cylinder")
}

const ROD_VOLUME: f64 = PI * 0.25 * 1.86;

/// Cube of side 2 with a round hole bored along z.
fn bored_cube() -> Difference {
    let cube = Cuboid::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
        .expect("valid cube");
    let drill = Cylinder::new(Point3::new(0.0, 0.0, -2.0), Point3::new(0.0, 0.0, 2.0), 0.5)
        .expect("valid cylinder");
    Difference::new(Box::new(cube), Box::new(drill))
}

/// Claims everything below z = 0.5, including samples outside its bounds.
struct Slab(Cuboid);

impl Bounded for Slab {
    fn min(&self) -> Point3<f64> {
        self.0.min()
    }

    fn max(&self) -> Point3<f64> {
        self.0.max()
    }
}

impl Solid for Slab {
    fn contains(&self, p: &Point3<f64>) -> bool {
        p.z < 0.5
    }
}

fn slab() -> Slab {
    Slab(Cuboid::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).expect("valid cube"))
}

fn assert_inside_bounds(mesh: &Mesh, solid: &dyn Solid, slack: f64) {
    let (lo, hi) = (solid.min(), solid.max());
    for v in mesh.vertices() {
        for axis in 0..3 {
            assert!(v[axis] >= lo[axis] - slack && v[axis] <= hi[axis] + slack, "{v}");
        }
    }
}

// =============================================================================
// Marching Cubes
// =============================================================================

#[test]
fn marching_cubes_rod() {
    let solid = rod();
    let config = MarchingCubesConfig::new(0.08).with_search_iterations(10);
    let mesh = marching_cubes(&solid, &config).expect("valid");

    assert!(mesh.is_manifold());
    assert_relative_eq!(mesh.volume(), ROD_VOLUME, max_relative = 0.03);
    assert_inside_bounds(&mesh, &solid, 1e-3);
}

#[test]
fn marching_cubes_bored_cube() {
    let solid = bored_cube();
    let config = MarchingCubesConfig::new(0.1).with_search_iterations(8);
    let mesh = marching_cubes(&solid, &config).expect("valid");

    assert!(mesh.is_manifold());
    assert_relative_eq!(mesh.volume(), 8.0 - PI / 2.0, max_relative = 0.02);
    // The bore leaves the centre line empty.
    assert!(!solid.contains(&Point3::origin()));
    assert_inside_bounds(&mesh, &solid, 1e-3);
}

#[test]
#[should_panic(expected = "solid is true outside of bounds")]
fn marching_cubes_rejects_leaky_solid() {
    let _ = marching_cubes(&slab(), &MarchingCubesConfig::new(0.25).with_workers(2));
}

// =============================================================================
// Dual Contouring
// =============================================================================

#[test]
fn dual_contour_rod() {
    let solid = rod();
    let mesh = dual_contour(&solid, &DualContourConfig::new(0.08)).expect("valid");

    assert!(mesh.is_manifold());
    assert_relative_eq!(mesh.volume(), ROD_VOLUME, max_relative = 0.05);
    // Clipping keeps every vertex inside its own cell.
    assert_inside_bounds(&mesh, &solid, 0.08);
}

#[test]
fn dual_contour_streams_rod() {
    let solid = rod();
    let resident = dual_contour(&solid, &DualContourConfig::new(0.08)).expect("valid");
    let streamed = dual_contour(
        &solid,
        &DualContourConfig::new(0.08).with_max_memory_bytes(0),
    )
    .expect("valid");

    assert_eq!(resident.len(), streamed.len());
    assert_relative_eq!(resident.volume(), streamed.volume(), max_relative = 1e-12);
}

#[test]
#[should_panic(expected = "solid is true outside of bounds")]
fn dual_contour_rejects_leaky_solid() {
    let _ = dual_contour(&slab(), &DualContourConfig::new(0.25).with_workers(2));
}

// =============================================================================
// Degenerate Inputs
// =============================================================================

#[test]
fn solid_smaller_than_a_cell_yields_empty_mesh() {
    // No grid sample lands inside a ball this small.
    let speck = Sphere::new(Point3::origin(), 0.01).expect("valid sphere");

    let mc = marching_cubes(&speck, &MarchingCubesConfig::new(0.1)).expect("valid");
    let dc = dual_contour(&speck, &DualContourConfig::new(0.1)).expect("valid");

    assert!(mc.is_empty());
    assert!(dc.is_empty());
}

#[test]
fn thin_plate_is_closed() {
    let plate = Cuboid::new(Point3::new(-1.0, -1.0, -0.07), Point3::new(1.0, 1.0, 0.07))
        .expect("valid plate");
    let config = MarchingCubesConfig::new(0.1).with_search_iterations(8);
    let mesh = marching_cubes(&plate, &config).expect("valid");

    assert!(mesh.is_manifold());
    assert_relative_eq!(mesh.volume(), 4.0 * 0.14, max_relative = 0.05);
}
