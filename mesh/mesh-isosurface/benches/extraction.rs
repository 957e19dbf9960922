//! Benchmarks for isosurface extraction.
//!
//! Run with: cargo bench -p mesh-isosurface
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p mesh-isosurface -- --save-baseline main
//! 2. After changes: cargo bench -p mesh-isosurface -- --baseline main

#![allow(clippy::expect_used, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mesh_isosurface::{DualContourConfig, MarchingCubesConfig, McTable, dual_contour, marching_cubes};
use mesh_solid::Sphere;
use mesh_types::Point3;

// =============================================================================
// Helpers
// =============================================================================

fn unit_ball() -> Sphere {
    Sphere::new(Point3::origin(), 1.0).expect("valid sphere")
}

/// Number of grid cells a unit ball is sampled on at `delta`.
fn cells(delta: f64) -> u64 {
    let n = (2.0 / delta).ceil() as u64 + 2;
    n * n * n
}

// =============================================================================
// Case Table
// =============================================================================

fn bench_table(c: &mut Criterion) {
    c.bench_function("table_generate", |b| b.iter(McTable::generate));
}

// =============================================================================
// Marching Cubes Benchmarks
// =============================================================================

fn bench_marching_cubes(c: &mut Criterion) {
    let mut group = c.benchmark_group("MarchingCubes");
    group.sample_size(20);
    let ball = unit_ball();

    for delta in [0.1, 0.05] {
        group.throughput(Throughput::Elements(cells(delta)));

        group.bench_with_input(BenchmarkId::new("midpoints", delta), &delta, |b, &delta| {
            let config = MarchingCubesConfig::new(delta);
            b.iter(|| marching_cubes(black_box(&ball), black_box(&config)));
        });

        group.bench_with_input(BenchmarkId::new("search_8", delta), &delta, |b, &delta| {
            let config = MarchingCubesConfig::new(delta).with_search_iterations(8);
            b.iter(|| marching_cubes(black_box(&ball), black_box(&config)));
        });
    }

    group.finish();
}

// =============================================================================
// Dual Contouring Benchmarks
// =============================================================================

fn bench_dual_contour(c: &mut Criterion) {
    let mut group = c.benchmark_group("DualContour");
    group.sample_size(10); // Hermite estimation dominates, keep it short
    let ball = unit_ball();

    for delta in [0.1, 0.05] {
        group.throughput(Throughput::Elements(cells(delta)));

        group.bench_with_input(BenchmarkId::new("preview", delta), &delta, |b, &delta| {
            let config = DualContourConfig::preview().with_delta(delta);
            b.iter(|| dual_contour(black_box(&ball), black_box(&config)));
        });

        // Four resident layers forces the window to slide on every row.
        group.bench_with_input(BenchmarkId::new("streamed", delta), &delta, |b, &delta| {
            let config = DualContourConfig::preview()
                .with_delta(delta)
                .with_max_memory_bytes(0);
            b.iter(|| dual_contour(black_box(&ball), black_box(&config)));
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_table, bench_marching_cubes, bench_dual_contour);
criterion_main!(benches);
