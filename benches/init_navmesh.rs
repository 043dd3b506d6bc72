//! Measure building a large navmesh from a triangle list
//!
//! Mesh is 100 cells by 100 cells, 20000 triangles
//!

use bevy::prelude::*;
use bevy_navmesh_funnel_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Vertices and indices of a grid of unit cells split along their diagonals
fn prepare_triangles(length: i32, depth: i32) -> (Vec<Vec3>, Vec<usize>) {
	let mut vertices = Vec::new();
	let mut triangles = Vec::new();
	for z in 0..depth {
		for x in 0..length {
			let (x, z) = (x as f32, z as f32);
			let base = vertices.len();
			vertices.push(Vec3::new(x, 0.0, z));
			vertices.push(Vec3::new(x + 1.0, 0.0, z));
			vertices.push(Vec3::new(x + 1.0, 0.0, z + 1.0));
			vertices.push(Vec3::new(x, 0.0, z + 1.0));
			triangles.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
		}
	}
	(vertices, triangles)
}

/// Build the navmesh and register it
fn init_navmesh(vertices: &[Vec3], triangles: &[usize]) {
	let mut graphs = NavGraphs::default();
	graphs
		.add_graph(NavMesh::from_triangles(vertices, triangles).unwrap())
		.unwrap();
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("data_initialisation");
	group.significance_level(0.05).sample_size(50);
	let (vertices, triangles) = prepare_triangles(100, 100);
	group.bench_function("init_navmesh", |b| {
		b.iter(|| init_navmesh(black_box(&vertices), black_box(&triangles)))
	});
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
