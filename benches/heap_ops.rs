//! Measure filling and draining a search heap
//!

use bevy_navmesh_funnel_plugin::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A scored item
#[derive(Clone, Copy)]
struct Item(u32);

impl HeapItem for Item {
	fn f(&self) -> u32 {
		self.0
	}
}

/// Push every score then pop them all back out in order
fn calc(scores: &[u32]) {
	let mut heap = PathHeap::new(DEFAULT_HEAP_SIZE);
	for s in scores {
		heap.insert(Item(*s)).unwrap();
	}
	while !heap.is_empty() {
		let _ = heap.extract_min().unwrap();
	}
}

pub fn criterion_benchmark(c: &mut Criterion) {
	let mut group = c.benchmark_group("algorithm_use");
	group.significance_level(0.05).sample_size(100);
	let mut rng = StdRng::seed_from_u64(7);
	let scores: Vec<u32> = (0..10_000).map(|_| rng.random_range(0..100_000)).collect();
	group.bench_function("heap_ops", |b| b.iter(|| calc(black_box(&scores))));
	group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
