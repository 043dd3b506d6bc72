//! Find, smooth and follow paths across small navmeshes through the public api
//!

use std::thread;

use bevy::prelude::*;
use bevy_navmesh_funnel_plugin::prelude::*;

/// A navmesh of unit squares, each cell split into two triangles along its diagonal
fn cells_mesh(cells: &[(i32, i32)]) -> NavMesh {
	let mut vertices = Vec::new();
	let mut triangles = Vec::new();
	for (x, z) in cells {
		let (x, z) = (*x as f32, *z as f32);
		let base = vertices.len();
		vertices.push(Vec3::new(x, 0.0, z));
		vertices.push(Vec3::new(x + 1.0, 0.0, z));
		vertices.push(Vec3::new(x + 1.0, 0.0, z + 1.0));
		vertices.push(Vec3::new(x, 0.0, z + 1.0));
		triangles.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
	}
	NavMesh::from_triangles(&vertices, &triangles).unwrap()
}

/// Cells of an L-shaped corridor turning at (2, 0)
const L_SHAPE: [(i32, i32); 5] = [(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)];

#[test]
fn search_then_funnel_l_shape() {
	let mut graphs = NavGraphs::default();
	graphs.add_graph(cells_mesh(&L_SHAPE)).unwrap();
	let settings = NavMeshSettings::default();
	let mut search = PathSearch::new(&settings);
	let start = Vec3::new(0.5, 0.0, 0.5);
	let end = Vec3::new(2.5, 0.0, 2.5);
	let raw = search
		.search(&graphs, &PathRequest::new(start, end), &CancelToken::new())
		.unwrap();
	// the coarse route starts and ends exactly where asked
	assert_eq!(start, raw.get_vector_path()[0]);
	assert_eq!(end, *raw.get_vector_path().last().unwrap());
	// consecutive nodes are neighbours
	for pair in raw.get_nodes().windows(2) {
		assert!(graphs.get_node(pair[0]).unwrap().is_connected_to(pair[1]));
	}
	let pipeline = PathModifiers::from_settings(&settings);
	let smooth = pipeline.get().apply(&graphs, raw.clone()).unwrap();
	let actual = vec![start, Vec3::new(2.0, 0.0, 1.0), end];
	assert_eq!(actual, smooth.get_vector_path().to_vec());
	assert!(smooth.length() < raw.length());
	assert_eq!(raw.get_nodes(), smooth.get_nodes());
}

#[test]
fn blocked_corridor_has_no_path() {
	let mut graphs = NavGraphs::default();
	graphs.add_graph(cells_mesh(&L_SHAPE)).unwrap();
	// both triangles of the corner cell
	graphs.set_walkable(NodeRef::new(0, 4), false).unwrap();
	graphs.set_walkable(NodeRef::new(0, 5), false).unwrap();
	let mut search = PathSearch::new(&NavMeshSettings::default());
	let request = PathRequest::with_nodes(
		Vec3::new(0.5, 0.0, 0.5),
		NodeRef::new(0, 0),
		Vec3::new(2.5, 0.0, 2.5),
		NodeRef::new(0, 9),
	);
	let result = search.search(&graphs, &request, &CancelToken::new());
	assert!(matches!(result, Err(NavMeshError::NoPathFound { .. })));
	// the scratch space is reusable after a failure
	graphs.set_walkable(NodeRef::new(0, 4), true).unwrap();
	graphs.set_walkable(NodeRef::new(0, 5), true).unwrap();
	assert!(search.search(&graphs, &request, &CancelToken::new()).is_ok());
}

#[test]
fn controller_stays_on_mesh() {
	let mut graphs = NavGraphs::default();
	graphs.add_graph(cells_mesh(&L_SHAPE)).unwrap();
	let mesh = graphs.as_navmesh(0).unwrap();
	let mut controller = NavmeshController::default();
	let start = Vec3::new(0.5, 0.0, 0.5);
	// walk straight up out of the first cell
	let target = Vec3::new(0.5, 0.0, 2.5);
	let clamped = controller.clamp_to_navmesh(&graphs, start, target);
	let inside = (0..mesh.get_nodes().len()).any(|n| mesh.contains_point(n, clamped));
	assert!(inside, "{} is off the mesh", clamped);
	assert!(clamped.z <= 1.0 + 1e-4);
	assert!(controller.get_current_node().is_some());
	// moving within the mesh is left alone
	let free = Vec3::new(2.5, 0.0, 0.5);
	let mut controller = NavmeshController::default();
	assert_eq!(free, controller.clamp_to_navmesh(&graphs, start, free));
}

#[test]
fn searches_share_graphs_across_threads() {
	let mut cells = Vec::new();
	for z in 0..8 {
		for x in 0..8 {
			cells.push((x, z));
		}
	}
	let mut graphs = NavGraphs::default();
	graphs.add_graph(cells_mesh(&cells)).unwrap();
	let shared = SharedNavGraphs::new(graphs);
	let settings = NavMeshSettings::default();
	let mut handles = Vec::new();
	for i in 0..4 {
		let shared = shared.clone();
		let settings = settings.clone();
		handles.push(thread::spawn(move || {
			let mut search = PathSearch::new(&settings);
			let start = Vec3::new(0.5, 0.0, 0.5 + i as f32);
			let end = Vec3::new(7.5, 0.0, 7.5 - i as f32);
			for _ in 0..20 {
				let graphs = shared.read().unwrap();
				let result = search.search(&graphs, &PathRequest::new(start, end), &CancelToken::new());
				// an update may wall off a region but never corrupts a running search
				match result {
					Ok(path) => assert_eq!(end, *path.get_vector_path().last().unwrap()),
					Err(e) => assert!(matches!(e, NavMeshError::NoPathFound { .. })),
				}
			}
		}));
	}
	for n in 0..10 {
		shared
			.update(|g| g.update_penalty(NodeRef::new(0, n), 1000))
			.unwrap()
			.unwrap();
	}
	for handle in handles {
		handle.join().unwrap();
	}
	assert_eq!(10, shared.get_revision());
}
