//! Drive the plugin inside a headless bevy app
//!

use bevy::prelude::*;
use bevy_navmesh_funnel_plugin::prelude::*;

/// A 4x4 navmesh of unit squares
fn grid_graphs() -> NavGraphs {
	let mut vertices = Vec::new();
	let mut triangles = Vec::new();
	for z in 0..4 {
		for x in 0..4 {
			let (x, z) = (x as f32, z as f32);
			let base = vertices.len();
			vertices.push(Vec3::new(x, 0.0, z));
			vertices.push(Vec3::new(x + 1.0, 0.0, z));
			vertices.push(Vec3::new(x + 1.0, 0.0, z + 1.0));
			vertices.push(Vec3::new(x, 0.0, z + 1.0));
			triangles.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
		}
	}
	let mut graphs = NavGraphs::default();
	graphs
		.add_graph(NavMesh::from_triangles(&vertices, &triangles).unwrap())
		.unwrap();
	graphs
}

fn app() -> App {
	let mut app = App::new();
	app.add_plugins((MinimalPlugins, NavMeshPlugin));
	app
}

/// Update the app until `done` holds or give up
fn update_until(app: &mut App, mut done: impl FnMut(&mut App) -> bool) -> bool {
	for _ in 0..500 {
		app.update();
		if done(app) {
			return true;
		}
		std::thread::sleep(std::time::Duration::from_millis(2));
	}
	false
}

#[test]
fn requested_path_is_inserted() {
	let mut app = app();
	app.world_mut()
		.spawn(NavMeshBundle::new(grid_graphs(), NavMeshSettings::default()));
	let agent = app.world_mut().spawn_empty().id();
	let start = Vec3::new(0.5, 0.0, 0.5);
	let end = Vec3::new(3.5, 0.0, 3.5);
	app.world_mut()
		.send_event(EventPathRequest::new(agent, PathRequest::new(start, end)));
	let found = update_until(&mut app, |app| app.world().get::<NavPath>(agent).is_some());
	assert!(found);
	let path = app.world().get::<NavPath>(agent).unwrap();
	// open grid so the funnel pulls it straight
	assert_eq!(vec![start, end], path.get_vector_path().to_vec());
}

#[test]
fn unreachable_goal_reports_failure() {
	let mut app = app();
	let mut graphs = grid_graphs();
	let island = graphs
		.add_graph(PointGraph::new(&[Vec3::new(10.0, 0.0, 10.0)], &[]).unwrap())
		.unwrap();
	app.world_mut()
		.spawn(NavMeshBundle::new(graphs, NavMeshSettings::default()));
	let agent = app.world_mut().spawn_empty().id();
	let request = PathRequest::with_nodes(
		Vec3::new(0.5, 0.0, 0.5),
		NodeRef::new(0, 0),
		Vec3::new(10.0, 0.0, 10.0),
		NodeRef::new(island, 0),
	);
	app.world_mut()
		.send_event(EventPathRequest::new(agent, request));
	let failed = update_until(&mut app, |app| {
		app.world_mut()
			.resource_mut::<Events<EventPathFailed>>()
			.drain()
			.any(|e| e.get_entity() == agent)
	});
	assert!(failed);
	assert!(app.world().get::<NavPath>(agent).is_none());
}

#[test]
fn agents_are_clamped() {
	let mut app = app();
	app.world_mut()
		.spawn(NavMeshBundle::new(grid_graphs(), NavMeshSettings::default()));
	let agent = app
		.world_mut()
		.spawn((
			Transform::from_translation(Vec3::new(1.5, 0.0, 1.5)),
			NavmeshController::default(),
		))
		.id();
	app.update();
	// push the agent off the edge of the grid
	app.world_mut()
		.get_mut::<Transform>(agent)
		.unwrap()
		.translation = Vec3::new(1.5, 0.0, -3.0);
	app.update();
	let translation = app.world().get::<Transform>(agent).unwrap().translation;
	assert!((translation - Vec3::new(1.5, 0.0, 0.0)).length() < 1e-4);
}

#[test]
fn area_update_walls_off_the_goal() {
	let mut app = app();
	let bundle = NavMeshBundle::new(grid_graphs(), NavMeshSettings::default());
	let shared = bundle.get_shared_graphs().clone();
	app.world_mut().spawn(bundle);
	// block the whole second column
	let wall = GraphUpdate::new(Vec3::new(1.2, 0.0, -1.0), Vec3::new(1.8, 0.0, 5.0)).with_walkable(false);
	app.world_mut().send_event(EventUpdateArea::new(wall));
	let agent = app.world_mut().spawn_empty().id();
	let request = PathRequest::new(Vec3::new(0.5, 0.0, 0.5), Vec3::new(3.5, 0.0, 3.5));
	app.world_mut()
		.send_event(EventPathRequest::new(agent, request));
	let failed = update_until(&mut app, |app| {
		app.world_mut()
			.resource_mut::<Events<EventPathFailed>>()
			.drain()
			.any(|e| e.get_entity() == agent)
	});
	assert!(failed);
	assert_eq!(1, shared.get_revision());
	let graphs = shared.read().unwrap();
	let blocked = graphs.get_graphs()[0].get_nodes().iter().filter(|n| !n.is_walkable()).count();
	// two triangles in each of the four cells of the column
	assert_eq!(8, blocked);
}

#[test]
fn alternative_path_penalises_the_found_route() {
	let mut app = app();
	let alternative = AlternativePath::from_seed(5000, 1, 11);
	let settings = NavMeshSettings::default();
	let pipeline = PathModifiers::from_settings(&settings).get().clone().with(alternative.clone());
	let bundle = NavMeshBundle::new(grid_graphs(), settings).with_modifiers(pipeline);
	let shared = bundle.get_shared_graphs().clone();
	app.world_mut().spawn((bundle, alternative.clone()));
	let agent = app.world_mut().spawn_empty().id();
	let request = PathRequest::new(Vec3::new(0.5, 0.0, 0.5), Vec3::new(3.5, 0.0, 3.5));
	app.world_mut()
		.send_event(EventPathRequest::new(agent, request));
	let found = update_until(&mut app, |app| app.world().get::<NavPath>(agent).is_some());
	assert!(found);
	// the penalty lands on the next update
	app.update();
	assert!(!alternative.is_pending());
	let path = app.world().get::<NavPath>(agent).unwrap().clone();
	let graphs = shared.read().unwrap();
	for node in path.get_nodes() {
		assert_eq!(5000, graphs.get_node(*node).unwrap().get_penalty());
	}
	assert_eq!(path.get_nodes().to_vec(), alternative.get_applied().unwrap());
}
