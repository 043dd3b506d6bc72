//! Defines the Bevy [Plugin] for navmesh pathfinding
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod agent_layer;
pub mod graph_layer;
pub mod path_layer;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// Apply changes to the graphs, then spawn searches for new requests
	Request,
	/// Pick up finished searches
	Collect,
	/// Move agents back onto the mesh
	Agents,
}

pub struct NavMeshPlugin;

impl Plugin for NavMeshPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<NavMeshSettings>()
			.register_type::<NavmeshController>()
			.register_type::<Heuristic>()
			.register_type::<Int3>()
			.register_type::<NodeRef>()
			.register_type::<FunnelModifier>()
			.register_type::<GraphUpdate>()
			.add_event::<graph_layer::EventUpdateArea>()
			.add_event::<path_layer::EventPathRequest>()
			.add_event::<path_layer::EventPathFailed>()
			.configure_sets(
				Update,
				(
					OrderingSet::Request,
					OrderingSet::Collect,
					OrderingSet::Agents,
				)
					.chain(),
			)
			.add_systems(
				Update,
				(
					(
						graph_layer::process_area_updates,
						graph_layer::commit_alternative_paths,
						path_layer::event_insert_path_queue,
					)
						.chain()
						.in_set(OrderingSet::Request),
					path_layer::collect_finished_paths.in_set(OrderingSet::Collect),
					agent_layer::clamp_agents.in_set(OrderingSet::Agents),
				),
			);
	}
}
