//! Keeping agents on the surface of a navmesh
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Clamp the translation of every entity with a [NavmeshController] onto the navmesh. Movement
/// that would leave the mesh is stopped at its boundary
#[cfg(not(tarpaulin_include))]
pub fn clamp_agents(
	nav_q: Query<&SharedNavGraphs>,
	mut agent_q: Query<(&mut Transform, &mut NavmeshController)>,
) {
	for shared in nav_q.iter() {
		let revision = shared.get_revision();
		let Ok(graphs) = shared.read() else {
			error!("Navigation graph lock has been poisoned, agents can no longer be clamped");
			continue;
		};
		for (mut transform, mut controller) in agent_q.iter_mut() {
			controller.sync_revision(revision);
			let position = transform.translation;
			let clamped = controller.clamp_to_navmesh(&graphs, position, position);
			if clamped != position {
				transform.translation = clamped;
			}
		}
	}
}
