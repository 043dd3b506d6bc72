//! Logic for changing the graphs of a navmesh while searches may be running against them. Every
//! change goes through [SharedNavGraphs::update] so it waits for in-flight searches to release
//! their read locks
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Apply a [GraphUpdate] to the graphs of every navmesh entity
#[derive(Event)]
pub struct EventUpdateArea {
	/// The change and the area it covers
	update: GraphUpdate,
}

impl EventUpdateArea {
	/// Create a new instance of [EventUpdateArea]
	pub fn new(update: GraphUpdate) -> Self {
		EventUpdateArea { update }
	}
	pub fn get_update(&self) -> &GraphUpdate {
		&self.update
	}
}

/// Read [EventUpdateArea] and apply each to the graphs of every navmesh
#[cfg(not(tarpaulin_include))]
pub fn process_area_updates(
	mut events: EventReader<EventUpdateArea>,
	nav_q: Query<&SharedNavGraphs>,
) {
	for event in events.read() {
		for shared in nav_q.iter() {
			match shared.update(|g| g.update_area(event.get_update())) {
				Ok(changed) => debug!("Area update changed {} nodes", changed),
				Err(e) => error!("Area update failed: {}", e),
			}
		}
	}
}

/// Move the penalties of each [AlternativePath] onto the latest path it recorded
#[cfg(not(tarpaulin_include))]
pub fn commit_alternative_paths(nav_q: Query<(&SharedNavGraphs, &AlternativePath)>) {
	for (shared, alternative) in nav_q.iter() {
		if !alternative.is_pending() {
			continue;
		}
		match shared.update(|g| alternative.commit(g)) {
			Ok(Ok(penalised)) => debug!("Penalised {} nodes of the latest path", penalised),
			Ok(Err(e)) | Err(e) => error!("Failed to commit alternative path penalties: {}", e),
		}
	}
}
