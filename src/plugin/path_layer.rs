//! Logic relating to finding [NavPath]s on background threads
//!

use std::sync::RwLock;

use crate::prelude::*;
use bevy::{
	prelude::*,
	tasks::{block_on, futures_lite::future, AsyncComputeTaskPool},
};

/// A request to find a path for an entity. Once found the path is inserted onto the entity as
/// a [NavPath] component
#[derive(Event)]
pub struct EventPathRequest {
	/// The entity that will follow the path
	entity: Entity,
	/// Where the path goes
	request: PathRequest,
}

impl EventPathRequest {
	/// Create a new instance of [EventPathRequest]
	pub fn new(entity: Entity, request: PathRequest) -> Self {
		EventPathRequest { entity, request }
	}
	pub fn get_entity(&self) -> Entity {
		self.entity
	}
	pub fn get_request(&self) -> &PathRequest {
		&self.request
	}
}

/// Published when a search for an entity ends without a path
#[derive(Event, Debug)]
pub struct EventPathFailed {
	/// The entity that asked for the path
	entity: Entity,
	/// Why the search gave up
	error: NavMeshError,
}

impl EventPathFailed {
	/// Create a new instance of [EventPathFailed]
	pub fn new(entity: Entity, error: NavMeshError) -> Self {
		EventPathFailed { entity, error }
	}
	pub fn get_entity(&self) -> Entity {
		self.entity
	}
	pub fn get_error(&self) -> &NavMeshError {
		&self.error
	}
}

/// Search `graphs` under its read lock with `search` and post-process the result with
/// `modifiers`
pub fn find_path(
	graphs: &RwLock<NavGraphs>,
	search: &mut PathSearch,
	modifiers: &ModifierPipeline,
	request: &PathRequest,
	token: &CancelToken,
) -> Result<NavPath, NavMeshError> {
	let graphs = graphs.read().map_err(|_| NavMeshError::LockPoisoned)?;
	let path = search.search(&graphs, request, token)?;
	modifiers.apply(&graphs, path)
}

/// Process [EventPathRequest] and spawn a search for each onto the [AsyncComputeTaskPool]
#[cfg(not(tarpaulin_include))]
pub fn event_insert_path_queue(
	mut events: EventReader<EventPathRequest>,
	mut nav_q: Query<(
		&SharedNavGraphs,
		&NavMeshSettings,
		&PathModifiers,
		&mut PathQueue,
	)>,
) {
	let pool = AsyncComputeTaskPool::get();
	for event in events.read() {
		for (shared, settings, modifiers, mut queue) in nav_q.iter_mut() {
			let token = CancelToken::new();
			let task_token = token.clone();
			let graphs = shared.get_lock();
			let searches = queue.get_search_pool().clone();
			let settings = settings.clone();
			let pipeline = modifiers.get().clone();
			let request = event.request;
			let task = pool.spawn(async move {
				let mut search = searches.checkout(&settings);
				let result = find_path(&graphs, &mut search, &pipeline, &request, &task_token);
				searches.give_back(search);
				result
			});
			if queue.contains(event.entity) {
				debug!("Replacing pending path of {:?}", event.entity);
			}
			queue.insert(event.entity, PendingPath::new(token, task));
		}
	}
}

/// Poll running searches and insert finished paths onto the entities that asked for them
#[cfg(not(tarpaulin_include))]
pub fn collect_finished_paths(
	mut commands: Commands,
	mut nav_q: Query<&mut PathQueue>,
	mut event_failed: EventWriter<EventPathFailed>,
) {
	for mut queue in nav_q.iter_mut() {
		queue.get_mut().retain(|entity, pending| {
			let Some(result) = block_on(future::poll_once(pending.get_task_mut())) else {
				return true;
			};
			match result {
				Ok(path) => {
					debug!(
						"Path found for {:?}, {} nodes after expanding {}",
						entity,
						path.get_nodes().len(),
						path.get_expanded()
					);
					// the entity may have been despawned while searching
					if let Ok(mut entity_commands) = commands.get_entity(*entity) {
						entity_commands.try_insert(path);
					}
				}
				Err(NavMeshError::Cancelled) => {
					debug!("Search for {:?} was cancelled", entity);
				}
				Err(e) => {
					debug!("No path for {:?}: {}", entity, e);
					event_failed.write(EventPathFailed::new(*entity, e));
				}
			}
			false
		});
	}
}
