//! Components which make up a navmesh entity
//!

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc, Mutex, RwLock, RwLockReadGuard,
	},
};

use crate::prelude::*;
use bevy::{prelude::*, tasks::Task};

/// Tunables of searching, funnelling and clamping
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Component, Reflect, Clone, Debug, PartialEq)]
#[reflect(Component)]
pub struct NavMeshSettings {
	/// Distance estimate used to guide searches
	pub heuristic: Heuristic,
	/// Multiplier applied to the heuristic
	pub heuristic_scale: f32,
	/// Starting number of slots of a search heap
	pub initial_heap_size: usize,
	/// Maximum number of funnel iterations
	pub max_funnel_vertices: usize,
	/// Look-ahead factor of a [NavmeshController]
	pub forward_planning: f32,
}

impl Default for NavMeshSettings {
	fn default() -> Self {
		NavMeshSettings {
			heuristic: Heuristic::default(),
			heuristic_scale: 1.0,
			initial_heap_size: DEFAULT_HEAP_SIZE,
			max_funnel_vertices: MAX_FUNNEL_VERTICES,
			forward_planning: MIN_FORWARD_PLANNING,
		}
	}
}

impl NavMeshSettings {
	/// From a `ron` file generate the [NavMeshSettings]
	#[cfg(feature = "ron")]
	pub fn from_ron(path: String) -> Result<Self, NavMeshError> {
		let file = std::fs::File::open(&path)
			.map_err(|e| NavMeshError::Settings(format!("{}: {}", path, e)))?;
		ron::de::from_reader(file).map_err(|e| NavMeshError::Settings(format!("{}: {}", path, e)))
	}
}

/// The graphs of a navmesh entity shared between the main world and background searches
///
/// Searches hold the read lock for their whole duration, [SharedNavGraphs::update] takes the
/// write lock so a topology change waits for in-flight searches and blocks new ones until it is
/// done. Every update bumps a revision number which agents compare against to notice that the
/// triangle they stand on may have changed
#[derive(Component, Clone, Default)]
pub struct SharedNavGraphs {
	/// The graphs
	graphs: Arc<RwLock<NavGraphs>>,
	/// Number of updates applied
	revision: Arc<AtomicU64>,
}

impl SharedNavGraphs {
	/// Create a new instance of [SharedNavGraphs]
	pub fn new(graphs: NavGraphs) -> Self {
		SharedNavGraphs {
			graphs: Arc::new(RwLock::new(graphs)),
			revision: Arc::new(AtomicU64::new(0)),
		}
	}
	/// Get a handle to the lock for use on another thread
	pub fn get_lock(&self) -> Arc<RwLock<NavGraphs>> {
		self.graphs.clone()
	}
	/// Get the number of updates applied so far
	pub fn get_revision(&self) -> u64 {
		self.revision.load(Ordering::Acquire)
	}
	/// Take the read lock
	pub fn read(&self) -> Result<RwLockReadGuard<'_, NavGraphs>, NavMeshError> {
		self.graphs.read().map_err(|_| NavMeshError::LockPoisoned)
	}
	/// Modify the graphs under the write lock
	pub fn update<F, R>(&self, f: F) -> Result<R, NavMeshError>
	where
		F: FnOnce(&mut NavGraphs) -> R,
	{
		let mut graphs = self.graphs.write().map_err(|_| NavMeshError::LockPoisoned)?;
		let result = f(&mut graphs);
		self.revision.fetch_add(1, Ordering::AcqRel);
		Ok(result)
	}
}

/// Post-processing applied to every path found for this navmesh
#[derive(Component, Clone, Debug)]
pub struct PathModifiers(pub ModifierPipeline);

impl PathModifiers {
	/// Create the default pipeline which funnels paths with the ceiling from `settings`
	pub fn from_settings(settings: &NavMeshSettings) -> Self {
		PathModifiers(
			ModifierPipeline::new().with(FunnelModifier::new(settings.max_funnel_vertices)),
		)
	}
	/// Get the pipeline
	pub fn get(&self) -> &ModifierPipeline {
		&self.0
	}
}

impl Default for PathModifiers {
	fn default() -> Self {
		PathModifiers::from_settings(&NavMeshSettings::default())
	}
}

/// A search running on the [bevy::tasks::AsyncComputeTaskPool]
pub struct PendingPath {
	/// Aborts the search
	token: CancelToken,
	/// The running search
	task: Task<Result<NavPath, NavMeshError>>,
}

impl PendingPath {
	/// Create a new instance of [PendingPath]
	pub fn new(token: CancelToken, task: Task<Result<NavPath, NavMeshError>>) -> Self {
		PendingPath { token, task }
	}
	/// Ask the search to stop early
	pub fn cancel(&self) {
		self.token.cancel();
	}
	/// Get the running task
	pub fn get_task_mut(&mut self) -> &mut Task<Result<NavPath, NavMeshError>> {
		&mut self.task
	}
}

/// Most idle searches a [SearchPool] holds on to
pub const MAX_POOLED_SEARCHES: usize = 16;

/// Idle [PathSearch]es shared with background tasks so their scratch memory is reused from one
/// request to the next. A task checks a search out, runs it and gives it back
#[derive(Clone, Default)]
pub struct SearchPool {
	/// Idle searches
	searches: Arc<Mutex<Vec<PathSearch>>>,
}

impl SearchPool {
	/// Take an idle search configured for `settings` or create one when none is idle
	pub fn checkout(&self, settings: &NavMeshSettings) -> PathSearch {
		let pooled = match self.searches.lock() {
			Ok(mut searches) => searches.pop(),
			Err(_) => {
				error!("Search pool lock poisoned, creating a new search");
				None
			}
		};
		match pooled {
			Some(mut search) => {
				search.configure(settings);
				search
			}
			None => PathSearch::new(settings),
		}
	}
	/// Return a search to the pool, it is dropped when the pool is full
	pub fn give_back(&self, search: PathSearch) {
		if let Ok(mut searches) = self.searches.lock() {
			if searches.len() < MAX_POOLED_SEARCHES {
				searches.push(search);
			}
		}
	}
	/// Number of idle searches
	pub fn len(&self) -> usize {
		self.searches.lock().map(|s| s.len()).unwrap_or(0)
	}
	/// Whether no search is idle
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Searches in flight keyed by the entity that asked for them. Each entity has at most one
/// search running, a new request cancels the previous one
#[derive(Component, Default)]
pub struct PathQueue {
	/// Running searches
	pending: HashMap<Entity, PendingPath>,
	/// Idle searches for the next requests
	searches: SearchPool,
}

impl PathQueue {
	/// Track a new search for `entity`, cancelling any it already had
	pub fn insert(&mut self, entity: Entity, pending: PendingPath) {
		if let Some(old) = self.pending.insert(entity, pending) {
			old.cancel();
		}
	}
	/// Number of searches in flight
	pub fn len(&self) -> usize {
		self.pending.len()
	}
	/// Whether there are no searches in flight
	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}
	/// Whether `entity` has a search running
	pub fn contains(&self, entity: Entity) -> bool {
		self.pending.contains_key(&entity)
	}
	pub fn get_mut(&mut self) -> &mut HashMap<Entity, PendingPath> {
		&mut self.pending
	}
	/// Get the pool of idle searches, clone it to hand to a task
	pub fn get_search_pool(&self) -> &SearchPool {
		&self.searches
	}
}

#[derive(Bundle)]
pub struct NavMeshBundle {
	shared_graphs: SharedNavGraphs,
	settings: NavMeshSettings,
	modifiers: PathModifiers,
	queue: PathQueue,
}

impl NavMeshBundle {
	/// Create a new instance of [NavMeshBundle] from prebuilt graphs
	pub fn new(graphs: NavGraphs, settings: NavMeshSettings) -> Self {
		let modifiers = PathModifiers::from_settings(&settings);
		NavMeshBundle {
			shared_graphs: SharedNavGraphs::new(graphs),
			settings,
			modifiers,
			queue: PathQueue::default(),
		}
	}
	/// Create a new instance of [NavMeshBundle] holding a single navmesh built from a bevy
	/// [Mesh] placed at `translation`
	pub fn from_bevy_mesh(
		mesh: &Mesh,
		translation: Vec3,
		settings: NavMeshSettings,
	) -> Result<Self, NavMeshError> {
		let mut graphs = NavGraphs::default();
		graphs.add_graph(NavMesh::from_bevy_mesh(mesh, translation)?)?;
		Ok(NavMeshBundle::new(graphs, settings))
	}
	/// Replace the default post-processing
	pub fn with_modifiers(mut self, pipeline: ModifierPipeline) -> Self {
		self.modifiers = PathModifiers(pipeline);
		self
	}
	/// Get the shared graphs, clone it to keep a handle for later updates
	pub fn get_shared_graphs(&self) -> &SharedNavGraphs {
		&self.shared_graphs
	}
}
