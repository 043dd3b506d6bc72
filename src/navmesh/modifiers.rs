//! Post-processing of found paths.
//!
//! A modifier takes a finished [NavPath] and returns a new one, it never mutates its input. A
//! [ModifierPipeline] applies an ordered list of modifiers one after the other, the output of
//! each being the input of the next. Plain closures can be used as modifiers.
//!
//! [AlternativePath] is the exception that feeds back into the graphs: it records each path it
//! sees and, once committed, makes the nodes of that path more expensive so that the following
//! searches spread out over other routes.
//!

use std::sync::{Arc, Mutex};

use crate::prelude::*;
use bevy::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A step of path post-processing
pub trait PathModifier: Send + Sync {
	/// Produce a new path from `path`
	fn apply(&self, graphs: &NavGraphs, path: &NavPath) -> Result<NavPath, NavMeshError>;
}

impl<F> PathModifier for F
where
	F: Fn(&NavGraphs, &NavPath) -> NavPath + Send + Sync,
{
	fn apply(&self, graphs: &NavGraphs, path: &NavPath) -> Result<NavPath, NavMeshError> {
		Ok(self(graphs, path))
	}
}

/// Ordered list of [PathModifier]s
#[derive(Clone, Default)]
pub struct ModifierPipeline {
	/// Applied first to last
	modifiers: Vec<Arc<dyn PathModifier>>,
}

impl std::fmt::Debug for ModifierPipeline {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ModifierPipeline")
			.field("modifiers", &self.modifiers.len())
			.finish()
	}
}

impl ModifierPipeline {
	/// Create a new empty instance of [ModifierPipeline]
	pub fn new() -> Self {
		ModifierPipeline::default()
	}
	/// Append a modifier, builder style
	pub fn with(mut self, modifier: impl PathModifier + 'static) -> Self {
		self.push(modifier);
		self
	}
	/// Append a modifier
	pub fn push(&mut self, modifier: impl PathModifier + 'static) {
		self.modifiers.push(Arc::new(modifier));
	}
	/// Number of modifiers
	pub fn len(&self) -> usize {
		self.modifiers.len()
	}
	/// Whether the pipeline does nothing
	pub fn is_empty(&self) -> bool {
		self.modifiers.is_empty()
	}
	/// Run every modifier in order, stopping at the first failure
	pub fn apply(&self, graphs: &NavGraphs, path: NavPath) -> Result<NavPath, NavMeshError> {
		self.modifiers
			.iter()
			.try_fold(path, |p, m| m.apply(graphs, &p))
	}
}

/// Default penalty added to the sampled nodes of a recorded path
pub const ALTERNATIVE_PENALTY: u32 = 1000;
/// Default largest gap between two sampled nodes
pub const ALTERNATIVE_RANDOM_STEP: usize = 10;

/// Makes later searches avoid the route of the latest path.
///
/// As a [PathModifier] it records the nodes of every path passing through and returns the path
/// unchanged. [AlternativePath::commit] then takes its penalty back off the nodes penalised last
/// time and adds it to a random sample of the recorded nodes: the first sampled node is within
/// `random_step` of the start and each following one is between `1` and `random_step - 1`
/// nodes further along. Committing needs the graphs mutably so it is run through
/// [SharedNavGraphs::update], the plugin does so before spawning new searches for any navmesh
/// entity carrying an [AlternativePath] component. Clones share their record.
#[derive(Component, Clone)]
pub struct AlternativePath {
	/// Added to each sampled node
	penalty: u32,
	/// Largest gap between sampled nodes
	random_step: usize,
	/// Recorded and penalised nodes
	state: Arc<Mutex<AlternativeState>>,
}

/// Book keeping of an [AlternativePath]
#[derive(Debug)]
struct AlternativeState {
	/// Nodes of the latest path, waiting to be committed
	pending: Option<Vec<NodeRef>>,
	/// Nodes currently carrying a penalty
	applied: Vec<NodeRef>,
	/// The penalty `applied` carries
	applied_penalty: u32,
	/// Chooses the sample
	rng: StdRng,
}

impl std::fmt::Debug for AlternativePath {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AlternativePath")
			.field("penalty", &self.penalty)
			.field("random_step", &self.random_step)
			.finish()
	}
}

impl Default for AlternativePath {
	fn default() -> Self {
		AlternativePath::new(ALTERNATIVE_PENALTY, ALTERNATIVE_RANDOM_STEP)
	}
}

impl AlternativePath {
	/// Create a new instance of [AlternativePath] sampling from system entropy
	pub fn new(penalty: u32, random_step: usize) -> Self {
		AlternativePath::with_rng(penalty, random_step, StdRng::from_os_rng())
	}
	/// Create a new instance of [AlternativePath] with a reproducible sample
	pub fn from_seed(penalty: u32, random_step: usize, seed: u64) -> Self {
		AlternativePath::with_rng(penalty, random_step, StdRng::seed_from_u64(seed))
	}
	/// Create a new instance of [AlternativePath] around `rng`
	fn with_rng(penalty: u32, random_step: usize, rng: StdRng) -> Self {
		AlternativePath {
			penalty,
			random_step: random_step.max(1),
			state: Arc::new(Mutex::new(AlternativeState {
				pending: None,
				applied: Vec::new(),
				applied_penalty: 0,
				rng,
			})),
		}
	}
	pub fn get_penalty(&self) -> u32 {
		self.penalty
	}
	pub fn get_random_step(&self) -> usize {
		self.random_step
	}
	/// Whether a path has been recorded since the last commit
	pub fn is_pending(&self) -> bool {
		self.state.lock().map(|s| s.pending.is_some()).unwrap_or(false)
	}
	/// Nodes currently carrying the penalty
	pub fn get_applied(&self) -> Result<Vec<NodeRef>, NavMeshError> {
		let state = self.state.lock().map_err(|_| NavMeshError::LockPoisoned)?;
		Ok(state.applied.clone())
	}
	/// Remove the previous penalties and penalise a sample of the recorded path. Returns the
	/// number of nodes penalised, `0` when nothing was recorded since the last commit
	pub fn commit(&self, graphs: &mut NavGraphs) -> Result<usize, NavMeshError> {
		let mut state = self.state.lock().map_err(|_| NavMeshError::LockPoisoned)?;
		let Some(nodes) = state.pending.take() else {
			return Ok(0);
		};
		remove_penalty(graphs, &state.applied, state.applied_penalty)?;
		let step = self.random_step;
		let mut sampled = Vec::new();
		let mut i = state.rng.random_range(0..step);
		while let Some(node) = nodes.get(i) {
			sampled.push(*node);
			i += if step > 1 {
				state.rng.random_range(1..step)
			} else {
				1
			};
		}
		for node in &sampled {
			let Some(current) = graphs.get_node(*node).map(|n| n.get_penalty()) else {
				continue;
			};
			graphs.update_penalty(*node, current.saturating_add(self.penalty))?;
		}
		state.applied = sampled;
		state.applied_penalty = self.penalty;
		Ok(state.applied.len())
	}
	/// Take every penalty added by the last commit back off, the recorded path is kept
	pub fn revert(&self, graphs: &mut NavGraphs) -> Result<(), NavMeshError> {
		let mut state = self.state.lock().map_err(|_| NavMeshError::LockPoisoned)?;
		remove_penalty(graphs, &state.applied, state.applied_penalty)?;
		state.applied.clear();
		state.applied_penalty = 0;
		Ok(())
	}
}

/// Subtract `penalty` from each of `nodes`, nodes which no longer exist are skipped
fn remove_penalty(graphs: &mut NavGraphs, nodes: &[NodeRef], penalty: u32) -> Result<(), NavMeshError> {
	for node in nodes {
		let Some(current) = graphs.get_node(*node).map(|n| n.get_penalty()) else {
			continue;
		};
		if current < penalty {
			// something else lowered it in the meantime
			warn!("Penalty of {:?} is {}, expected at least {}", node, current, penalty);
		}
		graphs.update_penalty(*node, current.saturating_sub(penalty))?;
	}
	Ok(())
}

impl PathModifier for AlternativePath {
	fn apply(&self, _graphs: &NavGraphs, path: &NavPath) -> Result<NavPath, NavMeshError> {
		let mut state = self.state.lock().map_err(|_| NavMeshError::LockPoisoned)?;
		state.pending = Some(path.get_nodes().to_vec());
		Ok(path.clone())
	}
}
