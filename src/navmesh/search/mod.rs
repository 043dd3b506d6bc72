//! Searching [NavGraphs] for a coarse route of nodes between two positions
//!

pub mod astar;
pub mod heap;

use std::sync::{
	atomic::{AtomicBool, Ordering},
	Arc,
};

use crate::prelude::*;
use bevy::prelude::*;

/// Describes where a search should start and end
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathRequest {
	/// Exact world position the path starts from
	pub start: Vec3,
	/// Exact world position the path should reach
	pub end: Vec3,
	/// Node to start from, looked up from `start` when absent
	pub start_node: Option<NodeRef>,
	/// Node to reach, looked up from `end` when absent
	pub end_node: Option<NodeRef>,
}

impl PathRequest {
	/// Create a new instance of [PathRequest] where the start and end nodes will be found from
	/// the positions
	pub fn new(start: Vec3, end: Vec3) -> Self {
		PathRequest {
			start,
			end,
			start_node: None,
			end_node: None,
		}
	}
	/// Create a new instance of [PathRequest] with known start and end nodes
	pub fn with_nodes(start: Vec3, start_node: NodeRef, end: Vec3, end_node: NodeRef) -> Self {
		PathRequest {
			start,
			end,
			start_node: Some(start_node),
			end_node: Some(end_node),
		}
	}
}

/// A found path. `nodes` is the coarse route and `vector_path` the waypoints an agent follows.
///
/// Straight out of a search both lists have the same length, each waypoint being the position
/// of its node except the first and last which are the exact requested start and end. A route
/// within a single node is the one exception, it has one node and the two waypoints start and
/// end. Path modifiers such as the [crate::prelude::FunnelModifier] replace the waypoints and
/// leave the nodes alone
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct NavPath {
	/// Nodes visited from start to goal
	nodes: Vec<NodeRef>,
	/// Waypoints from start to goal
	vector_path: Vec<Vec3>,
	/// How many nodes the search expanded to find the route
	expanded: usize,
}

impl NavPath {
	/// Create a new instance of [NavPath]
	pub fn new(nodes: Vec<NodeRef>, vector_path: Vec<Vec3>) -> Self {
		NavPath {
			nodes,
			vector_path,
			expanded: 0,
		}
	}
	/// Get the coarse route
	pub fn get_nodes(&self) -> &[NodeRef] {
		&self.nodes
	}
	/// Get the waypoints
	pub fn get_vector_path(&self) -> &[Vec3] {
		&self.vector_path
	}
	/// Get the number of nodes expanded by the search
	pub fn get_expanded(&self) -> usize {
		self.expanded
	}
	/// Record the number of nodes expanded by the search
	pub fn set_expanded(&mut self, expanded: usize) {
		self.expanded = expanded;
	}
	/// A copy of the path with new waypoints
	pub fn with_vector_path(&self, vector_path: Vec<Vec3>) -> Self {
		NavPath {
			nodes: self.nodes.clone(),
			vector_path,
			expanded: self.expanded,
		}
	}
	/// Total length of the waypoints
	pub fn length(&self) -> f32 {
		path_length(&self.vector_path)
	}
}

/// Shared flag used to abort a running search from another thread
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	/// Create a new instance of [CancelToken]
	pub fn new() -> Self {
		CancelToken::default()
	}
	/// Ask the search holding this token to stop
	pub fn cancel(&self) {
		self.0.store(true, Ordering::Relaxed);
	}
	/// Whether cancellation has been requested
	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn cancel_is_shared_between_clones() {
		let token = CancelToken::new();
		let other = token.clone();
		assert!(!other.is_cancelled());
		token.cancel();
		assert!(other.is_cancelled());
	}
	#[test]
	fn nav_path_length() {
		let path = NavPath::new(vec![NodeRef::new(0, 0)], vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0)]);
		assert_eq!(2.0, path.length());
	}
}
