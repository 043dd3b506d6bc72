//! Errors raised when a caller breaks the preconditions of a graph, heap or search
//!

use crate::prelude::*;

/// Failures that abort the current operation. Geometric degeneracies are not represented here,
/// they fall back to a usable result instead
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum NavMeshError {
	/// Tried to take the minimum of a heap with nothing in it
	#[error("Cannot extract from an empty heap")]
	HeapEmpty,
	/// The heap wanted to grow beyond [HEAP_SIZE_CEILING], likely a runaway search
	#[error("Heap size {requested} exceeds the ceiling of {HEAP_SIZE_CEILING} slots, the search is probably stuck in a loop")]
	HeapCeilingExceeded {
		/// Number of slots the heap tried to grow to
		requested: usize,
	},
	/// A node has a different number of connections to connection costs
	#[error("Node {node} has {connections} connections but {costs} connection costs")]
	MismatchedConnections {
		/// Index of the offending node within its graph
		node: usize,
		/// Length of the connection list
		connections: usize,
		/// Length of the cost list
		costs: usize,
	},
	/// A triangle index list whose length is not a multiple of 3
	#[error("Triangle index list of length {len} is not a multiple of 3")]
	InvalidTriangleList {
		/// Length of the list
		len: usize,
	},
	/// A triangle refers to a vertex that doesn't exist
	#[error("Vertex index {index} is out of range of {vertex_count} vertices")]
	VertexOutOfRange {
		/// The bad index
		index: usize,
		/// Number of vertices supplied
		vertex_count: usize,
	},
	/// A bevy [bevy::prelude::Mesh] that can't be read as a triangle list
	#[error("Mesh cannot be converted into a navmesh: {0}")]
	UnsupportedMesh(&'static str),
	/// A node handle doesn't resolve to a node
	#[error("Node {0:?} does not exist")]
	UnknownNode(NodeRef),
	/// Start and goal sit in disconnected regions
	#[error("No path exists from {start:?} to {goal:?}")]
	NoPathFound {
		/// Node the search started from
		start: NodeRef,
		/// Node the search tried to reach
		goal: NodeRef,
	},
	/// Node list and position list of a path differ in length
	#[error("Path has {nodes} nodes but {positions} positions")]
	MismatchedPathLengths {
		/// Number of nodes
		nodes: usize,
		/// Number of positions
		positions: usize,
	},
	/// The graph collection holds no node to start from
	#[error("No walkable node near {0}")]
	NoNearestNode(bevy::math::Vec3),
	/// The search was aborted through its [CancelToken]
	#[error("Search was cancelled")]
	Cancelled,
	/// A writer panicked while holding the graph lock
	#[error("Navigation graph lock is poisoned")]
	LockPoisoned,
	/// A settings file couldn't be opened or parsed
	#[error("Failed loading settings: {0}")]
	Settings(String),
}
