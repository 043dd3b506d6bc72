//! Graphs are arenas of [GraphNode]s addressed by stable integer handles ([NodeRef]). A world
//! may be described by several graphs at once, for instance two disjoint navmesh regions joined
//! by a hand placed [point::PointGraph], so every node records the graph it belongs to and
//! connections may cross from one graph into another.
//!

pub mod mesh;
pub mod point;

use crate::prelude::*;
use bevy::prelude::*;

/// Index of a graph within [NavGraphs]
pub type GraphIndex = usize;
/// Index of a node within its graph
pub type NodeIndex = usize;

/// Stable handle to a node of any graph
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct NodeRef {
	/// The graph owning the node
	pub graph: GraphIndex,
	/// Position of the node in the graph arena
	pub node: NodeIndex,
}

impl NodeRef {
	/// Create a new instance of [NodeRef]
	pub fn new(graph: GraphIndex, node: NodeIndex) -> Self {
		NodeRef { graph, node }
	}
}

/// A node of a navigation graph. For a navmesh this is a triangle, for a point graph a single
/// waypoint
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Position of the node within its graph
	index: NodeIndex,
	/// The owning graph
	graph: GraphIndex,
	/// Representative position, the centroid of a triangle
	position: Int3,
	/// Indices into the shared vertex array of a navmesh, clockwise on the XZ plane
	vertices: Option<[usize; 3]>,
	/// Neighbouring nodes
	connections: Vec<NodeRef>,
	/// Cost of moving to each neighbour, parallel to `connections`
	connection_costs: Vec<u32>,
	/// Whether agents can traverse the node
	walkable: bool,
	/// Extra cost added when a path enters this node
	penalty: u32,
}

impl GraphNode {
	/// Create a new instance of a walkable [GraphNode] without connections
	pub fn new(index: NodeIndex, graph: GraphIndex, position: Int3, vertices: Option<[usize; 3]>) -> Self {
		GraphNode {
			index,
			graph,
			position,
			vertices,
			connections: Vec::new(),
			connection_costs: Vec::new(),
			walkable: true,
			penalty: 0,
		}
	}
	/// Get the handle of this node
	pub fn get_ref(&self) -> NodeRef {
		NodeRef::new(self.graph, self.index)
	}
	/// Get the index of the node within its graph
	pub fn get_index(&self) -> NodeIndex {
		self.index
	}
	/// Get the graph this node belongs to
	pub fn get_graph(&self) -> GraphIndex {
		self.graph
	}
	/// Get the fixed-point position
	pub fn get_position(&self) -> Int3 {
		self.position
	}
	/// Get the triangle vertex indices, `None` for nodes without a polygon
	pub fn get_vertices(&self) -> Option<[usize; 3]> {
		self.vertices
	}
	/// Get the neighbouring nodes
	pub fn get_connections(&self) -> &[NodeRef] {
		&self.connections
	}
	/// Get the cost of moving to each neighbour
	pub fn get_connection_costs(&self) -> &[u32] {
		&self.connection_costs
	}
	/// Iterate over each neighbour with its cost
	pub fn iter_connections(&self) -> impl Iterator<Item = (NodeRef, u32)> + '_ {
		self.connections
			.iter()
			.copied()
			.zip(self.connection_costs.iter().copied())
	}
	/// Whether agents can traverse the node
	pub fn is_walkable(&self) -> bool {
		self.walkable
	}
	/// Mark the node as (un)walkable
	pub fn set_walkable(&mut self, walkable: bool) {
		self.walkable = walkable;
	}
	/// Get the penalty applied when entering the node
	pub fn get_penalty(&self) -> u32 {
		self.penalty
	}
	/// Set the penalty applied when entering the node
	pub fn set_penalty(&mut self, penalty: u32) {
		self.penalty = penalty;
	}
	/// Add a one-way connection, an existing connection to the same node has its cost replaced
	pub fn add_connection(&mut self, to: NodeRef, cost: u32) {
		if let Some(i) = self.connections.iter().position(|c| *c == to) {
			self.connection_costs[i] = cost;
		} else {
			self.connections.push(to);
			self.connection_costs.push(cost);
		}
	}
	/// Whether this node has a connection to `other`
	pub fn is_connected_to(&self, other: NodeRef) -> bool {
		self.connections.contains(&other)
	}
	/// Ensure the connection and cost lists line up
	pub fn validate(&self) -> Result<(), NavMeshError> {
		if self.connections.len() != self.connection_costs.len() {
			return Err(NavMeshError::MismatchedConnections {
				node: self.index,
				connections: self.connections.len(),
				costs: self.connection_costs.len(),
			});
		}
		Ok(())
	}
	/// Move the node (and any connections within the same graph) to a new graph index
	fn reassign_graph(&mut self, from: GraphIndex, to: GraphIndex) {
		self.graph = to;
		for c in self.connections.iter_mut() {
			if c.graph == from {
				c.graph = to;
			}
		}
	}
	/// Replace the connection lists wholesale, used when loading precomputed adjacency
	pub fn set_connections(&mut self, connections: Vec<NodeRef>, connection_costs: Vec<u32>) {
		self.connections = connections;
		self.connection_costs = connection_costs;
	}
}

/// Result of a nearest node query
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearestNode {
	/// The node nearest the queried position
	pub node: NodeRef,
	/// The queried position moved onto the node
	pub clamped_position: Vec3,
}

/// A change applied to every node overlapping an area of the XZ plane, see
/// [NavGraphs::update_area]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Reflect)]
pub struct GraphUpdate {
	/// Minimum corner of the area
	min: Int3,
	/// Maximum corner of the area
	max: Int3,
	/// Added to the penalty of each node
	penalty_delta: i32,
	/// Walkability given to each node, `None` leaves it alone
	walkable: Option<bool>,
}

impl GraphUpdate {
	/// Create a new instance of [GraphUpdate] covering the rectangle spanned by two corners, the
	/// height of either corner is ignored
	pub fn new(corner: Vec3, opposite: Vec3) -> Self {
		let a = Int3::from_vec3(corner);
		let b = Int3::from_vec3(opposite);
		GraphUpdate {
			min: Int3::new(a.x.min(b.x), 0, a.z.min(b.z)),
			max: Int3::new(a.x.max(b.x), 0, a.z.max(b.z)),
			penalty_delta: 0,
			walkable: None,
		}
	}
	/// Add `delta` to the penalty of each node, the result saturates at `0` and [u32::MAX]
	pub fn with_penalty_delta(mut self, delta: i32) -> Self {
		self.penalty_delta = delta;
		self
	}
	/// Make each node walkable or block it
	pub fn with_walkable(mut self, walkable: bool) -> Self {
		self.walkable = Some(walkable);
		self
	}
	pub fn get_min(&self) -> Int3 {
		self.min
	}
	pub fn get_max(&self) -> Int3 {
		self.max
	}
	pub fn get_penalty_delta(&self) -> i32 {
		self.penalty_delta
	}
	pub fn get_walkable(&self) -> Option<bool> {
		self.walkable
	}
	/// Apply the change to a single node
	pub fn apply(&self, node: &mut GraphNode) {
		node.set_penalty(node.get_penalty().saturating_add_signed(self.penalty_delta));
		if let Some(walkable) = self.walkable {
			node.set_walkable(walkable);
		}
	}
}

/// Any graph that can be searched
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug)]
pub enum NavGraph {
	/// A triangulated navigation mesh, supports clamping and funnelling
	Mesh(NavMesh),
	/// Free standing waypoints with explicit connections
	Point(PointGraph),
}

impl NavGraph {
	/// Get the nodes of the graph
	pub fn get_nodes(&self) -> &[GraphNode] {
		match self {
			NavGraph::Mesh(m) => m.get_nodes(),
			NavGraph::Point(p) => p.get_nodes(),
		}
	}
	/// Get mutable access to the nodes of the graph
	fn get_nodes_mut(&mut self) -> &mut [GraphNode] {
		match self {
			NavGraph::Mesh(m) => m.get_nodes_mut(),
			NavGraph::Point(p) => p.get_nodes_mut(),
		}
	}
	/// Get a node of the graph
	pub fn get_node(&self, index: NodeIndex) -> Option<&GraphNode> {
		self.get_nodes().get(index)
	}
	/// Navmesh capability query, `None` when the graph cannot be clamped against or funnelled
	pub fn as_navmesh(&self) -> Option<&NavMesh> {
		match self {
			NavGraph::Mesh(m) => Some(m),
			NavGraph::Point(_) => None,
		}
	}
	/// Find the walkable node nearest to `position`
	pub fn get_nearest(&self, position: Vec3) -> Option<NearestNode> {
		match self {
			NavGraph::Mesh(m) => m.get_nearest(position),
			NavGraph::Point(p) => p.get_nearest(position),
		}
	}
	/// Nodes overlapping the rectangle `min..=max` on the XZ plane
	pub fn get_nodes_in_area(&self, min: Int3, max: Int3) -> Vec<NodeIndex> {
		match self {
			NavGraph::Mesh(m) => m.get_nodes_in_area(min, max),
			NavGraph::Point(p) => p.get_nodes_in_area(min, max),
		}
	}
	/// Set the index of the graph, updating every node
	fn reassign(&mut self, index: GraphIndex) {
		let from = match self {
			NavGraph::Mesh(m) => m.get_graph_index(),
			NavGraph::Point(p) => p.get_graph_index(),
		};
		for node in self.get_nodes_mut() {
			node.reassign_graph(from, index);
		}
		match self {
			NavGraph::Mesh(m) => m.set_graph_index(index),
			NavGraph::Point(p) => p.set_graph_index(index),
		}
	}
}

impl From<NavMesh> for NavGraph {
	fn from(mesh: NavMesh) -> Self {
		NavGraph::Mesh(mesh)
	}
}

impl From<PointGraph> for NavGraph {
	fn from(graph: PointGraph) -> Self {
		NavGraph::Point(graph)
	}
}

/// Every graph of the world. Graphs are registered explicitly with [NavGraphs::add_graph] by
/// whoever owns the collection
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, Default)]
pub struct NavGraphs {
	/// The graphs, indexed by [GraphIndex]
	graphs: Vec<NavGraph>,
}

impl NavGraphs {
	/// Register a graph, it is given the next free [GraphIndex]
	pub fn add_graph(&mut self, graph: impl Into<NavGraph>) -> Result<GraphIndex, NavMeshError> {
		let mut graph = graph.into();
		for node in graph.get_nodes() {
			node.validate()?;
		}
		let index = self.graphs.len();
		graph.reassign(index);
		self.graphs.push(graph);
		Ok(index)
	}
	/// Get all graphs
	pub fn get_graphs(&self) -> &[NavGraph] {
		&self.graphs
	}
	/// Get a graph
	pub fn get_graph(&self, index: GraphIndex) -> Option<&NavGraph> {
		self.graphs.get(index)
	}
	/// Get a graph as a navmesh if it is one
	pub fn as_navmesh(&self, index: GraphIndex) -> Option<&NavMesh> {
		self.graphs.get(index).and_then(|g| g.as_navmesh())
	}
	/// Resolve a node handle
	pub fn get_node(&self, node: NodeRef) -> Option<&GraphNode> {
		self.graphs.get(node.graph).and_then(|g| g.get_node(node.node))
	}
	/// Resolve a node handle mutably
	fn get_node_mut(&mut self, node: NodeRef) -> Result<&mut GraphNode, NavMeshError> {
		self.graphs
			.get_mut(node.graph)
			.and_then(|g| g.get_nodes_mut().get_mut(node.node))
			.ok_or(NavMeshError::UnknownNode(node))
	}
	/// Number of nodes in each graph
	pub fn get_graph_sizes(&self) -> Vec<usize> {
		self.graphs.iter().map(|g| g.get_nodes().len()).collect()
	}
	/// Total number of nodes across all graphs
	pub fn node_count(&self) -> usize {
		self.graphs.iter().map(|g| g.get_nodes().len()).sum()
	}
	/// Find the walkable node nearest to `position` across every graph, the graph whose clamped
	/// position is closest wins
	pub fn get_nearest(&self, position: Vec3) -> Option<NearestNode> {
		let mut best: Option<(NearestNode, f32)> = None;
		for graph in &self.graphs {
			if let Some(nearest) = graph.get_nearest(position) {
				let dist = nearest.clamped_position.distance_squared(position);
				if best.is_none_or(|(_, d)| dist < d) {
					best = Some((nearest, dist));
				}
			}
		}
		best.map(|(n, _)| n)
	}
	/// Link two nodes (possibly of different graphs) in both directions
	pub fn connect(&mut self, a: NodeRef, b: NodeRef, cost: u32) -> Result<(), NavMeshError> {
		// resolve both before mutating either
		if self.get_node(b).is_none() {
			return Err(NavMeshError::UnknownNode(b));
		}
		self.get_node_mut(a)?.add_connection(b, cost);
		self.get_node_mut(b)?.add_connection(a, cost);
		Ok(())
	}
	/// Change the penalty of a node
	pub fn update_penalty(&mut self, node: NodeRef, penalty: u32) -> Result<(), NavMeshError> {
		self.get_node_mut(node)?.set_penalty(penalty);
		Ok(())
	}
	/// Change the walkability of a node
	pub fn set_walkable(&mut self, node: NodeRef, walkable: bool) -> Result<(), NavMeshError> {
		self.get_node_mut(node)?.set_walkable(walkable);
		Ok(())
	}
	/// Apply `update` to every node of every graph overlapping its area, returns the number of
	/// nodes changed. Run it through [SharedNavGraphs::update] while searches may be in flight
	pub fn update_area(&mut self, update: &GraphUpdate) -> usize {
		let mut changed = 0;
		for graph in self.graphs.iter_mut() {
			let selected = graph.get_nodes_in_area(update.get_min(), update.get_max());
			let nodes = graph.get_nodes_mut();
			for index in selected {
				if let Some(node) = nodes.get_mut(index) {
					update.apply(node);
					changed += 1;
				}
			}
		}
		changed
	}
}
