//! A graph of free standing waypoints. Point graphs have no polygons so paths across them can't
//! be funnelled or clamped against, they contribute their raw node positions instead.
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Waypoints joined by explicit links
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, Default)]
pub struct PointGraph {
	/// Index of this graph within [NavGraphs]
	graph: GraphIndex,
	/// The waypoints
	nodes: Vec<GraphNode>,
}

impl PointGraph {
	/// Create a graph from world positions, each link joins two positions by index in both
	/// directions with a cost of their distance
	pub fn new(positions: &[Vec3], links: &[(usize, usize)]) -> Result<Self, NavMeshError> {
		let mut nodes: Vec<GraphNode> = positions
			.iter()
			.enumerate()
			.map(|(i, p)| GraphNode::new(i, 0, Int3::from_vec3(*p), None))
			.collect();
		for (a, b) in links {
			for i in [*a, *b] {
				if i >= nodes.len() {
					return Err(NavMeshError::UnknownNode(NodeRef::new(0, i)));
				}
			}
			let cost = (nodes[*a].get_position() - nodes[*b].get_position()).cost_magnitude();
			nodes[*a].add_connection(NodeRef::new(0, *b), cost);
			nodes[*b].add_connection(NodeRef::new(0, *a), cost);
		}
		Ok(PointGraph { graph: 0, nodes })
	}
	/// Create a graph from prepared nodes, the connection lists are validated when the graph is
	/// added to [NavGraphs]
	pub fn from_nodes(nodes: Vec<GraphNode>) -> Self {
		let graph = nodes.first().map(|n| n.get_graph()).unwrap_or_default();
		PointGraph { graph, nodes }
	}
	/// Get the index of this graph
	pub fn get_graph_index(&self) -> GraphIndex {
		self.graph
	}
	/// Set the index of this graph
	pub(crate) fn set_graph_index(&mut self, graph: GraphIndex) {
		self.graph = graph;
	}
	/// Get the waypoints
	pub fn get_nodes(&self) -> &[GraphNode] {
		&self.nodes
	}
	/// Get mutable access to the waypoints
	pub(crate) fn get_nodes_mut(&mut self) -> &mut [GraphNode] {
		&mut self.nodes
	}
	/// Waypoints inside the rectangle `min..=max` on the XZ plane
	pub fn get_nodes_in_area(&self, min: Int3, max: Int3) -> Vec<NodeIndex> {
		self.nodes
			.iter()
			.filter(|n| {
				let p = n.get_position();
				min.x <= p.x && p.x <= max.x && min.z <= p.z && p.z <= max.z
			})
			.map(|n| n.get_index())
			.collect()
	}
	/// The walkable waypoint closest to `position`
	pub fn get_nearest(&self, position: Vec3) -> Option<NearestNode> {
		let target = Int3::from_vec3(position);
		let mut best: Option<(&GraphNode, f64)> = None;
		for node in self.nodes.iter().filter(|n| n.is_walkable()) {
			let dist = (node.get_position() - target).sqr_magnitude();
			if best.is_none_or(|(_, d)| dist < d) {
				best = Some((node, dist));
			}
		}
		best.map(|(node, _)| NearestNode {
			node: node.get_ref(),
			clamped_position: node.get_position().to_vec3(),
		})
	}
}
