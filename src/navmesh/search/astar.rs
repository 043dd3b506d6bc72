//! A* over [NavGraphs].
//!
//! The graphs are never written to during a search. Every piece of transient state (the `g`
//! and `h` scores, parent links and the open/closed status of a node) lives in a
//! [SearchScratch] owned by the [PathSearch], indexed by the same [NodeRef] as the graph. Many
//! searches can therefore read the same graphs concurrently as long as each has its own
//! [PathSearch].
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Transient per-node state of a single search
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SearchNode {
	/// Cost of the best known route from the start
	pub g: u32,
	/// Heuristic estimate of the cost to the goal
	pub h: u32,
	/// Cost of the connection used to reach this node
	pub cost: u32,
	/// The node this one was reached from
	pub parent: Option<NodeRef>,
	/// Search this record belongs to, a mismatch means the record is stale
	search_id: u16,
	/// Whether the node has been expanded
	closed: bool,
}

impl SearchNode {
	/// Priority of the node, `g + h`
	pub fn f(&self) -> u32 {
		self.g.saturating_add(self.h)
	}
	/// Whether the node has been expanded
	pub fn is_closed(&self) -> bool {
		self.closed
	}
}

/// Entry of the open list, a snapshot of a node's `f` when it was (re)opened
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpenEntry {
	/// The opened node
	node: NodeRef,
	/// `f` at the time of opening
	f: u32,
}

impl HeapItem for OpenEntry {
	fn f(&self) -> u32 {
		self.f
	}
}

/// Pooled per-search state. Records are invalidated in bulk between searches by bumping the
/// search id rather than clearing every array
#[derive(Clone, Debug)]
pub struct SearchScratch {
	/// Per graph, per node records
	nodes: Vec<Vec<SearchNode>>,
	/// The open list
	heap: PathHeap<OpenEntry>,
	/// Id of the current search
	search_id: u16,
}

impl SearchScratch {
	/// Create a new instance of [SearchScratch]
	pub fn new(initial_heap_size: usize) -> Self {
		SearchScratch {
			nodes: Vec::new(),
			heap: PathHeap::new(initial_heap_size),
			search_id: 0,
		}
	}
	/// Size the arenas for `graphs` and invalidate the records of the previous search
	fn prepare(&mut self, graphs: &NavGraphs) {
		let sizes = graphs.get_graph_sizes();
		self.nodes.resize_with(sizes.len(), Vec::new);
		for (records, size) in self.nodes.iter_mut().zip(sizes) {
			records.resize(size, SearchNode::default());
		}
		self.search_id = self.search_id.wrapping_add(1);
		if self.search_id == 0 {
			// ids wrapped, old records could be mistaken for current ones
			for records in self.nodes.iter_mut() {
				records.fill(SearchNode::default());
			}
			self.search_id = 1;
		}
		self.heap.clear();
	}
	/// Record of a node for the current search, `None` if it hasn't been discovered
	pub fn get(&self, node: NodeRef) -> Option<&SearchNode> {
		self.nodes
			.get(node.graph)
			.and_then(|g| g.get(node.node))
			.filter(|r| r.search_id == self.search_id)
	}
	/// Record of a node for the current search, reset if it belongs to an older one. The flag
	/// is `true` when the node is discovered for the first time
	fn get_mut(&mut self, node: NodeRef) -> Option<(&mut SearchNode, bool)> {
		let id = self.search_id;
		let record = self.nodes.get_mut(node.graph)?.get_mut(node.node)?;
		let fresh = record.search_id != id;
		if fresh {
			*record = SearchNode {
				search_id: id,
				..Default::default()
			};
		}
		Some((record, fresh))
	}
}

/// Runs A* searches, reusing its scratch memory from one search to the next
#[derive(Clone, Debug)]
pub struct PathSearch {
	/// Estimate of the remaining cost
	heuristic: Heuristic,
	/// Multiplier applied to the heuristic
	heuristic_scale: f32,
	/// Pooled search state
	scratch: SearchScratch,
}

impl PathSearch {
	/// Create a new instance of [PathSearch] configured from `settings`
	pub fn new(settings: &NavMeshSettings) -> Self {
		PathSearch {
			heuristic: settings.heuristic,
			heuristic_scale: settings.heuristic_scale,
			scratch: SearchScratch::new(settings.initial_heap_size),
		}
	}
	/// Adopt the heuristic of `settings`, the scratch memory is kept
	pub fn configure(&mut self, settings: &NavMeshSettings) {
		self.heuristic = settings.heuristic;
		self.heuristic_scale = settings.heuristic_scale;
	}
	/// Get the heuristic in use
	pub fn get_heuristic(&self) -> Heuristic {
		self.heuristic
	}
	/// Get the scratch state of the last search
	pub fn get_scratch(&self) -> &SearchScratch {
		&self.scratch
	}
	/// Find a route of nodes from the start to the end of `request`.
	///
	/// Fails with [NavMeshError::NoPathFound] when the goal can't be reached and with
	/// [NavMeshError::Cancelled] when `cancel` is triggered, it is checked before every node
	/// expansion. Neither leaves the [PathSearch] in a state that affects later searches
	pub fn search(
		&mut self,
		graphs: &NavGraphs,
		request: &PathRequest,
		cancel: &CancelToken,
	) -> Result<NavPath, NavMeshError> {
		let start = match request.start_node {
			Some(n) => n,
			None => {
				graphs
					.get_nearest(request.start)
					.ok_or(NavMeshError::NoNearestNode(request.start))?
					.node
			}
		};
		let goal = match request.end_node {
			Some(n) => n,
			None => {
				graphs
					.get_nearest(request.end)
					.ok_or(NavMeshError::NoNearestNode(request.end))?
					.node
			}
		};
		let start_node = graphs.get_node(start).ok_or(NavMeshError::UnknownNode(start))?;
		if graphs.get_node(goal).is_none() {
			return Err(NavMeshError::UnknownNode(goal));
		}
		let target = Int3::from_vec3(request.end);

		self.scratch.prepare(graphs);
		let h = self
			.heuristic
			.estimate(start_node.get_position(), target, self.heuristic_scale);
		if let Some((record, _)) = self.scratch.get_mut(start) {
			record.h = h;
			let f = record.f();
			self.scratch.heap.insert(OpenEntry { node: start, f })?;
		}

		let mut expanded = 0;
		loop {
			if cancel.is_cancelled() {
				self.scratch.heap.clear();
				return Err(NavMeshError::Cancelled);
			}
			if self.scratch.heap.is_empty() {
				return Err(NavMeshError::NoPathFound { start, goal });
			}
			let entry = self.scratch.heap.extract_min()?;
			let Some((current, _)) = self.scratch.get_mut(entry.node) else {
				continue;
			};
			// a better route re-opened the node after this entry was queued
			if current.closed || current.f() != entry.f {
				continue;
			}
			current.closed = true;
			let current_g = current.g;
			expanded += 1;
			if entry.node == goal {
				break;
			}
			let Some(node) = graphs.get_node(entry.node) else {
				continue;
			};
			for (neighbour_ref, cost) in node.iter_connections() {
				let Some(neighbour) = graphs.get_node(neighbour_ref) else {
					continue;
				};
				if !neighbour.is_walkable() {
					continue;
				}
				let g = current_g
					.saturating_add(cost)
					.saturating_add(neighbour.get_penalty());
				let Some((record, fresh)) = self.scratch.get_mut(neighbour_ref) else {
					continue;
				};
				if record.closed {
					continue;
				}
				if fresh || g < record.g {
					record.g = g;
					record.h = self.heuristic.estimate(
						neighbour.get_position(),
						target,
						self.heuristic_scale,
					);
					record.cost = cost;
					record.parent = Some(entry.node);
					let f = record.f();
					self.scratch.heap.insert(OpenEntry {
						node: neighbour_ref,
						f,
					})?;
				}
			}
		}

		let nodes = self.trace(goal);
		let mut vector_path: Vec<Vec3> = nodes
			.iter()
			.filter_map(|n| graphs.get_node(*n))
			.map(|n| n.get_position().to_vec3())
			.collect();
		if vector_path.len() == 1 {
			vector_path.push(request.end);
		}
		if let Some(first) = vector_path.first_mut() {
			*first = request.start;
		}
		if let Some(last) = vector_path.last_mut() {
			*last = request.end;
		}
		let mut path = NavPath::new(nodes, vector_path);
		path.set_expanded(expanded);
		Ok(path)
	}
	/// Walk the parent links back from `goal`
	fn trace(&self, goal: NodeRef) -> Vec<NodeRef> {
		let mut nodes = vec![goal];
		let mut current = goal;
		while let Some(parent) = self.scratch.get(current).and_then(|r| r.parent) {
			nodes.push(parent);
			current = parent;
		}
		nodes.reverse();
		nodes
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	use crate::navmesh::graphs::mesh::cells_mesh;

	fn graphs_of(mesh: NavMesh) -> NavGraphs {
		let mut graphs = NavGraphs::default();
		graphs.add_graph(mesh).unwrap();
		graphs
	}
	#[test]
	fn diagonal_of_three_by_three_grid() {
		let mut cells = Vec::new();
		for z in 0..3 {
			for x in 0..3 {
				cells.push((x, z));
			}
		}
		let graphs = graphs_of(cells_mesh(&cells));
		let mut search = PathSearch::new(&NavMeshSettings::default());
		let request = PathRequest::new(Vec3::new(0.5, 0.0, 0.5), Vec3::new(2.5, 0.0, 2.5));
		let path = search.search(&graphs, &request, &CancelToken::new()).unwrap();
		assert!(path.get_expanded() <= 9);
		// cells meeting at a corner don't share an edge so the route zig-zags through 5 triangles
		assert_eq!(5, path.get_nodes().len());
		assert_eq!(path.get_nodes().len(), path.get_vector_path().len());
		assert_eq!(Vec3::new(0.5, 0.0, 0.5), path.get_vector_path()[0]);
		assert_eq!(Vec3::new(2.5, 0.0, 2.5), path.get_vector_path()[4]);
	}
	#[test]
	fn route_is_connected() {
		let cells = vec![(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)];
		let graphs = graphs_of(cells_mesh(&cells));
		let mut search = PathSearch::new(&NavMeshSettings::default());
		let request = PathRequest::new(Vec3::new(0.5, 0.0, 0.5), Vec3::new(2.5, 0.0, 2.5));
		let path = search.search(&graphs, &request, &CancelToken::new()).unwrap();
		for pair in path.get_nodes().windows(2) {
			let node = graphs.get_node(pair[0]).unwrap();
			assert!(node.is_connected_to(pair[1]));
		}
	}
	#[test]
	fn single_node_route() {
		let graphs = graphs_of(cells_mesh(&[(0, 0)]));
		let mut search = PathSearch::new(&NavMeshSettings::default());
		let request = PathRequest::new(Vec3::new(0.8, 0.0, 0.2), Vec3::new(0.9, 0.0, 0.1));
		let path = search.search(&graphs, &request, &CancelToken::new()).unwrap();
		assert_eq!(1, path.get_nodes().len());
		assert_eq!(vec![Vec3::new(0.8, 0.0, 0.2), Vec3::new(0.9, 0.0, 0.1)], path.get_vector_path().to_vec());
	}
	#[test]
	fn disconnected_regions() {
		// two cells with a gap between them
		let graphs = graphs_of(cells_mesh(&[(0, 0), (2, 0)]));
		let mut search = PathSearch::new(&NavMeshSettings::default());
		let request = PathRequest::new(Vec3::new(0.5, 0.0, 0.5), Vec3::new(2.5, 0.0, 0.5));
		let result = search.search(&graphs, &request, &CancelToken::new());
		assert!(matches!(result, Err(NavMeshError::NoPathFound { .. })));
	}
	#[test]
	fn unwalkable_nodes_avoided() {
		let cells = vec![(0, 0), (1, 0), (2, 0)];
		let mut graphs = graphs_of(cells_mesh(&cells));
		// both triangles of the middle cell
		graphs.set_walkable(NodeRef::new(0, 2), false).unwrap();
		graphs.set_walkable(NodeRef::new(0, 3), false).unwrap();
		let mut search = PathSearch::new(&NavMeshSettings::default());
		let request = PathRequest::new(Vec3::new(0.5, 0.0, 0.5), Vec3::new(2.5, 0.0, 0.5));
		let result = search.search(&graphs, &request, &CancelToken::new());
		assert!(matches!(result, Err(NavMeshError::NoPathFound { .. })));
	}
	#[test]
	fn cancelled_search_is_reusable() {
		let cells = vec![(0, 0), (1, 0), (2, 0)];
		let graphs = graphs_of(cells_mesh(&cells));
		let mut search = PathSearch::new(&NavMeshSettings::default());
		let request = PathRequest::new(Vec3::new(0.5, 0.0, 0.5), Vec3::new(2.5, 0.0, 0.5));
		let token = CancelToken::new();
		token.cancel();
		assert_eq!(Err(NavMeshError::Cancelled), search.search(&graphs, &request, &token));
		let path = search.search(&graphs, &request, &CancelToken::new()).unwrap();
		assert_eq!(Vec3::new(2.5, 0.0, 0.5), *path.get_vector_path().last().unwrap());
	}
	#[test]
	fn penalties_steer_the_route() {
		// a 2x2 block, the cheapest route from bottom left to top right depends on penalties
		let cells = vec![(0, 0), (1, 0), (0, 1), (1, 1)];
		let mut graphs = graphs_of(cells_mesh(&cells));
		let mut search = PathSearch::new(&NavMeshSettings::default());
		let request = PathRequest::new(Vec3::new(0.2, 0.0, 0.1), Vec3::new(1.8, 0.0, 1.9));
		let first = search.search(&graphs, &request, &CancelToken::new()).unwrap();
		// make every node of the first route except the ends very expensive
		let inner = &first.get_nodes()[1..first.get_nodes().len() - 1];
		for n in inner {
			graphs.update_penalty(*n, 100_000).unwrap();
		}
		let second = search.search(&graphs, &request, &CancelToken::new()).unwrap();
		for n in &second.get_nodes()[1..second.get_nodes().len() - 1] {
			assert!(!inner.contains(n));
		}
	}
	#[test]
	fn explicit_nodes_skip_nearest_lookup() {
		let graphs = graphs_of(cells_mesh(&[(0, 0), (1, 0)]));
		let mut search = PathSearch::new(&NavMeshSettings::default());
		let request = PathRequest::with_nodes(Vec3::new(0.5, 0.0, 0.5), NodeRef::new(0, 0), Vec3::new(1.5, 0.0, 0.5), NodeRef::new(0, 3));
		let path = search.search(&graphs, &request, &CancelToken::new()).unwrap();
		assert_eq!(NodeRef::new(0, 0), path.get_nodes()[0]);
		assert_eq!(NodeRef::new(0, 3), *path.get_nodes().last().unwrap());
	}
	#[test]
	fn unknown_start_node() {
		let graphs = graphs_of(cells_mesh(&[(0, 0)]));
		let mut search = PathSearch::new(&NavMeshSettings::default());
		let request = PathRequest::with_nodes(Vec3::ZERO, NodeRef::new(0, 9), Vec3::ZERO, NodeRef::new(0, 0));
		let result = search.search(&graphs, &request, &CancelToken::new());
		assert_eq!(Err(NavMeshError::UnknownNode(NodeRef::new(0, 9))), result);
	}
	#[test]
	fn crosses_into_point_graph() {
		let mut graphs = graphs_of(cells_mesh(&[(0, 0)]));
		graphs.add_graph(PointGraph::new(&[Vec3::new(3.0, 0.0, 0.5), Vec3::new(5.0, 0.0, 0.5)], &[(0, 1)]).unwrap()).unwrap();
		graphs.connect(NodeRef::new(0, 0), NodeRef::new(1, 0), 2500).unwrap();
		let mut search = PathSearch::new(&NavMeshSettings::default());
		let request = PathRequest::new(Vec3::new(0.8, 0.0, 0.2), Vec3::new(5.0, 0.0, 0.5));
		let path = search.search(&graphs, &request, &CancelToken::new()).unwrap();
		let actual = vec![NodeRef::new(0, 0), NodeRef::new(1, 0), NodeRef::new(1, 1)];
		assert_eq!(actual, path.get_nodes().to_vec());
	}
}
