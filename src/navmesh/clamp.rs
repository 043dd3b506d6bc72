//! Keeping an agent on the surface of a navmesh.
//!
//! Given the triangle an agent stands on, where it is and where it would like to be, a small
//! bounded walk across neighbouring triangles finds the furthest point towards the destination
//! that doesn't cross a boundary of the mesh.
//!
//! The walk only follows open edges whose nearest point lies within a circle centred halfway
//! between the start and end, with a radius of half the distance between them, so its cost is
//! bound by the length of the move rather than the size of the mesh.
//!
//! ```text
//!  _________________
//! |\       |\       |
//! |  \  s  |  \     |   e
//! |    \   |    \   |
//! |______\_|______\_|
//!                  ^
//!                  clamped here
//! ```
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Where a clamped move ends up
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClampResult {
	/// Triangle the agent now stands on
	pub node: NodeRef,
	/// The reachable position
	pub position: Vec3,
}

/// Reusable stack and closed list of the clamping walk. Not for concurrent use
#[derive(Clone, Debug, Default)]
pub struct ClampScratch {
	/// Triangles waiting to be inspected
	stack: Vec<NodeIndex>,
	/// Triangles already pushed
	closed: Vec<NodeIndex>,
}

impl ClampScratch {
	/// Create a new instance of [ClampScratch]
	pub fn new() -> Self {
		ClampScratch {
			stack: Vec::with_capacity(16),
			closed: Vec::with_capacity(32),
		}
	}
}

/// Move from `start_pos` on `start_node` towards `end_pos` without leaving the navmesh.
///
/// If the end is inside a triangle reached by the walk it is returned unchanged, otherwise the
/// result is the point on a blocking edge closest (on the XZ plane) to the end. When the start
/// node isn't part of a navmesh clamping isn't supported and the start is returned as is
pub fn clamp_along_navmesh(
	graphs: &NavGraphs,
	start_pos: Vec3,
	start_node: NodeRef,
	end_pos: Vec3,
	scratch: &mut ClampScratch,
) -> ClampResult {
	let unchanged = ClampResult {
		node: start_node,
		position: start_pos,
	};
	let Some(mesh) = graphs.as_navmesh(start_node.graph) else {
		return unchanged;
	};
	if mesh.get_node(start_node.node).is_none() {
		return unchanged;
	}
	let graph = start_node.graph;
	let start = start_pos.as_dvec3();
	let end = end_pos.as_dvec3();
	let search_center = (start + end) * 0.5;
	let search_radius = magnitude_xz(start, end) * 0.5;

	let mut best = unchanged;
	let mut best_dist = f64::INFINITY;

	scratch.stack.clear();
	scratch.closed.clear();
	scratch.stack.push(start_node.node);
	scratch.closed.push(start_node.node);

	while let Some(current) = scratch.stack.pop() {
		if mesh.contains_point(current, end_pos) {
			best = ClampResult {
				node: NodeRef::new(graph, current),
				position: end_pos,
			};
			break;
		}
		let Some(edges) = mesh.get_edges(current) else {
			continue;
		};
		for edge in edges {
			let (Some(a), Some(b)) = (mesh.get_vertex(edge.start), mesh.get_vertex(edge.end)) else {
				continue;
			};
			match edge.kind {
				EdgeKind::Blocking => {
					let p = nearest_point_strict_xz(a.to_dvec3(), b.to_dvec3(), end);
					let dist = magnitude_xz(p, end);
					if dist < best_dist {
						best_dist = dist;
						best = ClampResult {
							node: NodeRef::new(graph, current),
							position: p.as_vec3(),
						};
					}
				}
				EdgeKind::Open(neighbour) => {
					if neighbour.graph != graph || scratch.closed.contains(&neighbour.node) {
						continue;
					}
					let p = nearest_point_strict_xz(a.to_dvec3(), b.to_dvec3(), search_center);
					if magnitude_xz(p, search_center) <= search_radius {
						scratch.closed.push(neighbour.node);
						scratch.stack.push(neighbour.node);
					}
				}
			}
		}
	}
	best
}

/// Clamps the movement of an agent to the navmesh every frame. Remembers the triangle the agent
/// was last on so each clamp only needs a small local walk
#[derive(Component, Clone, Debug, Reflect)]
#[reflect(Component)]
pub struct NavmeshController {
	/// Factor applied to a movement direction before clamping. A small value decreases corner
	/// cutting, a large one takes edges further away into account
	forward_planning: f32,
	/// Triangle the agent was last clamped onto
	previous_node: Option<NodeRef>,
	/// Position the agent was last clamped to
	previous_position: Vec3,
	/// Revision of the graphs the previous node belongs to
	graphs_revision: u64,
	/// Walk state reused between clamps
	#[reflect(ignore)]
	scratch: ClampScratch,
}

impl Default for NavmeshController {
	fn default() -> Self {
		NavmeshController::new(NavMeshSettings::default().forward_planning)
	}
}

impl NavmeshController {
	/// Create a new instance of [NavmeshController]
	pub fn new(forward_planning: f32) -> Self {
		NavmeshController {
			forward_planning: forward_planning.max(MIN_FORWARD_PLANNING),
			previous_node: None,
			previous_position: Vec3::ZERO,
			graphs_revision: 0,
			scratch: ClampScratch::new(),
		}
	}
	/// Get the triangle the agent was last clamped onto
	pub fn get_current_node(&self) -> Option<NodeRef> {
		self.previous_node
	}
	/// Get the look-ahead factor
	pub fn get_forward_planning(&self) -> f32 {
		self.forward_planning
	}
	/// Set the look-ahead factor, it never drops below [MIN_FORWARD_PLANNING]
	pub fn set_forward_planning(&mut self, forward_planning: f32) {
		self.forward_planning = forward_planning.max(MIN_FORWARD_PLANNING);
	}
	/// Forget the current triangle, call after moving the agent by other means. The next clamp
	/// relocates the agent with a nearest node query
	pub fn teleport(&mut self) {
		self.previous_node = None;
	}
	/// Teleport if the graphs have been modified since the agent was last clamped
	pub fn sync_revision(&mut self, revision: u64) {
		if self.graphs_revision != revision {
			self.graphs_revision = revision;
			self.teleport();
		}
	}
	/// Clamp a move from the agent's position to `target`. `position` is only used to relocate
	/// the agent when it isn't known to be on a triangle, otherwise the walk starts from the
	/// previously clamped position
	pub fn clamp_to_navmesh(&mut self, graphs: &NavGraphs, position: Vec3, target: Vec3) -> Vec3 {
		let node = match self.previous_node {
			Some(node) => node,
			None => {
				let Some(nearest) = graphs.get_nearest(position) else {
					// nothing to stand on
					return target;
				};
				self.previous_position = position;
				nearest.node
			}
		};
		let result = clamp_along_navmesh(
			graphs,
			self.previous_position,
			node,
			target,
			&mut self.scratch,
		);
		self.previous_node = Some(result.node);
		self.previous_position = result.position;
		result.position
	}
	/// Clamp a movement direction, returns the direction that keeps the agent on the mesh
	pub fn clamp_move(&mut self, graphs: &NavGraphs, position: Vec3, direction: Vec3) -> Vec3 {
		let target = position + direction * self.forward_planning;
		let clamped = self.clamp_to_navmesh(graphs, position, target);
		(clamped - position) / self.forward_planning
	}
}
