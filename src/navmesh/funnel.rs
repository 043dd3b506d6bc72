//! Pulling a coarse route of triangles taut.
//!
//! The triangles of a route form a corridor, each pair of consecutive triangles shares an edge
//! (a portal) with one vertex on the left of the corridor and one on the right. The funnel walks
//! the portals keeping an apex and the narrowest left and right sightlines seen so far. When a
//! new portal would cross one sightline over the other the crossed side becomes a corner of the
//! path, the apex moves onto it and the walk restarts from there.
//!
//! ```text
//!          left[i]
//!    apex ------------ x
//!        \           /
//!         \  funnel /
//!          \       /
//!           right[i]
//! ```
//!
//! Degenerate corridors (too short, zero width, or whose sides can't be told apart) are not
//! errors, they fall back to a straight line between the ends of the corridor.
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Walk consecutive triangles of a route appending one point per shared edge to each side of the
/// corridor. Which shared vertex goes to which side is kept consistent with the previous portal
/// where possible, [run_funnel] fixes the labelling if the whole corridor ended up mirrored.
/// Triangles that don't share an edge contribute both of their centroids to both sides
pub fn build_funnel_corridor(
	mesh: &NavMesh,
	nodes: &[NodeRef],
	left: &mut Vec<Vec3>,
	right: &mut Vec<Vec3>,
) {
	let mut last_left: Option<usize> = None;
	let mut last_right: Option<usize> = None;
	for pair in nodes.windows(2) {
		let (n1, n2) = (pair[0].node, pair[1].node);
		match mesh.get_shared_edge(n1, n2) {
			Some((first, second)) => {
				let (l, r) = if Some(first) == last_left {
					(first, second)
				} else if Some(first) == last_right {
					(second, first)
				} else if Some(second) == last_left {
					(second, first)
				} else {
					(first, second)
				};
				let (Some(lv), Some(rv)) = (mesh.get_vertex(l), mesh.get_vertex(r)) else {
					continue;
				};
				left.push(lv.to_vec3());
				right.push(rv.to_vec3());
				last_left = Some(l);
				last_right = Some(r);
			}
			None => {
				for n in [n1, n2] {
					if let Some(node) = mesh.get_node(n) {
						let p = node.get_position().to_vec3();
						left.push(p);
						right.push(p);
					}
				}
				last_left = None;
				last_right = None;
			}
		}
	}
}

/// Which point decides the true orientation of the first portal
fn side_witness(left: &[Vec3], right: &[Vec3]) -> Vec3 {
	if left[2] == left[1] {
		right[2]
	} else {
		left[2]
	}
}

/// Run the funnel over a corridor whose first and last entries are the start and end of the path.
///
/// Returns `None` when the corridor is too short or its orientation can't be resolved, the
/// caller should then use a straight line from start to end. At most `max_vertices` corners are
/// emitted, a walk needing more is truncated with a warning
pub fn run_funnel(left: &[Vec3], right: &[Vec3], max_vertices: usize) -> Option<Vec<Vec3>> {
	if left.len() != right.len() || left.len() <= 3 {
		return None;
	}
	let mut left = left.to_vec();
	let mut right = right.to_vec();

	// zero width portals break the side tests below
	while left[1] == left[2] && right[1] == right[2] {
		left.remove(1);
		right.remove(1);
		if left.len() <= 3 {
			return None;
		}
	}

	let mut witness = side_witness(&left, &right);
	while is_colinear(left[0], left[1], right[1])
		|| is_left(left[1], right[1], witness) == is_left(left[1], right[1], left[0])
	{
		left.remove(1);
		right.remove(1);
		if left.len() <= 3 {
			return None;
		}
		witness = side_witness(&left, &right);
	}

	if !is_clockwise(left[0], left[1], right[1]) && !is_colinear(left[0], left[1], right[1]) {
		std::mem::swap(&mut left, &mut right);
	}

	let mut path = vec![left[0]];
	let mut apex = left[0];
	let mut portal_left = left[1];
	let mut portal_right = right[1];
	let mut left_index = 1;
	let mut right_index = 1;

	let mut i = 2;
	while i < left.len() {
		if path.len() > max_vertices {
			warn!(
				"Funnel exceeded {} vertices, truncating the path",
				max_vertices
			);
			break;
		}
		let new_left = left[i];
		let new_right = right[i];

		if triangle_area2(apex, portal_right, new_right) >= 0.0 {
			if apex == portal_right || triangle_area2(apex, portal_left, new_right) <= 0.0 {
				portal_right = new_right;
				right_index = i;
			} else {
				// right crossed over left, the left portal is a corner
				path.push(portal_left);
				apex = portal_left;
				let apex_index = left_index;
				portal_right = apex;
				left_index = apex_index;
				right_index = apex_index;
				i = apex_index + 1;
				continue;
			}
		}

		if triangle_area2(apex, portal_left, new_left) <= 0.0 {
			if apex == portal_left || triangle_area2(apex, portal_right, new_left) >= 0.0 {
				portal_left = new_left;
				left_index = i;
			} else {
				path.push(portal_right);
				apex = portal_right;
				let apex_index = right_index;
				portal_left = apex;
				left_index = apex_index;
				right_index = apex_index;
				i = apex_index + 1;
				continue;
			}
		}
		i += 1;
	}

	path.push(left[left.len() - 1]);
	Some(path)
}

/// Funnel the nodes `start..=end` of a path segment onto the end of `out`
fn construct_funnel(
	mesh: &NavMesh,
	nodes: &[NodeRef],
	vector_path: &[Vec3],
	start: usize,
	end: usize,
	max_vertices: usize,
	out: &mut Vec<Vec3>,
) {
	let mut left = vec![vector_path[start]];
	let mut right = vec![vector_path[start]];
	build_funnel_corridor(mesh, &nodes[start..=end], &mut left, &mut right);
	left.push(vector_path[end]);
	right.push(vector_path[end]);
	match run_funnel(&left, &right, max_vertices) {
		Some(points) => out.extend(points),
		None => {
			out.push(vector_path[start]);
			out.push(vector_path[end]);
		}
	}
}

/// Replaces the waypoints of a path with the funnelled route through its corridor
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Reflect)]
pub struct FunnelModifier {
	/// Ceiling on the corners a single funnel walk may emit
	max_vertices: usize,
}

impl Default for FunnelModifier {
	fn default() -> Self {
		FunnelModifier {
			max_vertices: MAX_FUNNEL_VERTICES,
		}
	}
}

impl FunnelModifier {
	/// Create a new instance of [FunnelModifier]
	pub fn new(max_vertices: usize) -> Self {
		FunnelModifier { max_vertices }
	}
	/// Funnel a path.
	///
	/// The path is split into runs of consecutive nodes from the same graph. Runs on a navmesh
	/// are funnelled independently, runs on graphs without polygons keep their waypoints. The
	/// node list and waypoint list must line up one to one, except for a path within a single
	/// node which is already straight and returned unchanged
	pub fn funnel(&self, graphs: &NavGraphs, path: &NavPath) -> Result<NavPath, NavMeshError> {
		let nodes = path.get_nodes();
		let vector_path = path.get_vector_path();
		if nodes.len() < 2 {
			return Ok(path.clone());
		}
		if nodes.len() != vector_path.len() {
			return Err(NavMeshError::MismatchedPathLengths {
				nodes: nodes.len(),
				positions: vector_path.len(),
			});
		}
		let mut out = Vec::with_capacity(vector_path.len());
		let mut segment_start = 0;
		for i in 1..=nodes.len() {
			if i < nodes.len() && nodes[i].graph == nodes[segment_start].graph {
				continue;
			}
			let segment_end = i - 1;
			match graphs.as_navmesh(nodes[segment_start].graph) {
				Some(mesh) if segment_end > segment_start => construct_funnel(
					mesh,
					nodes,
					vector_path,
					segment_start,
					segment_end,
					self.max_vertices,
					&mut out,
				),
				_ => out.extend_from_slice(&vector_path[segment_start..=segment_end]),
			}
			segment_start = i;
		}
		Ok(path.with_vector_path(out))
	}
}

impl PathModifier for FunnelModifier {
	fn apply(&self, graphs: &NavGraphs, path: &NavPath) -> Result<NavPath, NavMeshError> {
		self.funnel(graphs, path)
	}
}
