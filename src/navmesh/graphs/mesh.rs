//! A [NavMesh] is a triangulated walkable surface. Vertices are shared between triangles so two
//! neighbours reference the exact same vertex indices along the edge they share, which is how
//! adjacency and portals are discovered.
//!
//! ```text
//!  v3 _______ v2
//!    |\      |
//!    |  \  1 |
//!    | 0  \  |
//!    |______\|
//!  v0        v1
//! ```
//!
//! Every triangle is stored wound clockwise on the XZ plane.
//!

use std::collections::HashMap;

use crate::prelude::*;
use bevy::prelude::*;

/// Classification of one directed edge of a triangle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
	/// No neighbour shares the edge, it is the boundary of the mesh
	Blocking,
	/// The neighbour sharing the edge
	Open(NodeRef),
}

/// A directed edge of a triangle between two vertex indices
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshEdge {
	/// Vertex index the edge starts at
	pub start: usize,
	/// Vertex index the edge ends at
	pub end: usize,
	/// Whether the edge can be crossed
	pub kind: EdgeKind,
}

/// A triangulated navigation mesh
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, Default)]
pub struct NavMesh {
	/// Index of this graph within [NavGraphs]
	graph: GraphIndex,
	/// De-duplicated vertex positions shared by all triangles
	vertices: Vec<Int3>,
	/// One node per triangle
	nodes: Vec<GraphNode>,
}

impl NavMesh {
	/// Build a mesh from world space vertices and a triangle list (three indices per triangle).
	///
	/// Vertices are quantised and merged so coincident positions become a single vertex,
	/// triangles are re-wound clockwise and any two triangles sharing an edge are connected with
	/// a cost of the distance between their centroids
	pub fn from_triangles(vertices: &[Vec3], triangles: &[usize]) -> Result<Self, NavMeshError> {
		if triangles.len() % 3 != 0 {
			return Err(NavMeshError::InvalidTriangleList {
				len: triangles.len(),
			});
		}
		// merge coincident vertices
		let mut lookup: HashMap<Int3, usize> = HashMap::new();
		let mut merged: Vec<Int3> = Vec::new();
		let mut remap = Vec::with_capacity(vertices.len());
		for v in vertices {
			let p = Int3::from_vec3(*v);
			let index = *lookup.entry(p).or_insert_with(|| {
				merged.push(p);
				merged.len() - 1
			});
			remap.push(index);
		}
		let mut nodes = Vec::with_capacity(triangles.len() / 3);
		for (i, tri) in triangles.chunks(3).enumerate() {
			let mut v = [0; 3];
			for (slot, index) in v.iter_mut().zip(tri) {
				*slot = *remap.get(*index).ok_or(NavMeshError::VertexOutOfRange {
					index: *index,
					vertex_count: vertices.len(),
				})?;
			}
			if !is_clockwise_int(merged[v[0]], merged[v[1]], merged[v[2]]) {
				v.swap(0, 2);
			}
			let centroid = Int3::centroid(merged[v[0]], merged[v[1]], merged[v[2]]);
			nodes.push(GraphNode::new(i, 0, centroid, Some(v)));
		}
		let mut mesh = NavMesh {
			graph: 0,
			vertices: merged,
			nodes,
		};
		mesh.connect_shared_edges();
		Ok(mesh)
	}
	/// Build a mesh from a bevy [Mesh] using a `TriangleList` topology. Vertex positions are
	/// offset by `translation`
	pub fn from_bevy_mesh(mesh: &Mesh, translation: Vec3) -> Result<Self, NavMeshError> {
		use bevy::render::mesh::PrimitiveTopology;
		if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
			return Err(NavMeshError::UnsupportedMesh(
				"only TriangleList topology is supported",
			));
		}
		let positions = mesh
			.attribute(Mesh::ATTRIBUTE_POSITION)
			.and_then(|a| a.as_float3())
			.ok_or(NavMeshError::UnsupportedMesh(
				"mesh has no Float32x3 position attribute",
			))?;
		let vertices: Vec<Vec3> = positions
			.iter()
			.map(|p| Vec3::from_array(*p) + translation)
			.collect();
		let triangles: Vec<usize> = match mesh.indices() {
			Some(indices) => indices.iter().collect(),
			None => (0..vertices.len()).collect(),
		};
		NavMesh::from_triangles(&vertices, &triangles)
	}
	/// Connect every pair of triangles sharing exactly two vertices
	fn connect_shared_edges(&mut self) {
		let mut edge_owners: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
		let mut seen: HashMap<[usize; 3], usize> = HashMap::new();
		for node in &self.nodes {
			let Some(v) = node.get_vertices() else {
				continue;
			};
			let mut sorted = v;
			sorted.sort_unstable();
			if let Some(original) = seen.get(&sorted) {
				warn!(
					"Triangle {} is identical to triangle {}, they will not be connected",
					node.get_index(),
					original
				);
			} else {
				seen.insert(sorted, node.get_index());
			}
			for (a, b) in [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])] {
				edge_owners
					.entry((a.min(b), a.max(b)))
					.or_default()
					.push(node.get_index());
			}
		}
		for i in 0..self.nodes.len() {
			let Some(v) = self.nodes[i].get_vertices() else {
				continue;
			};
			let mut neighbours: Vec<usize> = Vec::new();
			for (a, b) in [(v[0], v[1]), (v[1], v[2]), (v[2], v[0])] {
				if let Some(owners) = edge_owners.get(&(a.min(b), a.max(b))) {
					neighbours.extend(owners.iter().filter(|n| **n != i));
				}
			}
			neighbours.sort_unstable();
			neighbours.dedup();
			for n in neighbours {
				// identical triangles share all three edges
				if self.shared_vertex_count(i, n) != 2 {
					continue;
				}
				let cost = (self.nodes[i].get_position() - self.nodes[n].get_position()).cost_magnitude();
				let to = NodeRef::new(self.graph, n);
				self.nodes[i].add_connection(to, cost);
			}
		}
	}
	/// Number of vertex indices two triangles have in common
	fn shared_vertex_count(&self, a: NodeIndex, b: NodeIndex) -> usize {
		match (self.nodes[a].get_vertices(), self.nodes[b].get_vertices()) {
			(Some(va), Some(vb)) => va.iter().filter(|v| vb.contains(v)).count(),
			_ => 0,
		}
	}
	/// Get the index of this graph
	pub fn get_graph_index(&self) -> GraphIndex {
		self.graph
	}
	/// Set the index of this graph
	pub(crate) fn set_graph_index(&mut self, graph: GraphIndex) {
		self.graph = graph;
	}
	/// Get the shared vertex array
	pub fn get_vertices(&self) -> &[Int3] {
		&self.vertices
	}
	/// Get a vertex by index
	pub fn get_vertex(&self, index: usize) -> Option<Int3> {
		self.vertices.get(index).copied()
	}
	/// Get the triangles
	pub fn get_nodes(&self) -> &[GraphNode] {
		&self.nodes
	}
	/// Get mutable access to the triangles
	pub(crate) fn get_nodes_mut(&mut self) -> &mut [GraphNode] {
		&mut self.nodes
	}
	/// Get a triangle
	pub fn get_node(&self, index: NodeIndex) -> Option<&GraphNode> {
		self.nodes.get(index)
	}
	/// The three corner positions of a triangle in clockwise order
	pub fn get_node_corners(&self, index: NodeIndex) -> Option<[Int3; 3]> {
		let v = self.nodes.get(index)?.get_vertices()?;
		Some([self.vertices[v[0]], self.vertices[v[1]], self.vertices[v[2]]])
	}
	/// Whether `point` lies within a triangle on the XZ plane, points on an edge count as inside
	pub fn contains_point(&self, index: NodeIndex, point: Vec3) -> bool {
		let Some([a, b, c]) = self.get_node_corners(index) else {
			return false;
		};
		let p = Int3::from_vec3(point);
		is_clockwise_margin(a, b, p) && is_clockwise_margin(b, c, p) && is_clockwise_margin(c, a, p)
	}
	/// Closest point to `point` on the surface of a triangle
	pub fn closest_point_on_node(&self, index: NodeIndex, point: Vec3) -> Option<Vec3> {
		let [a, b, c] = self.get_node_corners(index)?;
		let p = closest_point_on_triangle(a.to_dvec3(), b.to_dvec3(), c.to_dvec3(), point.as_dvec3());
		Some(p.as_vec3())
	}
	/// The three directed edges of a triangle, each classified as blocking or open by scanning
	/// the triangle's connections for a neighbour holding both vertices of the edge
	pub fn get_edges(&self, index: NodeIndex) -> Option<[MeshEdge; 3]> {
		let node = self.nodes.get(index)?;
		let v = node.get_vertices()?;
		let mut edges = [MeshEdge {
			start: 0,
			end: 0,
			kind: EdgeKind::Blocking,
		}; 3];
		for (edge, (i, j)) in edges.iter_mut().zip([(0, 2), (1, 0), (2, 1)]) {
			let start = v[j];
			let end = v[i];
			let mut kind = EdgeKind::Blocking;
			for c in node.get_connections() {
				if c.graph != self.graph {
					continue;
				}
				let Some(other) = self.nodes.get(c.node).and_then(|n| n.get_vertices()) else {
					continue;
				};
				if other.contains(&start) && other.contains(&end) {
					kind = EdgeKind::Open(*c);
					break;
				}
			}
			*edge = MeshEdge { start, end, kind };
		}
		Some(edges)
	}
	/// The two vertex indices shared by a pair of triangles, ordered as they appear in `a`
	pub fn get_shared_edge(&self, a: NodeIndex, b: NodeIndex) -> Option<(usize, usize)> {
		let va = self.nodes.get(a)?.get_vertices()?;
		let vb = self.nodes.get(b)?.get_vertices()?;
		let mut shared = va.iter().filter(|v| vb.contains(v));
		let first = *shared.next()?;
		let second = *shared.next()?;
		Some((first, second))
	}
	/// Triangles overlapping the rectangle `min..=max` on the XZ plane. A triangle overlaps when
	/// one of its corners lies in the rectangle, one of its edges crosses a side of the
	/// rectangle or the rectangle sits entirely inside it
	pub fn get_nodes_in_area(&self, min: Int3, max: Int3) -> Vec<NodeIndex> {
		let in_rect = |p: Int3| min.x <= p.x && p.x <= max.x && min.z <= p.z && p.z <= max.z;
		let a = Int3::new(min.x, 0, min.z);
		let b = Int3::new(min.x, 0, max.z);
		let c = Int3::new(max.x, 0, min.z);
		let d = Int3::new(max.x, 0, max.z);
		let sides = [(a, b), (a, c), (c, d), (d, b)];
		let mut found = Vec::new();
		for node in &self.nodes {
			let index = node.get_index();
			let Some(corners) = self.get_node_corners(index) else {
				continue;
			};
			if corners.iter().any(|p| in_rect(*p)) {
				found.push(index);
				continue;
			}
			// entirely to one side of the rectangle
			if corners.iter().all(|p| p.x < min.x)
				|| corners.iter().all(|p| p.x > max.x)
				|| corners.iter().all(|p| p.z < min.z)
				|| corners.iter().all(|p| p.z > max.z)
			{
				continue;
			}
			let crosses = (0..3).any(|i| {
				let (s, e) = (corners[i], corners[(i + 1) % 3]);
				sides.iter().any(|(r1, r2)| segments_intersect_xz(s, e, *r1, *r2))
			});
			let [t0, t1, t2] = corners;
			let encloses = [a, b, c, d].iter().any(|r| {
				is_clockwise_margin(t0, t1, *r) && is_clockwise_margin(t1, t2, *r) && is_clockwise_margin(t2, t0, *r)
			});
			if crosses || encloses {
				found.push(index);
			}
		}
		found
	}
	/// Find the walkable triangle nearest to `position`. Triangles containing the position on
	/// the XZ plane are preferred (the one vertically closest), otherwise the triangle with the
	/// closest centroid is used. The position is then clamped onto the triangle
	pub fn get_nearest(&self, position: Vec3) -> Option<NearestNode> {
		let p = Int3::from_vec3(position);
		let mut best: Option<(usize, bool, f64)> = None;
		for node in self.nodes.iter().filter(|n| n.is_walkable()) {
			let index = node.get_index();
			let inside = self.contains_point(index, position);
			let dist = if inside {
				(node.get_position().y - p.y).unsigned_abs() as f64
			} else {
				(node.get_position() - p).sqr_magnitude()
			};
			let better = match best {
				None => true,
				Some((_, best_inside, best_dist)) => {
					(inside && !best_inside) || (inside == best_inside && dist < best_dist)
				}
			};
			if better {
				best = Some((index, inside, dist));
			}
		}
		let (index, _, _) = best?;
		Some(NearestNode {
			node: NodeRef::new(self.graph, index),
			clamped_position: self.closest_point_on_node(index, position)?,
		})
	}
}

/// A mesh of unit cells at `(x, z)`, each split into the triangles `(a, b, c)` and `(a, c, d)`
/// where `a` is the cell's minimum corner and the corners run anticlockwise. Cell `i` owns nodes
/// `2i` and `2i + 1`
#[cfg(test)]
pub(crate) fn cells_mesh(cells: &[(i32, i32)]) -> NavMesh {
	let mut vertices = Vec::new();
	let mut triangles = Vec::new();
	for (x, z) in cells {
		let (x, z) = (*x as f32, *z as f32);
		let base = vertices.len();
		vertices.push(Vec3::new(x, 0.0, z));
		vertices.push(Vec3::new(x + 1.0, 0.0, z));
		vertices.push(Vec3::new(x + 1.0, 0.0, z + 1.0));
		vertices.push(Vec3::new(x, 0.0, z + 1.0));
		triangles.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
	}
	NavMesh::from_triangles(&vertices, &triangles).unwrap()
}
