//! Useful structures and tools used by the graphs, searches and path modifiers
//!

use crate::prelude::*;
use bevy::math::DVec3;
use bevy::prelude::*;

/// Number of fixed-point units in a single world unit
pub const PRECISION: i32 = 1000;
/// A search heap growing beyond this many slots indicates a runaway search rather than a
/// legitimately large graph
pub const HEAP_SIZE_CEILING: usize = 1 << 18;
/// Default number of waypoints the funnel may emit before the walk is truncated
pub const MAX_FUNNEL_VERTICES: usize = 200;
/// Default initial slot count of a search heap
pub const DEFAULT_HEAP_SIZE: usize = 512;
/// Smallest look-ahead a [crate::prelude::NavmeshController] will use when clamping a move
pub const MIN_FORWARD_PLANNING: f32 = 0.01;

/// Estimate of the remaining cost from a node to the goal used to guide the A* search
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Reflect)]
pub enum Heuristic {
	/// Always zero, the search degrades to Dijkstra
	None,
	/// Sum of the absolute axis deltas
	Manhattan,
	/// Manhattan on the XZ plane where diagonal steps cost 1.4
	DiagonalManhattan,
	/// Straight line distance
	#[default]
	Euclidean,
}

impl Heuristic {
	/// Estimate the cost of moving from `position` to `target`, both in fixed-point units, scaled
	/// by `scale`
	pub fn estimate(&self, position: Int3, target: Int3, scale: f32) -> u32 {
		let scale = scale as f64;
		match self {
			Heuristic::None => 0,
			Heuristic::Euclidean => ((position - target).magnitude() * scale).round() as u32,
			Heuristic::Manhattan => {
				let d = (position.x - target.x).unsigned_abs() as f64
					+ (position.y - target.y).unsigned_abs() as f64
					+ (position.z - target.z).unsigned_abs() as f64;
				(d * scale).round() as u32
			}
			Heuristic::DiagonalManhattan => {
				let x_distance = (position.x - target.x).unsigned_abs() as u64;
				let z_distance = (position.z - target.z).unsigned_abs() as u64;
				let h = if x_distance > z_distance {
					(14 * z_distance + 10 * (x_distance - z_distance)) / 10
				} else {
					(14 * x_distance + 10 * (z_distance - x_distance)) / 10
				};
				(h as f64 * scale).round() as u32
			}
		}
	}
}

/// Twice the signed area of the triangle `abc` projected onto the XZ plane. Negative when the
/// points wind clockwise
pub fn triangle_area2(a: Vec3, b: Vec3, c: Vec3) -> f64 {
	let (ax, az) = (a.x as f64, a.z as f64);
	let (bx, bz) = (b.x as f64, b.z as f64);
	let (cx, cz) = (c.x as f64, c.z as f64);
	(bx - ax) * (cz - az) - (cx - ax) * (bz - az)
}

/// Fixed-point flavour of [triangle_area2], exact
pub fn triangle_area2_int(a: Int3, b: Int3, c: Int3) -> i64 {
	(b.x as i64 - a.x as i64) * (c.z as i64 - a.z as i64)
		- (c.x as i64 - a.x as i64) * (b.z as i64 - a.z as i64)
}

/// Whether `abc` winds clockwise on the XZ plane
pub fn is_clockwise(a: Vec3, b: Vec3, c: Vec3) -> bool {
	triangle_area2(a, b, c) < 0.0
}

/// Whether `abc` winds clockwise on the XZ plane
pub fn is_clockwise_int(a: Int3, b: Int3, c: Int3) -> bool {
	triangle_area2_int(a, b, c) < 0
}

/// Whether `abc` winds clockwise or is degenerate. Used for containment tests so that points on
/// an edge count as inside
pub fn is_clockwise_margin(a: Int3, b: Int3, c: Int3) -> bool {
	triangle_area2_int(a, b, c) <= 0
}

/// Whether the segments `a1 -> a2` and `b1 -> b2` cross on the XZ plane, touching at an end
/// counts. Parallel segments never intersect
pub fn segments_intersect_xz(a1: Int3, a2: Int3, b1: Int3, b2: Int3) -> bool {
	let (d1x, d1z) = (a2.x as i128 - a1.x as i128, a2.z as i128 - a1.z as i128);
	let (d2x, d2z) = (b2.x as i128 - b1.x as i128, b2.z as i128 - b1.z as i128);
	let den = d2z * d1x - d2x * d1z;
	if den == 0 {
		return false;
	}
	let (ox, oz) = (a1.x as i128 - b1.x as i128, a1.z as i128 - b1.z as i128);
	// fractions along each segment, kept as numerators over `den`
	let u = d2x * oz - d2z * ox;
	let v = d1x * oz - d1z * ox;
	let within = |n: i128| if den > 0 { 0 <= n && n <= den } else { den <= n && n <= 0 };
	within(u) && within(v)
}

/// Whether the three points lie on a single line in the XZ plane
pub fn is_colinear(a: Vec3, b: Vec3, c: Vec3) -> bool {
	triangle_area2(a, b, c).abs() <= f64::EPSILON
}

/// Whether `p` lies to the left of the directed line `a -> b` on the XZ plane (or on it)
pub fn is_left(a: Vec3, b: Vec3, p: Vec3) -> bool {
	triangle_area2(a, b, p) <= 0.0
}

/// Distance between two points ignoring the vertical axis
pub fn magnitude_xz(a: DVec3, b: DVec3) -> f64 {
	let dx = b.x - a.x;
	let dz = b.z - a.z;
	(dx * dx + dz * dz).sqrt()
}

/// Nearest point to `point` on the segment `line_start -> line_end` measured only on the XZ
/// plane. The returned point takes the height of `point`
pub fn nearest_point_strict_xz(line_start: DVec3, line_end: DVec3, point: DVec3) -> DVec3 {
	let mut start = line_start;
	let mut end = line_end;
	start.y = point.y;
	end.y = point.y;
	let full_direction = end - start;
	let length = full_direction.length();
	if length == 0.0 {
		return start;
	}
	let direction = full_direction / length;
	let t = (point - start).dot(direction).clamp(0.0, length);
	start + direction * t
}

/// Closest point to `p` on (or inside) the triangle `abc`
pub fn closest_point_on_triangle(a: DVec3, b: DVec3, c: DVec3, p: DVec3) -> DVec3 {
	let ab = b - a;
	let ac = c - a;
	let ap = p - a;
	let d1 = ab.dot(ap);
	let d2 = ac.dot(ap);
	// vertex region of a
	if d1 <= 0.0 && d2 <= 0.0 {
		return a;
	}
	let bp = p - b;
	let d3 = ab.dot(bp);
	let d4 = ac.dot(bp);
	// vertex region of b
	if d3 >= 0.0 && d4 <= d3 {
		return b;
	}
	let vc = d1 * d4 - d3 * d2;
	// edge region of ab
	if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
		let v = d1 / (d1 - d3);
		return a + ab * v;
	}
	let cp = p - c;
	let d5 = ab.dot(cp);
	let d6 = ac.dot(cp);
	// vertex region of c
	if d6 >= 0.0 && d5 <= d6 {
		return c;
	}
	let vb = d5 * d2 - d1 * d6;
	// edge region of ac
	if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
		let w = d2 / (d2 - d6);
		return a + ac * w;
	}
	let va = d3 * d6 - d5 * d4;
	// edge region of bc
	if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
		let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
		return b + (c - b) * w;
	}
	// inside the face
	let denom = 1.0 / (va + vb + vc);
	let v = vb * denom;
	let w = vc * denom;
	a + ab * v + ac * w
}

/// Sum of the distances between consecutive points
pub fn path_length(points: &[Vec3]) -> f32 {
	points.windows(2).map(|w| w[0].distance(w[1])).sum()
}
