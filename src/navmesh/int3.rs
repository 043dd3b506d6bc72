//! A fixed-point 3d coordinate used for all mesh geometry.
//!
//! World positions are quantised to [PRECISION] units per world unit (millimetres when a unit is a
//! meter) so that point-in-triangle and edge comparisons are exact and don't drift as a mesh is
//! built, queried or serialised. Magnitudes are always computed with `f64` intermediates as the
//! squared length of a large coordinate easily exceeds the range of an `i32`.
//!

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::prelude::*;
use bevy::math::DVec3;
use bevy::prelude::*;

/// A position in world space stored as integers at a fixed precision
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Reflect)]
pub struct Int3 {
	/// X coordinate in fixed-point units
	pub x: i32,
	/// Y coordinate in fixed-point units
	pub y: i32,
	/// Z coordinate in fixed-point units
	pub z: i32,
}

impl Int3 {
	/// The origin
	pub const ZERO: Int3 = Int3 { x: 0, y: 0, z: 0 };
	/// Create a new instance of [Int3] from raw fixed-point components
	pub const fn new(x: i32, y: i32, z: i32) -> Self {
		Int3 { x, y, z }
	}
	/// Quantise a world position, rounding each axis to the nearest fixed-point unit
	pub fn from_vec3(v: Vec3) -> Self {
		let p = PRECISION as f64;
		Int3 {
			x: (v.x as f64 * p).round() as i32,
			y: (v.y as f64 * p).round() as i32,
			z: (v.z as f64 * p).round() as i32,
		}
	}
	/// Convert back into world space
	pub fn to_vec3(self) -> Vec3 {
		self.to_dvec3().as_vec3()
	}
	/// Convert back into world space at double precision
	pub fn to_dvec3(self) -> DVec3 {
		let p = PRECISION as f64;
		DVec3::new(self.x as f64 / p, self.y as f64 / p, self.z as f64 / p)
	}
	/// Dot product of two coordinates, widened so it can't overflow
	pub fn dot(self, other: Int3) -> i64 {
		self.x as i64 * other.x as i64 + self.y as i64 * other.y as i64 + self.z as i64 * other.z as i64
	}
	/// Squared length in fixed-point units
	pub fn sqr_magnitude(self) -> f64 {
		let x = self.x as f64;
		let y = self.y as f64;
		let z = self.z as f64;
		x * x + y * y + z * z
	}
	/// Length in fixed-point units
	pub fn magnitude(self) -> f64 {
		self.sqr_magnitude().sqrt()
	}
	/// Length in fixed-point units rounded to an integer, this is the traversal cost of an edge
	/// spanning this vector
	pub fn cost_magnitude(self) -> u32 {
		self.magnitude().round() as u32
	}
	/// Length in world units
	pub fn world_magnitude(self) -> f32 {
		(self.magnitude() / PRECISION as f64) as f32
	}
	/// Squared length computed purely with `i32` arithmetic. Wraps around for coordinates
	/// further than ~46 world units from the origin, only use it on small deltas
	pub fn unsafe_sqr_magnitude(self) -> i32 {
		self.x
			.wrapping_mul(self.x)
			.wrapping_add(self.y.wrapping_mul(self.y))
			.wrapping_add(self.z.wrapping_mul(self.z))
	}
	/// Mean of three positions. Summed in `i64` as three coordinates a little over 715 world
	/// units from the origin already exceed an `i32` when added together
	pub fn centroid(a: Int3, b: Int3, c: Int3) -> Self {
		let mean = |a: i32, b: i32, c: i32| ((a as i64 + b as i64 + c as i64) as f64 / 3.0).round() as i32;
		Int3 {
			x: mean(a.x, b.x, c.x),
			y: mean(a.y, b.y, c.y),
			z: mean(a.z, b.z, c.z),
		}
	}
	/// Scale the vector so that its length in fixed-point units becomes `magnitude`. A zero vector
	/// is returned unchanged
	pub fn normalize_to(self, magnitude: f32) -> Self {
		let current = self.magnitude();
		if current == 0.0 {
			return self;
		}
		let scale = magnitude as f64 / current;
		Int3 {
			x: (self.x as f64 * scale).round() as i32,
			y: (self.y as f64 * scale).round() as i32,
			z: (self.z as f64 * scale).round() as i32,
		}
	}
}

impl From<Vec3> for Int3 {
	fn from(v: Vec3) -> Self {
		Int3::from_vec3(v)
	}
}

impl From<Int3> for Vec3 {
	fn from(v: Int3) -> Self {
		v.to_vec3()
	}
}

impl Add for Int3 {
	type Output = Int3;
	fn add(self, rhs: Int3) -> Int3 {
		Int3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
	}
}

impl Sub for Int3 {
	type Output = Int3;
	fn sub(self, rhs: Int3) -> Int3 {
		Int3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
	}
}

impl Neg for Int3 {
	type Output = Int3;
	fn neg(self) -> Int3 {
		Int3::new(-self.x, -self.y, -self.z)
	}
}

impl Mul<i32> for Int3 {
	type Output = Int3;
	fn mul(self, rhs: i32) -> Int3 {
		Int3::new(self.x * rhs, self.y * rhs, self.z * rhs)
	}
}

impl Mul<f32> for Int3 {
	type Output = Int3;
	fn mul(self, rhs: f32) -> Int3 {
		let r = rhs as f64;
		Int3::new(
			(self.x as f64 * r).round() as i32,
			(self.y as f64 * r).round() as i32,
			(self.z as f64 * r).round() as i32,
		)
	}
}

impl Div<f32> for Int3 {
	type Output = Int3;
	fn div(self, rhs: f32) -> Int3 {
		let r = rhs as f64;
		Int3::new(
			(self.x as f64 / r).round() as i32,
			(self.y as f64 / r).round() as i32,
			(self.z as f64 / r).round() as i32,
		)
	}
}
