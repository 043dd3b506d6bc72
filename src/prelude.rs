//! `use bevy_navmesh_funnel_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::navmesh::{
	clamp::*,
	error::*,
	funnel::*,
	graphs::{mesh::*, point::*, *},
	int3::*,
	modifiers::*,
	search::{astar::*, heap::*, *},
	utilities::*,
};

#[doc(hidden)]
pub use crate::{
	bundle::*,
	plugin::{agent_layer::*, graph_layer::*, path_layer::*, *},
};
