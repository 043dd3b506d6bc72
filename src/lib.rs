//! This is a plugin for Bevy game engine to find paths across navigation meshes, smooth them
//! with a funnel and keep agents on the walkable surface
//!

pub mod bundle;
pub mod navmesh;
pub mod plugin;

pub mod prelude;
