//! Navigation meshes are a means of describing the walkable surface of a world as a series of
//! connected convex polygons (triangles).
//!
//! [Simple Stupid Funnel Algorithm](http://digestingduck.blogspot.com/2010/03/simple-stupid-funnel-algorithm.html)
//!
//! [Amit's A* Pages](http://theory.stanford.edu/~amitp/GameProgramming/)
//!
//! A path is found in three stages:
//!
//! 1. A coarse route of triangles is found with A* over the node graph, ordering the open list with a binary [search::heap::PathHeap]
//! 2. The route is converted into a corridor of "portals", the edges shared between consecutive triangles
//! 3. The corridor is pulled taut with the funnel algorithm to produce the final list of waypoints
//!
//! At runtime an agent moving freely has its desired movement clamped against the mesh so that it
//! never walks off the edge of a triangle into the void.
//!
//! Definitions:
//!
//! * Node - a triangle of the mesh (or a bare point of a [graphs::point::PointGraph]), referenced by a [graphs::NodeRef]
//! * Portal - an edge shared by two neighbouring triangles
//! * Blocking edge - an edge of a triangle with no neighbour across it, the boundary of the mesh
//! * Apex - the last committed waypoint of the funnel from which the current portal sides are measured
//!
//! ```text
//!  ___________
//! |\    |\    |
//! |  \  |  \  |
//! |____\|____\|
//! |\    |\    |
//! |  \  |  \  |
//! |____\|____\|
//! ```
//!
//! All positions stored in a mesh are fixed-point [int3::Int3] values with a precision of
//! [utilities::PRECISION] units per world unit so that spatial queries never drift.
//!

pub mod clamp;
pub mod error;
pub mod funnel;
pub mod graphs;
pub mod int3;
pub mod modifiers;
pub mod search;
pub mod utilities;
