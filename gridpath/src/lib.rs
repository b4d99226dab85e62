//! Shortest paths over rectangular terrain grids.
//!
//! A [`Field`] holds the terrain, [`find_path`] runs a best-first search from a start to a goal
//! cell moving in eight directions. Diagonal moves are only allowed when neither of the two
//! orthogonal cells beside them is a wall.

pub mod config;
pub mod cost;
pub mod error;
pub mod find;
pub mod grid;
pub mod render;
pub mod util;

pub use config::{Policy, SearchConfig};
pub use cost::{CostModel, Heuristic, Step};
pub use error::{GridError, Result};
pub use find::{
    find_path, reconstruct_path, MapStorage, MapTrait, NodeReference, NodeStatus, PathFinder,
    PathFinderState, PathResult, SearchNode, SearchStorage,
};
pub use grid::{Cell, CellStorage, Direction, Field, Neighbor, Point, Terrain};
pub use render::PathOverlay;
