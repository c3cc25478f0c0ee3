//! Tilegrid – discrete rigid-body physics for tile grids.
//!
//! Grids are rectangular arrays of square and wedge tiles that move in whole
//! pixels. Each tick converts velocities to pixel deltas, sweeps grids one
//! pixel at a time against an exact point-sampled hitbox, untangles circular
//! obstructions with a bounded search, and exchanges velocity between grids
//! left touching.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::{IVec2, Vec2};

pub use collision::broadphase::{AabbTree, NodeId};
pub use config::{PhysicsConfig, HIGH_RES_FACTOR, TILE_SIZE, TILE_SIZE_HIGH_RES};
pub use core::{
    grid::{Grid, RegionEditor},
    tile::{Tile, TileInfo, TileLayer},
    types::{Aabb, Xf},
};
pub use error::{GridError, Result};
pub use utils::allocator::GridId;
pub use world::{GridManager, GridObject};
