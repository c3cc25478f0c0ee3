//! Core data: transforms, tile kinds, and the tile grid itself.

pub mod grid;
pub mod tile;
pub mod types;

pub use grid::{Grid, HitboxMap, RegionEditor};
pub use tile::{Tile, TileInfo, TileLayer};
pub use types::{Aabb, Xf};
