//! Collision detection: tile hitbox geometry and the broad-phase tree.

pub mod broadphase;
pub mod hitbox;

pub use broadphase::{AabbTree, NodeId};
