//! Global configuration constants and tunables for the tilegrid engine.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Edge length of one tile, in pixels.
pub const TILE_SIZE: i32 = 12;

/// Supersampling factor of the high-resolution hitbox space.
pub const HIGH_RES_FACTOR: i32 = 3;

/// Edge length of one tile in high-resolution cells.
pub const TILE_SIZE_HIGH_RES: i32 = TILE_SIZE * HIGH_RES_FACTOR;

/// Default padding of the broad-phase fat boxes (one tile).
pub const DEFAULT_AABB_MARGIN: i32 = TILE_SIZE;

/// Fraction of the sub-pixel velocity remainder kept from one tick to the next.
pub const DEFAULT_VEL_LAG_DECAY: f32 = 0.95;

/// Tick duration above which a warning is logged.
pub const DEFAULT_TICK_BUDGET_MS: f32 = 4.0;

/// Runtime tunables of a [`GridManager`](crate::world::GridManager).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Padding added around every tight box stored in the broad-phase tree.
    pub aabb_margin: i32,
    /// Multiplier applied to `vel_lag` after each tick.
    pub vel_lag_decay: f32,
    /// Recursion cap of the circular-obstruction search. `None` uses the
    /// number of grids taking part in the tick.
    pub max_search_depth: Option<usize>,
    /// Tick duration budget used for the over-budget warning.
    pub tick_budget_ms: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            aabb_margin: DEFAULT_AABB_MARGIN,
            vel_lag_decay: DEFAULT_VEL_LAG_DECAY,
            max_search_depth: None,
            tick_budget_ms: DEFAULT_TICK_BUDGET_MS,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.aabb_margin < 0 {
            return Err(GridError::Config(format!(
                "aabb_margin must be non-negative, got {}",
                self.aabb_margin
            )));
        }
        if !(0.0..=1.0).contains(&self.vel_lag_decay) {
            return Err(GridError::Config(format!(
                "vel_lag_decay must lie in [0, 1], got {}",
                self.vel_lag_decay
            )));
        }
        if self.max_search_depth == Some(0) {
            return Err(GridError::Config(
                "max_search_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
