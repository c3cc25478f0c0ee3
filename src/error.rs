//! Error types for recoverable, data-driven failures.
//!
//! Logic defects (bad corner codes, out-of-region writes, stale ids) are not
//! represented here; they panic.

use glam::IVec2;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("Tile {value} at {pos} is out of range")]
    TileOutOfRange { value: i32, pos: IVec2 },
    #[error("Tile layer is {width}x{height} but holds {len} values")]
    LayerSizeMismatch { width: i32, height: i32, len: usize },
    #[error("Negative grid size: {width}x{height}")]
    NegativeSize { width: i32, height: i32 },
    #[error("Invalid physics config: {0}")]
    Config(String),
}

/// Convenient Result type alias for fallible grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
