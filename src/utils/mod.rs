//! Utility helpers: generational storage, direction math, and logging.

pub mod allocator;
pub mod logging;
pub mod math;

pub use allocator::{Arena, GridId};
pub use math::*;
