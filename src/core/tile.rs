use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Corner code of an empty cell.
pub const CORNER_EMPTY: i32 = -2;
/// Corner code of a full square.
pub const CORNER_FULL: i32 = -1;

/// Tile kinds. The discriminant is the index used by tile layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tile {
    #[default]
    Air = 0,
    Wall = 1,
    /// Wall with the top-left corner cut off.
    WallA = 2,
    /// Wall with the top-right corner cut off.
    WallB = 3,
    /// Wall with the bottom-right corner cut off.
    WallC = 4,
    /// Wall with the bottom-left corner cut off.
    WallD = 5,
}

impl Tile {
    pub const COUNT: usize = 6;

    pub const ALL: [Tile; Tile::COUNT] = [
        Tile::Air,
        Tile::Wall,
        Tile::WallA,
        Tile::WallB,
        Tile::WallC,
        Tile::WallD,
    ];

    pub fn info(self) -> &'static TileInfo {
        &TILE_INFO[self as usize]
    }

    pub fn is_empty(self) -> bool {
        self == Tile::Air
    }

    pub fn mass(self) -> i32 {
        self.info().mass
    }

    pub fn corner(self) -> i32 {
        self.info().corner
    }
}

impl TryFrom<i32> for Tile {
    type Error = i32;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Tile::ALL.get(index).copied())
            .ok_or(value)
    }
}

/// Immutable per-kind metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileInfo {
    pub tile: Tile,
    pub solid: bool,
    /// `-2` empty, `-1` full square, `0..=3` index of the missing corner.
    pub corner: i32,
    /// Integer mass, so that grid totals never drift.
    pub mass: i32,
}

static TILE_INFO: [TileInfo; Tile::COUNT] = [
    TileInfo { tile: Tile::Air, solid: false, corner: CORNER_EMPTY, mass: 0 },
    TileInfo { tile: Tile::Wall, solid: true, corner: CORNER_FULL, mass: 2 },
    TileInfo { tile: Tile::WallA, solid: true, corner: 0, mass: 1 },
    TileInfo { tile: Tile::WallB, solid: true, corner: 1, mass: 1 },
    TileInfo { tile: Tile::WallC, solid: true, corner: 2, mass: 1 },
    TileInfo { tile: Tile::WallD, solid: true, corner: 3, mass: 1 },
];

/// Row-major tile indices with explicit bounds, as handed over by a map loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    pub width: i32,
    pub height: i32,
    pub data: Vec<i32>,
}

impl TileLayer {
    pub fn new(width: i32, height: i32, data: Vec<i32>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Validates every index and converts the layer into tiles.
    pub fn to_tiles(&self) -> Result<Vec<Tile>> {
        if self.width < 0 || self.height < 0 {
            return Err(GridError::NegativeSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.data.len() != (self.width as usize) * (self.height as usize) {
            return Err(GridError::LayerSizeMismatch {
                width: self.width,
                height: self.height,
                len: self.data.len(),
            });
        }

        self.data
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                Tile::try_from(value).map_err(|value| GridError::TileOutOfRange {
                    value,
                    pos: IVec2::new(i as i32 % self.width, i as i32 / self.width),
                })
            })
            .collect()
    }
}
