use std::collections::HashMap;

use glam::IVec2;

use super::{
    tile::{Tile, TileLayer, CORNER_EMPTY},
    types::{Aabb, Xf},
};
use crate::{
    collision::hitbox,
    config::{HIGH_RES_FACTOR, TILE_SIZE, TILE_SIZE_HIGH_RES},
    error::Result,
};

/// Maps a tile coordinate to the point groups sampled for it. Tiles whose
/// mask would be zero have no entry.
pub type HitboxMap = HashMap<IVec2, u16>;

/// Rigid rectangular array of tiles with a position and a rotation.
///
/// Three coordinate spaces are involved:
/// * tile space: integer cell coordinates, `(0,0)` is the first array cell,
/// * grid space: pixels, origin at the minimal corner of the array,
/// * world space: reached through [`Grid::grid_to_world`].
///
/// `xf` maps the space centered on the array to world space, so that
/// resizing around existing content never moves it visually.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    xf: Xf,
    size: IVec2,
    cells: Vec<Tile>,
    hitbox_full: HitboxMap,
    hitbox_min: HitboxMap,
    mass: i64,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a trimmed grid from loader output, with the layer's minimal
    /// corner placed at `xf`. Fails on the first invalid tile index.
    pub fn from_layer(layer: &TileLayer, xf: Xf) -> Result<Self> {
        let tiles = layer.to_tiles()?;
        let mut grid = Self {
            xf,
            ..Self::default()
        };

        let size = IVec2::new(layer.width, layer.height);
        grid.modify_region(IVec2::ZERO, size, |region| {
            for (i, tile) in tiles.iter().enumerate() {
                let pos = IVec2::new(i as i32 % size.x, i as i32 / size.x);
                region.set(pos, *tile);
            }
        });
        Ok(grid)
    }

    pub fn xf(&self) -> Xf {
        self.xf
    }

    pub fn set_xf(&mut self, xf: Xf) {
        self.xf = xf;
    }

    pub(crate) fn translate(&mut self, delta: IVec2) {
        self.xf.pos += delta;
    }

    /// Array bounds, in tiles.
    pub fn size(&self) -> IVec2 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size.x <= 0 || self.size.y <= 0
    }

    /// Row-major cell contents.
    pub fn cells(&self) -> &[Tile] {
        &self.cells
    }

    pub fn mass(&self) -> i64 {
        self.mass
    }

    pub fn hitbox_full(&self) -> &HitboxMap {
        &self.hitbox_full
    }

    pub fn hitbox_min(&self) -> &HitboxMap {
        &self.hitbox_min
    }

    fn in_bounds(&self, pos: IVec2) -> bool {
        pos.cmpge(IVec2::ZERO).all() && pos.cmplt(self.size).all()
    }

    fn index(&self, pos: IVec2) -> usize {
        (pos.y * self.size.x + pos.x) as usize
    }

    /// Tile at `pos`, `Air` outside of the array.
    pub fn tile_at(&self, pos: IVec2) -> Tile {
        if self.in_bounds(pos) {
            self.cells[self.index(pos)]
        } else {
            Tile::Air
        }
    }

    pub fn corner_at(&self, pos: IVec2) -> i32 {
        self.tile_at(pos).corner()
    }

    /// Maps grid space to world space.
    pub fn grid_to_world(&self) -> Xf {
        let mut ret = self.xf;
        ret.pos -= self.xf.rotate_vec(self.size * TILE_SIZE / 2);
        ret
    }

    pub fn world_to_grid(&self) -> Xf {
        self.grid_to_world().inverse()
    }

    /// Tile coordinate containing a world-space pixel.
    pub fn world_pixel_to_tile(&self, pixel: IVec2) -> IVec2 {
        self.world_to_grid()
            .transform_pixel(pixel)
            .div_euclid(IVec2::splat(TILE_SIZE))
    }

    /// World-space bounds, optionally displaced by a world-space `offset`.
    pub fn world_aabb(&self, offset: Xf) -> Aabb {
        let xf = offset * self.grid_to_world();
        Aabb::from_corners(
            xf.transform_point(IVec2::ZERO),
            xf.transform_point(self.size * TILE_SIZE),
        )
    }

    /// Reallocates the array to `new_size`, moving every cell by `offset`.
    /// The world position of the kept content does not change.
    pub(crate) fn resize(&mut self, offset: IVec2, new_size: IVec2) {
        let new_size = new_size.max(IVec2::ZERO);
        let mut cells = vec![Tile::Air; (new_size.x * new_size.y) as usize];
        let mut cropped = false;

        for y in 0..self.size.y {
            for x in 0..self.size.x {
                let old = IVec2::new(x, y);
                let tile = self.cells[self.index(old)];
                if tile.is_empty() {
                    continue;
                }
                let pos = old + offset;
                if pos.cmpge(IVec2::ZERO).all() && pos.cmplt(new_size).all() {
                    cells[(pos.y * new_size.x + pos.x) as usize] = tile;
                } else {
                    cropped = true;
                    self.mass -= tile.mass() as i64;
                }
            }
        }

        self.xf.pos += self.xf.rotate_vec(
            new_size * TILE_SIZE / 2 - self.size * TILE_SIZE / 2 - offset * TILE_SIZE,
        );
        self.size = new_size;
        self.cells = cells;

        for map in [&mut self.hitbox_full, &mut self.hitbox_min] {
            *map = map
                .drain()
                .map(|(pos, mask)| (pos + offset, mask))
                .filter(|(pos, _)| pos.cmpge(IVec2::ZERO).all() && pos.cmplt(new_size).all())
                .collect();
        }

        if cropped {
            self.refresh_hitbox(IVec2::ZERO, new_size);
        }
    }

    /// Shrinks the array to the minimal rectangle holding non-empty cells.
    pub fn trim(&mut self) {
        if self.is_empty() {
            return;
        }

        let mut lo = self.size;
        let mut hi = IVec2::splat(-1);
        for y in 0..self.size.y {
            for x in 0..self.size.x {
                let pos = IVec2::new(x, y);
                if !self.cells[self.index(pos)].is_empty() {
                    lo = lo.min(pos);
                    hi = hi.max(pos);
                }
            }
        }

        if hi.x < 0 {
            // All cells are empty.
            self.resize(IVec2::ZERO, IVec2::ZERO);
            return;
        }
        if lo == IVec2::ZERO && hi == self.size - 1 {
            return;
        }
        self.resize(-lo, hi - lo + 1);
    }

    /// The only way to change cells.
    ///
    /// Grows the array so that `[origin, origin + size)` is addressable and
    /// hands that region to `edit`, addressed from `(0,0)`. Afterwards the
    /// mass and hitbox maps are patched incrementally and the array is
    /// trimmed if the region reached its border. A zero-area region only
    /// refreshes the hitboxes around `origin`.
    pub fn modify_region(
        &mut self,
        origin: IVec2,
        size: IVec2,
        edit: impl FnOnce(&mut RegionEditor<'_>),
    ) {
        assert!(
            size.cmpge(IVec2::ZERO).all(),
            "Negative region size {size}."
        );

        let mut origin = origin;
        let has_area = size.x > 0 && size.y > 0;
        if has_area {
            let (lo, hi) = if self.is_empty() {
                (origin, origin + size)
            } else {
                (origin.min(IVec2::ZERO), (origin + size).max(self.size))
            };
            if lo != IVec2::ZERO || hi != self.size {
                self.resize(-lo, hi - lo);
                origin -= lo;
            }
        }

        let before = self.region_mass(origin, size);
        {
            let stride = self.size.x;
            let mut region = RegionEditor {
                cells: &mut self.cells,
                stride,
                origin,
                size,
            };
            edit(&mut region);
        }
        let after = self.region_mass(origin, size);
        self.mass += after - before;

        // Neighbours' minimal masks depend on the edited cells.
        self.refresh_hitbox(origin - 1, size + 2);

        let touches_border = origin.x <= 0
            || origin.y <= 0
            || origin.x + size.x >= self.size.x
            || origin.y + size.y >= self.size.y;
        if has_area && touches_border {
            self.trim();
        }
    }

    /// Clears one tile. Does nothing outside the array or on an empty cell.
    pub fn remove_tile(&mut self, pos: IVec2) {
        if self.tile_at(pos).is_empty() {
            return;
        }
        self.modify_region(pos, IVec2::ONE, |region| {
            region.set(IVec2::ZERO, Tile::Air)
        });
    }

    fn region_mass(&self, origin: IVec2, size: IVec2) -> i64 {
        let mut sum = 0;
        for y in origin.y..origin.y + size.y {
            for x in origin.x..origin.x + size.x {
                sum += self.tile_at(IVec2::new(x, y)).mass() as i64;
            }
        }
        sum
    }

    fn refresh_hitbox(&mut self, origin: IVec2, size: IVec2) {
        for y in origin.y..origin.y + size.y {
            for x in origin.x..origin.x + size.x {
                let pos = IVec2::new(x, y);
                let corner = self.corner_at(pos);
                let full = hitbox::mask_full(corner);
                let min = if corner == CORNER_EMPTY {
                    0
                } else {
                    hitbox::mask_partial(corner, |offset| self.corner_at(pos + offset))
                };
                set_mask(&mut self.hitbox_full, pos, full);
                set_mask(&mut self.hitbox_min, pos, min);
            }
        }
    }

    /// Exact test for a grid-space high-res cell. Diagonal seams are owned
    /// according to the grid's current world rotation.
    pub fn collides_with_point_in_grid_space_high_res(&self, cell: IVec2) -> bool {
        self.solid_high_res(cell, self.xf.rot)
    }

    fn solid_high_res(&self, cell: IVec2, rot: i32) -> bool {
        let tile = cell.div_euclid(IVec2::splat(TILE_SIZE_HIGH_RES));
        let corner = self.corner_at(tile);
        if corner == CORNER_EMPTY {
            return false;
        }
        let local = cell - tile * TILE_SIZE_HIGH_RES;
        hitbox::collides_with_point_high_res_turned(corner, rot, local)
    }

    /// Tests a grid-space pixel through its four high-res sub-corners, so a
    /// pixel straddling a diagonal seam is solid if any part of it is.
    pub fn collides_with_point_in_grid_space(&self, pixel: IVec2) -> bool {
        let base = pixel * HIGH_RES_FACTOR;
        let last = HIGH_RES_FACTOR - 1;
        [
            IVec2::new(0, 0),
            IVec2::new(last, 0),
            IVec2::new(0, last),
            IVec2::new(last, last),
        ]
        .into_iter()
        .any(|sub| self.collides_with_point_in_grid_space_high_res(base + sub))
    }

    pub fn collides_with_point_in_world_space(&self, pixel: IVec2) -> bool {
        self.collides_with_point_in_grid_space(self.world_to_grid().transform_pixel(pixel))
    }

    /// Narrow-phase test against `other`, where `this_to_other` maps this
    /// grid's grid space into the other's. `other` keeps its own rotation as
    /// the frame for diagonal seams.
    ///
    /// The sampled points of both grids are tested against the other shape;
    /// neither set alone catches every thin overlap. `full` selects the exact
    /// point set, otherwise the reduced set that is only valid for single
    /// pixel steps.
    pub fn collides_with_grid_with_custom_xf_difference(
        &self,
        other: &Grid,
        this_to_other: Xf,
        full: bool,
    ) -> bool {
        self.collides_in_frame(other, this_to_other, other.xf.rot, full)
    }

    /// Same as above, with both grids displaced by world-space offsets.
    pub fn collides_with_grid_with_offsets(
        &self,
        self_offset: Xf,
        other: &Grid,
        other_offset: Xf,
        full: bool,
    ) -> bool {
        let other_to_world = other_offset * other.grid_to_world();
        let this_to_other = other_to_world.inverse() * (self_offset * self.grid_to_world());
        self.collides_in_frame(other, this_to_other, other_to_world.rot, full)
    }

    /// `other_rot` is the other grid's rotation in the frame where seams are
    /// shared; this grid's follows from `this_to_other`.
    fn collides_in_frame(
        &self,
        other: &Grid,
        this_to_other: Xf,
        other_rot: i32,
        full: bool,
    ) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let this_rot = other_rot + this_to_other.rot;
        self.points_hit(other, this_to_other, other_rot, full)
            || other.points_hit(self, this_to_other.inverse(), this_rot, full)
    }

    /// Tests this grid's sample points against `other`, turned `other_rot`.
    fn points_hit(&self, other: &Grid, xf: Xf, other_rot: i32, full: bool) -> bool {
        let map = if full {
            &self.hitbox_full
        } else {
            &self.hitbox_min
        };
        let other_bounds = Aabb {
            min: IVec2::ZERO,
            max: other.size * TILE_SIZE_HIGH_RES - 1,
        };

        map.iter().any(|(&tile, &mask)| {
            let base = tile * TILE_SIZE_HIGH_RES;
            let tile_bounds = Aabb::from_corners(
                xf.transform_high_res_cell(base),
                xf.transform_high_res_cell(base + (TILE_SIZE_HIGH_RES - 1)),
            );
            if !tile_bounds.overlaps(&other_bounds) {
                return false;
            }
            hitbox::for_each_point(mask, |point| {
                other.solid_high_res(xf.transform_high_res_cell(base + point), other_rot)
            })
        })
    }
}

fn set_mask(map: &mut HitboxMap, pos: IVec2, mask: u16) {
    if mask == 0 {
        map.remove(&pos);
    } else {
        map.insert(pos, mask);
    }
}

/// Window over the cells granted to a [`Grid::modify_region`] callback.
pub struct RegionEditor<'a> {
    cells: &'a mut Vec<Tile>,
    stride: i32,
    origin: IVec2,
    size: IVec2,
}

impl RegionEditor<'_> {
    pub fn size(&self) -> IVec2 {
        self.size
    }

    fn index(&self, pos: IVec2) -> usize {
        assert!(
            pos.cmpge(IVec2::ZERO).all() && pos.cmplt(self.size).all(),
            "Cell {pos} is outside of the granted region of size {}.",
            self.size
        );
        let abs = self.origin + pos;
        (abs.y * self.stride + abs.x) as usize
    }

    pub fn get(&self, pos: IVec2) -> Tile {
        self.cells[self.index(pos)]
    }

    pub fn set(&mut self, pos: IVec2, tile: Tile) {
        let index = self.index(pos);
        self.cells[index] = tile;
    }
}
