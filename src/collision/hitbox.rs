//! Tile hitbox geometry.
//!
//! Every tile is sampled on a `TILE_SIZE_HIGH_RES`² lattice of high-res cells.
//! A tile shape is described by a 16-bit mask over canonical point groups:
//!
//! * bits `0..4`: the corner cell of corner `j`,
//! * bits `4..12`: the cell one step into the tile from corner `j`, along x
//!   (`4 + 2j`) or along y (`5 + 2j`),
//! * bits `12..16`: a sparse set of cells just inside the diagonal of wedge `k`.
//!
//! Corners are numbered clockwise from the top-left: `(-1,-1)`, `(1,-1)`,
//! `(1,1)`, `(-1,1)`. A wedge's corner code names the corner it is missing.
//!
//! Cells centred on a wedge diagonal belong to the whole diagonal or to none
//! of it, depending on the wedge's orientation in the frame shared by the
//! shapes being compared (see [`owns_diagonal`]). Two complementary wedges
//! meeting along a diagonal therefore split the seam cells between them no
//! matter how far one has slid along the other. Sample points never sit on a
//! diagonal, so the masks do not depend on orientation.

use std::sync::OnceLock;

use glam::IVec2;

use crate::config::TILE_SIZE_HIGH_RES;
use crate::core::tile::{CORNER_EMPTY, CORNER_FULL};

pub const POINT_GROUP_COUNT: usize = 16;

/// Bits of the four true corners, the only minimization candidates.
pub const CORNER_BITS: u16 = 0x000F;

const CORNERS: [IVec2; 4] = [
    IVec2::new(-1, -1),
    IVec2::new(1, -1),
    IVec2::new(1, 1),
    IVec2::new(-1, 1),
];

const DIRS4: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(0, 1),
    IVec2::new(-1, 0),
    IVec2::new(0, -1),
];

pub fn corner_vector(corner: i32) -> IVec2 {
    assert!(
        (0..4).contains(&corner),
        "Corner {corner} has no corner vector."
    );
    CORNERS[corner as usize]
}

fn corner_bit(vector: IVec2) -> u16 {
    let index = CORNERS
        .iter()
        .position(|&c| c == vector)
        .unwrap_or_else(|| panic!("{vector} is not a corner vector."));
    1 << index
}

/// Point groups lying on the boundary of the given shape.
pub fn mask_full(corner: i32) -> u16 {
    match corner {
        CORNER_EMPTY => 0,
        CORNER_FULL => CORNER_BITS,
        // Corner 2; y-offset of corner 1, x-offset of corner 3; diagonal 0.
        0 => 0x1484,
        // Corner 3; y-offset of corner 0, x-offset of corner 2; diagonal 1.
        1 => 0x2128,
        // Corner 0; x-offset of corner 1, y-offset of corner 3; diagonal 2.
        2 => 0x4841,
        // Corner 1; x-offset of corner 0, y-offset of corner 2; diagonal 3.
        3 => 0x8212,
        _ => panic!("Corner {corner} is out of range."),
    }
}

pub fn mask_possible_min(corner: i32) -> u16 {
    mask_full(corner) & CORNER_BITS
}

/// The reduced point set used by single-pixel sweeps.
///
/// `neighbor(offset)` returns the corner code of the tile at `offset` from
/// this one. A corner is dropped when it sits on a vertex fully surrounded by
/// solid corners: both edge neighbours and the diagonal neighbour must each
/// carry the corner touching that vertex.
pub fn mask_partial(corner: i32, neighbor: impl Fn(IVec2) -> i32) -> u16 {
    let mut mask = mask_full(corner);

    for (j, &k) in CORNERS.iter().enumerate() {
        let bit = 1 << j;
        if mask & bit == 0 {
            continue;
        }

        let covered_x = mask_possible_min(neighbor(IVec2::new(k.x, 0)))
            & corner_bit(IVec2::new(-k.x, k.y));
        let covered_y = mask_possible_min(neighbor(IVec2::new(0, k.y)))
            & corner_bit(IVec2::new(k.x, -k.y));
        let covered_diag = mask_possible_min(neighbor(k)) & corner_bit(-k);

        if covered_x != 0 && covered_y != 0 && covered_diag != 0 {
            mask &= !bit;
        }
    }

    mask
}

/// High-res cells of one point group, in tile-local coordinates.
pub fn point_group(bit: usize) -> &'static [IVec2] {
    static GROUPS: OnceLock<Vec<Vec<IVec2>>> = OnceLock::new();
    let groups = GROUPS.get_or_init(build_point_groups);
    &groups[bit]
}

/// Calls `f` for every high-res cell selected by `mask`.
pub fn for_each_point(mask: u16, mut f: impl FnMut(IVec2) -> bool) -> bool {
    let mut bits = mask;
    while bits != 0 {
        let bit = bits.trailing_zeros() as usize;
        bits &= bits - 1;
        for &point in point_group(bit) {
            if f(point) {
                return true;
            }
        }
    }
    false
}

fn corner_cell(k: IVec2) -> IVec2 {
    let last = TILE_SIZE_HIGH_RES - 1;
    IVec2::new(
        if k.x < 0 { 0 } else { last },
        if k.y < 0 { 0 } else { last },
    )
}

fn build_point_groups() -> Vec<Vec<IVec2>> {
    let s = TILE_SIZE_HIGH_RES;
    let mut groups = Vec::with_capacity(POINT_GROUP_COUNT);

    for &k in &CORNERS {
        groups.push(vec![corner_cell(k)]);
    }
    for &k in &CORNERS {
        let cell = corner_cell(k);
        groups.push(vec![cell + IVec2::new(-k.x, 0)]);
        groups.push(vec![cell + IVec2::new(0, -k.y)]);
    }
    for &k in &CORNERS {
        // Solve `dot(k, 2h + 1 - s) == -2` for y, one cell per column.
        let points = (0..s)
            .filter(|x| x % 3 == 1)
            .filter_map(|x| {
                let cx = 2 * x + 1 - s;
                let y = (k.y * (-2 - k.x * cx) + s - 1) / 2;
                (0..s).contains(&y).then_some(IVec2::new(x, y))
            })
            .collect();
        groups.push(points);
    }

    groups
}

/// Whether a wedge turned `rot` quarter steps owns the cells centred on its
/// diagonal. Complementary wedges in the same frame always disagree.
pub fn owns_diagonal(corner: i32, rot: i32) -> bool {
    (corner + rot).rem_euclid(4) < 2
}

/// Point-in-shape test for a tile-local high-res cell, with the tile
/// unturned.
pub fn collides_with_point_high_res(corner: i32, point: IVec2) -> bool {
    collides_with_point_high_res_turned(corner, 0, point)
}

/// Point-in-shape test for a tile-local high-res cell of a tile turned `rot`
/// quarter steps in the shared frame. Only the ownership of diagonal cells
/// depends on `rot`.
pub fn collides_with_point_high_res_turned(corner: i32, rot: i32, point: IVec2) -> bool {
    let s = TILE_SIZE_HIGH_RES;
    let inside = point.cmpge(IVec2::ZERO).all() && point.cmplt(IVec2::splat(s)).all();

    match corner {
        CORNER_EMPTY => false,
        CORNER_FULL => inside,
        0..=3 => {
            if !inside {
                return false;
            }
            let k = CORNERS[corner as usize];
            let c = point * 2 + 1 - s;
            let dot = k.dot(c);
            dot < 0 || (dot == 0 && owns_diagonal(corner, rot))
        }
        _ => panic!("Corner {corner} is out of range."),
    }
}

/// Whether the shape has a complete edge on side `dir` (`0` = +x, `1` = +y,
/// `2` = -x, `3` = -y).
pub fn corner_has_edge(corner: i32, dir: i32) -> bool {
    assert!((0..4).contains(&dir), "Direction {dir} is out of range.");
    match corner {
        CORNER_EMPTY => false,
        CORNER_FULL => true,
        0..=3 => CORNERS[corner as usize].dot(DIRS4[dir as usize]) < 0,
        _ => panic!("Corner {corner} is out of range."),
    }
}
