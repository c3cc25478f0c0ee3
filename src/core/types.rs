use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::config::HIGH_RES_FACTOR;

/// Integer rigid transform: a translation plus one of four 90° rotation steps.
///
/// Rotation step `1` maps `+x` onto `+y` (clockwise on a y-down screen).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Xf {
    pub pos: IVec2,
    pub rot: i32,
}

impl Xf {
    pub const IDENTITY: Self = Self {
        pos: IVec2::ZERO,
        rot: 0,
    };

    pub fn new(pos: IVec2, rot: i32) -> Self {
        Self {
            pos,
            rot: rot.rem_euclid(4),
        }
    }

    pub fn from_pos(pos: IVec2) -> Self {
        Self { pos, rot: 0 }
    }

    /// Returns a copy rotated by `steps` quarter turns around its own origin.
    pub fn rotate(&self, steps: i32) -> Self {
        Self::new(self.pos, self.rot + steps)
    }

    /// Returns a copy translated by `delta` in the outer space.
    pub fn translated(&self, delta: IVec2) -> Self {
        Self {
            pos: self.pos + delta,
            rot: self.rot,
        }
    }

    /// Image of the `+x` axis.
    pub fn axis_x(&self) -> IVec2 {
        match self.rot.rem_euclid(4) {
            0 => IVec2::new(1, 0),
            1 => IVec2::new(0, 1),
            2 => IVec2::new(-1, 0),
            _ => IVec2::new(0, -1),
        }
    }

    /// Image of the `+y` axis.
    pub fn axis_y(&self) -> IVec2 {
        let x = self.axis_x();
        IVec2::new(-x.y, x.x)
    }

    /// Rotates a vector without translating it.
    pub fn rotate_vec(&self, v: IVec2) -> IVec2 {
        self.axis_x() * v.x + self.axis_y() * v.y
    }

    /// Transforms a lattice vertex.
    pub fn transform_point(&self, v: IVec2) -> IVec2 {
        self.pos + self.rotate_vec(v)
    }

    /// Transforms the unit cell whose minimal corner is `cell`, returning the
    /// minimal corner of its image. Effectively `self * (cell + 0.5) - 0.5`.
    pub fn transform_pixel(&self, cell: IVec2) -> IVec2 {
        self.transform_point(cell) - self.flip_correction()
    }

    /// Same as [`Xf::transform_pixel`], for a cell of the high-resolution
    /// lattice. The translation is in pixels and gets scaled up.
    pub fn transform_high_res_cell(&self, cell: IVec2) -> IVec2 {
        self.pos * HIGH_RES_FACTOR + self.rotate_vec(cell) - self.flip_correction()
    }

    pub fn inverse(&self) -> Self {
        let rot = (-self.rot).rem_euclid(4);
        let inv = Self {
            pos: IVec2::ZERO,
            rot,
        };
        Self {
            pos: inv.rotate_vec(-self.pos),
            rot,
        }
    }

    /// `1` on every output axis that the rotation flips.
    fn flip_correction(&self) -> IVec2 {
        let x = self.axis_x();
        let y = self.axis_y();
        IVec2::new(
            ((x.x + y.x) < 0) as i32,
            ((x.y + y.y) < 0) as i32,
        )
    }
}

impl std::ops::Mul for Xf {
    type Output = Xf;

    fn mul(self, other: Xf) -> Xf {
        Xf {
            pos: self.pos + self.rotate_vec(other.pos),
            rot: (self.rot + other.rot).rem_euclid(4),
        }
    }
}

/// Integer axis-aligned box. Both corners are inclusive for overlap tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aabb {
    pub min: IVec2,
    pub max: IVec2,
}

impl Aabb {
    /// Builds a box from two arbitrary opposite corners.
    pub fn from_corners(a: IVec2, b: IVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn size(&self) -> IVec2 {
        self.max - self.min
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    pub fn contains_point(&self, point: IVec2) -> bool {
        self.min.cmple(point).all() && self.max.cmpge(point).all()
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grows the box by `margin` on every side.
    pub fn expand(&self, margin: i32) -> Aabb {
        Aabb {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    /// Stretches the box on the sides `delta` points toward.
    pub fn extend_toward(&self, delta: IVec2) -> Aabb {
        let mut ret = *self;
        ret.min += delta.min(IVec2::ZERO);
        ret.max += delta.max(IVec2::ZERO);
        ret
    }

    pub fn translated(&self, delta: IVec2) -> Aabb {
        Aabb {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Half-perimeter, used as the insertion cost metric of the tree.
    pub fn cost(&self) -> i64 {
        let size = self.size();
        size.x as i64 + size.y as i64
    }
}
