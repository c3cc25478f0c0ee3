//! Integer direction helpers layered on top of `glam`.

use glam::{IVec2, Vec2};

/// The eight unit steps, counter-clockwise in math orientation (clockwise on
/// a y-down screen), starting at `+x`.
pub const DIRS8: [IVec2; 8] = [
    IVec2::new(1, 0),
    IVec2::new(1, 1),
    IVec2::new(0, 1),
    IVec2::new(-1, 1),
    IVec2::new(-1, 0),
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
];

/// Octant index of a unit step, `None` for zero or longer vectors.
pub fn dir8_index(dir: IVec2) -> Option<usize> {
    DIRS8.iter().position(|&d| d == dir)
}

/// Rotates a unit step by `steps` multiples of 45°.
pub fn rotate_dir8(dir: IVec2, steps: i32) -> IVec2 {
    let index = dir8_index(dir).unwrap_or_else(|| panic!("{dir} is not a unit step."));
    DIRS8[(index as i32 + steps).rem_euclid(8) as usize]
}

/// Unit step pointing the same way as `v` on every axis.
pub fn sign_step(v: IVec2) -> IVec2 {
    v.signum()
}

/// `-1`, `0` or `1`. Unlike `f32::signum`, zero maps to zero.
pub fn sign_f32(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Whether no axis of `a` points against the same axis of `b`.
pub fn signs_compatible(a: IVec2, b: IVec2) -> bool {
    a.x * b.x >= 0 && a.y * b.y >= 0
}

/// Rounds half away from zero on both axes.
pub fn round_to_ivec(v: Vec2) -> IVec2 {
    IVec2::new(v.x.round() as i32, v.y.round() as i32)
}

/// Cosine between a unit step and `v`. Zero when `v` is zero.
pub fn normalized_dot(dir: IVec2, v: Vec2) -> f32 {
    let len = v.length();
    if len == 0.0 {
        return 0.0;
    }
    dir.as_vec2().normalize().dot(v) / len
}

/// The one or two unit steps bounding the octant that `v` points into.
/// A vector lying exactly on an octant boundary yields that single step.
pub fn straddling_dirs(v: Vec2) -> Vec<IVec2> {
    if v == Vec2::ZERO {
        return Vec::new();
    }

    let sx = if v.x > 0.0 { 1 } else if v.x < 0.0 { -1 } else { 0 };
    let sy = if v.y > 0.0 { 1 } else if v.y < 0.0 { -1 } else { 0 };
    if sx == 0 || sy == 0 || v.x.abs() == v.y.abs() {
        return vec![IVec2::new(sx, sy)];
    }

    let axis = if v.x.abs() > v.y.abs() {
        IVec2::new(sx, 0)
    } else {
        IVec2::new(0, sy)
    };
    vec![axis, IVec2::new(sx, sy)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_wraps() {
        assert_eq!(rotate_dir8(IVec2::new(1, 0), 1), IVec2::new(1, 1));
        assert_eq!(rotate_dir8(IVec2::new(1, 0), -1), IVec2::new(1, -1));
        assert_eq!(rotate_dir8(IVec2::new(0, -1), 2), IVec2::new(1, 0));
        assert_eq!(rotate_dir8(IVec2::new(-1, 1), 8), IVec2::new(-1, 1));
    }

    #[test]
    fn octant_bounds() {
        assert_eq!(straddling_dirs(Vec2::new(2.0, 1.0)), vec![IVec2::new(1, 0), IVec2::new(1, 1)]);
        assert_eq!(straddling_dirs(Vec2::new(-0.5, 3.0)), vec![IVec2::new(0, 1), IVec2::new(-1, 1)]);
        assert_eq!(straddling_dirs(Vec2::new(0.0, -2.0)), vec![IVec2::new(0, -1)]);
        assert_eq!(straddling_dirs(Vec2::new(-1.5, 1.5)), vec![IVec2::new(-1, 1)]);
        assert!(straddling_dirs(Vec2::ZERO).is_empty());
    }

    #[test]
    fn sign_helpers() {
        assert!(signs_compatible(IVec2::new(2, 0), IVec2::new(1, -1)));
        assert!(!signs_compatible(IVec2::new(2, 0), IVec2::new(-1, 0)));
        assert_eq!(sign_step(IVec2::new(-7, 3)), IVec2::new(-1, 1));
        assert_eq!(round_to_ivec(Vec2::new(0.5, -1.5)), IVec2::new(1, -2));
    }
}
