//! Velocity exchange between two touching grids.

use glam::Vec2;

/// Inertia of one side of a contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyMass {
    Finite(f32),
    Infinite,
}

impl BodyMass {
    pub fn new(mass: i64, infinite: bool) -> Self {
        if infinite {
            BodyMass::Infinite
        } else {
            BodyMass::Finite(mass as f32)
        }
    }
}

/// Fractions of the relative velocity absorbed by `a` and `b`.
///
/// `None` when neither side can change: both immovable, or no mass at all.
pub fn velocity_shares(a: BodyMass, b: BodyMass) -> Option<(f32, f32)> {
    match (a, b) {
        (BodyMass::Infinite, BodyMass::Infinite) => None,
        (BodyMass::Infinite, BodyMass::Finite(_)) => Some((0.0, 1.0)),
        (BodyMass::Finite(_), BodyMass::Infinite) => Some((1.0, 0.0)),
        (BodyMass::Finite(ma), BodyMass::Finite(mb)) => {
            let total = ma + mb;
            if total <= 0.0 {
                None
            } else {
                Some((mb / total, ma / total))
            }
        }
    }
}

/// Removes the component of `va - vb` along the unit `normal`. Momentum is
/// conserved between finite bodies. Returns whether anything changed.
pub fn cancel_along_normal(
    va: &mut Vec2,
    vb: &mut Vec2,
    ma: BodyMass,
    mb: BodyMass,
    normal: Vec2,
) -> bool {
    let Some((sa, sb)) = velocity_shares(ma, mb) else {
        return false;
    };
    let rel_n = (*va - *vb).dot(normal);
    if rel_n == 0.0 {
        return false;
    }
    *va -= normal * rel_n * sa;
    *vb += normal * rel_n * sb;
    true
}

/// Perfectly inelastic exchange: both end with the common velocity, or with
/// the velocity of the immovable one.
pub fn equalize(va: &mut Vec2, vb: &mut Vec2, ma: BodyMass, mb: BodyMass) -> bool {
    let Some((sa, sb)) = velocity_shares(ma, mb) else {
        return false;
    };
    let rel = *va - *vb;
    *va -= rel * sa;
    *vb += rel * sb;
    true
}
