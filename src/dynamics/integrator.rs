use glam::{IVec2, Vec2};

use crate::utils::math::round_to_ivec;

/// Converts continuous velocities into whole-pixel steps.
///
/// The fractional part that rounding drops is carried in `vel_lag` and
/// decays every tick, so sustained sub-pixel speeds still average out while
/// a stopped grid forgets its remainder.
#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    pub lag_decay: f32,
}

impl Integrator {
    pub fn new(lag_decay: f32) -> Self {
        Self { lag_decay }
    }

    /// Returns this tick's pixel delta, updating both accumulators.
    pub fn pixel_delta(&self, vel: Vec2, vel_lag: &mut Vec2, vel_owed: &mut IVec2) -> IVec2 {
        let total = vel + *vel_lag;
        let mut delta = round_to_ivec(total);
        *vel_lag = (total - delta.as_vec2()) * self.lag_decay;

        repay_owed(&mut delta, vel_owed);
        delta
    }
}

/// Cancels debt against the delta, one axis at a time, where both point the
/// same way.
pub fn repay_owed(delta: &mut IVec2, owed: &mut IVec2) {
    for axis in 0..2 {
        let d = delta[axis];
        let o = owed[axis];
        if d == 0 || o == 0 || d.signum() != o.signum() {
            continue;
        }
        let paid = d.signum() * d.abs().min(o.abs());
        delta[axis] -= paid;
        owed[axis] -= paid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_pixel_speed_averages_out() {
        let integrator = Integrator::new(1.0);
        let mut lag = Vec2::ZERO;
        let mut owed = IVec2::ZERO;
        let mut moved = IVec2::ZERO;
        for _ in 0..10 {
            moved += integrator.pixel_delta(Vec2::new(0.3, -0.5), &mut lag, &mut owed);
        }
        assert_eq!(moved.x, 3);
        assert!((moved.y + 5).abs() <= 1);
    }

    #[test]
    fn lag_decays() {
        let integrator = Integrator::new(0.5);
        let mut lag = Vec2::ZERO;
        let mut owed = IVec2::ZERO;
        let delta = integrator.pixel_delta(Vec2::new(0.25, 0.0), &mut lag, &mut owed);
        assert_eq!(delta, IVec2::ZERO);
        assert_eq!(lag, Vec2::new(0.125, 0.0));
    }

    #[test]
    fn debt_is_repaid_only_along_matching_signs() {
        let mut delta = IVec2::new(3, -2);
        let mut owed = IVec2::new(1, 4);
        repay_owed(&mut delta, &mut owed);
        assert_eq!(delta, IVec2::new(2, -2));
        assert_eq!(owed, IVec2::new(0, 4));

        let mut delta = IVec2::new(0, 2);
        let mut owed = IVec2::new(0, 5);
        repay_owed(&mut delta, &mut owed);
        assert_eq!(delta, IVec2::ZERO);
        assert_eq!(owed, IVec2::new(0, 3));
    }
}
