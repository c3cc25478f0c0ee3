use std::collections::HashSet;

use glam::{IVec2, Vec2};

use super::{GridManager, tick::TickState};
use crate::{
    dynamics::impulse::{cancel_along_normal, equalize},
    utils::{
        allocator::GridId,
        math::{DIRS8, normalized_dot, straddling_dirs},
    },
};

/// Directions at a right angle or more from the relative velocity never
/// separate.
const MIN_SEPARATING_DOT: f32 = 1e-4;

impl GridManager {
    /// Exchanges velocity between touching pairs. Returns the grids whose
    /// velocity changed.
    pub(super) fn transfer_impulses(&mut self, state: &TickState) -> Vec<GridId> {
        let mut order: Vec<(GridId, f32)> = state
            .participants
            .iter()
            .map(|p| (p.id, self.grid(p.id).vel.length_squared()))
            .collect();
        // Fastest first; ids are already sorted so ties stay stable.
        order.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut seen = HashSet::new();
        let mut changed = Vec::new();
        for (id, _) in order {
            let Some(participant) = state.get(id) else {
                continue;
            };
            for &other in &participant.candidates {
                if !seen.insert((id.min(other), id.max(other))) {
                    continue;
                }
                if self.resolve_contact(id, other) {
                    changed.push(id);
                    changed.push(other);
                }
            }
        }

        changed.sort();
        changed.dedup();
        changed
    }

    fn touching(&self, a: GridId, b: GridId, dir: IVec2) -> bool {
        self.blocked(a, &[b], dir, true)
    }

    /// The collision-free unit step closest to `rel`, if any lies within 90°.
    fn separating_dir(&self, a: GridId, b: GridId, rel: Vec2) -> Option<IVec2> {
        let order: Vec<usize> = if self.axis_parity {
            (0..DIRS8.len()).rev().collect()
        } else {
            (0..DIRS8.len()).collect()
        };

        let mut best: Option<(IVec2, f32)> = None;
        for index in order {
            let dir = DIRS8[index];
            let dot = normalized_dot(dir, rel);
            if dot <= MIN_SEPARATING_DOT || best.is_some_and(|(_, best_dot)| dot <= best_dot) {
                continue;
            }
            if !self.touching(a, b, dir) {
                best = Some((dir, dot));
            }
        }
        best.map(|(dir, _)| dir)
    }

    fn resolve_contact(&mut self, a: GridId, b: GridId) -> bool {
        let (object_a, object_b) = (self.grid(a), self.grid(b));
        if object_a.infinite_mass && object_b.infinite_mass {
            return false;
        }
        let rel = object_a.vel - object_b.vel;
        if rel == Vec2::ZERO {
            return false;
        }
        if !straddling_dirs(rel)
            .into_iter()
            .any(|dir| self.touching(a, b, dir))
        {
            return false;
        }

        let (mass_a, mass_b) = (object_a.body_mass(), object_b.body_mass());
        let separating = self.separating_dir(a, b, rel);
        let Some((object_a, object_b)) = self.grids.get2_mut(a, b) else {
            return false;
        };

        match separating {
            Some(dir) => {
                // Keep the sliding component, drop the one pushing into `b`.
                let along = dir.as_vec2().normalize();
                let mut normal = Vec2::new(-along.y, along.x);
                if normal.dot(rel) < 0.0 {
                    normal = -normal;
                }
                log::trace!("contact {a}/{b}: sliding along {dir}");
                cancel_along_normal(&mut object_a.vel, &mut object_b.vel, mass_a, mass_b, normal)
            }
            None => {
                log::trace!("contact {a}/{b}: inelastic");
                equalize(&mut object_a.vel, &mut object_b.vel, mass_a, mass_b)
            }
        }
    }
}
