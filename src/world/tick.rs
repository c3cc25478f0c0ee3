use std::collections::HashMap;

use glam::{IVec2, Vec2};

use super::GridManager;
use crate::{
    core::types::Xf,
    dynamics::integrator::Integrator,
    utils::{
        allocator::GridId,
        logging::{ScopedTimer, warn_if_tick_budget_exceeded},
        math::sign_step,
    },
};

/// A grid that may interact with others during the current tick.
#[derive(Debug, Clone)]
pub(crate) struct Participant {
    pub id: GridId,
    /// Pixels still to travel this tick.
    pub remaining: IVec2,
    /// Grids close enough to be touched this tick, sorted.
    pub candidates: Vec<GridId>,
}

#[derive(Debug, Default)]
pub(crate) struct TickState {
    /// Sorted by id.
    pub participants: Vec<Participant>,
    slots: HashMap<GridId, usize>,
}

impl TickState {
    pub(crate) fn new(mut participants: Vec<Participant>) -> Self {
        participants.sort_by_key(|p| p.id);
        let slots = participants
            .iter()
            .enumerate()
            .map(|(slot, p)| (p.id, slot))
            .collect();
        Self {
            participants,
            slots,
        }
    }

    pub fn get(&self, id: GridId) -> Option<&Participant> {
        self.slots.get(&id).map(|&slot| &self.participants[slot])
    }

    pub fn get_mut(&mut self, id: GridId) -> Option<&mut Participant> {
        self.slots
            .get(&id)
            .copied()
            .map(move |slot| &mut self.participants[slot])
    }

    pub fn is_stalled(&self) -> bool {
        self.participants.iter().any(|p| p.remaining != IVec2::ZERO)
    }
}

/// Single-pixel steps toward `remaining`: the diagonal first, then the axes
/// in parity order.
pub(crate) fn sweep_steps(remaining: IVec2, parity: bool) -> Vec<IVec2> {
    let s = sign_step(remaining);
    let mut steps = Vec::with_capacity(3);
    if s.x != 0 && s.y != 0 {
        steps.push(s);
    }
    let axes = if parity {
        [IVec2::new(0, s.y), IVec2::new(s.x, 0)]
    } else {
        [IVec2::new(s.x, 0), IVec2::new(0, s.y)]
    };
    steps.extend(axes.into_iter().filter(|&step| step != IVec2::ZERO));
    steps
}

impl GridManager {
    /// Advances every grid by one tick.
    pub fn tick_physics(&mut self) {
        let timer = ScopedTimer::new("tick");

        let (mut state, mut moved) = {
            let _t = ScopedTimer::new("tick::setup");
            self.setup_tick()
        };

        {
            let _t = ScopedTimer::new("tick::sweep");
            loop {
                self.sweep(&mut state);
                if !state.is_stalled() || !self.resolve_circular(&mut state) {
                    break;
                }
            }
        }

        {
            let _t = ScopedTimer::new("tick::refresh");
            moved.extend(state.participants.iter().map(|p| p.id));
            for &id in &moved {
                self.refresh_node(id);
            }
        }

        let changed = {
            let _t = ScopedTimer::new("tick::impulse");
            let changed = self.transfer_impulses(&state);
            for &id in &changed {
                self.refresh_node(id);
            }
            changed.len()
        };

        log::debug!(
            "tick: {} participant(s), {} free mover(s), {} stalled, {} velocity change(s)",
            state.participants.len(),
            moved.len() - state.participants.len(),
            state
                .participants
                .iter()
                .filter(|p| p.remaining != IVec2::ZERO)
                .count(),
            changed
        );

        self.axis_parity = !self.axis_parity;
        warn_if_tick_budget_exceeded(timer.elapsed(), self.config.tick_budget_ms);
    }

    /// Integrates velocities and gathers broad-phase candidates. Grids with
    /// nothing nearby are moved right away and returned separately.
    fn setup_tick(&mut self) -> (TickState, Vec<GridId>) {
        let integrator = Integrator::new(self.config.vel_lag_decay);

        let mut deltas = Vec::new();
        for id in self.grid_ids() {
            let object = self.grid_mut(id);
            let delta =
                integrator.pixel_delta(object.vel, &mut object.vel_lag, &mut object.vel_owed);
            if object.vel != Vec2::ZERO || delta != IVec2::ZERO {
                deltas.push((id, delta));
            }
        }

        let mut candidates: HashMap<GridId, Vec<GridId>> = HashMap::new();
        for &(id, delta) in &deltas {
            let query = Self::grid_aabb(&self.grid(id).grid, Xf::IDENTITY)
                .extend_toward(delta)
                .expand(1);
            let mut found = Vec::new();
            self.tree.collide_aabb(&query, |_, &other| {
                if other != id {
                    found.push(other);
                }
                false
            });
            candidates.insert(id, found);
        }

        // A participant seen by another participant must see it back.
        let links: Vec<(GridId, GridId)> = candidates
            .iter()
            .flat_map(|(&id, found)| found.iter().map(move |&other| (id, other)))
            .collect();
        for (id, other) in links {
            if let Some(list) = candidates.get_mut(&other) {
                list.push(id);
            }
        }

        let mut participants = Vec::new();
        let mut moved = Vec::new();
        for (id, delta) in deltas {
            let mut found = candidates.remove(&id).unwrap_or_default();
            found.sort();
            found.dedup();

            if found.is_empty() {
                if delta != IVec2::ZERO {
                    self.grid_mut(id).grid.translate(delta);
                    moved.push(id);
                }
                continue;
            }
            participants.push(Participant {
                id,
                remaining: delta,
                candidates: found,
            });
        }

        log::trace!(
            "tick setup: {} participant(s), {} free mover(s)",
            participants.len(),
            moved.len()
        );
        (TickState::new(participants), moved)
    }

    /// Whether grid `id` displaced by `offset` overlaps any of `candidates`.
    pub(crate) fn blocked(
        &self,
        id: GridId,
        candidates: &[GridId],
        offset: IVec2,
        full: bool,
    ) -> bool {
        let grid = &self.grid(id).grid;
        candidates.iter().any(|&other| {
            grid.collides_with_grid_with_offsets(
                Xf::from_pos(offset),
                &self.grid(other).grid,
                Xf::IDENTITY,
                full,
            )
        })
    }

    /// Moves participants one pixel at a time, round-robin, until nobody
    /// can advance.
    fn sweep(&mut self, state: &mut TickState) {
        loop {
            let mut progressed = false;
            for participant in state.participants.iter_mut() {
                if participant.remaining == IVec2::ZERO {
                    continue;
                }
                let step = sweep_steps(participant.remaining, self.axis_parity)
                    .into_iter()
                    .find(|&step| !self.blocked(participant.id, &participant.candidates, step, false));
                if let Some(step) = step {
                    self.grid_mut(participant.id).grid.translate(step);
                    participant.remaining -= step;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_try_diagonal_first() {
        assert_eq!(
            sweep_steps(IVec2::new(3, -1), false),
            vec![IVec2::new(1, -1), IVec2::new(1, 0), IVec2::new(0, -1)]
        );
        assert_eq!(
            sweep_steps(IVec2::new(3, -1), true),
            vec![IVec2::new(1, -1), IVec2::new(0, -1), IVec2::new(1, 0)]
        );
        assert_eq!(sweep_steps(IVec2::new(0, 2), true), vec![IVec2::new(0, 1)]);
        assert!(sweep_steps(IVec2::ZERO, false).is_empty());
    }
}
