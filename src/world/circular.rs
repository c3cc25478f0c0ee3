//! Resolution of circular obstructions.
//!
//! The pixel sweep moves one grid at a time, so a ring of grids each waiting
//! on the next never advances. This pass looks for a set of simultaneous
//! one-pixel displacements that leaves every grid collision-free: the stalled
//! grid steps, every grid it now overlaps is pushed in a compatible
//! direction, and so on recursively. The search is a depth-first
//! backtracking walk; continuations carry the work still pending further up
//! the chain so that a failure deep down can retry alternatives of any
//! earlier link.

use std::collections::HashSet;

use glam::IVec2;

use super::{GridManager, tick::TickState};
use crate::utils::{
    allocator::GridId,
    logging::ScopedTimer,
    math::{rotate_dir8, sign_f32, sign_step, signs_compatible},
};

/// Bookkeeping shared by every search of one pass.
#[derive(Debug, Default)]
struct PassMemo {
    displaced: HashSet<GridId>,
    /// Displacements that run into a grid nothing can push. Those grids never
    /// move during the pass, so the verdict holds for every later search.
    blocked: HashSet<(GridId, IVec2)>,
}

struct Search<'a> {
    manager: &'a mut GridManager,
    state: &'a TickState,
    memo: &'a mut PassMemo,
    /// Displacements that failed somewhere further down this search's chain.
    failed: HashSet<(GridId, IVec2)>,
    /// Displacements currently applied, in order.
    chain: Vec<(GridId, IVec2)>,
    max_depth: usize,
}

type Continuation<'k, 'a> = dyn FnMut(&mut Search<'a>) -> bool + 'k;

/// Rotation steps (in 45° units) tried for a direction, nearest first.
fn rotation_order(parity: bool, max_steps: i32) -> Vec<i32> {
    let side = if parity { -1 } else { 1 };
    let mut order = vec![0];
    for step in 1..=max_steps {
        order.push(side * step);
        order.push(-side * step);
    }
    order
}

impl<'a> Search<'a> {
    fn apply(&mut self, id: GridId, dir: IVec2) {
        self.manager.grid_mut(id).grid.translate(dir);
        self.memo.displaced.insert(id);
        self.chain.push((id, dir));
    }

    fn undo(&mut self) {
        if let Some((id, dir)) = self.chain.pop() {
            self.manager.grid_mut(id).grid.translate(-dir);
            self.memo.displaced.remove(&id);
        }
    }

    /// Grids overlapping `id` at its current position.
    fn hits(&self, id: GridId) -> Vec<GridId> {
        let Some(participant) = self.state.get(id) else {
            return Vec::new();
        };
        participant
            .candidates
            .iter()
            .copied()
            .filter(|&other| self.manager.blocked(id, &[other], IVec2::ZERO, true))
            .collect()
    }

    /// Non-participants and infinite masses stay put for the whole pass.
    fn immovable(&self, id: GridId) -> bool {
        self.state.get(id).is_none() || self.manager.grid(id).infinite_mass
    }

    fn pushable(&self, id: GridId) -> bool {
        !self.immovable(id) && !self.memo.displaced.contains(&id)
    }

    /// Directions a blocker may be pushed in: near `push`, and not against
    /// where it is heading anyway.
    fn blocker_dirs(&self, id: GridId, push: IVec2) -> Vec<IVec2> {
        let object = self.manager.grid(id);
        let remaining = self.state.get(id).map_or(IVec2::ZERO, |p| p.remaining);
        let heading = IVec2::new(
            if remaining.x != 0 { remaining.x.signum() } else { sign_f32(object.vel.x) },
            if remaining.y != 0 { remaining.y.signum() } else { sign_f32(object.vel.y) },
        );

        rotation_order(self.manager.axis_parity, 2)
            .into_iter()
            .map(|steps| rotate_dir8(push, steps))
            .filter(|&dir| signs_compatible(dir, heading))
            .collect()
    }

    fn displace(
        &mut self,
        id: GridId,
        dirs: &[IVec2],
        depth: usize,
        next: &mut Continuation<'_, 'a>,
    ) -> bool {
        if depth > self.max_depth {
            return false;
        }

        for &dir in dirs {
            let key = (id, dir);
            if self.memo.blocked.contains(&key) || self.failed.contains(&key) {
                continue;
            }

            self.apply(id, dir);
            let hits = self.hits(id);
            if hits.iter().any(|&hit| self.immovable(hit)) {
                self.undo();
                self.memo.blocked.insert(key);
                continue;
            }
            let ok = hits.iter().all(|&hit| self.pushable(hit))
                && self.displace_all(&hits, dir, depth + 1, next);
            if ok {
                return true;
            }
            self.undo();
            self.failed.insert(key);
        }
        false
    }

    fn displace_all(
        &mut self,
        hits: &[GridId],
        push: IVec2,
        depth: usize,
        next: &mut Continuation<'_, 'a>,
    ) -> bool {
        let Some((&first, rest)) = hits.split_first() else {
            return next(self);
        };
        if self.memo.displaced.contains(&first) {
            // Already moved by an earlier link; the final check still covers it.
            return self.displace_all(rest, push, depth, next);
        }

        let dirs = self.blocker_dirs(first, push);
        self.displace(first, &dirs, depth, &mut |search: &mut Search<'a>| {
            search.displace_all(rest, push, depth, next)
        })
    }

    fn chain_is_clear(&self) -> bool {
        self.chain.iter().all(|&(id, _)| self.hits(id).is_empty())
    }
}

impl GridManager {
    /// Runs one pass over the stalled participants. Returns whether any grid
    /// was displaced.
    pub(super) fn resolve_circular(&mut self, state: &mut TickState) -> bool {
        let _t = ScopedTimer::new("tick::circular");

        let max_depth = self
            .config
            .max_search_depth
            .unwrap_or(state.participants.len());
        let mut memo = PassMemo::default();
        let mut progressed = false;

        for slot in 0..state.participants.len() {
            let (id, remaining) = {
                let p = &state.participants[slot];
                (p.id, p.remaining)
            };
            if remaining == IVec2::ZERO || memo.displaced.contains(&id) {
                continue;
            }

            let heading = sign_step(remaining);
            let dirs: Vec<IVec2> = rotation_order(self.axis_parity, 1)
                .into_iter()
                .map(|steps| rotate_dir8(heading, steps))
                .collect();

            let chain = {
                let mut search = Search {
                    manager: &mut *self,
                    state: &*state,
                    memo: &mut memo,
                    failed: HashSet::new(),
                    chain: Vec::new(),
                    max_depth,
                };
                let found = search.displace(id, &dirs, 0, &mut |s: &mut Search<'_>| {
                    s.chain_is_clear()
                });
                if found { search.chain } else { Vec::new() }
            };
            if chain.is_empty() {
                continue;
            }

            log::trace!("grid {id} cleared a circular obstruction ({} link(s))", chain.len());
            self.commit(state, &chain);
            progressed = true;
        }

        progressed
    }

    /// Charges applied displacements to the remaining deltas, or to the debt
    /// where they went elsewhere.
    fn commit(&mut self, state: &mut TickState, chain: &[(GridId, IVec2)]) {
        for &(id, dir) in chain {
            let Some(participant) = state.get_mut(id) else {
                continue;
            };
            let mut owed = IVec2::ZERO;
            for axis in 0..2 {
                let d = dir[axis];
                let r = participant.remaining[axis];
                if d == 0 {
                    continue;
                }
                if r != 0 && r.signum() == d.signum() {
                    participant.remaining[axis] -= d;
                } else {
                    owed[axis] += d;
                }
            }
            self.grid_mut(id).vel_owed += owed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Grid, TileLayer, Xf};
    use crate::world::{tick::Participant, GridObject};

    fn block(pos: IVec2, width: i32, height: i32) -> Grid {
        let layer = TileLayer::new(width, height, vec![1; (width * height) as usize]);
        Grid::from_layer(&layer, Xf::from_pos(pos)).unwrap()
    }

    #[test]
    fn rotations_alternate_sides() {
        assert_eq!(rotation_order(false, 2), vec![0, 1, -1, 2, -2]);
        assert_eq!(rotation_order(true, 1), vec![0, -1, 1]);
    }

    #[test]
    fn only_fixed_obstacles_are_remembered_across_searches() {
        let mut manager = GridManager::new();
        let pusher = manager.add_grid(GridObject::new(block(IVec2::ZERO, 1, 1)));
        let middle = manager.add_grid(GridObject::new(block(IVec2::new(12, 0), 1, 1)));
        let wall = manager.add_grid(
            GridObject::new(block(IVec2::new(24, -12), 1, 3)).with_infinite_mass(true),
        );
        let state = TickState::new(vec![
            Participant {
                id: pusher,
                remaining: IVec2::new(1, 0),
                candidates: vec![middle, wall],
            },
            Participant {
                id: middle,
                remaining: IVec2::ZERO,
                candidates: vec![pusher, wall],
            },
        ]);

        let mut memo = PassMemo::default();
        let mut search = Search {
            manager: &mut manager,
            state: &state,
            memo: &mut memo,
            failed: HashSet::new(),
            chain: Vec::new(),
            max_depth: 2,
        };
        let found = search.displace(pusher, &[IVec2::X], 0, &mut |s: &mut Search<'_>| {
            s.chain_is_clear()
        });
        assert!(!found);
        assert!(search.chain.is_empty());
        // Sideways pushes on `middle` only failed because `pusher` had moved.
        assert!(search.failed.contains(&(pusher, IVec2::X)));
        assert!(search.failed.contains(&(middle, IVec2::Y)));

        for dir in [IVec2::X, IVec2::new(1, 1), IVec2::new(1, -1)] {
            assert!(memo.blocked.contains(&(middle, dir)));
        }
        assert!(!memo.blocked.contains(&(pusher, IVec2::X)));
        assert!(!memo.blocked.contains(&(middle, IVec2::Y)));
        assert_eq!(manager.grid(pusher).grid.grid_to_world().pos, IVec2::ZERO);
        assert_eq!(manager.grid(middle).grid.grid_to_world().pos, IVec2::new(12, 0));
    }
}
