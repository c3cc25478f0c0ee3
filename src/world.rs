use glam::{IVec2, Vec2};

use crate::{
    collision::broadphase::{AabbTree, NodeId},
    config::PhysicsConfig,
    core::{
        grid::Grid,
        types::{Aabb, Xf},
    },
    dynamics::impulse::BodyMass,
    error::Result,
    utils::{
        allocator::{Arena, GridId},
        math::round_to_ivec,
    },
};

mod circular;
mod contact;
mod tick;

/// A grid plus its simulation state.
#[derive(Debug, Clone, Default)]
pub struct GridObject {
    pub grid: Grid,
    /// Pixels per tick.
    pub vel: Vec2,
    /// Sub-pixel remainder carried into the next tick.
    pub vel_lag: Vec2,
    /// Pixels already travelled ahead of the velocity while clearing
    /// obstructions. Repaid from later deltas.
    pub vel_owed: IVec2,
    pub infinite_mass: bool,
    pub(crate) node: Option<NodeId>,
}

impl GridObject {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_infinite_mass(mut self, infinite_mass: bool) -> Self {
        self.infinite_mass = infinite_mass;
        self
    }

    /// Broad-phase leaf, present while the object is owned by a manager.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn body_mass(&self) -> BodyMass {
        BodyMass::new(self.grid.mass(), self.infinite_mass)
    }
}

/// Owns every grid of a scene and steps them together.
#[derive(Debug)]
pub struct GridManager {
    grids: Arena<GridObject>,
    tree: AabbTree<GridId>,
    axis_parity: bool,
    config: PhysicsConfig,
}

impl Default for GridManager {
    fn default() -> Self {
        Self::new()
    }
}

impl GridManager {
    pub fn new() -> Self {
        Self::from_valid_config(PhysicsConfig::default())
    }

    pub fn with_config(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: PhysicsConfig) -> Self {
        Self {
            grids: Arena::new(),
            tree: AabbTree::new(config.aabb_margin),
            axis_parity: false,
            config,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn add_grid(&mut self, object: GridObject) -> GridId {
        let aabb = Self::grid_aabb(&object.grid, Xf::IDENTITY);
        let id = self.grids.insert(object);
        let node = self.tree.insert(aabb, id);
        self.grid_mut(id).node = Some(node);
        log::debug!("Added grid {id}");
        id
    }

    /// Removes a grid and hands it back. Panics on an unknown id.
    pub fn remove_grid(&mut self, id: GridId) -> GridObject {
        let mut object = self
            .grids
            .remove(id)
            .unwrap_or_else(|| panic!("Unknown grid {id}."));
        if let Some(node) = object.node.take() {
            self.tree.remove(node);
        }
        log::debug!("Removed grid {id}");
        object
    }

    /// Panics on an unknown id.
    pub fn grid(&self, id: GridId) -> &GridObject {
        self.grids
            .get(id)
            .unwrap_or_else(|| panic!("Unknown grid {id}."))
    }

    pub fn try_grid(&self, id: GridId) -> Option<&GridObject> {
        self.grids.get(id)
    }

    pub(crate) fn grid_mut(&mut self, id: GridId) -> &mut GridObject {
        self.grids
            .get_mut(id)
            .unwrap_or_else(|| panic!("Unknown grid {id}."))
    }

    pub fn grid_ids(&self) -> Vec<GridId> {
        self.grids.ids().collect()
    }

    pub fn grid_count(&self) -> usize {
        self.grids.len()
    }

    /// Edits a grid in place and then refreshes its broad-phase entry. This
    /// is the only mutable access to a managed grid.
    pub fn modify_grid<R>(&mut self, id: GridId, edit: impl FnOnce(&mut GridObject) -> R) -> R {
        let ret = edit(self.grid_mut(id));
        self.refresh_node(id);
        ret
    }

    pub(crate) fn refresh_node(&mut self, id: GridId) -> bool {
        let object = self.grid(id);
        let Some(node) = object.node else {
            return false;
        };
        let aabb = Self::grid_aabb(&object.grid, Xf::IDENTITY);
        let hint = round_to_ivec(object.vel);
        self.tree.update(node, aabb, hint)
    }

    /// World-space box of `grid` displaced by `offset`.
    pub fn grid_aabb(grid: &Grid, offset: Xf) -> Aabb {
        grid.world_aabb(offset)
    }

    pub fn aabb_tree(&self) -> &AabbTree<GridId> {
        &self.tree
    }

    /// Axis order tie-break used by the current tick.
    pub fn axis_parity(&self) -> bool {
        self.axis_parity
    }

    /// Visits the grids colliding with grid `id` displaced by the world-space
    /// `offset`. `visit` returns `true` to stop; the return value tells
    /// whether it did.
    pub fn collide_grid(
        &self,
        id: GridId,
        offset: Xf,
        full: bool,
        visit: impl FnMut(GridId) -> bool,
    ) -> bool {
        let grid = &self.grid(id).grid;
        self.collide_impl(grid, offset, full, Some(id), visit)
    }

    /// Same as [`GridManager::collide_grid`] for a grid this manager does not
    /// own.
    pub fn collide_external_grid(
        &self,
        grid: &Grid,
        offset: Xf,
        full: bool,
        visit: impl FnMut(GridId) -> bool,
    ) -> bool {
        self.collide_impl(grid, offset, full, None, visit)
    }

    fn collide_impl(
        &self,
        grid: &Grid,
        offset: Xf,
        full: bool,
        skip: Option<GridId>,
        mut visit: impl FnMut(GridId) -> bool,
    ) -> bool {
        let aabb = Self::grid_aabb(grid, offset);
        self.tree.collide_aabb(&aabb, |_, &other| {
            Some(other) != skip
                && grid.collides_with_grid_with_offsets(
                    offset,
                    &self.grid(other).grid,
                    Xf::IDENTITY,
                    full,
                )
                && visit(other)
        })
    }

    /// Broad-phase candidates only.
    pub fn collide_aabb_approx(&self, aabb: &Aabb, mut visit: impl FnMut(GridId) -> bool) -> bool {
        self.tree.collide_aabb(aabb, |_, &id| visit(id))
    }

    /// Broad-phase candidates only.
    pub fn collide_point_approx(&self, point: IVec2, mut visit: impl FnMut(GridId) -> bool) -> bool {
        self.tree.collide_point(point, |_, &id| visit(id))
    }

    /// Visits the grids whose shape covers the world-space pixel.
    pub fn collide_point(&self, pixel: IVec2, mut visit: impl FnMut(GridId) -> bool) -> bool {
        self.collide_point_approx(pixel, |id| {
            self.grid(id).grid.collides_with_point_in_world_space(pixel) && visit(id)
        })
    }
}
