//! Component store boundary.
//!
//! The swarm core never owns agent storage. It reads and writes agent data
//! through [`ComponentStore`], with one typed accessor per component kind so a
//! missing component is an `Option`, never an untyped lookup.
//!
//! [`EcsStore`] is the `bevy_ecs`-backed implementation: it holds the ECS
//! world plus a [`SpatialGrid`] resource that answers radius queries.

use crate::components::*;
use crate::spatial::{spatial_grid_update_system, SpatialGrid};
use crate::systems::movement::{movement_system, DeltaTime};
use bevy_ecs::prelude::*;
use glam::Vec3;

/// Typed view of the external component store.
///
/// Reads take `&self` and must be safe to call from several threads at once;
/// writes only happen between the gather and apply phases of a tick.
pub trait ComponentStore: Send + Sync {
    /// Bring the neighbour index up to date. Called once at the start of a tick.
    fn refresh_spatial_index(&mut self) {}

    /// Swarm agents (entities with a position that take part in flocking)
    /// within `radius` of `center`.
    fn query_in_radius(&self, center: Vec3, radius: f32) -> Vec<Entity>;

    fn position(&self, entity: Entity) -> Option<Vec3>;
    fn velocity(&self, entity: Entity) -> Option<Vec3>;
    fn rotation(&self, entity: Entity) -> Option<Rotation>;
    fn movement(&self, entity: Entity) -> Option<Movement>;
    fn health(&self, entity: Entity) -> Option<Health>;
    fn ai_state(&self, entity: Entity) -> Option<SwarmAiState>;

    /// Whether the entity exists and has not been deactivated.
    fn is_active(&self, entity: Entity) -> bool;

    fn write_velocity(&mut self, entity: Entity, velocity: Vec3) -> bool;
    fn write_rotation(&mut self, entity: Entity, rotation: Rotation) -> bool;
    fn write_ai_state(&mut self, entity: Entity, state: SwarmAiState) -> bool;

    fn is_dead(&self, entity: Entity) -> bool {
        self.health(entity).is_some_and(|h| h.is_dead())
    }

    /// Alive and active: the only entities that take part in steering.
    fn is_live(&self, entity: Entity) -> bool {
        self.is_active(entity) && !self.is_dead(entity)
    }
}

/// `bevy_ecs` world with a spatial grid, usable as the swarm's component store.
///
/// Also carries the host-side conveniences a game loop needs around the swarm:
/// spawning, killing and deactivating entities, and moving agents by their
/// velocity after each swarm tick.
pub struct EcsStore {
    world: World,
    index_schedule: Schedule,
    movement_schedule: Schedule,
}

impl EcsStore {
    /// Create an empty store with the default grid cell size.
    pub fn new() -> Self {
        Self::with_cell_size(SpatialGrid::default().cell_size)
    }

    /// Create an empty store whose spatial grid uses `cell_size` cells.
    /// Cells roughly the size of the neighbour radius work best. Invalid
    /// sizes are replaced by [`SpatialGrid::DEFAULT_CELL_SIZE`].
    pub fn with_cell_size(cell_size: f32) -> Self {
        let mut world = World::new();
        world.insert_resource(SpatialGrid::new(cell_size));
        world.insert_resource(DeltaTime(0.0));

        let mut index_schedule = Schedule::default();
        index_schedule.add_systems(spatial_grid_update_system);

        let mut movement_schedule = Schedule::default();
        movement_schedule.add_systems(movement_system);

        Self {
            world,
            index_schedule,
            movement_schedule,
        }
    }

    /// Spawn a swarm agent with default components at `position`.
    pub fn spawn_agent(&mut self, position: Vec3) -> Entity {
        self.world.spawn(AgentBundle::at(position)).id()
    }

    /// Spawn a swarm agent from a fully specified bundle.
    pub fn spawn_agent_bundle(&mut self, bundle: AgentBundle) -> Entity {
        self.world.spawn(bundle).id()
    }

    /// Spawn an active target at `position`.
    pub fn spawn_target(&mut self, position: Vec3) -> Entity {
        self.world.spawn(TargetBundle::at(position)).id()
    }

    /// Spawn `count` agents in a square formation centred on `center`.
    pub fn spawn_mass_agents(&mut self, center: Vec3, count: usize, spread: f32) -> Vec<Entity> {
        if count == 0 {
            return Vec::new();
        }
        let cols = (count as f32).sqrt().ceil() as usize;
        let spacing = spread / cols as f32;

        (0..count)
            .map(|i| {
                let row = i / cols;
                let col = i % cols;
                let x = center.x + (col as f32 - cols as f32 / 2.0) * spacing;
                let z = center.z + (row as f32 - (count / cols) as f32 / 2.0) * spacing;
                self.spawn_agent(Vec3::new(x, center.y, z))
            })
            .collect()
    }

    /// Reduce an entity's health to zero. Returns false if it has no health.
    pub fn kill(&mut self, entity: Entity) -> bool {
        match self.world.get_mut::<Health>(entity) {
            Some(mut health) => {
                health.current = 0.0;
                true
            }
            None => false,
        }
    }

    /// Set the activation flag of an entity.
    pub fn set_active(&mut self, entity: Entity, active: bool) -> bool {
        if !self.world.entities().contains(entity) {
            return false;
        }
        self.world.entity_mut(entity).insert(Active(active));
        true
    }

    /// Teleport an entity. Returns false if it has no position.
    pub fn set_position(&mut self, entity: Entity, position: Vec3) -> bool {
        match self.world.get_mut::<Position>(entity) {
            Some(mut pos) => {
                pos.0 = position;
                true
            }
            None => false,
        }
    }

    /// Remove an entity entirely.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity)
    }

    /// Move every living, active entity by its velocity.
    pub fn advance_positions(&mut self, dt: f32) {
        if let Some(mut dt_res) = self.world.get_resource_mut::<DeltaTime>() {
            dt_res.0 = dt;
        }
        self.movement_schedule.run(&mut self.world);
    }

    /// All swarm agent handles, in spawn order.
    pub fn agents(&mut self) -> Vec<Entity> {
        let mut query = self.world.query_filtered::<Entity, With<SwarmAgent>>();
        let mut agents: Vec<Entity> = query.iter(&self.world).collect();
        agents.sort();
        agents
    }

    /// All target handles, in spawn order.
    pub fn targets(&mut self) -> Vec<Entity> {
        let mut query = self.world.query_filtered::<Entity, With<SwarmTarget>>();
        let mut targets: Vec<Entity> = query.iter(&self.world).collect();
        targets.sort();
        targets
    }

    /// Get the spatial grid reference (for debugging/visualization).
    pub fn spatial_grid(&self) -> Option<&SpatialGrid> {
        self.world.get_resource::<SpatialGrid>()
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for EcsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentStore for EcsStore {
    fn refresh_spatial_index(&mut self) {
        self.index_schedule.run(&mut self.world);
    }

    fn query_in_radius(&self, center: Vec3, radius: f32) -> Vec<Entity> {
        self.spatial_grid()
            .map(|grid| {
                grid.query_radius(center, radius)
                    .into_iter()
                    .map(|entry| entry.entity)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn position(&self, entity: Entity) -> Option<Vec3> {
        self.world.get::<Position>(entity).map(|p| p.0)
    }

    fn velocity(&self, entity: Entity) -> Option<Vec3> {
        self.world.get::<Velocity>(entity).map(|v| v.0)
    }

    fn rotation(&self, entity: Entity) -> Option<Rotation> {
        self.world.get::<Rotation>(entity).copied()
    }

    fn movement(&self, entity: Entity) -> Option<Movement> {
        self.world.get::<Movement>(entity).copied()
    }

    fn health(&self, entity: Entity) -> Option<Health> {
        self.world.get::<Health>(entity).copied()
    }

    fn ai_state(&self, entity: Entity) -> Option<SwarmAiState> {
        self.world.get::<SwarmAiState>(entity).copied()
    }

    fn is_active(&self, entity: Entity) -> bool {
        self.world.entities().contains(entity)
            && self.world.get::<Active>(entity).map_or(true, |a| a.0)
    }

    fn write_velocity(&mut self, entity: Entity, velocity: Vec3) -> bool {
        match self.world.get_mut::<Velocity>(entity) {
            Some(mut vel) => {
                vel.0 = velocity;
                true
            }
            None => false,
        }
    }

    fn write_rotation(&mut self, entity: Entity, rotation: Rotation) -> bool {
        match self.world.get_mut::<Rotation>(entity) {
            Some(mut rot) => {
                *rot = rotation;
                true
            }
            None => false,
        }
    }

    fn write_ai_state(&mut self, entity: Entity, state: SwarmAiState) -> bool {
        match self.world.get_mut::<SwarmAiState>(entity) {
            Some(mut ai) => {
                *ai = state;
                true
            }
            None => false,
        }
    }
}
