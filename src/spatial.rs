//! Spatial partitioning for efficient neighbor queries.
//!
//! Provides O(1) cell lookup and O(k) neighbor queries where k is the number
//! of entities in nearby cells, rather than O(n) for brute force.
//! Cells tile the ground (x/z) plane; the radius test itself is full 3D.

use crate::components::{Active, Health, Position, SwarmAgent};
use bevy_ecs::prelude::*;
use glam::Vec3;
use std::collections::HashMap;

/// Grid-based spatial partitioning structure.
///
/// Divides the ground plane into cells and tracks which entities are in each
/// cell. Enables fast neighbor queries by only checking nearby cells.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units.
    pub cell_size: f32,
    /// Map from cell coordinates to list of entities in that cell.
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    /// Reverse lookup: entity to cell.
    entity_cells: HashMap<Entity, (i32, i32)>,
}

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub position: Vec3,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CELL_SIZE)
    }
}

impl SpatialGrid {
    /// Default edge length of a cell, in world units.
    pub const DEFAULT_CELL_SIZE: f32 = 4.0;

    /// Create a new spatial grid with the given cell size.
    /// Non-finite or non-positive sizes fall back to [`Self::DEFAULT_CELL_SIZE`].
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            tracing::warn!(cell_size, "invalid spatial grid cell size, using default");
            Self::DEFAULT_CELL_SIZE
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            entity_cells: HashMap::new(),
        }
    }

    /// Convert a world position to ground-plane cell coordinates.
    #[inline]
    pub fn world_to_cell(&self, position: Vec3) -> (i32, i32) {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.z / self.cell_size).floor() as i32,
        )
    }

    /// Clear all entries (call at start of each tick before rebuilding).
    pub fn clear(&mut self) {
        self.cells.clear();
        self.entity_cells.clear();
    }

    /// Insert an entity at a position.
    pub fn insert(&mut self, entity: Entity, position: Vec3) {
        let cell = self.world_to_cell(position);

        // Remove from old cell if moved
        if let Some(&old_cell) = self.entity_cells.get(&entity) {
            if let Some(entries) = self.cells.get_mut(&old_cell) {
                entries.retain(|e| e.entity != entity);
            }
        }

        self.cells
            .entry(cell)
            .or_default()
            .push(SpatialEntry { entity, position });
        self.entity_cells.insert(entity, cell);
    }

    /// Remove an entity from the grid.
    pub fn remove(&mut self, entity: Entity) {
        if let Some(cell) = self.entity_cells.remove(&entity) {
            if let Some(entries) = self.cells.get_mut(&cell) {
                entries.retain(|e| e.entity != entity);
            }
        }
    }

    /// Query all entities within a radius of a point.
    /// Returns entries sorted by distance (closest first, ties by entity).
    pub fn query_radius(&self, center: Vec3, radius: f32) -> Vec<SpatialEntry> {
        if !radius.is_finite() || radius < 0.0 {
            return Vec::new();
        }

        let radius_sq = radius * radius;
        let cells_to_check = ((radius / self.cell_size).ceil() as i32).saturating_add(1);
        let center_cell = self.world_to_cell(center);

        let mut results = Vec::new();
        let mut collect = |entries: &[SpatialEntry]| {
            for entry in entries {
                if entry.position.distance_squared(center) <= radius_sq {
                    results.push(*entry);
                }
            }
        };

        // Wide queries visit the occupied cells instead of the whole window
        let side = 2 * cells_to_check as u64 + 1;
        if side.saturating_mul(side) > self.cells.len() as u64 {
            for entries in self.cells.values() {
                collect(entries);
            }
        } else {
            for dx in -cells_to_check..=cells_to_check {
                for dz in -cells_to_check..=cells_to_check {
                    let cell = (
                        center_cell.0.saturating_add(dx),
                        center_cell.1.saturating_add(dz),
                    );
                    if let Some(entries) = self.cells.get(&cell) {
                        collect(entries);
                    }
                }
            }
        }

        results.sort_by(|a, b| {
            let dist_a = a.position.distance_squared(center);
            let dist_b = b.position.distance_squared(center);
            dist_a
                .partial_cmp(&dist_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entity.cmp(&b.entity))
        });

        results
    }

    /// Get count of entities in a cell.
    pub fn cell_count(&self, cell: (i32, i32)) -> usize {
        self.cells.get(&cell).map(|v| v.len()).unwrap_or(0)
    }

    /// Get total entity count.
    pub fn total_count(&self) -> usize {
        self.entity_cells.len()
    }
}

/// System that rebuilds the spatial grid from living, active swarm agents.
pub fn spatial_grid_update_system(
    mut grid: ResMut<SpatialGrid>,
    query: Query<(Entity, &Position, Option<&Health>, Option<&Active>), With<SwarmAgent>>,
) {
    grid.clear();

    for (entity, pos, health, active) in query.iter() {
        if health.is_some_and(|h| h.is_dead()) || active.is_some_and(|a| !a.0) {
            continue;
        }
        grid.insert(entity, pos.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_grid_insert_query() {
        let mut grid = SpatialGrid::new(10.0);

        let e1 = Entity::from_raw(1);
        let e2 = Entity::from_raw(2);
        let e3 = Entity::from_raw(3);

        grid.insert(e1, Vec3::new(5.0, 0.0, 5.0));
        grid.insert(e2, Vec3::new(15.0, 0.0, 5.0));
        grid.insert(e3, Vec3::new(100.0, 0.0, 100.0));

        // Query around e1
        let nearby = grid.query_radius(Vec3::new(5.0, 0.0, 5.0), 15.0);
        assert_eq!(nearby.len(), 2);
        assert_eq!(nearby[0].entity, e1);

        // Query with smaller radius
        let nearby = grid.query_radius(Vec3::new(5.0, 0.0, 5.0), 5.0);
        assert_eq!(nearby.len(), 1);

        // Query far away
        let nearby = grid.query_radius(Vec3::new(100.0, 0.0, 100.0), 10.0);
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].entity, e3);
    }

    #[test]
    fn test_vertical_distance_counts() {
        let mut grid = SpatialGrid::new(10.0);
        grid.insert(Entity::from_raw(1), Vec3::new(0.0, 20.0, 0.0));

        // Same ground cell, but too high above the query point.
        assert!(grid.query_radius(Vec3::ZERO, 5.0).is_empty());
        assert_eq!(grid.query_radius(Vec3::ZERO, 25.0).len(), 1);
    }

    #[test]
    fn test_reinsert_moves_entity() {
        let mut grid = SpatialGrid::new(10.0);
        let e1 = Entity::from_raw(1);

        grid.insert(e1, Vec3::new(0.0, 0.0, 0.0));
        grid.insert(e1, Vec3::new(55.0, 0.0, 0.0));

        assert_eq!(grid.total_count(), 1);
        assert_eq!(grid.cell_count((0, 0)), 0);
        assert_eq!(grid.cell_count((5, 0)), 1);

        grid.remove(e1);
        assert_eq!(grid.total_count(), 0);
    }

    #[test]
    fn test_invalid_cell_size_falls_back() {
        for cell_size in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            let mut grid = SpatialGrid::new(cell_size);
            assert_eq!(grid.cell_size, SpatialGrid::DEFAULT_CELL_SIZE);

            let e1 = Entity::from_raw(1);
            grid.insert(e1, Vec3::new(1.0, 0.0, 1.0));
            let nearby = grid.query_radius(Vec3::ZERO, 3.0);
            assert_eq!(nearby.len(), 1);
            assert_eq!(nearby[0].entity, e1);
        }
    }

    #[test]
    fn test_huge_radius_scans_occupied_cells() {
        let mut grid = SpatialGrid::new(1.0);
        grid.insert(Entity::from_raw(1), Vec3::new(-500.0, 0.0, 0.0));
        grid.insert(Entity::from_raw(2), Vec3::new(900.0, 0.0, 300.0));

        assert_eq!(grid.query_radius(Vec3::ZERO, 1.0e30).len(), 2);
        assert_eq!(grid.query_radius(Vec3::ZERO, f32::MAX).len(), 2);
    }

    #[test]
    fn test_update_system_skips_dead_and_inactive() {
        let mut world = World::new();
        world.insert_resource(SpatialGrid::new(5.0));

        world.spawn((SwarmAgent, Position::new(0.0, 0.0, 0.0), Health::new(10.0)));
        world.spawn((SwarmAgent, Position::new(1.0, 0.0, 0.0), Health { current: 0.0, max: 10.0 }));
        world.spawn((SwarmAgent, Position::new(2.0, 0.0, 0.0), Active(false)));
        // Not a swarm agent at all.
        world.spawn(Position::new(3.0, 0.0, 0.0));

        let mut schedule = Schedule::default();
        schedule.add_systems(spatial_grid_update_system);
        schedule.run(&mut world);

        assert_eq!(world.resource::<SpatialGrid>().total_count(), 1);
    }
}
