//! Movement system - the downstream mover that advances positions.
//!
//! The swarm core only writes velocity and heading. Hosts that keep their
//! agents in an [`EcsStore`](crate::store::EcsStore) run this system after
//! each swarm tick to move the agents.

use crate::components::*;
use bevy_ecs::prelude::*;

/// Resource containing the delta time for the current tick.
#[derive(Resource, Default)]
pub struct DeltaTime(pub f32);

/// System that applies velocity to position for living, active entities.
pub fn movement_system(
    dt: Res<DeltaTime>,
    mut query: Query<(&mut Position, &Velocity, Option<&Health>, Option<&Active>)>,
) {
    let delta = dt.0;
    for (mut pos, vel, health, active) in query.iter_mut() {
        // Corpses and parked entities stay where they are
        if health.is_some_and(|h| h.is_dead()) || active.is_some_and(|a| !a.0) {
            continue;
        }
        pos.0 += vel.0 * delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_applies_velocity() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0));

        world.spawn((Position::new(0.0, 0.0, 0.0), Velocity::new(5.0, 0.0, 3.0)));

        let mut schedule = Schedule::default();
        schedule.add_systems(movement_system);
        schedule.run(&mut world);

        let mut query = world.query::<&Position>();
        let pos = query.single(&world);
        assert!((pos.0.x - 5.0).abs() < 0.001);
        assert!((pos.0.z - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_dead_entities_do_not_move() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(1.0));

        let corpse = world
            .spawn((
                Position::new(0.0, 0.0, 0.0),
                Velocity::new(5.0, 0.0, 0.0),
                Health { current: 0.0, max: 10.0 },
            ))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(movement_system);
        schedule.run(&mut world);

        assert_eq!(world.get::<Position>(corpse).unwrap().0.x, 0.0);
    }
}
