//! Steering integration - turns a steering vector into velocity and heading.
//!
//! Position is never touched here; a downstream mover (see
//! [`movement_system`](crate::systems::movement::movement_system)) consumes
//! the velocity.

use crate::components::{Movement, Rotation};
use crate::config::SwarmParameters;
use crate::systems::steering::AgentSample;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// New velocity (and heading, when it could be updated) for one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratedMotion {
    pub velocity: Vec3,
    /// `None` when the agent lacks a rotation or movement component, or is
    /// moving too slowly to have a meaningful heading.
    pub rotation: Option<Rotation>,
}

/// Applies steering to agent velocity and heading.
#[derive(Debug, Clone, Copy)]
pub struct SteeringIntegrator<'a> {
    params: &'a SwarmParameters,
}

impl<'a> SteeringIntegrator<'a> {
    pub fn new(params: &'a SwarmParameters) -> Self {
        Self { params }
    }

    /// Speed ceiling for an agent: its own `max_speed` when set, else the swarm's.
    pub fn effective_max_speed(&self, movement: Option<&Movement>) -> f32 {
        movement
            .map(|m| m.max_speed)
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(self.params.maximum_speed)
    }

    /// Integrate one tick of steering. `None` if the agent has no velocity.
    pub fn integrate(&self, agent: &AgentSample, steering: Vec3, delta_time: f32) -> Option<IntegratedMotion> {
        let current = agent.velocity?;

        let steering = if steering.is_finite() {
            steering
        } else {
            tracing::warn!(entity = ?agent.entity, "discarding non-finite steering");
            Vec3::ZERO
        };

        let mut velocity = current + steering * delta_time;
        let speed = velocity.length();
        let max_speed = self.effective_max_speed(agent.movement.as_ref());
        if speed > max_speed {
            velocity *= max_speed / speed;
        }
        if !velocity.is_finite() {
            tracing::warn!(entity = ?agent.entity, "velocity became non-finite, stopping agent");
            velocity = Vec3::ZERO;
        }

        let rotation = match (agent.rotation, agent.movement) {
            (Some(rotation), Some(movement)) if speed > self.params.heading_dead_zone => {
                let target_yaw = velocity.x.atan2(velocity.z);
                Some(Rotation::new(turn_toward(
                    rotation.yaw,
                    target_yaw,
                    movement.rotation_speed * delta_time,
                )))
            }
            _ => None,
        };

        Some(IntegratedMotion { velocity, rotation })
    }
}

/// Wrap an angle into [-PI, PI).
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Ease `yaw` toward `target` by the fraction `rate` of the shortest turn.
pub fn turn_toward(yaw: f32, target: f32, rate: f32) -> f32 {
    if !target.is_finite() {
        return yaw;
    }
    if !yaw.is_finite() {
        return wrap_angle(target);
    }
    let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
    let diff = wrap_angle(target - yaw);
    wrap_angle(yaw + diff * rate)
}
