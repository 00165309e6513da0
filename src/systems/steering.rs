//! Boid steering for swarm agents.
//!
//! Combines the five classical forces into one steering vector per agent:
//! separation, alignment, cohesion, target attraction and obstacle
//! avoidance. Every partial force follows the same recipe: pick a desired
//! direction, scale it to `maximum_speed`, subtract the current velocity and
//! clamp the result to `maximum_force`. The weighted sum is what the
//! integrator adds to the velocity.
//!
//! ## Data Access
//! - Reads: the agent sample, the store (neighbour query, neighbour
//!   position/velocity/health/active), target samples, obstacles
//! - Writes: nothing

use crate::components::{Movement, Obstacle, Rotation, SwarmAiState};
use crate::config::{AttractionMode, SwarmConfig, SwarmParameters, SwarmWeights};
use crate::store::ComponentStore;
use crate::systems::tactics::TacticBias;
use bevy_ecs::prelude::Entity;
use glam::Vec3;

// ============================================================================
// TICK SAMPLES
// ============================================================================

/// Per-tick read of one live swarm agent.
///
/// Sampled once before any agent is steered so every agent sees the same
/// previous-tick state, whatever order the swarm is processed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentSample {
    pub entity: Entity,
    /// Index among the live agents of this tick (drives tactic assignments).
    pub slot: usize,
    pub position: Vec3,
    pub velocity: Option<Vec3>,
    pub rotation: Option<Rotation>,
    pub movement: Option<Movement>,
    pub ai: Option<SwarmAiState>,
}

impl AgentSample {
    /// Sample an agent. `None` for dead, inactive or position-less agents.
    pub fn read<S: ComponentStore + ?Sized>(store: &S, entity: Entity, slot: usize) -> Option<Self> {
        if !store.is_live(entity) {
            return None;
        }
        Some(Self {
            entity,
            slot,
            position: store.position(entity)?,
            velocity: store.velocity(entity),
            rotation: store.rotation(entity),
            movement: store.movement(entity),
            ai: store.ai_state(entity),
        })
    }
}

/// Per-tick read of one active target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSample {
    pub entity: Entity,
    pub position: Vec3,
}

impl TargetSample {
    /// Sample a target. `None` for inactive or position-less targets.
    pub fn read<S: ComponentStore + ?Sized>(store: &S, entity: Entity) -> Option<Self> {
        if !store.is_active(entity) {
            return None;
        }
        Some(Self {
            entity,
            position: store.position(entity)?,
        })
    }
}

// ============================================================================
// STEERING FORCES
// ============================================================================

/// Unweighted partial steering forces for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringForces {
    pub separation: Vec3,
    pub alignment: Vec3,
    pub cohesion: Vec3,
    pub attraction: Vec3,
    pub obstacle_avoidance: Vec3,
    /// Braking force of agents a tactic told to hold.
    pub brake: Vec3,
}

impl SteeringForces {
    /// Sum of the flocking partials (separation + alignment + cohesion), weighted.
    pub fn flocking(&self, weights: &SwarmWeights) -> Vec3 {
        self.separation * weights.separation
            + self.alignment * weights.alignment
            + self.cohesion * weights.cohesion
    }

    /// The steering vector: every partial scaled by its weight and summed.
    /// Holding replaces pursuit, so the brake shares the attraction weight.
    pub fn total(&self, weights: &SwarmWeights) -> Vec3 {
        self.flocking(weights)
            + self.attraction * weights.attraction
            + self.obstacle_avoidance * weights.obstacle_avoidance
            + self.brake * weights.attraction
    }
}

/// Separation, alignment and cohesion from the local neighbourhood.
#[derive(Debug, Clone, Copy, Default)]
struct Flock {
    separation: Vec3,
    alignment: Vec3,
    cohesion: Vec3,
}

// ============================================================================
// STEERING CALCULATOR
// ============================================================================

/// Computes steering forces from a borrowed swarm configuration.
#[derive(Debug, Clone, Copy)]
pub struct SteeringCalculator<'a> {
    weights: &'a SwarmWeights,
    params: &'a SwarmParameters,
    mode: AttractionMode,
}

impl<'a> SteeringCalculator<'a> {
    pub fn new(config: &'a SwarmConfig) -> Self {
        Self {
            weights: &config.weights,
            params: &config.parameters,
            mode: config.attraction_mode,
        }
    }

    /// Weighted steering vector for `agent`.
    pub fn steer<S: ComponentStore + ?Sized>(
        &self,
        agent: &AgentSample,
        store: &S,
        targets: &[TargetSample],
        obstacles: &[Obstacle],
        bias: TacticBias,
    ) -> Vec3 {
        self.calculate(agent, store, targets, obstacles, bias)
            .total(self.weights)
    }

    /// All partial forces for `agent`, unweighted.
    pub fn calculate<S: ComponentStore + ?Sized>(
        &self,
        agent: &AgentSample,
        store: &S,
        targets: &[TargetSample],
        obstacles: &[Obstacle],
        bias: TacticBias,
    ) -> SteeringForces {
        let velocity = agent.velocity.unwrap_or(Vec3::ZERO);
        let flock = self.flock(agent, velocity, store);

        let mut forces = SteeringForces {
            separation: flock.separation,
            obstacle_avoidance: self.obstacle_avoidance(agent.position, velocity, obstacles),
            ..Default::default()
        };

        match bias {
            TacticBias::Hold => {
                forces.brake = (-velocity).clamp_length_max(self.params.maximum_force);
            }
            TacticBias::Destination(point) => {
                forces.alignment = flock.alignment;
                forces.cohesion = flock.cohesion;
                forces.attraction = self.pull(agent.position, velocity, point);
            }
            TacticBias::None => {
                forces.alignment = flock.alignment;
                forces.cohesion = flock.cohesion;
                forces.attraction = self.attraction(agent.position, velocity, targets);
            }
        }

        forces
    }

    /// Desired direction -> clamped steer.
    #[inline]
    fn steer_toward(&self, direction: Vec3, velocity: Vec3) -> Vec3 {
        let desired = direction.normalize_or_zero() * self.params.maximum_speed;
        (desired - velocity).clamp_length_max(self.params.maximum_force)
    }

    fn flock<S: ComponentStore + ?Sized>(&self, agent: &AgentSample, velocity: Vec3, store: &S) -> Flock {
        let params = self.params;

        let mut separation_sum = Vec3::ZERO;
        let mut velocity_sum = Vec3::ZERO;
        let mut velocity_count = 0u32;
        let mut position_sum = Vec3::ZERO;
        let mut neighbor_count = 0u32;

        for other in store.query_in_radius(agent.position, params.neighbor_distance) {
            if other == agent.entity || !store.is_live(other) {
                continue;
            }
            let Some(other_pos) = store.position(other) else {
                continue;
            };

            let distance = agent.position.distance(other_pos);
            // The query radius is inclusive
            if distance >= params.neighbor_distance {
                continue;
            }

            if distance < params.desired_separation {
                let away = (agent.position - other_pos)
                    .try_normalize()
                    .unwrap_or_else(|| stacked_escape(agent.entity));
                separation_sum += away / distance.max(params.distance_epsilon);
            }

            if let Some(other_vel) = store.velocity(other) {
                velocity_sum += other_vel;
                velocity_count += 1;
            }

            position_sum += other_pos;
            neighbor_count += 1;
        }

        let mut flock = Flock::default();
        if neighbor_count == 0 {
            return flock;
        }

        if separation_sum != Vec3::ZERO {
            flock.separation = self.steer_toward(separation_sum, velocity);
        }
        if velocity_count > 0 {
            flock.alignment = self.steer_toward(velocity_sum / velocity_count as f32, velocity);
        }
        let centroid = position_sum / neighbor_count as f32;
        flock.cohesion = self.steer_toward(centroid - agent.position, velocity);

        flock
    }

    /// Pull toward one point, fading out linearly over `attraction_range`.
    fn pull(&self, position: Vec3, velocity: Vec3, point: Vec3) -> Vec3 {
        let to_point = point - position;
        let distance = to_point.length();
        if distance <= 0.0 {
            return Vec3::ZERO;
        }
        let strength = (1.0 - distance / self.params.attraction_range).max(0.0);
        self.steer_toward(to_point, velocity) * strength
    }

    fn attraction(&self, position: Vec3, velocity: Vec3, targets: &[TargetSample]) -> Vec3 {
        match self.mode {
            AttractionMode::SumAllActive => targets
                .iter()
                .map(|t| self.pull(position, velocity, t.position))
                .fold(Vec3::ZERO, |acc, pull| acc + pull),
            AttractionMode::NearestOnly => nearest(position, targets)
                .map(|t| self.pull(position, velocity, t.position))
                .unwrap_or(Vec3::ZERO),
        }
    }

    fn obstacle_avoidance(&self, position: Vec3, velocity: Vec3, obstacles: &[Obstacle]) -> Vec3 {
        let mut total = Vec3::ZERO;
        for obstacle in obstacles {
            let distance = position.distance(obstacle.position);
            if distance < obstacle.radius + self.params.avoidance_buffer {
                total += self.steer_toward(position - obstacle.position, velocity);
            }
        }
        total
    }
}

/// Ground-plane direction an agent leaves along when it shares a neighbour's
/// exact position. Golden-angle steps give every entity index its own heading.
fn stacked_escape(entity: Entity) -> Vec3 {
    const GOLDEN_ANGLE: f32 = 2.399_963;
    let angle = (entity.index() as f32 * GOLDEN_ANGLE).rem_euclid(std::f32::consts::TAU);
    Vec3::new(angle.cos(), 0.0, angle.sin())
}

/// Nearest target to `position`; the earliest one wins ties.
pub fn nearest(position: Vec3, targets: &[TargetSample]) -> Option<&TargetSample> {
    targets.iter().fold(None, |best: Option<&TargetSample>, t| match best {
        Some(b) if b.position.distance_squared(position) <= t.position.distance_squared(position) => Some(b),
        _ => Some(t),
    })
}
