//! ECS Components for the swarm simulation.
//!
//! Components are pure data containers attached to entities.
//! All swarm logic lives in the steering/tactic systems that read these
//! components through the [`ComponentStore`](crate::store::ComponentStore).

use bevy_ecs::prelude::*;
use glam::Vec3;
use serde::{Deserialize, Serialize};

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// World-space position (y = up, the swarm moves over the x/z ground plane).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec3);

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }
}

/// Linear velocity in world units per second.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec3);

impl Velocity {
    pub fn new(vx: f32, vy: f32, vz: f32) -> Self {
        Self(Vec3::new(vx, vy, vz))
    }
}

/// Heading around the vertical axis, in radians.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub yaw: f32,
}

impl Rotation {
    pub fn new(yaw: f32) -> Self {
        Self { yaw }
    }
}

/// Per-agent movement limits.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Speed ceiling (units per second). Non-positive means "use the swarm default".
    pub max_speed: f32,
    /// Turn rate used when easing the heading toward the velocity direction.
    pub rotation_speed: f32,
}

impl Movement {
    pub fn new(max_speed: f32, rotation_speed: f32) -> Self {
        Self {
            max_speed,
            rotation_speed,
        }
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self {
            max_speed: 5.0,
            rotation_speed: 5.0,
        }
    }
}

// ============================================================================
// STATE COMPONENTS
// ============================================================================

/// Health of an agent. Damage resolution happens outside the swarm core;
/// the swarm only observes [`Health::is_dead`].
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Activation flag owned by the spawner. Entities without it count as active.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Active(pub bool);

impl Default for Active {
    fn default() -> Self {
        Self(true)
    }
}

/// Marker for entities that take part in the swarm neighbour query.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SwarmAgent;

/// Marker for entities the swarm pursues.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SwarmTarget;

// ============================================================================
// AI STATE COMPONENTS
// ============================================================================

/// Coarse behaviour mode of a swarm agent, written by the tactic layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiMode {
    #[default]
    Idle,
    /// Pursuing a target or a tactic destination.
    Chasing,
    /// Waiting for a wave release or an ambush trigger.
    Holding,
    /// Ambush sprung; pursuing at full commitment.
    Attacking,
}

/// Side of the target a flanking agent approaches from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlankSide {
    Left,
    Right,
}

impl FlankSide {
    pub fn sign(self) -> f32 {
        match self {
            FlankSide::Left => -1.0,
            FlankSide::Right => 1.0,
        }
    }
}

/// Tactic-specific data remembered per agent so assignments stay stable
/// while the swarm population changes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum TacticAssignment {
    #[default]
    Unassigned,
    Surround { angle: f32 },
    Flank { side: FlankSide },
    Wave { group: u32 },
    Ambush { sprung: bool },
}

/// AI state blob owned by the tactic layer.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SwarmAiState {
    pub mode: AiMode,
    pub assignment: TacticAssignment,
}

// ============================================================================
// STATIC WORLD DATA
// ============================================================================

/// Static spherical obstacle. Passed to the swarm by value every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub position: Vec3,
    pub radius: f32,
}

impl Obstacle {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self { position, radius }
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning a complete swarm agent.
#[derive(Bundle, Default)]
pub struct AgentBundle {
    pub agent: SwarmAgent,
    pub position: Position,
    pub velocity: Velocity,
    pub rotation: Rotation,
    pub movement: Movement,
    pub health: Health,
    pub active: Active,
    pub ai: SwarmAiState,
}

impl AgentBundle {
    pub fn at(position: Vec3) -> Self {
        Self {
            position: Position(position),
            ..Default::default()
        }
    }
}

/// Bundle for spawning a target.
#[derive(Bundle, Default)]
pub struct TargetBundle {
    pub target: SwarmTarget,
    pub position: Position,
    pub active: Active,
}

impl TargetBundle {
    pub fn at(position: Vec3) -> Self {
        Self {
            position: Position(position),
            ..Default::default()
        }
    }
}
