//! Snapshot types.
//!
//! `SwarmSnapshot` is a serializable view of the swarm after a tick, for
//! debugging, replays or a visualization client.

use crate::components::AiMode;
use crate::store::ComponentStore;
use crate::systems::selector::TacticState;
use crate::systems::tactics::TacticId;
use bevy_ecs::prelude::Entity;
use serde::{Deserialize, Serialize};

/// Snapshot of a single agent's state for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Entity bits, stable for the entity's lifetime.
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
    pub yaw: f32,
    pub alive: bool,
    pub mode: Option<AiMode>,
}

/// Complete swarm state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwarmSnapshot {
    /// Ticks run by the controller.
    pub tick: u64,
    /// Simulated seconds.
    pub time: f32,
    pub tactic: Option<TacticId>,
    /// Seconds until the next tactic evaluation.
    pub tactic_timer: f32,
    pub agents: Vec<AgentSnapshot>,
}

impl SwarmSnapshot {
    /// Capture the listed agents. Handles without a position are left out.
    pub fn capture<S: ComponentStore + ?Sized>(
        store: &S,
        agents: &[Entity],
        tick: u64,
        time: f32,
        tactic: &TacticState,
    ) -> Self {
        let agents = agents
            .iter()
            .filter_map(|&entity| {
                let position = store.position(entity)?;
                let velocity = store.velocity(entity).unwrap_or_default();
                Some(AgentSnapshot {
                    id: entity.to_bits(),
                    x: position.x,
                    y: position.y,
                    z: position.z,
                    vx: velocity.x,
                    vy: velocity.y,
                    vz: velocity.z,
                    yaw: store.rotation(entity).map_or(0.0, |r| r.yaw),
                    alive: store.is_live(entity),
                    mode: store.ai_state(entity).map(|ai| ai.mode),
                })
            })
            .collect();

        Self {
            tick,
            time,
            tactic: tactic.current,
            tactic_timer: tactic.timer,
            agents,
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty JSON string (for debugging).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a snapshot written by [`to_json`](Self::to_json), e.g. for replays.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
