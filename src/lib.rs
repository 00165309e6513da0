//! Swarm Sim - Swarm AI Core
//!
//! Boid flocking for large hostile swarms, layered with a cooldown-gated
//! tactic selector (Surround / Flank / Wave / Ambush).
//! Agent data lives in an external [`ComponentStore`]; [`EcsStore`] backs it
//! with `bevy_ecs`.

pub mod api;
pub mod components;
pub mod config;
pub mod error;
pub mod spatial;
pub mod store;
pub mod systems;
pub mod world;

pub use bevy_ecs::entity::Entity;

pub use api::{SwarmController, TickReport};
pub use components::*;
pub use config::{AttractionMode, SwarmConfig, SwarmParameters, SwarmWeights, TacticSettings};
pub use error::{ConfigError, SwarmError};
pub use spatial::{SpatialEntry, SpatialGrid};
pub use store::{ComponentStore, EcsStore};
pub use systems::*;
pub use world::{AgentSnapshot, SwarmSnapshot};
