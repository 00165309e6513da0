//! Swarm configuration: steering weights, flocking parameters and tactic tuning.
//!
//! Every number the algorithms use lives here; nothing is hard-coded in the
//! steering or tactic code. Configs deserialize from JSON with per-field
//! defaults, so a file only needs to name the values it overrides:
//!
//! ```json
//! { "weights": { "cohesion": 0.8 }, "tactics": { "cooldown": 12.0 } }
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Weights applied to each partial steering vector before summing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmWeights {
    pub separation: f32,
    pub alignment: f32,
    pub cohesion: f32,
    pub attraction: f32,
    /// Reserved for evasion of hostile agent types. No input feeds it in this core.
    pub avoidance: f32,
    pub obstacle_avoidance: f32,
}

impl Default for SwarmWeights {
    fn default() -> Self {
        Self {
            separation: 1.5,
            alignment: 1.0,
            cohesion: 1.2,
            attraction: 2.0,
            avoidance: 0.0,
            obstacle_avoidance: 1.5,
        }
    }
}

/// Distances and limits used by the steering calculator and integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmParameters {
    /// Radius of the neighbour query.
    pub neighbor_distance: f32,
    /// Neighbours closer than this push the agent away.
    pub desired_separation: f32,
    /// Desired speed of every steer, and the fallback speed ceiling.
    pub maximum_speed: f32,
    /// Magnitude cap of each partial steer.
    pub maximum_force: f32,
    /// Targets farther than this exert no pull.
    pub attraction_range: f32,
    /// Obstacles are avoided within `radius + avoidance_buffer`.
    pub avoidance_buffer: f32,
    /// Lower bound substituted for near-zero distances.
    pub distance_epsilon: f32,
    /// Below this speed the heading is left alone.
    pub heading_dead_zone: f32,
}

impl Default for SwarmParameters {
    fn default() -> Self {
        Self {
            neighbor_distance: 3.0,
            desired_separation: 1.5,
            maximum_speed: 4.0,
            maximum_force: 0.1,
            attraction_range: 50.0,
            avoidance_buffer: 5.0,
            distance_epsilon: 1e-3,
            heading_dead_zone: 0.1,
        }
    }
}

/// Tactic selection thresholds and per-tactic geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticSettings {
    /// Seconds a chosen tactic stays locked in.
    pub cooldown: f32,
    /// Wave when active agents exceed this...
    pub wave_min_agents: usize,
    /// ...and active targets stay below this.
    pub wave_max_targets: usize,
    /// Flank when active agents exceed this...
    pub flank_min_agents: usize,
    /// ...and active targets reach at least this.
    pub flank_min_targets: usize,
    /// Surround when exactly this many targets are active.
    pub surround_targets: usize,
    /// Radius of the ring surrounding agents spread over.
    pub surround_radius: f32,
    /// Lateral offset of flanking destinations.
    pub flank_offset: f32,
    /// Share of flankers that take the right-hand side.
    pub flank_right_share: f32,
    /// Number of staggered wave groups.
    pub wave_groups: u32,
    /// Seconds between consecutive wave group releases.
    pub wave_interval: f32,
    /// Ambushers spring once a target comes this close.
    pub ambush_trigger_radius: f32,
}

impl Default for TacticSettings {
    fn default() -> Self {
        Self {
            cooldown: 30.0,
            wave_min_agents: 100,
            wave_max_targets: 5,
            flank_min_agents: 50,
            flank_min_targets: 5,
            surround_targets: 1,
            surround_radius: 8.0,
            flank_offset: 10.0,
            flank_right_share: 0.7,
            wave_groups: 3,
            wave_interval: 4.0,
            ambush_trigger_radius: 15.0,
        }
    }
}

/// How target attraction combines several active targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttractionMode {
    /// Every active target pulls; the swarm splits its attention.
    #[default]
    SumAllActive,
    /// Only the nearest active target pulls.
    NearestOnly,
}

/// Complete swarm configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub weights: SwarmWeights,
    pub parameters: SwarmParameters,
    pub tactics: TacticSettings,
    pub attraction_mode: AttractionMode,
}

impl SwarmConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SwarmConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.parameters.validate()?;
        self.tactics.validate()
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be finite and >= 0, got {value}")))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be finite and > 0, got {value}")))
    }
}

impl SwarmWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("weights.separation", self.separation)?;
        non_negative("weights.alignment", self.alignment)?;
        non_negative("weights.cohesion", self.cohesion)?;
        non_negative("weights.attraction", self.attraction)?;
        non_negative("weights.avoidance", self.avoidance)?;
        non_negative("weights.obstacle_avoidance", self.obstacle_avoidance)
    }
}

impl SwarmParameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("parameters.neighbor_distance", self.neighbor_distance)?;
        non_negative("parameters.desired_separation", self.desired_separation)?;
        positive("parameters.maximum_speed", self.maximum_speed)?;
        non_negative("parameters.maximum_force", self.maximum_force)?;
        positive("parameters.attraction_range", self.attraction_range)?;
        non_negative("parameters.avoidance_buffer", self.avoidance_buffer)?;
        positive("parameters.distance_epsilon", self.distance_epsilon)?;
        non_negative("parameters.heading_dead_zone", self.heading_dead_zone)
    }
}

impl TacticSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("tactics.cooldown", self.cooldown)?;
        non_negative("tactics.surround_radius", self.surround_radius)?;
        non_negative("tactics.flank_offset", self.flank_offset)?;
        non_negative("tactics.wave_interval", self.wave_interval)?;
        non_negative("tactics.ambush_trigger_radius", self.ambush_trigger_radius)?;
        if !(0.0..=1.0).contains(&self.flank_right_share) {
            return Err(ConfigError::invalid(
                "tactics.flank_right_share",
                format!("must lie in [0, 1], got {}", self.flank_right_share),
            ));
        }
        if self.wave_groups == 0 {
            return Err(ConfigError::invalid("tactics.wave_groups", "must be at least 1"));
        }
        Ok(())
    }
}
