//! Group tactics - per-agent strategies layered over flocking.
//!
//! A tactic never writes velocity. It only biases what the steering
//! calculator pursues ([`TacticBias`]) and records its per-agent assignment
//! in the agent's [`SwarmAiState`], so every agent still passes through the
//! integrator's speed clamp.

use crate::components::{AiMode, FlankSide, SwarmAiState, TacticAssignment};
use crate::config::TacticSettings;
use crate::error::SwarmError;
use crate::systems::steering::{nearest, AgentSample, TargetSample};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Identifier of a group tactic. "No tactic" is `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TacticId {
    Surround,
    Flank,
    Wave,
    Ambush,
}

impl TacticId {
    pub const ALL: [TacticId; 4] = [
        TacticId::Surround,
        TacticId::Flank,
        TacticId::Wave,
        TacticId::Ambush,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TacticId::Surround => "surround",
            TacticId::Flank => "flank",
            TacticId::Wave => "wave",
            TacticId::Ambush => "ambush",
        }
    }

    /// Strategy implementing this tactic.
    pub fn behavior(self) -> &'static dyn TacticBehavior {
        match self {
            TacticId::Surround => &SurroundTactic,
            TacticId::Flank => &FlankTactic,
            TacticId::Wave => &WaveTactic,
            TacticId::Ambush => &AmbushTactic,
        }
    }
}

impl fmt::Display for TacticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TacticId {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TacticId::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SwarmError::UnknownTactic(s.to_string()))
    }
}

/// What a tactic wants the steering calculator to pursue this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TacticBias {
    /// Pursue the active targets as plain flocking does.
    #[default]
    None,
    /// Pursue this point instead of the targets.
    Destination(Vec3),
    /// Stay put: brake instead of pursuing.
    Hold,
}

/// Swarm-wide inputs shared by every agent's tactic step.
#[derive(Debug, Clone, Copy)]
pub struct TacticContext<'a> {
    /// Number of live agents this tick.
    pub swarm_size: usize,
    /// Active targets this tick.
    pub targets: &'a [TargetSample],
    /// Seconds since the current tactic was chosen.
    pub elapsed: f32,
    pub settings: &'a TacticSettings,
}

/// Strategy contract for one group tactic.
pub trait TacticBehavior: Send + Sync {
    fn id(&self) -> TacticId;

    /// Decide this agent's bias, updating its AI state in place.
    fn apply(&self, agent: &AgentSample, ctx: &TacticContext<'_>, ai: &mut SwarmAiState) -> TacticBias;
}

// ============================================================================
// SURROUND
// ============================================================================

/// Spread evenly on a ring around the single target.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurroundTactic;

impl TacticBehavior for SurroundTactic {
    fn id(&self) -> TacticId {
        TacticId::Surround
    }

    fn apply(&self, agent: &AgentSample, ctx: &TacticContext<'_>, ai: &mut SwarmAiState) -> TacticBias {
        let Some(target) = ctx.targets.first() else {
            ai.mode = AiMode::Idle;
            return TacticBias::None;
        };

        let angle = match ai.assignment {
            TacticAssignment::Surround { angle } => angle,
            _ => {
                let angle = TAU * agent.slot as f32 / ctx.swarm_size.max(1) as f32;
                ai.assignment = TacticAssignment::Surround { angle };
                angle
            }
        };

        ai.mode = AiMode::Chasing;
        let offset = Vec3::new(angle.cos(), 0.0, angle.sin()) * ctx.settings.surround_radius;
        TacticBias::Destination(target.position + offset)
    }
}

// ============================================================================
// FLANK
// ============================================================================

/// Approach the nearest target from its sides.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlankTactic;

/// Side for a slot. A golden-ratio sequence keeps the right-hand share
/// close to `right_share` for any swarm size.
pub fn flank_side_for(slot: usize, right_share: f32) -> FlankSide {
    const GOLDEN: f64 = 0.618_033_988_749_895;
    let bucket = (slot as f64 * GOLDEN).fract();
    if bucket < right_share as f64 {
        FlankSide::Right
    } else {
        FlankSide::Left
    }
}

impl TacticBehavior for FlankTactic {
    fn id(&self) -> TacticId {
        TacticId::Flank
    }

    fn apply(&self, agent: &AgentSample, ctx: &TacticContext<'_>, ai: &mut SwarmAiState) -> TacticBias {
        let Some(target) = nearest(agent.position, ctx.targets) else {
            ai.mode = AiMode::Idle;
            return TacticBias::None;
        };

        let side = match ai.assignment {
            TacticAssignment::Flank { side } => side,
            _ => {
                let side = flank_side_for(agent.slot, ctx.settings.flank_right_share);
                ai.assignment = TacticAssignment::Flank { side };
                side
            }
        };

        ai.mode = AiMode::Chasing;
        let to_target = target.position - agent.position;
        let lateral = Vec3::new(-to_target.z, 0.0, to_target.x).normalize_or_zero();
        TacticBias::Destination(target.position + lateral * side.sign() * ctx.settings.flank_offset)
    }
}

// ============================================================================
// WAVE
// ============================================================================

/// Release the swarm in staggered groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaveTactic;

impl TacticBehavior for WaveTactic {
    fn id(&self) -> TacticId {
        TacticId::Wave
    }

    fn apply(&self, agent: &AgentSample, ctx: &TacticContext<'_>, ai: &mut SwarmAiState) -> TacticBias {
        let group = match ai.assignment {
            TacticAssignment::Wave { group } => group,
            _ => {
                let group = (agent.slot % ctx.settings.wave_groups.max(1) as usize) as u32;
                ai.assignment = TacticAssignment::Wave { group };
                group
            }
        };

        let release_at = group as f32 * ctx.settings.wave_interval;
        if ctx.elapsed < release_at {
            ai.mode = AiMode::Holding;
            return TacticBias::Hold;
        }

        match nearest(agent.position, ctx.targets) {
            Some(target) => {
                ai.mode = AiMode::Chasing;
                TacticBias::Destination(target.position)
            }
            None => {
                ai.mode = AiMode::Idle;
                TacticBias::None
            }
        }
    }
}

// ============================================================================
// AMBUSH
// ============================================================================

/// Lie in wait until a target wanders close, then commit.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbushTactic;

impl TacticBehavior for AmbushTactic {
    fn id(&self) -> TacticId {
        TacticId::Ambush
    }

    fn apply(&self, agent: &AgentSample, ctx: &TacticContext<'_>, ai: &mut SwarmAiState) -> TacticBias {
        let already_sprung = matches!(ai.assignment, TacticAssignment::Ambush { sprung: true });
        let trigger = ctx.settings.ambush_trigger_radius;
        let sprung = already_sprung
            || ctx
                .targets
                .iter()
                .any(|t| t.position.distance(agent.position) <= trigger);

        ai.assignment = TacticAssignment::Ambush { sprung };
        if sprung {
            ai.mode = AiMode::Attacking;
            TacticBias::None
        } else {
            ai.mode = AiMode::Holding;
            TacticBias::Hold
        }
    }
}
