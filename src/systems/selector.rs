//! Tactic selection - a cooldown-gated decision over swarm population.
//!
//! The selector re-evaluates only when its timer runs out, so a swarm that
//! chose a tactic keeps it for the whole cooldown even if the population
//! shifts in the meantime.

use crate::config::TacticSettings;
use crate::error::SwarmError;
use crate::systems::tactics::TacticId;
use serde::{Deserialize, Serialize};

/// Population counts a decision is based on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    /// Agents alive and active.
    pub active_agents: usize,
    /// Targets active.
    pub active_targets: usize,
}

/// Tactic state owned by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TacticState {
    pub current: Option<TacticId>,
    /// Seconds until the next evaluation.
    pub timer: f32,
    pub cooldown: f32,
    /// Seconds since the current tactic was chosen.
    pub elapsed: f32,
}

impl TacticState {
    fn new(cooldown: f32) -> Self {
        Self {
            current: None,
            timer: 0.0,
            cooldown,
            elapsed: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionSource {
    /// The cooldown ran out and the census was evaluated.
    Scheduled,
    /// A manual override.
    Forced,
}

/// One decision instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TacticDecision {
    pub tactic: Option<TacticId>,
    pub previous: Option<TacticId>,
    /// `None` for forced decisions.
    pub census: Option<Census>,
    pub source: DecisionSource,
}

/// Chooses the swarm's group tactic.
#[derive(Debug, Clone)]
pub struct TacticSelector {
    state: TacticState,
}

impl TacticSelector {
    pub fn new(cooldown: f32) -> Self {
        Self {
            state: TacticState::new(cooldown),
        }
    }

    /// Pure decision rule. Earlier rules win.
    pub fn choose(census: Census, settings: &TacticSettings) -> Option<TacticId> {
        let Census {
            active_agents: agents,
            active_targets: targets,
        } = census;

        if agents > settings.wave_min_agents && targets < settings.wave_max_targets {
            Some(TacticId::Wave)
        } else if agents > settings.flank_min_agents && targets >= settings.flank_min_targets {
            Some(TacticId::Flank)
        } else if targets == settings.surround_targets {
            Some(TacticId::Surround)
        } else {
            None
        }
    }

    /// Advance the timer by `delta_time`, deciding when it runs out.
    pub fn advance(&mut self, delta_time: f32, census: Census, settings: &TacticSettings) -> Option<TacticDecision> {
        self.state.timer -= delta_time;
        self.state.elapsed += delta_time;

        if self.state.timer > 0.0 {
            return None;
        }

        let tactic = Self::choose(census, settings);
        Some(self.commit(tactic, Some(census), DecisionSource::Scheduled))
    }

    /// Override the current tactic. Counts as a decision instant.
    pub fn force(&mut self, tactic: Option<TacticId>) -> TacticDecision {
        self.commit(tactic, None, DecisionSource::Forced)
    }

    /// Override by name; `"none"` clears the tactic. An unknown name still
    /// clears the tactic, then reports the error.
    pub fn force_named(&mut self, name: &str) -> Result<TacticDecision, SwarmError> {
        if name.trim().eq_ignore_ascii_case("none") {
            return Ok(self.force(None));
        }
        match name.parse::<TacticId>() {
            Ok(tactic) => Ok(self.force(Some(tactic))),
            Err(err) => {
                tracing::warn!(name, "unknown tactic requested, reverting to pure flocking");
                self.force(None);
                Err(err)
            }
        }
    }

    /// Change the cooldown used from the next decision on.
    pub fn set_cooldown(&mut self, cooldown: f32) {
        self.state.cooldown = cooldown;
    }

    pub fn state(&self) -> &TacticState {
        &self.state
    }

    pub fn current(&self) -> Option<TacticId> {
        self.state.current
    }

    fn commit(&mut self, tactic: Option<TacticId>, census: Option<Census>, source: DecisionSource) -> TacticDecision {
        let previous = self.state.current;
        self.state.current = tactic;
        self.state.timer = self.state.cooldown;
        self.state.elapsed = 0.0;

        match census {
            Some(c) => tracing::info!(
                tactic = tactic.map_or("none", TacticId::name),
                previous = previous.map_or("none", TacticId::name),
                agents = c.active_agents,
                targets = c.active_targets,
                ?source,
                "swarm tactic decided"
            ),
            None => tracing::info!(
                tactic = tactic.map_or("none", TacticId::name),
                previous = previous.map_or("none", TacticId::name),
                ?source,
                "swarm tactic decided"
            ),
        }

        TacticDecision {
            tactic,
            previous,
            census,
            source,
        }
    }
}

impl Default for TacticSelector {
    fn default() -> Self {
        Self::new(TacticSettings::default().cooldown)
    }
}
