//! Public API for the swarm.
//!
//! [`SwarmController`] is the one entry point a game loop talks to. It owns
//! the configuration and the tactic selector, borrows agent data through a
//! [`ComponentStore`], and runs one synchronous tick per [`update`] call.
//!
//! ## Tick Pipeline
//!
//! 1. Refresh the store's spatial index
//! 2. Sample live agents and active targets (the census)
//! 3. Advance the tactic selector, which may decide a new tactic
//! 4. **Gather phase** - per agent: tactic bias, steering, integration into
//!    a pending buffer. Reads only, so it is order independent and runs on
//!    rayon with `--features parallel`
//! 5. **Apply phase** - commit velocity, heading and AI state sequentially
//!
//! Position is never written; the host moves agents by their velocity
//! afterwards (see [`EcsStore::advance_positions`](crate::store::EcsStore::advance_positions)).
//!
//! [`update`]: SwarmController::update

use crate::components::{AiMode, Obstacle, SwarmAiState, TacticAssignment};
use crate::config::{AttractionMode, SwarmConfig, SwarmParameters, SwarmWeights, TacticSettings};
use crate::error::{ConfigError, SwarmError};
use crate::store::{ComponentStore, EcsStore};
use crate::systems::integrator::{IntegratedMotion, SteeringIntegrator};
use crate::systems::selector::{Census, TacticDecision, TacticSelector, TacticState};
use crate::systems::steering::{AgentSample, SteeringCalculator, TargetSample};
use crate::systems::tactics::{TacticBehavior, TacticBias, TacticContext, TacticId};
use crate::world::SwarmSnapshot;
use bevy_ecs::prelude::Entity;
use serde::Serialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Outcome of one [`SwarmController::update`] call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    /// Tick number after this update.
    pub tick: u64,
    pub census: Census,
    /// Set when the selector decided this tick.
    pub decision: Option<TacticDecision>,
    pub tactic: Option<TacticId>,
    /// Agents whose velocity was written.
    pub integrated: usize,
    /// Handles that were dead, inactive, missing or lacked a velocity.
    pub skipped: usize,
}

/// Write intents for one agent, produced in the gather phase.
#[derive(Debug, Clone, Copy)]
struct PendingUpdate {
    entity: Entity,
    motion: Option<IntegratedMotion>,
    ai: Option<SwarmAiState>,
}

/// Everything the gather phase reads, shared across agents (and threads).
struct TickPlan<'a, S: ComponentStore> {
    store: &'a S,
    calculator: SteeringCalculator<'a>,
    integrator: SteeringIntegrator<'a>,
    behavior: Option<&'static dyn TacticBehavior>,
    context: TacticContext<'a>,
    obstacles: &'a [Obstacle],
    delta_time: f32,
    /// Drop per-agent assignments left over from the previous tactic.
    reassign: bool,
}

impl<S: ComponentStore> TickPlan<'_, S> {
    fn plan_agent(&self, agent: &AgentSample) -> PendingUpdate {
        let mut ai = agent.ai;
        let bias = match ai.as_mut() {
            Some(state) => {
                if self.reassign {
                    state.assignment = TacticAssignment::Unassigned;
                }
                self.apply_tactic(agent, state)
            }
            None => TacticBias::None,
        };

        let steering = self.calculator.steer(
            agent,
            self.store,
            self.context.targets,
            self.obstacles,
            bias,
        );
        let motion = self
            .integrator
            .integrate(agent, steering, self.delta_time);

        PendingUpdate {
            entity: agent.entity,
            motion,
            ai,
        }
    }

    fn apply_tactic(&self, agent: &AgentSample, state: &mut SwarmAiState) -> TacticBias {
        match self.behavior {
            Some(behavior) => behavior.apply(agent, &self.context, state),
            None => {
                // Pure flocking
                state.assignment = TacticAssignment::Unassigned;
                state.mode = if self.context.targets.is_empty() {
                    AiMode::Idle
                } else {
                    AiMode::Chasing
                };
                TacticBias::None
            }
        }
    }
}

/// Swarm AI controller.
///
/// Holds the store and configuration, providing a clean API for:
/// - Running ticks over caller-supplied agents, targets and obstacles
/// - Tuning weights, parameters and tactic settings between ticks
/// - Forcing tactics manually
/// - Extracting state snapshots
pub struct SwarmController<S: ComponentStore = EcsStore> {
    store: S,
    config: SwarmConfig,
    selector: TacticSelector,
    tick: u64,
    time: f32,
    reassign: bool,
}

impl<S: ComponentStore> SwarmController<S> {
    /// Create a controller with the default configuration.
    pub fn new(store: S) -> Self {
        Self::build(store, SwarmConfig::default())
    }

    /// Create a controller with a custom configuration.
    pub fn with_config(store: S, config: SwarmConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(store, config))
    }

    fn build(store: S, config: SwarmConfig) -> Self {
        let selector = TacticSelector::new(config.tactics.cooldown);
        Self {
            store,
            config,
            selector,
            tick: 0,
            time: 0.0,
            reassign: false,
        }
    }

    /// Run one tick over `agents`, pursuing `targets` and avoiding `obstacles`.
    ///
    /// Never fails: missing entities and components are skipped. A negative
    /// or non-finite `delta_time` skips the whole tick.
    pub fn update(
        &mut self,
        delta_time: f32,
        agents: &[Entity],
        targets: &[Entity],
        obstacles: &[Obstacle],
    ) -> TickReport {
        if !delta_time.is_finite() || delta_time < 0.0 {
            tracing::warn!(delta_time, "invalid delta time, skipping swarm tick");
            return TickReport {
                tick: self.tick,
                tactic: self.selector.current(),
                skipped: agents.len(),
                ..Default::default()
            };
        }

        self.store.refresh_spatial_index();

        let target_samples: Vec<TargetSample> = targets
            .iter()
            .filter_map(|&entity| TargetSample::read(&self.store, entity))
            .collect();

        let mut agent_samples: Vec<AgentSample> = Vec::with_capacity(agents.len());
        for &entity in agents {
            if let Some(sample) = AgentSample::read(&self.store, entity, agent_samples.len()) {
                agent_samples.push(sample);
            }
        }

        let census = Census {
            active_agents: agent_samples.len(),
            active_targets: target_samples.len(),
        };
        let decision = self
            .selector
            .advance(delta_time, census, &self.config.tactics);
        if decision.is_some() {
            self.reassign = true;
        }
        let tactic = self.selector.current();

        let plan = TickPlan {
            store: &self.store,
            calculator: SteeringCalculator::new(&self.config),
            integrator: SteeringIntegrator::new(&self.config.parameters),
            behavior: tactic.map(TacticId::behavior),
            context: TacticContext {
                swarm_size: agent_samples.len(),
                targets: &target_samples,
                elapsed: self.selector.state().elapsed,
                settings: &self.config.tactics,
            },
            obstacles,
            delta_time,
            reassign: self.reassign,
        };

        // === GATHER PHASE ===
        #[cfg(feature = "parallel")]
        let pending: Vec<PendingUpdate> = agent_samples
            .par_iter()
            .map(|agent| plan.plan_agent(agent))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let pending: Vec<PendingUpdate> = agent_samples
            .iter()
            .map(|agent| plan.plan_agent(agent))
            .collect();

        // === APPLY PHASE ===
        let mut integrated = 0;
        let mut skipped = agents.len() - agent_samples.len();
        for update in pending {
            match update.motion {
                Some(motion) => {
                    self.store.write_velocity(update.entity, motion.velocity);
                    if let Some(rotation) = motion.rotation {
                        self.store.write_rotation(update.entity, rotation);
                    }
                    integrated += 1;
                }
                None => {
                    tracing::trace!(entity = ?update.entity, "agent has no velocity, skipped");
                    skipped += 1;
                }
            }
            if let Some(ai) = update.ai {
                self.store.write_ai_state(update.entity, ai);
            }
        }

        self.reassign = false;
        self.tick += 1;
        self.time += delta_time;

        tracing::debug!(
            tick = self.tick,
            agents = census.active_agents,
            targets = census.active_targets,
            integrated,
            skipped,
            "swarm tick"
        );

        TickReport {
            tick: self.tick,
            census,
            decision,
            tactic,
            integrated,
            skipped,
        }
    }

    // ========================================================================
    // CONFIGURATION
    // ========================================================================

    pub fn set_weights(&mut self, weights: SwarmWeights) -> Result<(), ConfigError> {
        weights.validate()?;
        self.config.weights = weights;
        Ok(())
    }

    pub fn set_parameters(&mut self, parameters: SwarmParameters) -> Result<(), ConfigError> {
        parameters.validate()?;
        self.config.parameters = parameters;
        Ok(())
    }

    /// Change the tactic cooldown. Takes effect at the next decision.
    pub fn set_cooldown(&mut self, cooldown: f32) -> Result<(), ConfigError> {
        let tactics = TacticSettings {
            cooldown,
            ..self.config.tactics
        };
        self.set_tactic_settings(tactics)
    }

    pub fn set_tactic_settings(&mut self, tactics: TacticSettings) -> Result<(), ConfigError> {
        tactics.validate()?;
        self.selector.set_cooldown(tactics.cooldown);
        self.config.tactics = tactics;
        Ok(())
    }

    pub fn set_attraction_mode(&mut self, mode: AttractionMode) {
        self.config.attraction_mode = mode;
    }

    /// Replace the whole configuration.
    pub fn set_config(&mut self, config: SwarmConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.selector.set_cooldown(config.tactics.cooldown);
        self.config = config;
        Ok(())
    }

    // ========================================================================
    // TACTICS
    // ========================================================================

    /// Override the tactic until the next scheduled decision.
    pub fn force_tactic(&mut self, tactic: Option<TacticId>) -> TacticDecision {
        self.reassign = true;
        self.selector.force(tactic)
    }

    /// Override the tactic by name. Unknown names fall back to pure flocking.
    pub fn force_tactic_named(&mut self, name: &str) -> Result<TacticDecision, SwarmError> {
        self.reassign = true;
        self.selector.force_named(name)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn tactic_state(&self) -> &TacticState {
        self.selector.state()
    }

    pub fn current_tactic(&self) -> Option<TacticId> {
        self.selector.current()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Get current tick number.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Get current simulation time in seconds.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    /// Capture the listed agents.
    pub fn snapshot(&self, agents: &[Entity]) -> SwarmSnapshot {
        SwarmSnapshot::capture(&self.store, agents, self.tick, self.time, self.selector.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EcsStore;
    use glam::Vec3;

    const DT: f32 = 1.0 / 60.0;
    const EPS: f32 = 1e-5;

    fn controller() -> SwarmController<EcsStore> {
        SwarmController::new(EcsStore::new())
    }

    #[test]
    fn test_two_agents_push_apart() {
        let mut swarm = controller();
        let a = swarm.store_mut().spawn_agent(Vec3::ZERO);
        let b = swarm.store_mut().spawn_agent(Vec3::new(1.0, 0.0, 0.0));

        let report = swarm.update(DT, &[a, b], &[], &[]);

        assert_eq!(report.integrated, 2);
        assert_eq!(report.tick, 1);
        let va = swarm.store().velocity(a).unwrap();
        let vb = swarm.store().velocity(b).unwrap();
        assert!(va.x < 0.0);
        assert!(vb.x > 0.0);
        // Positions are left to the host
        assert_eq!(swarm.store().position(a), Some(Vec3::ZERO));
    }

    #[test]
    fn test_speed_never_exceeds_limit() {
        let mut swarm = controller();
        let agents = swarm.store_mut().spawn_mass_agents(Vec3::ZERO, 40, 12.0);
        let target = swarm.store_mut().spawn_target(Vec3::new(20.0, 0.0, 5.0));
        let obstacles = [Obstacle::new(Vec3::new(10.0, 0.0, 0.0), 2.0)];

        for _ in 0..300 {
            swarm.update(DT, &agents, &[target], &obstacles);
            swarm.store_mut().advance_positions(DT);
            for &agent in &agents {
                let limit = swarm.store().movement(agent).unwrap().max_speed;
                let velocity = swarm.store().velocity(agent).unwrap();
                assert!(velocity.is_finite());
                assert!(velocity.length() <= limit + EPS);
                assert!(swarm.store().rotation(agent).unwrap().yaw.is_finite());
            }
        }
    }

    #[test]
    fn test_identical_runs_are_deterministic() {
        fn run() -> SwarmSnapshot {
            let mut swarm = controller();
            let agents = swarm.store_mut().spawn_mass_agents(Vec3::ZERO, 25, 10.0);
            let target = swarm.store_mut().spawn_target(Vec3::new(15.0, 0.0, -5.0));
            for _ in 0..60 {
                swarm.update(DT, &agents, &[target], &[]);
                swarm.store_mut().advance_positions(DT);
            }
            swarm.snapshot(&agents)
        }

        assert_eq!(run(), run());
    }

    #[test]
    fn test_agent_order_does_not_matter() {
        fn velocities(reverse: bool) -> Vec<Vec3> {
            let mut swarm = controller();
            let agents = vec![
                swarm.store_mut().spawn_agent(Vec3::ZERO),
                swarm.store_mut().spawn_agent(Vec3::new(1.0, 0.0, 0.0)),
                swarm.store_mut().spawn_agent(Vec3::new(0.5, 0.0, 1.0)),
                swarm.store_mut().spawn_agent(Vec3::new(2.0, 0.0, 0.5)),
            ];
            let mut order = agents.clone();
            if reverse {
                order.reverse();
            }
            swarm.update(DT, &order, &[], &[]);
            agents
                .iter()
                .map(|&a| swarm.store().velocity(a).unwrap())
                .collect()
        }

        assert_eq!(velocities(false), velocities(true));
    }

    #[test]
    fn test_dead_and_inactive_agents_untouched() {
        let mut swarm = controller();
        let a = swarm.store_mut().spawn_agent(Vec3::ZERO);
        let dead = swarm.store_mut().spawn_agent(Vec3::new(1.0, 0.0, 0.0));
        let parked = swarm.store_mut().spawn_agent(Vec3::new(0.0, 0.0, 1.0));
        swarm.store_mut().write_velocity(dead, Vec3::new(3.0, 0.0, 0.0));
        swarm.store_mut().write_velocity(parked, Vec3::new(0.0, 0.0, 3.0));
        swarm.store_mut().kill(dead);
        swarm.store_mut().set_active(parked, false);

        let report = swarm.update(DT, &[a, dead, parked], &[], &[]);

        assert_eq!(report.census.active_agents, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(swarm.store().velocity(dead), Some(Vec3::new(3.0, 0.0, 0.0)));
        assert_eq!(swarm.store().velocity(parked), Some(Vec3::new(0.0, 0.0, 3.0)));
        // Neither neighbour pushes the survivor
        assert_eq!(swarm.store().velocity(a), Some(Vec3::ZERO));
    }

    #[test]
    fn test_tactic_hysteresis_through_controller() {
        let mut swarm = controller();
        let agents = swarm.store_mut().spawn_mass_agents(Vec3::ZERO, 120, 60.0);
        let t1 = swarm.store_mut().spawn_target(Vec3::new(80.0, 0.0, 0.0));
        let t2 = swarm.store_mut().spawn_target(Vec3::new(-80.0, 0.0, 0.0));
        let targets = [t1, t2];

        let report = swarm.update(1.0, &agents, &targets, &[]);
        assert_eq!(report.decision.map(|d| d.tactic), Some(Some(TacticId::Wave)));

        for &agent in &agents[10..] {
            swarm.store_mut().kill(agent);
        }
        swarm.store_mut().set_active(t2, false);

        for _ in 0..29 {
            let report = swarm.update(1.0, &agents, &targets, &[]);
            assert!(report.decision.is_none());
            assert_eq!(report.census, Census { active_agents: 10, active_targets: 1 });
            assert_eq!(swarm.current_tactic(), Some(TacticId::Wave));
        }

        let report = swarm.update(1.0, &agents, &targets, &[]);
        assert!(report.decision.is_some());
        assert_eq!(swarm.current_tactic(), Some(TacticId::Surround));
        assert_eq!(swarm.tactic_state().timer, swarm.config().tactics.cooldown);
    }

    #[test]
    fn test_balanced_population_uses_pure_flocking() {
        let mut swarm = controller();
        let agents = swarm.store_mut().spawn_mass_agents(Vec3::ZERO, 5, 20.0);
        let targets: Vec<Entity> = (0..5)
            .map(|i| swarm.store_mut().spawn_target(Vec3::new(30.0, 0.0, i as f32 * 5.0)))
            .collect();

        let report = swarm.update(DT, &agents, &targets, &[]);
        assert_eq!(report.tactic, None);
        for &agent in &agents {
            let ai = swarm.store().ai_state(agent).unwrap();
            assert_eq!(ai.mode, AiMode::Chasing);
            assert_eq!(ai.assignment, TacticAssignment::Unassigned);
        }
    }

    #[test]
    fn test_unknown_tactic_fails_closed() {
        let mut swarm = controller();
        swarm.force_tactic(Some(TacticId::Wave));

        let result = swarm.force_tactic_named("blitz");
        assert!(matches!(result, Err(SwarmError::UnknownTactic(_))));
        assert_eq!(swarm.current_tactic(), None);
    }

    #[test]
    fn test_surround_assigns_ring_positions() {
        let mut swarm = controller();
        let agents = swarm.store_mut().spawn_mass_agents(Vec3::ZERO, 4, 20.0);
        let target = swarm.store_mut().spawn_target(Vec3::new(30.0, 0.0, 0.0));

        let report = swarm.update(DT, &agents, &[target], &[]);
        assert_eq!(report.tactic, Some(TacticId::Surround));

        let mut angles = Vec::new();
        for &agent in &agents {
            let ai = swarm.store().ai_state(agent).unwrap();
            assert_eq!(ai.mode, AiMode::Chasing);
            match ai.assignment {
                TacticAssignment::Surround { angle } => angles.push(angle),
                other => panic!("unexpected assignment {other:?}"),
            }
        }
        angles.dedup();
        assert_eq!(angles.len(), 4);
    }

    #[test]
    fn test_ambush_holds_then_springs() {
        let mut swarm = controller();
        let agent = swarm.store_mut().spawn_agent(Vec3::ZERO);
        let target = swarm.store_mut().spawn_target(Vec3::new(40.0, 0.0, 0.0));
        swarm.store_mut().write_velocity(agent, Vec3::new(1.0, 0.0, 0.0));
        swarm.force_tactic(Some(TacticId::Ambush));

        swarm.update(0.1, &[agent], &[target], &[]);
        assert_eq!(swarm.store().ai_state(agent).unwrap().mode, AiMode::Holding);
        assert!(swarm.store().velocity(agent).unwrap().x < 1.0);

        swarm.store_mut().set_position(target, Vec3::new(5.0, 0.0, 0.0));
        swarm.update(0.1, &[agent], &[target], &[]);
        let ai = swarm.store().ai_state(agent).unwrap();
        assert_eq!(ai.mode, AiMode::Attacking);
        assert_eq!(ai.assignment, TacticAssignment::Ambush { sprung: true });
    }

    #[test]
    fn test_wave_releases_first_group_only() {
        let mut swarm = controller();
        let agents = [
            swarm.store_mut().spawn_agent(Vec3::ZERO),
            swarm.store_mut().spawn_agent(Vec3::new(0.0, 0.0, 10.0)),
            swarm.store_mut().spawn_agent(Vec3::new(0.0, 0.0, 20.0)),
        ];
        let target = swarm.store_mut().spawn_target(Vec3::new(30.0, 0.0, 10.0));
        swarm.force_tactic(Some(TacticId::Wave));

        swarm.update(0.1, &agents, &[target], &[]);
        let modes: Vec<AiMode> = agents
            .iter()
            .map(|&a| swarm.store().ai_state(a).unwrap().mode)
            .collect();
        assert_eq!(modes, vec![AiMode::Chasing, AiMode::Holding, AiMode::Holding]);
        assert!(swarm.store().velocity(agents[0]).unwrap().x > 0.0);
        assert_eq!(swarm.store().velocity(agents[1]).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn test_missing_entities_are_skipped() {
        let mut swarm = controller();
        let a = swarm.store_mut().spawn_agent(Vec3::ZERO);
        let gone = swarm.store_mut().spawn_agent(Vec3::new(1.0, 0.0, 0.0));
        let gone_target = swarm.store_mut().spawn_target(Vec3::new(5.0, 0.0, 0.0));
        swarm.store_mut().despawn(gone);
        swarm.store_mut().despawn(gone_target);

        let report = swarm.update(DT, &[a, gone], &[gone_target], &[]);
        assert_eq!(report.census, Census { active_agents: 1, active_targets: 0 });
        assert_eq!(report.integrated, 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_stacked_spawns_spread_out() {
        let mut swarm = controller();
        let a = swarm.store_mut().spawn_agent(Vec3::ZERO);
        let b = swarm.store_mut().spawn_agent(Vec3::ZERO);

        for _ in 0..120 {
            swarm.update(DT, &[a, b], &[], &[]);
            swarm.store_mut().advance_positions(DT);
        }

        let pa = swarm.store().position(a).unwrap();
        let pb = swarm.store().position(b).unwrap();
        assert!(pa.is_finite() && pb.is_finite());
        assert!(pa.distance(pb) > 0.0);
    }

    #[test]
    fn test_zero_cell_size_store_ticks() {
        let mut swarm = SwarmController::new(EcsStore::with_cell_size(0.0));
        let a = swarm.store_mut().spawn_agent(Vec3::ZERO);
        let b = swarm.store_mut().spawn_agent(Vec3::new(1.0, 0.0, 0.0));

        let report = swarm.update(DT, &[a, b], &[], &[]);
        assert_eq!(report.integrated, 2);
        assert!(swarm.store().velocity(a).unwrap().x < 0.0);
        assert!(swarm.store().velocity(b).unwrap().x > 0.0);
    }

    #[test]
    fn test_invalid_delta_skips_tick() {
        let mut swarm = controller();
        let a = swarm.store_mut().spawn_agent(Vec3::ZERO);
        let b = swarm.store_mut().spawn_agent(Vec3::new(1.0, 0.0, 0.0));

        for dt in [f32::NAN, -1.0, f32::INFINITY] {
            let report = swarm.update(dt, &[a, b], &[], &[]);
            assert_eq!(report.integrated, 0);
            assert_eq!(report.tick, 0);
        }
        assert_eq!(swarm.store().velocity(a), Some(Vec3::ZERO));
        assert_eq!(swarm.tactic_state().timer, 0.0);
    }

    #[test]
    fn test_setters_validate() {
        let mut swarm = controller();
        assert!(swarm.set_cooldown(-1.0).is_err());
        assert_eq!(swarm.config().tactics.cooldown, 30.0);

        swarm.set_cooldown(5.0).unwrap();
        assert_eq!(swarm.config().tactics.cooldown, 5.0);
        assert_eq!(swarm.force_tactic(None).tactic, None);
        assert_eq!(swarm.tactic_state().timer, 5.0);

        let weights = SwarmWeights {
            separation: -1.0,
            ..Default::default()
        };
        assert!(swarm.set_weights(weights).is_err());

        swarm.set_attraction_mode(AttractionMode::NearestOnly);
        assert_eq!(swarm.config().attraction_mode, AttractionMode::NearestOnly);
    }
}
