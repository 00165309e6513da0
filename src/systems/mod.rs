//! Swarm systems.
//!
//! Each module is one stage of the per-tick pipeline driven by
//! [`SwarmController`](crate::api::SwarmController):
//!
//! - `selector` - cooldown-gated tactic decision over the census
//! - `tactics` - per-agent tactic bias (Surround, Flank, Wave, Ambush)
//! - `steering` - boid forces: separation, alignment, cohesion, attraction,
//!   obstacle avoidance
//! - `integrator` - steering to clamped velocity and eased heading
//!
//! `movement` is the host-side mover for [`EcsStore`](crate::store::EcsStore).

pub mod integrator;
pub mod movement;
pub mod selector;
pub mod steering;
pub mod tactics;

pub use integrator::{turn_toward, wrap_angle, IntegratedMotion, SteeringIntegrator};
pub use movement::*;
pub use selector::{Census, DecisionSource, TacticDecision, TacticSelector, TacticState};
pub use steering::{nearest, AgentSample, SteeringCalculator, SteeringForces, TargetSample};
pub use tactics::{
    AmbushTactic, FlankTactic, SurroundTactic, TacticBehavior, TacticBias, TacticContext, TacticId,
    WaveTactic,
};
