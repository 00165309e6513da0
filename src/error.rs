//! Error types for the swarm core.
//!
//! Ticks never fail; these errors only come out of configuration and
//! manual tactic overrides.

use std::io;
use thiserror::Error;

/// Errors raised while loading or validating a [`SwarmConfig`](crate::config::SwarmConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read swarm config: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse swarm config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid swarm config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the swarm controller.
#[derive(Debug, Error)]
pub enum SwarmError {
    /// The named tactic does not exist; the selector fell back to pure flocking.
    #[error("unknown tactic '{0}', falling back to pure flocking")]
    UnknownTactic(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
