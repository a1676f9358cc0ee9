//! Error types for the simulation core.
//!
//! [`SimulationError`] covers the registry and the step loop. Only
//! [`SimulationError::SimulationFault`] is fatal; a stale handle is an
//! ordinary, recoverable outcome.

use bevy_ecs::entity::Entity;
use thiserror::Error;

/// Errors produced by the body registry and the simulation loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// The handle does not name a live body (never created, or destroyed).
    #[error("unknown body {0:?}")]
    UnknownBody(Entity),

    /// The registry was asked to create or destroy a body while the physics
    /// engine is inside a step.
    #[error("body registry cannot be mutated while the physics step is running")]
    InvalidMutationWindow,

    /// The physics engine left the world in an unusable state.
    #[error("simulation fault: {0}")]
    SimulationFault(String),
}

impl SimulationError {
    /// Creates a simulation fault with the given description.
    pub fn fault(reason: impl Into<String>) -> Self {
        Self::SimulationFault(reason.into())
    }

    /// Whether the run loop can keep going after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SimulationFault(_))
    }
}

/// Errors loading or saving the INI configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    Load(String),

    #[error("failed to save config file: {0}")]
    Save(String),
}
