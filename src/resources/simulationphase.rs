use bevy_ecs::prelude::Resource;

/// Where the simulation loop currently is relative to the engine step.
///
/// The body registry refuses structural changes while the phase is
/// [`SimulationPhase::Stepping`].
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationPhase {
    /// Between frames; bodies may be created and destroyed.
    #[default]
    Idle,
    /// Inside the engine's step call; contact callbacks may be running.
    Stepping,
}

impl SimulationPhase {
    pub fn is_stepping(self) -> bool {
        self == SimulationPhase::Stepping
    }
}
