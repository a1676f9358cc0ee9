use bevy_ecs::prelude::Resource;

/// Simulated time bookkeeping for the fixed-step loop.
#[derive(Resource, Clone, Copy, Debug)]
pub struct SimulationTime {
    /// Simulated seconds since the world was created.
    pub elapsed: f32,
    /// Length of the most recent tick in seconds.
    pub delta: f32,
    /// Number of completed ticks.
    pub tick_count: u64,
    /// Fixed step used by [`advance`](crate::systems::simulation::advance).
    pub step: f32,
    /// Unsimulated frame time carried over by `advance`.
    pub accumulator: f32,
}

impl Default for SimulationTime {
    fn default() -> Self {
        SimulationTime {
            elapsed: 0.0,
            delta: 0.0,
            tick_count: 0,
            step: 1.0 / 30.0,
            accumulator: 0.0,
        }
    }
}

impl SimulationTime {
    pub fn with_step(step: f32) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }
}
