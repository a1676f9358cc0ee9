//! Spawner: turns input requests into falling blocks.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, error};

use crate::components::bodykind::BodyKind;
use crate::error::SimulationError;
use crate::events::spawn::SpawnRequest;
use crate::registry;
use crate::resources::simulationconfig::SimulationConfig;

const DEFAULT_BLOCK_SIZE: f32 = 20.0;

/// Create a Dynamic block of the configured size centered on `(x, y)`.
///
/// Any position is accepted; a block far outside the platform simply falls
/// forever without colliding.
pub fn on_spawn_request(world: &mut World, x: f32, y: f32) -> Result<Entity, SimulationError> {
    let (width, height) = world
        .get_resource::<SimulationConfig>()
        .map(|c| (c.block_width, c.block_height))
        .unwrap_or((DEFAULT_BLOCK_SIZE, DEFAULT_BLOCK_SIZE));
    let entity = registry::create_body(world, BodyKind::Dynamic, x, y, width, height)?;
    debug!("Spawned block {:?} at ({}, {})", entity, x, y);
    Ok(entity)
}

/// Observer creating a block for every [`SpawnRequest`].
///
/// Creation is queued as a command, so it lands on the next flush rather
/// than in the middle of whatever triggered the request.
pub fn spawn_request_observer(trigger: On<SpawnRequest>, mut commands: Commands) {
    let SpawnRequest { x, y } = *trigger.event();
    commands.queue(move |world: &mut World| {
        if let Err(e) = on_spawn_request(world, x, y) {
            error!("Spawn request at ({}, {}) failed: {}", x, y, e);
        }
    });
}
