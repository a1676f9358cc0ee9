use bevy_ecs::prelude::*;

/// Request from the input collaborator to drop a block at a world position
/// in pixels. Handled by
/// [`spawn_request_observer`](crate::systems::spawner::spawn_request_observer).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SpawnRequest {
    pub x: f32,
    pub y: f32,
}
