//! World setup.
//!
//! Builds a ready-to-tick ECS world: physics state, contact dispatcher with
//! its policy, pending-deletion set, loop phase and time, configuration, and
//! the observers for spawn requests and contact logging. [`setup`] also
//! places the static ground platform near the bottom of the window.

use bevy_ecs::prelude::*;
use log::info;

use crate::components::bodykind::BodyKind;
use crate::error::SimulationError;
use crate::events::contact::observe_contact_log;
use crate::policies::stock_policy;
use crate::registry;
use crate::resources::contactdispatcher::{ContactDispatcher, ContactPolicy};
use crate::resources::pendingdeletions::PendingDeletions;
use crate::resources::physicsworld::PhysicsWorld;
use crate::resources::simulationconfig::SimulationConfig;
use crate::resources::simulationphase::SimulationPhase;
use crate::resources::simulationtime::SimulationTime;
use crate::systems::spawner::spawn_request_observer;

/// Distance from the bottom of the window to the ground's center line.
const GROUND_MARGIN: f32 = 50.0;
const GROUND_THICKNESS: f32 = 30.0;

/// Build an empty world using the stock policy selected by the config.
pub fn build_world(config: SimulationConfig) -> World {
    let policy = stock_policy(config.remove_on_contact);
    build_world_with_policy(config, policy)
}

/// Build an empty world with a caller-provided contact policy.
pub fn build_world_with_policy(config: SimulationConfig, policy: Box<dyn ContactPolicy>) -> World {
    let mut world = World::new();
    world.insert_resource(PhysicsWorld::new(&config.physics));
    world.insert_resource(ContactDispatcher::from_boxed(policy));
    world.insert_resource(PendingDeletions::new());
    world.insert_resource(SimulationPhase::Idle);
    world.insert_resource(SimulationTime::with_step(config.physics.timestep()));
    world.insert_resource(config);

    world.add_observer(spawn_request_observer);
    world.add_observer(observe_contact_log);
    // Ensure the observers are registered before anything is triggered.
    world.flush();
    world
}

/// Create the static ground platform spanning the window width.
pub fn create_ground(world: &mut World) -> Result<Entity, SimulationError> {
    let (width, height) = world
        .get_resource::<SimulationConfig>()
        .map(|c| (c.window_width as f32, c.window_height as f32))
        .unwrap_or((640.0, 480.0));
    registry::create_body(
        world,
        BodyKind::Static,
        width / 2.0,
        height - GROUND_MARGIN,
        width,
        GROUND_THICKNESS,
    )
}

/// Build the world and place the ground.
pub fn setup(config: SimulationConfig) -> Result<World, SimulationError> {
    let mut world = build_world(config);
    let ground = create_ground(&mut world)?;
    info!("World ready, ground body {:?}", ground);
    Ok(world)
}
