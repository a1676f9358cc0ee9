use bevy_ecs::lifecycle::HookContext;
use bevy_ecs::prelude::Component;
use bevy_ecs::world::DeferredWorld;
use log::warn;
use rapier2d::prelude::{ColliderHandle, RigidBodyHandle};

use crate::resources::physicsworld::PhysicsWorld;

/// Link from a body entity to its rigid body and collider inside
/// [`PhysicsWorld`].
///
/// Removing the component, or despawning its entity by any route, also
/// removes the rigid body and collider from the engine.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
#[component(on_remove = release_engine_body)]
pub struct PhysicsBody {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

fn release_engine_body(mut world: DeferredWorld, ctx: HookContext) {
    let Some(handle) = world.get::<PhysicsBody>(ctx.entity).copied() else {
        return;
    };
    match world.get_resource_mut::<PhysicsWorld>() {
        Some(mut physics) => {
            physics.remove_body(&handle);
        }
        None => warn!(
            "Body {:?} removed while no physics world is installed; engine body left behind",
            ctx.entity
        ),
    }
}
