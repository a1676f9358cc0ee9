//! Body registry.
//!
//! Bodies are entities of the ECS [`World`] carrying [`BodyKind`],
//! [`BoxShape`], [`Pose`] and [`PhysicsBody`]. Bodies are created and
//! destroyed through the functions here, which refuse to run while the
//! simulation loop is inside an engine step. Despawning a body entity any
//! other way still takes it out of the engine.

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemParam;
use log::{debug, error};
use rapier2d::math::{Real, Vector};

use crate::components::bodykind::BodyKind;
use crate::components::boxshape::BoxShape;
use crate::components::physicsbody::PhysicsBody;
use crate::components::pose::Pose;
use crate::error::SimulationError;
use crate::resources::physicsworld::PhysicsWorld;
use crate::resources::simulationphase::SimulationPhase;

/// Snapshot of one live body, as consumed by renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyView {
    pub entity: Entity,
    pub kind: BodyKind,
    pub shape: BoxShape,
    pub pose: Pose,
}

impl BodyView {
    /// The four world-space corners of the body's rectangle.
    pub fn corners(&self) -> [Vector<Real>; 4] {
        self.shape.corners(&self.pose)
    }
}

/// Create a body centered on `(x, y)` with the given full size, in pixels.
pub fn create_body(
    world: &mut World,
    kind: BodyKind,
    x: Real,
    y: Real,
    width: Real,
    height: Real,
) -> Result<Entity, SimulationError> {
    ensure_idle(world)?;
    if !world.contains_resource::<PhysicsWorld>() {
        return Err(SimulationError::fault("no physics world to create bodies in"));
    }

    let entity = world
        .spawn((kind, BoxShape::new(width, height), Pose::new(x, y, 0.0)))
        .id();
    let handle = world
        .resource_mut::<PhysicsWorld>()
        .insert_body(entity, kind, x, y, width, height);
    world.entity_mut(entity).insert(handle);

    debug!(
        "Created {} body {:?} at ({}, {}) size {}x{}",
        kind.name(),
        entity,
        x,
        y,
        width,
        height
    );
    Ok(entity)
}

pub fn kind_of(world: &World, entity: Entity) -> Result<BodyKind, SimulationError> {
    world
        .get::<BodyKind>(entity)
        .copied()
        .ok_or(SimulationError::UnknownBody(entity))
}

/// Remove a body from the world and from the engine.
///
/// Destroying a handle twice yields [`SimulationError::UnknownBody`] the
/// second time.
pub fn destroy_body(world: &mut World, entity: Entity) -> Result<(), SimulationError> {
    ensure_idle(world)?;
    if world.get::<PhysicsBody>(entity).is_none() {
        return Err(SimulationError::UnknownBody(entity));
    }
    if !world.contains_resource::<PhysicsWorld>() {
        return Err(SimulationError::fault("no physics world to destroy bodies in"));
    }
    // The PhysicsBody remove hook takes the body out of the engine.
    world.despawn(entity);

    debug!("Destroyed body {:?}", entity);
    Ok(())
}

/// Snapshot of a single body.
pub fn body(world: &World, entity: Entity) -> Result<BodyView, SimulationError> {
    let entity_ref = world
        .get_entity(entity)
        .map_err(|_| SimulationError::UnknownBody(entity))?;
    match (
        entity_ref.get::<BodyKind>(),
        entity_ref.get::<BoxShape>(),
        entity_ref.get::<Pose>(),
    ) {
        (Some(kind), Some(shape), Some(pose)) => Ok(BodyView {
            entity,
            kind: *kind,
            shape: *shape,
            pose: *pose,
        }),
        _ => Err(SimulationError::UnknownBody(entity)),
    }
}

/// Visit every live body. Each call starts a fresh traversal.
pub fn for_each_body(world: &mut World, mut f: impl FnMut(BodyView)) {
    let mut query = world.query::<(Entity, &BodyKind, &BoxShape, &Pose)>();
    for (entity, kind, shape, pose) in query.iter(world) {
        f(BodyView {
            entity,
            kind: *kind,
            shape: *shape,
            pose: *pose,
        });
    }
}

pub fn body_count(world: &mut World) -> usize {
    world.query::<&BodyKind>().iter(world).count()
}

/// Read-only access to every live body from inside a system.
#[derive(SystemParam)]
pub struct Bodies<'w, 's> {
    query: Query<'w, 's, (Entity, &'static BodyKind, &'static BoxShape, &'static Pose)>,
}

impl Bodies<'_, '_> {
    pub fn iter(&self) -> impl Iterator<Item = BodyView> + '_ {
        self.query
            .iter()
            .map(|(entity, kind, shape, pose)| BodyView {
                entity,
                kind: *kind,
                shape: *shape,
                pose: *pose,
            })
    }

    pub fn count(&self) -> usize {
        self.query.iter().count()
    }
}

fn ensure_idle(world: &World) -> Result<(), SimulationError> {
    let phase = world
        .get_resource::<SimulationPhase>()
        .copied()
        .unwrap_or_default();
    if phase.is_stepping() {
        error!("Body registry mutated while the physics step is running");
        return Err(SimulationError::InvalidMutationWindow);
    }
    Ok(())
}
