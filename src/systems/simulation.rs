//! Fixed-step simulation loop.
//!
//! # Tick Flow
//!
//! 1. Phase goes `Idle → Stepping`; the registry now refuses mutations.
//! 2. The engine steps with the [`ContactDispatcher`] installed as its event
//!    handler and physics hooks. Policies see the world read-only and can
//!    only flag bodies in [`PendingDeletions`].
//! 3. Phase returns to `Idle`.
//! 4. Journaled begin/end notices are triggered as [`ContactEvent`]s.
//! 5. Flagged bodies are destroyed; this is the only place where contact
//!    policy leads to destruction.
//! 6. Every [`Pose`] is refreshed from the engine.

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::physicsbody::PhysicsBody;
use crate::components::pose::Pose;
use crate::error::SimulationError;
use crate::events::contact::ContactEvent;
use crate::registry;
use crate::resources::contactdispatcher::{
    ContactContext, ContactDispatcher, ContactNotice, ContactPhase,
};
use crate::resources::pendingdeletions::PendingDeletions;
use crate::resources::physicsworld::PhysicsWorld;
use crate::resources::simulationphase::SimulationPhase;
use crate::resources::simulationtime::SimulationTime;

/// What happened during one or more ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub ticks: u32,
    /// Begin and end notices in dispatch order.
    pub contacts: Vec<ContactNotice>,
    /// Bodies destroyed by the deferred-deletion drain.
    pub destroyed: Vec<Entity>,
}

impl TickReport {
    pub fn begin_count(&self) -> usize {
        self.count(ContactPhase::Begin)
    }

    pub fn end_count(&self) -> usize {
        self.count(ContactPhase::End)
    }

    pub fn merge(&mut self, other: TickReport) {
        self.ticks += other.ticks;
        self.contacts.extend(other.contacts);
        self.destroyed.extend(other.destroyed);
    }

    fn count(&self, phase: ContactPhase) -> usize {
        self.contacts.iter().filter(|n| n.phase == phase).count()
    }
}

/// Advance the world by exactly one step of `dt` seconds.
pub fn tick(world: &mut World, dt: f32) -> Result<TickReport, SimulationError> {
    if world
        .get_resource::<SimulationPhase>()
        .is_some_and(|p| p.is_stepping())
    {
        return Err(SimulationError::InvalidMutationWindow);
    }
    if !world.contains_resource::<PhysicsWorld>() {
        return Err(SimulationError::fault("no physics world to step"));
    }

    set_phase(world, SimulationPhase::Stepping);
    let stepped = world.resource_scope(
        |world: &mut World, mut physics: Mut<PhysicsWorld>| -> Result<(), SimulationError> {
            let world: &World = world;
            let dispatcher = world
                .get_resource::<ContactDispatcher>()
                .ok_or_else(|| SimulationError::fault("no contact dispatcher installed"))?;
            let pending = world
                .get_resource::<PendingDeletions>()
                .ok_or_else(|| SimulationError::fault("no pending-deletion set"))?;

            physics.set_timestep(dt);
            physics.step(&dispatcher.bind(ContactContext::new(world, pending)));
            Ok(())
        },
    );
    set_phase(world, SimulationPhase::Idle);
    stepped?;

    let contacts = world
        .get_resource::<ContactDispatcher>()
        .map(|d| d.drain_journal())
        .unwrap_or_default();
    for notice in &contacts {
        world.trigger(ContactEvent::from(*notice));
    }
    world.flush();

    let destroyed = drain_pending_deletions(world)?;
    sync_poses(world)?;

    if let Some(mut time) = world.get_resource_mut::<SimulationTime>() {
        time.elapsed += dt;
        time.delta = dt;
        time.tick_count += 1;
    }

    Ok(TickReport {
        ticks: 1,
        contacts,
        destroyed,
    })
}

/// Run as many fixed ticks as `frame_time` (plus leftover time) allows, at
/// most `max_substeps`. Time that still does not fit is dropped so a long
/// stall cannot snowball into ever longer frames.
pub fn advance(
    world: &mut World,
    frame_time: f32,
    max_substeps: u32,
) -> Result<TickReport, SimulationError> {
    let step = {
        let Some(mut time) = world.get_resource_mut::<SimulationTime>() else {
            return Err(SimulationError::fault("no simulation time resource"));
        };
        time.accumulator += frame_time.max(0.0);
        time.step
    };
    if step <= 0.0 {
        return Err(SimulationError::fault("fixed step must be positive"));
    }

    let mut report = TickReport::default();
    while report.ticks < max_substeps && world.resource::<SimulationTime>().accumulator >= step {
        world.resource_mut::<SimulationTime>().accumulator -= step;
        report.merge(tick(world, step)?);
    }

    let mut time = world.resource_mut::<SimulationTime>();
    if time.accumulator >= step {
        warn!(
            "Simulation fell behind, dropping {:.3}s after {} ticks",
            time.accumulator, report.ticks
        );
        time.accumulator = 0.0;
    }
    Ok(report)
}

/// Destroy every body flagged during the last step.
pub fn drain_pending_deletions(world: &mut World) -> Result<Vec<Entity>, SimulationError> {
    let flagged = world
        .get_resource::<PendingDeletions>()
        .map(|p| p.drain())
        .unwrap_or_default();

    let mut destroyed = Vec::with_capacity(flagged.len());
    for entity in flagged {
        match registry::destroy_body(world, entity) {
            Ok(()) => destroyed.push(entity),
            Err(SimulationError::UnknownBody(_)) => {
                debug!("Flagged body {:?} was already destroyed", entity);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(destroyed)
}

/// Copy the engine's body positions into each [`Pose`].
pub fn sync_poses(world: &mut World) -> Result<(), SimulationError> {
    if !world.contains_resource::<PhysicsWorld>() {
        return Err(SimulationError::fault("no physics world to read poses from"));
    }
    world.resource_scope(|world: &mut World, physics: Mut<PhysicsWorld>| {
        let mut query = world.query::<(Entity, &PhysicsBody, &mut Pose)>();
        for (entity, handle, mut pose) in query.iter_mut(world) {
            let Some(next) = physics.pose(handle) else {
                return Err(SimulationError::fault(format!(
                    "body {entity:?} has no engine state"
                )));
            };
            if !next.is_finite() {
                return Err(SimulationError::fault(format!(
                    "body {entity:?} left the step with a non-finite pose"
                )));
            }
            if *pose != next {
                *pose = next;
            }
        }
        Ok(())
    })
}

fn set_phase(world: &mut World, phase: SimulationPhase) {
    world.insert_resource(phase);
}
