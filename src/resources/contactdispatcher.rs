//! Contact dispatcher resource.
//!
//! The dispatcher turns the engine's entity-level contact notifications into
//! kind-aware policy calls. It runs inside the engine step, where the ECS
//! world is only available by shared reference: a policy can read bodies and
//! flag them for deletion, but it cannot destroy anything.
//!
//! Begin and end notifications are also journaled so the simulation loop can
//! re-publish them as [`ContactEvent`](crate::events::contact::ContactEvent)s
//! once the step is over.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{trace, warn};
use rapier2d::prelude::{ContactManifold, Real};

use crate::components::bodykind::BodyKind;
use crate::error::SimulationError;
use crate::registry;
use crate::resources::pendingdeletions::PendingDeletions;
use crate::resources::physicsworld::ContactSink;
use crate::resources::simulationphase::SimulationPhase;

/// A body taking part in a contact, with its kind already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyRef {
    pub entity: Entity,
    pub kind: BodyKind,
}

/// What the solver should do with a contact after the pre-solve hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverResponse {
    /// Resolve the contact normally.
    #[default]
    Keep,
    /// Drop the contact for this step; the bodies pass through each other.
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Begin,
    End,
}

/// Journal entry for a begin or end notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactNotice {
    pub phase: ContactPhase,
    pub a: BodyRef,
    pub b: BodyRef,
}

impl ContactNotice {
    /// Whether this notice concerns the unordered pair `{x, y}`.
    pub fn involves_pair(&self, x: Entity, y: Entity) -> bool {
        (self.a.entity == x && self.b.entity == y) || (self.a.entity == y && self.b.entity == x)
    }
}

/// Read-only view of the world handed to policy hooks during a step.
#[derive(Clone, Copy)]
pub struct ContactContext<'w> {
    world: &'w World,
    pending: &'w PendingDeletions,
}

impl<'w> ContactContext<'w> {
    pub fn new(world: &'w World, pending: &'w PendingDeletions) -> Self {
        Self { world, pending }
    }

    pub fn kind_of(&self, entity: Entity) -> Result<BodyKind, SimulationError> {
        registry::kind_of(self.world, entity)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.kind_of(entity).is_ok()
    }

    pub fn phase(&self) -> SimulationPhase {
        self.world
            .get_resource::<SimulationPhase>()
            .copied()
            .unwrap_or_default()
    }

    /// Queue a body for destruction once the current step has finished.
    pub fn flag_for_deletion(&self, entity: Entity) {
        self.pending.flag(entity);
    }

    fn body(&self, entity: Entity) -> Option<BodyRef> {
        self.kind_of(entity)
            .ok()
            .map(|kind| BodyRef { entity, kind })
    }
}

/// Application policy reacting to contacts.
///
/// Every hook runs inside the engine step. Hooks must not block and must
/// not try to reach the world mutably; flag bodies through
/// [`ContactContext::flag_for_deletion`] instead.
pub trait ContactPolicy: Send + Sync + 'static {
    /// Called once for every Dynamic participant of a begin-contact event.
    fn deletion_intent(&self, ctx: &ContactContext<'_>, body: BodyRef, other: BodyRef);

    fn end_contact(&self, _ctx: &ContactContext<'_>, _a: BodyRef, _b: BodyRef) {}

    /// Called before the solver computes impulses for an active contact.
    fn pre_solve(
        &self,
        _ctx: &ContactContext<'_>,
        _a: BodyRef,
        _b: BodyRef,
        _manifold: &ContactManifold,
    ) -> SolverResponse {
        SolverResponse::Keep
    }

    /// Called after impulse resolution with the impulse magnitude applied
    /// over the step.
    fn post_solve(&self, _ctx: &ContactContext<'_>, _a: BodyRef, _b: BodyRef, _impulse: Real) {}
}

#[derive(Resource)]
pub struct ContactDispatcher {
    policy: Box<dyn ContactPolicy>,
    journal_tx: Sender<ContactNotice>,
    journal_rx: Receiver<ContactNotice>,
}

impl ContactDispatcher {
    pub fn new(policy: impl ContactPolicy) -> Self {
        Self::from_boxed(Box::new(policy))
    }

    pub fn from_boxed(policy: Box<dyn ContactPolicy>) -> Self {
        let (journal_tx, journal_rx) = unbounded();
        Self {
            policy,
            journal_tx,
            journal_rx,
        }
    }

    pub fn on_begin_contact(&self, ctx: &ContactContext<'_>, a: Entity, b: Entity) {
        let (Some(a), Some(b)) = (ctx.body(a), ctx.body(b)) else {
            warn!("Begin contact {:?}/{:?} names a body the registry no longer has, skipped", a, b);
            return;
        };
        trace!("Begin contact {:?} ({}) / {:?} ({})", a.entity, a.kind.name(), b.entity, b.kind.name());
        self.journal(ContactPhase::Begin, a, b);

        for (body, other) in [(a, b), (b, a)] {
            if body.kind.is_dynamic() {
                self.policy.deletion_intent(ctx, body, other);
            }
        }
    }

    pub fn on_end_contact(&self, ctx: &ContactContext<'_>, a: Entity, b: Entity) {
        let (Some(a), Some(b)) = (ctx.body(a), ctx.body(b)) else {
            return;
        };
        trace!("End contact {:?} / {:?}", a.entity, b.entity);
        self.journal(ContactPhase::End, a, b);
        self.policy.end_contact(ctx, a, b);
    }

    pub fn on_pre_solve(
        &self,
        ctx: &ContactContext<'_>,
        a: Entity,
        b: Entity,
        manifold: &ContactManifold,
    ) -> SolverResponse {
        match (ctx.body(a), ctx.body(b)) {
            (Some(a), Some(b)) => self.policy.pre_solve(ctx, a, b, manifold),
            _ => SolverResponse::Keep,
        }
    }

    pub fn on_post_solve(&self, ctx: &ContactContext<'_>, a: Entity, b: Entity, impulse: Real) {
        if let (Some(a), Some(b)) = (ctx.body(a), ctx.body(b)) {
            self.policy.post_solve(ctx, a, b, impulse);
        }
    }

    /// Take the begin/end notices recorded since the last drain, in the order
    /// the engine reported them.
    pub fn drain_journal(&self) -> Vec<ContactNotice> {
        self.journal_rx.try_iter().collect()
    }

    /// Bind the dispatcher to a world view for the duration of one step.
    pub fn bind<'w>(&'w self, ctx: ContactContext<'w>) -> StepDispatch<'w> {
        StepDispatch {
            dispatcher: self,
            ctx,
        }
    }

    fn journal(&self, phase: ContactPhase, a: BodyRef, b: BodyRef) {
        // Both ends live in this struct, so the channel cannot be disconnected.
        let _ = self.journal_tx.send(ContactNotice { phase, a, b });
    }
}

/// The dispatcher as seen by the engine during a single step.
pub struct StepDispatch<'w> {
    dispatcher: &'w ContactDispatcher,
    ctx: ContactContext<'w>,
}

impl ContactSink for StepDispatch<'_> {
    fn begin_contact(&self, a: Entity, b: Entity) {
        self.dispatcher.on_begin_contact(&self.ctx, a, b);
    }

    fn end_contact(&self, a: Entity, b: Entity) {
        self.dispatcher.on_end_contact(&self.ctx, a, b);
    }

    fn pre_solve(&self, a: Entity, b: Entity, manifold: &ContactManifold) -> SolverResponse {
        self.dispatcher.on_pre_solve(&self.ctx, a, b, manifold)
    }

    fn post_solve(&self, a: Entity, b: Entity, impulse: Real) {
        self.dispatcher.on_post_solve(&self.ctx, a, b, impulse);
    }
}
