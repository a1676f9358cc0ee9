//! Contact events published after each step.
//!
//! The simulation loop journals begin and end notifications while the engine
//! is stepping and triggers one [`ContactEvent`] per notification once the
//! step has returned, so observers run with full world access. Both bodies
//! are still alive when the event is triggered; bodies flagged for deletion
//! are destroyed right after.
use bevy_ecs::prelude::*;
use log::debug;

use crate::resources::contactdispatcher::{BodyRef, ContactNotice, ContactPhase};

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub a: BodyRef,
    pub b: BodyRef,
}

impl From<ContactNotice> for ContactEvent {
    fn from(notice: ContactNotice) -> Self {
        Self {
            phase: notice.phase,
            a: notice.a,
            b: notice.b,
        }
    }
}

/// Debug trace of every contact transition.
pub fn observe_contact_log(trigger: On<ContactEvent>) {
    let event = trigger.event();
    debug!(
        "{:?} contact: {:?} ({}) / {:?} ({})",
        event.phase,
        event.a.entity,
        event.a.kind.name(),
        event.b.entity,
        event.b.kind.name()
    );
}
