//! Stock contact policies.
//!
//! [`LogDeletionIntent`] keeps every body and only reports which dynamic
//! bodies a removal rule would have picked. [`RemoveOnContact`] flags them,
//! so the simulation loop destroys each dynamic body at the end of the tick
//! in which it first touched something.
//!
//! Neither policy reacts to end contact: a flag raised by a begin contact is
//! honored even if the pair separates within the same step.

use log::info;

use crate::resources::contactdispatcher::{BodyRef, ContactContext, ContactPolicy};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogDeletionIntent;

impl ContactPolicy for LogDeletionIntent {
    fn deletion_intent(&self, _ctx: &ContactContext<'_>, body: BodyRef, other: BodyRef) {
        info!(
            "Detected collision: dynamic body {:?} touched {} body {:?}, it may be deleted",
            body.entity,
            other.kind.name(),
            other.entity
        );
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOnContact;

impl ContactPolicy for RemoveOnContact {
    fn deletion_intent(&self, ctx: &ContactContext<'_>, body: BodyRef, other: BodyRef) {
        info!(
            "Detected collision: dynamic body {:?} touched {} body {:?}, flagged for deletion",
            body.entity,
            other.kind.name(),
            other.entity
        );
        ctx.flag_for_deletion(body.entity);
    }
}

/// Pick the stock policy for the `remove_on_contact` setting.
pub fn stock_policy(remove_on_contact: bool) -> Box<dyn ContactPolicy> {
    if remove_on_contact {
        Box::new(RemoveOnContact)
    } else {
        Box::new(LogDeletionIntent)
    }
}
