//! Pending-deletion set.
//!
//! Contact policies flag bodies for removal while the engine is stepping.
//! The flags travel through a channel so they can be written through a
//! shared reference from inside engine callbacks, and are drained by the
//! simulation loop once the step has returned.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use rustc_hash::FxHashSet;

#[derive(Resource)]
pub struct PendingDeletions {
    tx: Sender<Entity>,
    rx: Receiver<Entity>,
}

impl Default for PendingDeletions {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingDeletions {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Flag a body for destruction after the current step.
    pub fn flag(&self, entity: Entity) {
        // Both ends live in this struct, so the channel cannot be disconnected.
        let _ = self.tx.send(entity);
    }

    /// Number of flags waiting, duplicates included.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Take every flagged body, in flag order, with duplicates removed.
    pub fn drain(&self) -> Vec<Entity> {
        let mut seen = FxHashSet::default();
        self.rx.try_iter().filter(|e| seen.insert(*e)).collect()
    }
}
