//! Boxdrop library.
//!
//! A fixed-step 2D rigid-body loop: a static platform, falling blocks
//! spawned on request, and contact notifications routed to a policy that may
//! flag blocks for removal once the physics step has finished.
//!
//! The modules expose the ECS components, resources, systems and events so
//! integration tests and other front ends can drive the same world.

pub mod components;
pub mod error;
pub mod events;
pub mod game;
pub mod policies;
pub mod registry;
pub mod resources;
pub mod systems;
