//! Engine systems.
//!
//! Submodules overview
//! - [`simulation`] – fixed-step tick, deferred destruction and pose sync
//! - [`spawner`] – create falling blocks from spawn requests
//! - `input` – read mouse and keyboard from raylib (`window` feature)
//! - `render` – draw bodies with raylib (`window` feature)

#[cfg(feature = "window")]
pub mod input;
#[cfg(feature = "window")]
pub mod render;
pub mod simulation;
pub mod spawner;
