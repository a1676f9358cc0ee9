//! ECS components for bodies.
//!
//! Every simulated body is an entity carrying all four components below.
//!
//! Submodules overview:
//! - [`bodykind`] – immutable Static/Dynamic classification
//! - [`boxshape`] – rectangle half extents and corner computation
//! - [`physicsbody`] – handles into the physics engine
//! - [`pose`] – position and rotation synced from the engine each tick

pub mod bodykind;
pub mod boxshape;
pub mod physicsbody;
pub mod pose;
