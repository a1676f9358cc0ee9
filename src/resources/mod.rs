//! ECS resources made available to systems.
//!
//! Overview
//! - `contactdispatcher` – policy hooks invoked from inside the engine step
//! - `pendingdeletions` – bodies flagged for destruction after the step
//! - `physicsworld` – rapier state and the pixel/meter boundary
//! - `simulationconfig` – INI-backed settings for window, physics and spawner
//! - `simulationphase` – Idle/Stepping state of the loop
//! - `simulationtime` – simulated time, tick count and accumulator
pub mod contactdispatcher;
pub mod pendingdeletions;
pub mod physicsworld;
pub mod simulationconfig;
pub mod simulationphase;
pub mod simulationtime;
