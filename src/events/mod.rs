//! Event types and observers.
//!
//! Submodules:
//! - [`contact`] – begin/end contact notifications re-published after a step
//! - [`spawn`] – requests to create a falling block
pub mod contact;
pub mod spawn;
