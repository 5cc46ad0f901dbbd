//! Foster placement workflows for animal shelters.
//!
//! The heart of the crate is [`workflows::fostering`]: the engine that moves
//! animals and animal groups between available, requested, and fostered
//! states while keeping the group-level invariants intact, plus the
//! best-effort chat notifications that ride on successful transitions.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
