//! # Communications interface crate.
//!
//! Provides the interface structures shared between the wristevator coordinator and its
//! collaborators (actuators, sensors and command sources).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand definitions and parsing
pub mod tc;

/// Demand and sensor definitions for equipment (the elevator and wrist actuators)
pub mod eqpt;
