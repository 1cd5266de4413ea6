//! # Wristevator library.
//!
//! This library allows other crates in the workspace to access items defined inside the
//! wristevator crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Global data store of the executable
pub mod data_store;

/// Envelope limiter - keeps the wrist inside the band of safe angles for the current height
pub mod envelope;

/// Fault log - records faults raised by each module
pub mod fault_log;

/// Parameters of the executable
pub mod params;

/// Trapezoidal profiles and their synchronisation across both axes
pub mod profile;

/// Route selector - picks the next setpoint on the way to a goal
pub mod route;

/// Setpoint catalog - the named positions and the transition table between them
pub mod setpoints;

/// Simulated mechanism
pub mod sim;

/// Wristevator coordinator - the top level control module
pub mod wrist_ctrl;
