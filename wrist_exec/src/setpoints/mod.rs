//! Setpoint catalog module
//!
//! Holds the named operating positions of the mechanism, the safe transit positions used only for
//! routing, and the table of preferred intermediates between pairs of setpoints. The catalog is
//! built once at startup and never mutated.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod catalog;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use catalog::*;
pub use params::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors found while building or querying the catalog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("The catalog must contain at least one goal setpoint")]
    NoGoals,

    #[error("The catalog must contain at least one intermediate setpoint")]
    NoIntermediates,

    #[error("Setpoint {0} is defined more than once")]
    DuplicateName(String),

    #[error("Setpoint {0} has a non-finite height or angle")]
    NonFinite(String),

    #[error("There is no setpoint named {0}")]
    UnknownSetpoint(String),

    #[error("Setpoint {0} is not a goal")]
    NotAGoal(String),

    #[error("Setpoint {0} is not an intermediate")]
    NotAnIntermediate(String),

    #[error("Transition from {0} to itself")]
    SelfTransition(String),

    #[error("Transition from {0} to {1} is defined more than once")]
    DuplicateTransition(String, String),
}
