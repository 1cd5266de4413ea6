//! Wristevator coordinator module
//!
//! Coordinates the elevator and wrist so that the mechanism only ever moves through the safe
//! envelope. Goals are reached by a sequence of legs, each leg being a synchronised pair of
//! trapezoidal profiles towards a setpoint chosen by the route selector. In manual mode operator
//! rates are passed through the envelope limiter directly.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

#[cfg(test)]
mod test;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use params::*;
pub use state::*;

use crate::envelope::EnvelopeError;
use crate::fault_log::Fault;
use crate::setpoints::CatalogError;
use util::{archive::ArchiveError, params::LoadError};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The possible modes of execution of WristCtrl. Each mode is handled by a `mode_xyz` function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// Holding the last demanded position.
    Idle,

    /// Passing operator rates through the envelope limiter.
    Manual,

    /// Bringing both axes to rest before goal tracking begins.
    Decelerate,

    /// Executing legs towards the goal.
    GoalTracking,
}

/// Problems with the sensor data which prevent closed loop control.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SensFault {
    #[error("No sensor data was received")]
    Missing,

    #[error("Sensor data is {age_s:.3} s old")]
    Stale { age_s: f64 },

    #[error("Sensor data contains non-finite values")]
    NonFinite,

    #[error("Measured height ({0:.3} m) is outside the elevator's range")]
    HeightOutOfRange(f64),

    #[error("Measured angle ({0:.3} rad) is outside the wrist's range")]
    AngleOutOfRange(f64),

    #[error("Invalid cycle time: {0} s")]
    InvalidCycleTime(f64),
}

/// Possible errors that can occur during WristCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum WristCtrlError {
    #[error("WristCtrl has not been initialised")]
    NotInitialised,

    #[error("Could not load the parameters: {0}")]
    ParamLoadError(LoadError),

    #[error("Invalid {0} parameters: {1}")]
    InvalidAxisParams(&'static str, &'static str),

    #[error("Invalid parameters: {0}")]
    InvalidParams(&'static str),

    #[error("Setpoint catalog error: {0}")]
    CatalogError(#[from] CatalogError),

    #[error("Envelope error: {0}")]
    EnvelopeError(#[from] EnvelopeError),

    #[error("Invalid manual rates ({0}, {1})")]
    InvalidManualRates(f64, f64),

    #[error("Archive error: {0}")]
    ArchiveError(ArchiveError),
}

impl Fault for SensFault {
    fn kind(&self) -> &'static str {
        match self {
            SensFault::Missing => "missing",
            SensFault::Stale { .. } => "stale",
            SensFault::NonFinite => "non_finite",
            SensFault::HeightOutOfRange(_) => "height_out_of_range",
            SensFault::AngleOutOfRange(_) => "angle_out_of_range",
            SensFault::InvalidCycleTime(_) => "invalid_cycle_time",
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Idle
    }
}
