//! Envelope limiter module
//!
//! Some combinations of elevator height and wrist angle would drive the manipulator into the
//! frame. The limiter describes the safe band of wrist angles at each height and, every cycle,
//! inhibits any axis motion that would take the projected next position deeper into a limit. Motion
//! back out of a limit is always allowed.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod limiter;
mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
pub use limiter::*;
pub use params::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One directional motion inhibits for both axes.
///
/// A set flag means the axis may not move further in that direction this cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopFlags {
    pub elevator_stop_down: bool,
    pub elevator_stop_up: bool,
    pub wrist_stop_lower: bool,
    pub wrist_stop_upper: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors in the envelope description.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("The {0} angle limit table is empty")]
    EmptyTable(&'static str),

    #[error("The {0} angle limit table contains a non-finite value")]
    NonFinite(&'static str),

    #[error("The heights of the {0} angle limit table are not strictly increasing")]
    NotIncreasing(&'static str),

    #[error("The {0} angle limit table is not monotonic")]
    NotMonotonic(&'static str),

    #[error("The lower angle limit ({lower}) is not below the upper limit ({upper}) at {height_m} m")]
    EmptyBand {
        height_m: f64,
        lower: f64,
        upper: f64,
    },

    #[error("Invalid {0} axis range: [{1}, {2}]")]
    InvalidRange(&'static str, f64, f64),
}

