//! # Wristevator Equipment Interface
//!
//! Demands sent to, and sensor data read from, the elevator (linear) and wrist (rotary) actuators.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands for both axes of the mechanism, produced once per control cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct WristevatorDems {
    /// Demand for the elevator.
    ///
    /// Units: meters, meters/second, meters/second^2
    pub elevator: AxisDem,

    /// Demand for the wrist.
    ///
    /// Units: radians, radians/second, radians/second^2
    pub wrist: AxisDem,
}

/// Sensor data for both axes, consumed once per control cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct WristevatorSensData {
    /// Measured height of the elevator carriage.
    ///
    /// Units: meters
    pub height_m: f64,

    /// Measured angle of the wrist.
    ///
    /// Units: radians
    pub angle_rad: f64,

    /// Measured rate of the elevator.
    ///
    /// Units: meters/second
    pub height_rate_ms: f64,

    /// Measured rate of the wrist.
    ///
    /// Units: radians/second
    pub angle_rate_rads: f64,

    /// True if the elevator home reference switch is closed.
    pub home_switch: bool,

    /// Time at which the data was sampled, in seconds since the start of the session.
    pub timestamp_s: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A demand for a single actuator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum AxisDem {
    /// A point on a motion profile, tracked by the actuator's own closed loop.
    ProfilePoint {
        /// Demanded position
        pos: f64,

        /// Feed-forward rate
        rate: f64,

        /// Feed-forward acceleration
        accel: f64,
    },

    /// An open loop rate demand.
    Rate(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AxisDem {
    /// A demand to hold the given position at rest.
    pub fn hold(pos: f64) -> Self {
        AxisDem::ProfilePoint {
            pos,
            rate: 0.0,
            accel: 0.0,
        }
    }

    /// The rate component of the demand.
    pub fn rate(&self) -> f64 {
        match self {
            AxisDem::ProfilePoint { rate, .. } => *rate,
            AxisDem::Rate(r) => *r,
        }
    }

    /// The position component of the demand, if there is one.
    pub fn pos(&self) -> Option<f64> {
        match self {
            AxisDem::ProfilePoint { pos, .. } => Some(*pos),
            AxisDem::Rate(_) => None,
        }
    }
}

impl Default for AxisDem {
    fn default() -> Self {
        AxisDem::Rate(0.0)
    }
}

impl Default for WristevatorDems {
    fn default() -> Self {
        Self {
            elevator: AxisDem::default(),
            wrist: AxisDem::default(),
        }
    }
}

impl WristevatorSensData {
    /// Returns true if every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        self.height_m.is_finite()
            && self.angle_rad.is_finite()
            && self.height_rate_ms.is_finite()
            && self.angle_rate_rads.is_finite()
            && self.timestamp_s.is_finite()
    }
}
