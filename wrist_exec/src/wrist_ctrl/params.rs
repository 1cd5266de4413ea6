//! Parameters structure for WristCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::envelope::EnvelopeParams;
use crate::profile::{AxisLimits, AxisTolerance};
use crate::setpoints::CatalogParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the wristevator coordinator.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Params {
    /// The setpoint the mechanism is assumed to be resting at on startup.
    pub start_setpoint: String,

    /// Scale applied to wrist angles when comparing them with heights, normally the length of the
    /// manipulator.
    ///
    /// Units: meters/radian
    pub angle_scale_m_per_rad: f64,

    /// Maximum age of sensor data before it is considered stale.
    ///
    /// Units: seconds
    pub max_sens_age_s: f64,

    /// How far outside an axis's range a measurement may be before it is considered invalid.
    ///
    /// Units: meters for the elevator, radians for the wrist
    pub sens_range_margin: [f64; 2],

    // ---- AXES ----
    pub elevator: AxisParams,
    pub wrist: AxisParams,

    // ---- TABLES ----
    pub envelope: EnvelopeParams,
    pub catalog: CatalogParams,
}

/// Capabilities of a single axis.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct AxisParams {
    /// Minimum position of the axis.
    ///
    /// Units: meters or radians
    pub min_pos: f64,

    /// Maximum position of the axis.
    ///
    /// Units: meters or radians
    pub max_pos: f64,

    /// Maximum rate magnitude.
    ///
    /// Units: meters/second or radians/second
    pub max_rate: f64,

    /// Maximum acceleration magnitude.
    ///
    /// Units: meters/second^2 or radians/second^2
    pub max_accel: f64,

    /// Position band within which the axis is considered to have arrived.
    pub pos_tolerance: f64,

    /// Rate band within which the axis is considered to be stopped.
    pub rate_tolerance: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AxisParams {
    pub fn limits(&self) -> AxisLimits {
        AxisLimits {
            max_rate: self.max_rate,
            max_accel: self.max_accel,
        }
    }

    pub fn tolerance(&self) -> AxisTolerance {
        AxisTolerance {
            pos: self.pos_tolerance,
            rate: self.rate_tolerance,
        }
    }

    /// Returns a description of the first invalid value, if any.
    pub(crate) fn check(&self) -> Option<&'static str> {
        let values = [
            self.min_pos,
            self.max_pos,
            self.max_rate,
            self.max_accel,
            self.pos_tolerance,
            self.rate_tolerance,
        ];

        if values.iter().any(|v| !v.is_finite()) {
            Some("non-finite value")
        } else if self.min_pos >= self.max_pos {
            Some("min_pos must be less than max_pos")
        } else if self.max_rate <= 0.0 || self.max_accel <= 0.0 {
            Some("max_rate and max_accel must be positive")
        } else if self.pos_tolerance <= 0.0 || self.rate_tolerance <= 0.0 {
            Some("tolerances must be positive")
        } else {
            None
        }
    }
}
