//! # Wristevator telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be executed by the wristevator coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WristevatorCmd {
    /// Move both axes to the named goal setpoint, routing through safe intermediates as needed.
    Goal {
        /// Name of the goal setpoint, as it appears in the setpoint catalog.
        name: String,
    },

    /// Drive both axes at the given rates, subject to the envelope limits.
    Speeds {
        /// Rate of the elevator in meters/second.
        ///
        /// Positive is upwards.
        height_rate_ms: f64,

        /// Rate of the wrist in radians/second.
        ///
        /// Follows the right hand rule about the wrist axle.
        angle_rate_rads: f64,
    },

    /// Switch to manual rate control with both rates zeroed.
    Manual,

    /// Release control of the mechanism, holding the last demanded position.
    Release,
}
