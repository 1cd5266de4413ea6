//! Parameters structure for the envelope limiter

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The safe angular band of the wrist as a function of elevator height.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EnvelopeParams {
    /// Knots of the lowest safe wrist angle, as `[height, angle]` pairs sorted by increasing
    /// height.
    ///
    /// Units: meters, radians
    pub lower_angle_limit: Vec<[f64; 2]>,

    /// Knots of the highest safe wrist angle, as `[height, angle]` pairs sorted by increasing
    /// height.
    ///
    /// Units: meters, radians
    pub upper_angle_limit: Vec<[f64; 2]>,
}
