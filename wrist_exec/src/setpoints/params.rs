//! Configuration structures for the setpoint catalog

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The static setpoint catalog and transition table, as loaded from the parameter file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CatalogParams {
    /// Operator selectable goal setpoints.
    pub goals: Vec<SetpointSpec>,

    /// Safe transit setpoints, only ever used for routing.
    pub intermediates: Vec<SetpointSpec>,

    /// Preferred intermediates between pairs of setpoints.
    #[serde(default)]
    pub transitions: Vec<TransitionSpec>,
}

/// A single named setpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetpointSpec {
    pub name: String,

    /// Units: meters
    pub height: f64,

    /// Units: radians
    pub angle: f64,
}

/// A row of the transition table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionSpec {
    /// Setpoint the mechanism is leaving from.
    pub origin: String,

    /// Goal the mechanism is heading towards.
    pub destination: String,

    /// Intermediate to pass through on the way.
    pub intermediate: String,

    /// If true the row also applies from `destination` to `origin`.
    #[serde(default)]
    pub symmetric: bool,
}
