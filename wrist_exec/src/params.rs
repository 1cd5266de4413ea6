//! # Wristevator Executable Parameters
//!
//! This module provide parameters for the wristevator executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WristExecParams {
    /// Target period of one control cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Number of consecutive cycle overruns tolerated before entering safe mode
    pub max_consec_cycle_overruns: u64,

    /// Goals the operator may select, each must be a goal in the setpoint catalog
    pub operator_goals: Vec<String>,
}
