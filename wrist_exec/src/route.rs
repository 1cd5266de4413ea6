//! # Route selector
//!
//! Decides which setpoint the mechanism should travel to next on its way to a goal. Routes have at
//! most one intermediate: either the one configured in the catalog's transition table, or, when
//! the mechanism is not sitting at a known setpoint, the intermediate closest to it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;

// Internal
use crate::setpoints::{SetpointCatalog, SetpointId};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The routing view of the coordinator state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteState {
    /// The most recently reached setpoint.
    pub previous: SetpointId,

    /// The currently targeted setpoint.
    pub next: SetpointId,

    /// True if control was last handed over from manual mode.
    pub is_manual: bool,

    /// True if the last leg converged on `next`.
    pub leg_finished: bool,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Select the next setpoint to travel to.
///
/// # Inputs
/// - `catalog`: The setpoint catalog
/// - `goal`: The ultimate goal
/// - `state`: Current routing state
/// - `position`: Measured `[height, angle]` of the mechanism
/// - `angle_scale_m_per_rad`: Scale applied to angles so they can be compared with heights
pub fn select_next(
    catalog: &SetpointCatalog,
    goal: SetpointId,
    state: &RouteState,
    position: [f64; 2],
    angle_scale_m_per_rad: f64,
) -> SetpointId {
    let clean_arrival =
        !state.is_manual && state.previous == state.next && state.leg_finished;

    if !clean_arrival {
        if let Some(id) = nearest_intermediate(catalog, position, angle_scale_m_per_rad) {
            return id;
        }
    }

    catalog
        .lookup_intermediate(state.previous, goal)
        .unwrap_or(goal)
}

/// Find the intermediate closest to `position`.
///
/// Ties are resolved in favour of the intermediate which comes first in the catalog.
pub fn nearest_intermediate(
    catalog: &SetpointCatalog,
    position: [f64; 2],
    angle_scale_m_per_rad: f64,
) -> Option<SetpointId> {
    let current = to_config_space(position, angle_scale_m_per_rad);

    let mut nearest: Option<(SetpointId, f64)> = None;

    for id in catalog.all_intermediates() {
        let dist = (to_config_space(catalog.get(*id).position(), angle_scale_m_per_rad) - current)
            .norm();

        match nearest {
            Some((_, d)) if d <= dist => (),
            _ => nearest = Some((*id, dist)),
        }
    }

    nearest.map(|(id, _)| id)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a `[height, angle]` pair into a point in which both components are in meters.
fn to_config_space(position: [f64; 2], angle_scale_m_per_rad: f64) -> Vector2<f64> {
    Vector2::new(position[0], position[1] * angle_scale_m_per_rad)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
