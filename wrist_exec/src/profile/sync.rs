//! Cyclic execution of synchronised profiles

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::Deserialize;

// Internal
use super::{AxisLimits, DualProfile, ProfileState};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Convergence band of an axis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
pub struct AxisTolerance {
    pub pos: f64,
    pub rate: f64,
}

/// Measured state of both axes.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Measured {
    /// `[height, angle]`
    pub pos: [f64; 2],

    /// `[height rate, angle rate]`
    pub rate: [f64; 2],
}

/// Output of a single synchroniser step.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SyncOutput {
    pub elevator: ProfileState,
    pub wrist: ProfileState,

    /// True once both the profile and the measured state have converged on the target.
    pub done: bool,
}

/// Generates and steps a [`DualProfile`] towards a target.
#[derive(Debug, Default, Clone)]
pub struct Synchroniser {
    limits: [AxisLimits; 2],
    tolerance: [AxisTolerance; 2],
    leg: Option<Leg>,
}

#[derive(Debug, Clone, Copy)]
struct Leg {
    target: [f64; 2],

    /// `None` if the leg started within tolerance of the target.
    profile: Option<DualProfile>,

    elapsed_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Synchroniser {
    pub fn new(limits: [AxisLimits; 2], tolerance: [AxisTolerance; 2]) -> Self {
        Self {
            limits,
            tolerance,
            leg: None,
        }
    }

    /// Discard the current profiles. The next call to `advance` regenerates them.
    pub fn reset(&mut self) {
        self.leg = None;
    }

    /// Step the profiles by `dt_s` towards `target`.
    ///
    /// If `target` differs from the target of the current profiles, or there are none, new
    /// profiles are generated starting from the measured position, which is assumed to be at rest.
    pub fn advance(&mut self, target: [f64; 2], measured: &Measured, dt_s: f64) -> SyncOutput {
        let mut leg = match self.leg {
            Some(leg) if leg.target == target => leg,
            _ => self.new_leg(target, measured),
        };
        leg.elapsed_s += dt_s;
        self.leg = Some(leg);

        let profile = match leg.profile {
            Some(p) => p,
            None => {
                return SyncOutput {
                    elevator: ProfileState {
                        pos: target[0],
                        ..Default::default()
                    },
                    wrist: ProfileState {
                        pos: target[1],
                        ..Default::default()
                    },
                    done: true,
                }
            }
        };

        let (elevator, wrist) = profile.sample(leg.elapsed_s);
        let profile_done = leg.elapsed_s >= profile.total_time_s();

        let done = profile_done
            && self.within_pos_tolerance([elevator.pos, wrist.pos], target)
            && self.within_pos_tolerance(measured.pos, target)
            && measured
                .rate
                .iter()
                .zip(self.tolerance.iter())
                .all(|(r, tol)| r.abs() <= tol.rate);

        SyncOutput {
            elevator,
            wrist,
            done,
        }
    }

    fn new_leg(&self, target: [f64; 2], measured: &Measured) -> Leg {
        let profile = if self.within_pos_tolerance(measured.pos, target) {
            debug!("Leg to {:?} starts within tolerance, no profile needed", target);
            None
        } else {
            let p =
                DualProfile::synchronise(measured.pos, target, &self.limits[0], &self.limits[1]);
            debug!(
                "New leg from {:?} to {:?}, duration {:.3} s",
                measured.pos,
                target,
                p.total_time_s()
            );
            Some(p)
        };

        Leg {
            target,
            profile,
            elapsed_s: 0.0,
        }
    }

    fn within_pos_tolerance(&self, pos: [f64; 2], target: [f64; 2]) -> bool {
        pos.iter()
            .zip(target.iter())
            .zip(self.tolerance.iter())
            .all(|((p, t), tol)| (p - t).abs() <= tol.pos)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
