//! # Wristevator simulation
//!
//! A simple plant model of the elevator and wrist used to run the coordinator without hardware.
//! Each axis tracks its demand with a proportional position loop plus rate feed-forward, limited
//! by the axis rate and acceleration.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod client;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use comms_if::eqpt::wristevator::{AxisDem, WristevatorDems, WristevatorSensData};
use util::maths::approach;

pub use client::*;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the simulated mechanism.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SimParams {
    /// Frequency at which the background simulation is stepped.
    ///
    /// Units: hertz
    pub update_frequency_hz: f64,

    /// The home switch is closed at or below this height.
    ///
    /// Units: meters
    pub home_switch_height_m: f64,

    /// Initial `[height, angle]` of the mechanism.
    ///
    /// Units: meters, radians
    pub start_pos: [f64; 2],

    pub elevator: SimAxisParams,
    pub wrist: SimAxisParams,
}

/// Parameters of a single simulated axis.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct SimAxisParams {
    /// Proportional gain of the simulated actuator's position loop.
    ///
    /// Units: 1/second
    pub tracking_gain: f64,

    pub max_rate: f64,
    pub max_accel: f64,
}

/// The simulated mechanism.
#[derive(Debug, Clone)]
pub struct SimWristevator {
    params: SimParams,
    elevator: SimAxis,
    wrist: SimAxis,
}

#[derive(Debug, Default, Clone, Copy)]
struct SimAxis {
    pos: f64,
    rate: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Invalid simulation parameters: {0}")]
    InvalidParams(&'static str),

    #[error("The simulation state mutex has been poisoned")]
    Poisoned,

    #[error("Could not start the simulation thread: {0}")]
    ThreadError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimWristevator {
    pub fn new(params: &SimParams) -> Result<Self, SimError> {
        if !(params.update_frequency_hz > 0.0) {
            return Err(SimError::InvalidParams("update_frequency_hz must be positive"));
        }
        for axis in [params.elevator, params.wrist].iter() {
            if !(axis.tracking_gain > 0.0 && axis.max_rate > 0.0 && axis.max_accel > 0.0) {
                return Err(SimError::InvalidParams(
                    "tracking_gain, max_rate and max_accel must be positive",
                ));
            }
        }

        Ok(Self {
            params: params.clone(),
            elevator: SimAxis {
                pos: params.start_pos[0],
                rate: 0.0,
            },
            wrist: SimAxis {
                pos: params.start_pos[1],
                rate: 0.0,
            },
        })
    }

    /// Advance the simulation by `dt_s` under the given demands.
    pub fn step(&mut self, dt_s: f64, dems: &WristevatorDems) {
        self.elevator.step(dt_s, &dems.elevator, &self.params.elevator);
        self.wrist.step(dt_s, &dems.wrist, &self.params.wrist);
    }

    /// Sensor data for the current state, stamped with `time_s`.
    pub fn sens_data(&self, time_s: f64) -> WristevatorSensData {
        WristevatorSensData {
            height_m: self.elevator.pos,
            angle_rad: self.wrist.pos,
            height_rate_ms: self.elevator.rate,
            angle_rate_rads: self.wrist.rate,
            home_switch: self.elevator.pos <= self.params.home_switch_height_m,
            timestamp_s: time_s,
        }
    }
}

impl SimAxis {
    fn step(&mut self, dt_s: f64, dem: &AxisDem, params: &SimAxisParams) {
        let desired_rate = match *dem {
            AxisDem::ProfilePoint { pos, rate, .. } => {
                rate + params.tracking_gain * (pos - self.pos)
            }
            AxisDem::Rate(r) => r,
        }
        .max(-params.max_rate)
        .min(params.max_rate);

        self.rate = approach(self.rate, desired_rate, params.max_accel * dt_s);
        self.pos += self.rate * dt_s;
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
