//! # Simulation Client
//!
//! Runs a [`SimWristevator`] on a background thread at its update frequency. The control cycle
//! sends demands and reads back sensor data through the client, as it would with the actuator
//! drivers.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, error};

use super::{SimError, SimParams, SimWristevator};
use comms_if::eqpt::wristevator::{WristevatorDems, WristevatorSensData};
use util::{session, time};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct SimClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    sim: Arc<Mutex<SimWristevator>>,
    dems: Arc<Mutex<WristevatorDems>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimClient {
    /// Start the simulation in the background.
    ///
    /// The session must already have been started, since sensor data is timestamped with the
    /// session's elapsed time.
    pub fn new(params: &SimParams) -> Result<Self, SimError> {
        let sim = SimWristevator::new(params)?;

        let bg_run = Arc::new(AtomicBool::new(true));
        let sim = Arc::new(Mutex::new(sim));
        let dems = Arc::new(Mutex::new(WristevatorDems::default()));

        let bg_run_clone = bg_run.clone();
        let sim_clone = sim.clone();
        let dems_clone = dems.clone();
        let period_s = time::period_s(params.update_frequency_hz);

        let bg_jh = thread::Builder::new()
            .name("sim_wristevator".into())
            .spawn(move || bg_thread(period_s, bg_run_clone, sim_clone, dems_clone))
            .map_err(SimError::ThreadError)?;

        debug!("SimClient started at {} Hz", params.update_frequency_hz);

        Ok(Self {
            bg_jh: Some(bg_jh),
            bg_run,
            sim,
            dems,
        })
    }

    /// Latest simulated sensor data.
    pub fn sens_data(&self) -> Result<WristevatorSensData, SimError> {
        let sim = self.sim.lock().map_err(|_| SimError::Poisoned)?;

        Ok(sim.sens_data(session::get_elapsed_seconds()))
    }

    /// Demands to apply from the next simulation step onwards.
    pub fn send_demands(&self, dems: &WristevatorDems) -> Result<(), SimError> {
        let mut d = self.dems.lock().map_err(|_| SimError::Poisoned)?;
        *d = *dems;

        Ok(())
    }
}

impl Drop for SimClient {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                error!("SimClient background thread panicked");
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Background thread, steps the simulation at a fixed period until told to stop.
fn bg_thread(
    period_s: f64,
    run: Arc<AtomicBool>,
    sim: Arc<Mutex<SimWristevator>>,
    dems: Arc<Mutex<WristevatorDems>>,
) {
    let period = Duration::from_secs_f64(period_s);

    while run.load(Ordering::Relaxed) {
        let d = match dems.lock() {
            Ok(d) => *d,
            Err(_) => {
                error!("SimClient: demands mutex poisoned");
                break;
            }
        };

        match sim.lock() {
            Ok(mut s) => s.step(period_s, &d),
            Err(_) => {
                error!("SimClient: simulation mutex poisoned");
                break;
            }
        }

        thread::sleep(period);
    }
}
