//! Main wristevator executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Sensor data acquisition
//!         - Telecommand processing and handling
//!         - Wristevator coordinator processing
//!         - Fault monitoring
//!         - Demands output
//!         - Archiving
//!
//! # Modules
//!
//! All modules (e.g. `wrist_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use wrist_lib::{
    data_store::{DataStore, SafeModeCause},
    params::WristExecParams,
    sim::{SimClient, SimParams},
};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{error, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Runs the wristevator coordinator against the simulated mechanism.
#[derive(Debug, StructOpt)]
#[structopt(name = "wrist_exec")]
struct Cli {
    /// Path to the telecommand script to execute
    #[structopt(parse(from_os_str))]
    script: PathBuf,

    /// Stop after this many cycles, even if the script has not finished
    #[structopt(long)]
    cycles: Option<u128>,

    /// Log at debug rather than trace level
    #[structopt(long)]
    quiet: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let cli = Cli::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("wrist_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let log_level = if cli.quiet {
        LevelFilter::Debug
    } else {
        LevelFilter::Trace
    };
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("Wristevator Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: WristExecParams =
        util::params::load("wrist_exec.toml").wrap_err("Could not load exec params")?;
    let sim_params: SimParams =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    if !(exec_params.cycle_period_s > 0.0) {
        return Err(eyre!(
            "Cycle period must be positive, found {}",
            exec_params.cycle_period_s
        ));
    }
    let cycle_frequency_hz = 1.0 / exec_params.cycle_period_s;

    info!("Exec parameters loaded");

    // ---- LOAD SCRIPT ----

    info!("Loading script from {:?}", cli.script);

    let mut si = ScriptInterpreter::new(&cli.script).wrap_err("Failed to load script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} TCs\n",
        si.get_duration(),
        si.get_num_tcs()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    ds.wrist_ctrl
        .init("wrist_ctrl.toml", &session)
        .wrap_err("Failed to initialise WristCtrl")?;
    ds.wrist_ctrl
        .catalog()
        .validate_goals(&exec_params.operator_goals)
        .wrap_err("Invalid operator goals")?;
    info!("WristCtrl init complete");

    let sim_client = SimClient::new(&sim_params).wrap_err("Failed to initialise SimClient")?;
    info!("SimClient initialised");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut last_cycle_time_s: Option<f64> = None;
    let mut goal_reported = false;

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(cycle_frequency_hz, session::get_elapsed_seconds());

        // ---- DATA INPUT ----

        match sim_client.sens_data() {
            Ok(s) => {
                ds.wrist_sens = Some(s);
                ds.make_unsafe(SafeModeCause::SensDataUnavailable).ok();
            }
            Err(e) => {
                if !ds.safe {
                    error!("Could not read sensor data: {}", e);
                }
                ds.make_safe(SafeModeCause::SensDataUnavailable);
            }
        }

        // ---- TELECOMMAND PROCESSING ----

        match si.get_pending_tcs(ds.time_s) {
            PendingTcs::None => (),
            PendingTcs::Some(tc_vec) => {
                for tc in tc_vec.iter() {
                    tc_processor::exec(&mut ds, tc);
                }
            }
            // Exit if end of script reached
            PendingTcs::EndOfScript => {
                info!("End of TC script reached, stopping");
                break;
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        ds.wrist_ctrl_input.sens = ds.wrist_sens;
        ds.wrist_ctrl_input.time_s = ds.time_s;
        ds.wrist_ctrl_input.dt_s = match last_cycle_time_s {
            Some(t) => ds.time_s - t,
            None => exec_params.cycle_period_s,
        };
        last_cycle_time_s = Some(ds.time_s);

        match ds.wrist_ctrl.proc(&ds.wrist_ctrl_input) {
            Ok((o, r)) => {
                ds.wrist_ctrl_output = o;
                ds.wrist_ctrl_status_rpt = r;
            }
            Err(e) => warn!("Error during WristCtrl processing: {}", e),
        };

        // ---- FAULT MONITORING ----

        if let Some(f) = ds.wrist_ctrl_status_rpt.fault {
            ds.fault_log.report("wrist_ctrl", f);
        }
        if ds.is_1_hz_cycle {
            ds.fault_log.update();
        }

        if ds.wrist_ctrl_status_rpt.done && !goal_reported {
            if let Some(g) = ds.wrist_ctrl_status_rpt.goal {
                info!(
                    "Goal {} complete after {:.02} s",
                    ds.wrist_ctrl.catalog().get(g).name,
                    ds.time_s
                );
            }
        }
        goal_reported = ds.wrist_ctrl_status_rpt.done;

        // ---- DEMANDS OUTPUT ----

        sim_client
            .send_demands(&ds.wrist_ctrl_output)
            .wrap_err("Could not send demands to the simulation")?;

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.wrist_ctrl.write() {
            warn!("Could not write WristCtrl archive: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;
        let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.cycle_overrun(false, exec_params.max_consec_cycle_overruns);
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                ds.cycle_overrun(true, exec_params.max_consec_cycle_overruns);
            }
        }

        ds.num_cycles += 1;

        if let Some(n) = cli.cycles {
            if ds.num_cycles >= n {
                info!("Cycle limit of {} reached, stopping", n);
                break;
            }
        }
    }

    // ---- SHUTDOWN ----

    info!(
        "End of execution, {} fault(s) raised over {} cycles",
        ds.fault_log.num_faults(),
        ds.num_cycles
    );
    if ds.fault_log.num_active() > 0 {
        warn!("{} fault(s) still active", ds.fault_log.num_active());
    }
    if ds.fault_log.is_active("wrist_ctrl") {
        warn!("WristCtrl ended with an active sensor fault");
    }

    Ok(())
}
