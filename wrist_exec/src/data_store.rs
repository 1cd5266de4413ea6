//! # Data Store

use comms_if::eqpt::wristevator::{WristevatorDems, WristevatorSensData};
use log::{info, warn};

use crate::{fault_log::FaultLog, wrist_ctrl};
use util::module::State;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the mechanism has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    MakeSafeTc,
    SensDataUnavailable,
    CycleOverruns,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session time at the start of this cycle
    pub time_s: f64,

    // Safe mode variables
    /// Determines if the mechanism is in safe mode.
    pub safe: bool,

    /// Gives the reason for the mechanism being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // Sensors
    pub wrist_sens: Option<WristevatorSensData>,

    // WristCtrl
    pub wrist_ctrl: wrist_ctrl::WristCtrl,
    pub wrist_ctrl_input: wrist_ctrl::InputData,
    pub wrist_ctrl_output: WristevatorDems,
    pub wrist_ctrl_status_rpt: wrist_ctrl::StatusReport,

    // Monitoring
    pub fault_log: FaultLog,

    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the mechanism into safe mode with the given cause.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            self.wrist_ctrl.make_safe();
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// To remove safe mode the provided cause must match the initial reason for safe mode being
    /// enabled. If safe mode was not enabled `Ok(())` is returned.
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) if root_cause != cause => Err(()),
            _ => {
                self.safe = false;
                self.safe_cause = None;
                info!("Make unsafe requested, root cause match, safe mode disabled");
                Ok(())
            }
        }
    }

    /// Record whether the last cycle overran.
    ///
    /// Safe mode is entered once more than `limit` consecutive cycles have overrun, and left again
    /// on the first cycle which does not.
    pub fn cycle_overrun(&mut self, overran: bool, limit: u64) {
        if overran {
            self.num_consec_cycle_overruns += 1;

            if self.num_consec_cycle_overruns > limit {
                self.make_safe(SafeModeCause::CycleOverruns);
            }
        } else {
            self.num_consec_cycle_overruns = 0;
            self.make_unsafe(SafeModeCause::CycleOverruns).ok();
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64, time_s: f64) {
        let cycles_per_s = (cycle_frequency_hz.round() as u128).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_s == 0;

        self.wrist_sens = None;
        self.wrist_ctrl_input = wrist_ctrl::InputData::default();
        self.wrist_ctrl_output = WristevatorDems::default();
        self.wrist_ctrl_status_rpt = wrist_ctrl::StatusReport::default();

        self.time_s = time_s;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_safe_mode() {
        let mut ds = DataStore::default();

        ds.make_safe(SafeModeCause::SensDataUnavailable);
        assert!(ds.safe);

        // A later cause does not replace the root cause
        ds.make_safe(SafeModeCause::MakeSafeTc);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::SensDataUnavailable));

        assert!(ds.make_unsafe(SafeModeCause::MakeSafeTc).is_err());
        assert!(ds.safe);
        assert!(ds.make_unsafe(SafeModeCause::SensDataUnavailable).is_ok());
        assert!(!ds.safe);
        assert!(ds.make_unsafe(SafeModeCause::MakeSafeTc).is_ok());
    }

    #[test]
    fn test_cycle_overruns() {
        let mut ds = DataStore::default();

        for _ in 0..3 {
            ds.cycle_overrun(true, 3);
        }
        assert!(!ds.safe);

        ds.cycle_overrun(true, 3);
        assert!(ds.safe);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::CycleOverruns));

        ds.cycle_overrun(false, 3);
        assert_eq!(ds.num_consec_cycle_overruns, 0);
        assert!(!ds.safe);

        // Overruns do not clear another root cause
        ds.make_safe(SafeModeCause::MakeSafeTc);
        ds.cycle_overrun(false, 3);
        assert!(ds.safe);
    }

    #[test]
    fn test_cycle_start() {
        let mut ds = DataStore::default();

        let mut num_1_hz = 0;
        for _ in 0..150 {
            ds.cycle_start(50.0, 0.0);
            if ds.is_1_hz_cycle {
                num_1_hz += 1;
            }
            ds.num_cycles += 1;
        }

        assert_eq!(num_1_hz, 3);
        assert!(ds.wrist_ctrl_input.cmd.is_none());
    }
}
