//! Closed loop tests of WristCtrl against the simulated mechanism

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::*;
use crate::{
    setpoints::SetpointId,
    sim::{SimParams, SimWristevator},
};
use comms_if::{
    eqpt::wristevator::{AxisDem, WristevatorDems, WristevatorSensData},
    tc::wristevator::WristevatorCmd,
};
use util::module::State;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Control cycle period
const DT_S: f64 = 0.02;

/// Number of simulation steps per control cycle
const SIM_SUBSTEPS: usize = 4;

/// Upper bound on the number of cycles any scenario should need
const MAX_CYCLES: usize = 1000;

// ---------------------------------------------------------------------------
// TEST RIG
// ---------------------------------------------------------------------------

struct Rig {
    ctrl: WristCtrl,
    sim: SimWristevator,
    time_s: f64,
    last_dems: WristevatorDems,
}

impl Rig {
    fn new() -> Self {
        let params: Params =
            util::params::from_str(include_str!("../../../params/wrist_ctrl.toml")).unwrap();
        let sim_params: SimParams =
            util::params::from_str(include_str!("../../../params/sim.toml")).unwrap();

        Self {
            ctrl: WristCtrl::new(params).unwrap(),
            sim: SimWristevator::new(&sim_params).unwrap(),
            time_s: 0.0,
            last_dems: WristevatorDems::default(),
        }
    }

    fn id(&self, name: &str) -> SetpointId {
        self.ctrl.catalog().lookup(name).unwrap()
    }

    /// Run one cycle with fresh sensor data.
    fn cycle(&mut self, cmd: Option<WristevatorCmd>) -> StatusReport {
        let sens = self.sim.sens_data(self.time_s);
        self.cycle_with(cmd, Some(sens))
    }

    /// Run one cycle with the given sensor data.
    fn cycle_with(
        &mut self,
        cmd: Option<WristevatorCmd>,
        sens: Option<WristevatorSensData>,
    ) -> StatusReport {
        let input = InputData {
            cmd,
            sens,
            time_s: self.time_s,
            dt_s: DT_S,
        };

        let (dems, report) = self.ctrl.proc(&input).unwrap();

        for _ in 0..SIM_SUBSTEPS {
            self.sim.step(DT_S / SIM_SUBSTEPS as f64, &dems);
        }
        self.time_s += DT_S;
        self.last_dems = dems;

        report
    }

    /// Cycle until the goal is reached, returning the sequence of setpoints targeted on the way.
    fn run_to_goal(&mut self) -> Vec<SetpointId> {
        let mut seq = Vec::new();
        let mut last_next = self.ctrl.next();

        for _ in 0..MAX_CYCLES {
            let report = self.cycle(None);

            if report.next != last_next {
                seq.push(report.next);
                last_next = report.next;
            }

            if report.done {
                return seq;
            }
        }

        panic!("Goal was not reached within {} cycles", MAX_CYCLES);
    }

    fn goal(name: &str) -> Option<WristevatorCmd> {
        Some(WristevatorCmd::Goal {
            name: name.to_string(),
        })
    }

    fn measured(&self) -> [f64; 2] {
        [self.ctrl.height_m().unwrap(), self.ctrl.angle_rad().unwrap()]
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[test]
fn test_home_to_l4() {
    let mut rig = Rig::new();
    let (clear, l4) = (rig.id("CLEAR"), rig.id("L4"));

    let report = rig.cycle(Rig::goal("L4"));
    assert_eq!(report.mode, Mode::GoalTracking);
    assert_eq!(report.next, clear);
    assert!(!report.done);

    let mut seq = vec![report.next];
    seq.extend(rig.run_to_goal());
    assert_eq!(seq, vec![clear, l4]);

    // Done is only reported once both axes have settled on the goal
    let pos = rig.measured();
    assert!((pos[0] - 1.6).abs() <= 0.01);
    assert!((pos[1] - 1.2).abs() <= 0.02);
    assert!(rig.ctrl.height_rate_ms().unwrap().abs() <= 0.05);
    assert!(rig.ctrl.angle_rate_rads().unwrap().abs() <= 0.1);
    assert!(rig.ctrl.is_goal_complete());
    assert_eq!(rig.ctrl.previous(), l4);
    assert_eq!(rig.ctrl.next(), l4);
}

#[test]
fn test_done_is_held() {
    let mut rig = Rig::new();
    rig.cycle(Rig::goal("L4"));
    rig.run_to_goal();

    for _ in 0..50 {
        let report = rig.cycle(None);
        assert!(report.done);
        assert_eq!(report.mode, Mode::GoalTracking);
        assert_eq!(rig.last_dems.elevator, AxisDem::hold(1.6));
        assert_eq!(rig.last_dems.wrist, AxisDem::hold(1.2));
    }
}

#[test]
fn test_stays_in_envelope() {
    let mut rig = Rig::new();

    for goal in ["L4", "LOWER_ALGAE", "HUMAN", "L3", "HOME"].iter() {
        rig.cycle(Rig::goal(goal));

        loop {
            let report = rig.cycle(None);

            let pos = rig.measured();
            let next_pos = [
                pos[0] + rig.last_dems.elevator.rate() * DT_S,
                pos[1] + rig.last_dems.wrist.rate() * DT_S,
            ];
            assert!(
                rig.ctrl.envelope().contains(pos[0], pos[1]),
                "Left the envelope at {:?} on the way to {}",
                pos,
                goal
            );
            assert!(rig.ctrl.envelope().contains(next_pos[0], next_pos[1]));

            if report.done {
                break;
            }
            assert!(rig.time_s < 60.0, "{} not reached", goal);
        }
    }

    let pos = rig.measured();
    assert!(pos[0].abs() <= 0.01);
    assert!(pos[1].abs() <= 0.02);
}

#[test]
fn test_regoal_mid_transit() {
    let mut rig = Rig::new();
    let (clear, lower_algae) = (rig.id("CLEAR"), rig.id("LOWER_ALGAE"));

    rig.cycle(Rig::goal("L4"));
    for _ in 0..20 {
        rig.cycle(None);
    }
    assert_eq!(rig.ctrl.next(), clear);
    assert!(rig.ctrl.height_m().unwrap() < 0.5);

    // Interrupted legs always go via the nearest intermediate
    let report = rig.cycle(Rig::goal("LOWER_ALGAE"));
    assert_eq!(report.mode, Mode::Decelerate);

    let mut saw_clear_leg = false;
    let mut last_next = report.next;
    let mut seq = Vec::new();
    for _ in 0..MAX_CYCLES {
        let report = rig.cycle(None);
        if report.mode == Mode::GoalTracking && report.next == clear {
            saw_clear_leg = true;
        }
        if report.next != last_next {
            seq.push(report.next);
            last_next = report.next;
        }
        if report.done {
            break;
        }
    }

    assert!(saw_clear_leg);
    assert_eq!(seq, vec![lower_algae]);
    assert!(rig.ctrl.is_goal_complete());
    assert_eq!(rig.ctrl.goal(), Some(lower_algae));
}

#[test]
fn test_manual() {
    let mut rig = Rig::new();
    let (clear, l4) = (rig.id("CLEAR"), rig.id("L4"));

    // Rates beyond the axis limits are clamped
    let report = rig.cycle(Some(WristevatorCmd::Speeds {
        height_rate_ms: 10.0,
        angle_rate_rads: 0.0,
    }));
    assert_eq!(report.mode, Mode::Manual);
    assert!(report.manual_rate_clamped);
    assert_eq!(rig.last_dems.elevator, AxisDem::Rate(1.0));
    assert!(rig.ctrl.is_manual());
    assert_eq!(rig.ctrl.goal(), None);

    let report = rig.cycle(Some(WristevatorCmd::Speeds {
        height_rate_ms: 0.5,
        angle_rate_rads: 0.0,
    }));
    assert!(!report.manual_rate_clamped);

    for _ in 0..20 {
        rig.cycle(None);
    }
    let report = rig.cycle(Some(WristevatorCmd::Manual));
    assert_eq!(report.mode, Mode::Manual);
    assert_eq!(rig.last_dems.elevator, AxisDem::Rate(0.0));
    for _ in 0..20 {
        rig.cycle(None);
    }

    // Leaving manual re-enters the routing graph at the nearest intermediate
    let report = rig.cycle(Rig::goal("L4"));
    let mut seq = vec![report.next];
    seq.extend(rig.run_to_goal());
    assert_eq!(seq, vec![clear, l4]);
    assert!(!rig.ctrl.is_manual());
}

#[test]
fn test_manual_envelope_stop() {
    let mut rig = Rig::new();

    rig.cycle(Some(WristevatorCmd::Speeds {
        height_rate_ms: 0.0,
        angle_rate_rads: 1.0,
    }));

    let mut report = StatusReport::default();
    for _ in 0..100 {
        report = rig.cycle(None);
    }

    // At the bottom of the travel the wrist is stopped at the upper limit
    let angle = rig.ctrl.angle_rad().unwrap();
    assert!(angle > 0.55 && angle < 0.71, "angle: {}", angle);
    assert!(report.limited);
    assert!(report.stop_flags.wrist_stop_upper);
    assert!(!report.stop_flags.wrist_stop_lower);
    assert_eq!(rig.last_dems.wrist, AxisDem::Rate(0.0));
    assert_eq!(report.mode, Mode::Manual);

    // Motion away from the limit is allowed
    let report = rig.cycle(Some(WristevatorCmd::Speeds {
        height_rate_ms: 0.0,
        angle_rate_rads: -1.0,
    }));
    assert_eq!(rig.last_dems.wrist, AxisDem::Rate(-1.0));
    assert!(!report.stop_flags.wrist_stop_upper);
}

#[test]
fn test_sens_faults() {
    let mut rig = Rig::new();

    // Missing
    rig.cycle(Rig::goal("L4"));
    rig.cycle(None);
    let report = rig.cycle_with(None, None);
    assert_eq!(report.mode, Mode::Idle);
    assert_eq!(report.fault, Some(SensFault::Missing));
    assert_eq!(rig.ctrl.goal(), None);
    assert_eq!(rig.last_dems.elevator.rate(), 0.0);
    assert_eq!(rig.last_dems.wrist.rate(), 0.0);

    // Stale
    rig.cycle(Rig::goal("L4"));
    let mut sens = rig.sim.sens_data(rig.time_s);
    sens.timestamp_s -= 1.0;
    let report = rig.cycle_with(None, Some(sens));
    assert_eq!(report.mode, Mode::Idle);
    assert!(matches!(report.fault, Some(SensFault::Stale { .. })));

    // Non-finite
    rig.cycle(Rig::goal("L4"));
    let mut sens = rig.sim.sens_data(rig.time_s);
    sens.angle_rad = std::f64::NAN;
    let report = rig.cycle_with(None, Some(sens));
    assert_eq!(report.fault, Some(SensFault::NonFinite));

    // Out of range
    let mut sens = rig.sim.sens_data(rig.time_s);
    sens.height_m = 3.0;
    sens.home_switch = false;
    let report = rig.cycle_with(None, Some(sens));
    assert_eq!(report.fault, Some(SensFault::HeightOutOfRange(3.0)));

    // Good data clears the fault
    let report = rig.cycle(None);
    assert_eq!(report.fault, None);
    assert_eq!(report.mode, Mode::Idle);
}

#[test]
fn test_rejected_commands() {
    let mut rig = Rig::new();

    let report = rig.cycle(Rig::goal("L9"));
    assert!(report.cmd_rejected);
    assert_eq!(report.mode, Mode::Idle);

    // Intermediates cannot be goals
    let report = rig.cycle(Rig::goal("CLEAR"));
    assert!(report.cmd_rejected);
    assert_eq!(report.mode, Mode::Idle);

    let report = rig.cycle(Some(WristevatorCmd::Speeds {
        height_rate_ms: std::f64::INFINITY,
        angle_rate_rads: 0.0,
    }));
    assert!(report.cmd_rejected);
    assert_eq!(report.mode, Mode::Idle);

    // A rejected goal leaves the active one alone
    rig.cycle(Rig::goal("L2"));
    let report = rig.cycle(Rig::goal("L9"));
    assert!(report.cmd_rejected);
    assert_eq!(report.mode, Mode::GoalTracking);
    assert_eq!(report.goal, Some(rig.id("L2")));
}

#[test]
fn test_repeated_goal() {
    let mut rig = Rig::new();

    rig.cycle(Rig::goal("L4"));
    for _ in 0..30 {
        rig.cycle(None);
    }
    let next = rig.ctrl.next();

    let report = rig.cycle(Rig::goal("L4"));
    assert_eq!(report.mode, Mode::GoalTracking);
    assert_eq!(report.next, next);
    assert!(!report.cmd_rejected);

    rig.run_to_goal();
    assert!(rig.ctrl.is_goal_complete());
}

#[test]
fn test_release() {
    let mut rig = Rig::new();

    rig.cycle(Rig::goal("L3"));
    for _ in 0..30 {
        rig.cycle(None);
    }

    let report = rig.cycle(Some(WristevatorCmd::Release));
    assert_eq!(report.mode, Mode::Idle);
    assert_eq!(report.goal, None);

    let held = rig.last_dems;
    assert_eq!(held.elevator.rate(), 0.0);
    assert_eq!(held.wrist.rate(), 0.0);

    for _ in 0..20 {
        rig.cycle(None);
    }
    assert_eq!(rig.last_dems, held);

    // make_safe also stops manual motion
    rig.cycle(Some(WristevatorCmd::Speeds {
        height_rate_ms: 0.3,
        angle_rate_rads: 0.0,
    }));
    rig.ctrl.make_safe();
    assert_eq!(rig.ctrl.mode(), Mode::Idle);
    rig.cycle(None);
    assert_eq!(rig.last_dems.elevator.rate(), 0.0);
}

/// Send a goal while the mechanism is still moving under a hold demand, and check goal tracking
/// only starts once both axes are measured at rest.
fn check_goal_from_moving(rig: &mut Rig) {
    assert!(rig.ctrl.height_rate_ms().unwrap().abs() > 0.05);

    let report = rig.cycle(Rig::goal("HOME"));
    assert_eq!(report.mode, Mode::Decelerate);
    assert!(rig.last_dems.elevator.rate() > 0.0);

    let mut report = report;
    for _ in 0..MAX_CYCLES {
        if report.mode != Mode::Decelerate {
            break;
        }
        report = rig.cycle(None);
    }

    assert_eq!(report.mode, Mode::GoalTracking);
    assert!(rig.ctrl.height_rate_ms().unwrap().abs() <= 0.05);
    assert!(rig.ctrl.angle_rate_rads().unwrap().abs() <= 0.1);

    rig.run_to_goal();
    assert!(rig.ctrl.is_goal_complete());
    assert_eq!(rig.ctrl.goal(), Some(rig.id("HOME")));
}

#[test]
fn test_goal_after_sens_fault() {
    let mut rig = Rig::new();

    rig.cycle(Rig::goal("L4"));
    for _ in 0..20 {
        rig.cycle(None);
    }

    let report = rig.cycle_with(None, None);
    assert_eq!(report.mode, Mode::Idle);

    check_goal_from_moving(&mut rig);
}

#[test]
fn test_goal_after_release() {
    let mut rig = Rig::new();

    rig.cycle(Rig::goal("L4"));
    for _ in 0..20 {
        rig.cycle(None);
    }

    let report = rig.cycle(Some(WristevatorCmd::Release));
    assert_eq!(report.mode, Mode::Idle);

    check_goal_from_moving(&mut rig);
}

#[test]
fn test_homing() {
    let mut rig = Rig::new();
    let sens = |height_m: f64, home_switch: bool, timestamp_s: f64| WristevatorSensData {
        height_m,
        angle_rad: 0.0,
        height_rate_ms: 0.0,
        angle_rate_rads: 0.0,
        home_switch,
        timestamp_s,
    };

    // Raw height reads 3 cm high with the switch open
    rig.cycle_with(None, Some(sens(0.03, false, rig.time_s)));
    assert!((rig.ctrl.height_m().unwrap() - 0.03).abs() < 1e-9);
    assert!((rig.last_dems.elevator.pos().unwrap() - 0.03).abs() < 1e-9);

    // Closing the switch re-zeroes the height, the held demand stays at the same raw height
    rig.cycle_with(None, Some(sens(0.03, true, rig.time_s)));
    assert!(rig.ctrl.height_m().unwrap().abs() < 1e-9);
    assert!((rig.last_dems.elevator.pos().unwrap() - 0.03).abs() < 1e-9);

    // Only the rising edge re-zeroes
    rig.cycle_with(None, Some(sens(0.035, true, rig.time_s)));
    assert!((rig.ctrl.height_m().unwrap() - 0.005).abs() < 1e-9);
    rig.cycle_with(None, Some(sens(0.05, false, rig.time_s)));
    assert!((rig.ctrl.height_m().unwrap() - 0.02).abs() < 1e-9);

    // Goal demands go out in the raw frame
    let report = rig.cycle_with(Rig::goal("L4"), Some(sens(0.05, false, rig.time_s)));
    assert_eq!(report.mode, Mode::GoalTracking);
    let pos = rig.last_dems.elevator.pos().unwrap();
    assert!(pos >= 0.05 && pos < 0.06, "pos: {}", pos);
}

#[test]
fn test_not_initialised() {
    let mut ctrl = WristCtrl::default();

    assert!(matches!(
        ctrl.proc(&InputData::default()),
        Err(WristCtrlError::NotInitialised)
    ));
}

#[test]
fn test_invalid_params() {
    let params: Params =
        util::params::from_str(include_str!("../../../params/wrist_ctrl.toml")).unwrap();

    let mut p = params.clone();
    p.start_setpoint = "NOWHERE".into();
    assert!(matches!(
        WristCtrl::new(p),
        Err(WristCtrlError::CatalogError(_))
    ));

    let mut p = params.clone();
    p.elevator.max_accel = 0.0;
    assert!(matches!(
        WristCtrl::new(p),
        Err(WristCtrlError::InvalidAxisParams("elevator", _))
    ));

    let mut p = params;
    p.envelope.upper_angle_limit = vec![[0.0, -1.0], [1.0, -1.0]];
    assert!(matches!(
        WristCtrl::new(p),
        Err(WristCtrlError::EnvelopeError(_))
    ));
}
