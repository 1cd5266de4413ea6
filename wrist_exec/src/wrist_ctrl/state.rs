//! Implementations for the WristCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::{Mode, Params, SensFault, WristCtrlError};
use crate::{
    envelope::{EnvelopeLimiter, StopFlags},
    profile::{Measured, ProfileState, Synchroniser},
    route::{self, RouteState},
    setpoints::{CatalogError, SetpointCatalog, SetpointId},
};
use comms_if::{
    eqpt::wristevator::{AxisDem, WristevatorDems, WristevatorSensData},
    tc::wristevator::WristevatorCmd,
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::approach,
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wristevator coordinator state
#[derive(Default)]
pub struct WristCtrl {
    params: Params,
    initialised: bool,

    catalog: SetpointCatalog,
    limiter: EnvelopeLimiter,
    sync: Synchroniser,

    /// Executing mode
    mode: Mode,

    /// The ultimate goal, if there is one
    goal: Option<SetpointId>,

    /// The most recently reached setpoint
    previous: SetpointId,

    /// The currently targeted setpoint
    next: SetpointId,

    /// True if control was last taken back from manual mode
    is_manual: bool,

    /// True if the last leg converged on `next`
    finished_leg: bool,

    /// True if a leg towards `next` is being executed
    leg_active: bool,

    /// Operator rates after clamping
    manual_rates: [f64; 2],
    manual_rates_clamped: bool,

    /// Position last demanded of each axis
    dem_pos: Option<[f64; 2]>,

    /// Rate last demanded of each axis
    dem_rate: [f64; 2],

    /// Last valid measurement, with the homing offset applied
    measured: Option<Measured>,

    /// Offset added to the raw height, set when the home switch closes.
    ///
    /// Units: meters
    height_offset_m: f64,
    home_switch: bool,

    time_s: f64,
    output: WristevatorDems,
    report: StatusReport,
    arch_report: Archiver,
}

/// Input data to WristCtrl.
#[derive(Debug, Default, Clone)]
pub struct InputData {
    /// Command to execute this cycle, if any.
    pub cmd: Option<WristevatorCmd>,

    /// Latest sensor data, or `None` if none was received.
    pub sens: Option<WristevatorSensData>,

    /// Current time, in the same time base as the sensor timestamps.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Time since the last cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// Status report for WristCtrl processing.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StatusReport {
    pub mode: Mode,
    pub goal: Option<SetpointId>,
    pub previous: SetpointId,
    pub next: SetpointId,

    /// True if the goal has been reached.
    pub done: bool,

    /// Envelope flags from this cycle.
    pub stop_flags: StopFlags,

    /// True if the envelope changed the demands this cycle.
    pub limited: bool,

    /// True if the operator rates exceeded the axis limits.
    pub manual_rate_clamped: bool,

    /// True if a command was rejected this cycle.
    pub cmd_rejected: bool,

    /// Sensor fault this cycle, if any.
    pub fault: Option<SensFault>,
}

/// Flat archive record.
#[derive(Serialize)]
struct ArchRecord {
    time_s: f64,
    mode: Mode,
    goal: String,
    previous: String,
    next: String,
    done: bool,
    limited: bool,
    manual_rate_clamped: bool,
    cmd_rejected: bool,
    elevator_stop_down: bool,
    elevator_stop_up: bool,
    wrist_stop_lower: bool,
    wrist_stop_upper: bool,
    fault: String,
    height_m: Option<f64>,
    angle_rad: Option<f64>,
    height_rate_ms: Option<f64>,
    angle_rate_rads: Option<f64>,
    dem_height_rate_ms: f64,
    dem_angle_rate_rads: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for WristCtrl {
    type InitData = &'static str;
    type InitError = WristCtrlError;

    type InputData = InputData;
    type OutputData = WristevatorDems;
    type StatusReport = StatusReport;
    type ProcError = WristCtrlError;

    /// Initialise the WristCtrl module.
    ///
    /// Expected init data is the path to the parameter file.
    fn init(
        &mut self,
        init_data: Self::InitData,
        session: &Session,
    ) -> Result<(), Self::InitError> {
        let params = params::load(init_data).map_err(WristCtrlError::ParamLoadError)?;

        *self = Self::new(params)?;

        self.arch_report = Archiver::from_path(session, "wrist_ctrl/status_report.csv")
            .map_err(WristCtrlError::ArchiveError)?;

        Ok(())
    }

    /// Perform cyclic processing of WristCtrl.
    ///
    /// Problems with the inputs never cause an error, instead they are flagged in the status
    /// report and the module falls back to `Idle`.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !self.initialised {
            return Err(WristCtrlError::NotInitialised);
        }

        self.report = StatusReport::default();
        self.time_s = input_data.time_s;

        // ---- COMMANDS ----

        if let Some(ref cmd) = input_data.cmd {
            if let Err(e) = self.exec_cmd(cmd) {
                warn!("WristCtrl rejected command {:?}: {}", cmd, e);
                self.report.cmd_rejected = true;
            }
        }

        // ---- SENSOR VALIDATION ----

        let measured = match self.check_sens(input_data) {
            Ok(m) => m,
            Err(fault) => {
                if self.mode != Mode::Idle {
                    warn!("Sensor fault, WristCtrl falling back to Idle: {}", fault);
                    self.release();
                }
                self.report.fault = Some(fault);

                let dems = self.hold_dems(None);
                self.end_cycle(dems, None);
                return Ok((self.output, self.report));
            }
        };
        self.measured = Some(measured);

        // ---- MODE EXECUTION ----

        let dt_s = input_data.dt_s;

        let dems = match self.mode {
            Mode::Idle => self.mode_idle(&measured),
            Mode::Manual => self.mode_manual(),
            Mode::Decelerate => match self.mode_decelerate(&measured, dt_s) {
                Some(d) => d,
                None => {
                    self.set_mode(Mode::GoalTracking);
                    self.mode_goal_tracking(&measured, dt_s)
                }
            },
            Mode::GoalTracking => self.mode_goal_tracking(&measured, dt_s),
        };

        // ---- ENVELOPE ----

        let dems = self.apply_envelope(dems, &measured, dt_s);

        self.end_cycle(dems, Some(&measured));

        trace!(
            "WristCtrl output: elev {:?}, wrist {:?}",
            self.output.elevator,
            self.output.wrist
        );

        Ok((self.output, self.report))
    }

    /// Stop all motion, holding the last demanded position.
    fn make_safe(&mut self) {
        self.manual_rates = [0.0, 0.0];
        self.release();
    }
}

impl WristCtrl {
    /// Create a new coordinator from its parameters.
    ///
    /// The catalog and envelope are validated here. The mechanism is assumed to be at rest at the
    /// `start_setpoint`.
    pub fn new(params: Params) -> Result<Self, WristCtrlError> {
        for &(name, axis) in [("elevator", &params.elevator), ("wrist", &params.wrist)].iter() {
            if let Some(reason) = axis.check() {
                return Err(WristCtrlError::InvalidAxisParams(name, reason));
            }
        }
        if !(params.angle_scale_m_per_rad > 0.0) || !params.angle_scale_m_per_rad.is_finite() {
            return Err(WristCtrlError::InvalidParams(
                "angle_scale_m_per_rad must be positive",
            ));
        }
        if !(params.max_sens_age_s > 0.0) {
            return Err(WristCtrlError::InvalidParams("max_sens_age_s must be positive"));
        }
        if params
            .sens_range_margin
            .iter()
            .any(|m| !m.is_finite() || *m < 0.0)
        {
            return Err(WristCtrlError::InvalidParams(
                "sens_range_margin must be finite and not negative",
            ));
        }

        let catalog = SetpointCatalog::new(&params.catalog)?;
        let limiter = EnvelopeLimiter::new(
            &params.envelope,
            [params.elevator.min_pos, params.elevator.max_pos],
            [params.wrist.min_pos, params.wrist.max_pos],
        )?;
        let start = catalog
            .lookup(&params.start_setpoint)
            .ok_or_else(|| CatalogError::UnknownSetpoint(params.start_setpoint.clone()))?;

        let sync = Synchroniser::new(
            [params.elevator.limits(), params.wrist.limits()],
            [params.elevator.tolerance(), params.wrist.tolerance()],
        );

        info!("WristCtrl initialised, resting at {}", params.start_setpoint);

        Ok(Self {
            params,
            initialised: true,
            catalog,
            limiter,
            sync,
            previous: start,
            next: start,
            finished_leg: true,
            ..Default::default()
        })
    }

    // ---- OPERATOR INTERFACE ----

    /// Begin moving towards the named goal.
    ///
    /// Any motion in progress is first brought to rest. Requesting the goal which is already being
    /// tracked has no effect.
    pub fn set_goal(&mut self, name: &str) -> Result<(), WristCtrlError> {
        let id = self.catalog.lookup_goal(name)?;

        if self.goal == Some(id) && matches!(self.mode, Mode::Decelerate | Mode::GoalTracking) {
            debug!("Goal {} is already active", name);
            return Ok(());
        }

        info!("New goal: {}", name);

        self.goal = Some(id);
        self.leg_active = false;
        self.sync.reset();
        self.set_mode(Mode::Decelerate);

        Ok(())
    }

    /// Drive each axis at the given rate, clamped to the axis limits.
    pub fn set_manual_velocities(
        &mut self,
        height_rate_ms: f64,
        angle_rate_rads: f64,
    ) -> Result<(), WristCtrlError> {
        if !height_rate_ms.is_finite() || !angle_rate_rads.is_finite() {
            return Err(WristCtrlError::InvalidManualRates(
                height_rate_ms,
                angle_rate_rads,
            ));
        }

        let max_h = self.params.elevator.max_rate;
        let max_a = self.params.wrist.max_rate;
        let rates = [
            height_rate_ms.max(-max_h).min(max_h),
            angle_rate_rads.max(-max_a).min(max_a),
        ];

        self.manual_rates_clamped = rates[0] != height_rate_ms || rates[1] != angle_rate_rads;
        self.manual_rates = rates;
        self.enter_manual();

        Ok(())
    }

    /// Switch to manual mode with both rates zeroed.
    pub fn switch_to_manual(&mut self) {
        self.manual_rates = [0.0, 0.0];
        self.manual_rates_clamped = false;
        self.enter_manual();
    }

    /// Drop the current command and hold the last demanded position.
    pub fn release(&mut self) {
        if let Some(g) = self.goal {
            debug!("Goal {} dropped", self.catalog.get(g).name);
        }

        self.goal = None;
        self.leg_active = false;
        self.sync.reset();
        self.set_mode(Mode::Idle);
    }

    // ---- TELEMETRY ----

    /// True if control was last handed over from manual mode and no setpoint has been reached
    /// since.
    pub fn is_manual(&self) -> bool {
        self.is_manual
    }

    /// True once the goal has been reached, which requires the previous and next setpoints to
    /// both be the goal.
    pub fn is_goal_complete(&self) -> bool {
        match self.goal {
            Some(g) => {
                self.mode == Mode::GoalTracking
                    && self.finished_leg
                    && self.previous == g
                    && self.next == g
            }
            None => false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn goal(&self) -> Option<SetpointId> {
        self.goal
    }

    pub fn previous(&self) -> SetpointId {
        self.previous
    }

    pub fn next(&self) -> SetpointId {
        self.next
    }

    pub fn catalog(&self) -> &SetpointCatalog {
        &self.catalog
    }

    pub fn envelope(&self) -> &EnvelopeLimiter {
        &self.limiter
    }

    /// Envelope flags from the last cycle.
    pub fn stop_flags(&self) -> StopFlags {
        self.report.stop_flags
    }

    /// Units: meters
    pub fn height_m(&self) -> Option<f64> {
        self.measured.map(|m| m.pos[0])
    }

    /// Units: radians
    pub fn angle_rad(&self) -> Option<f64> {
        self.measured.map(|m| m.pos[1])
    }

    /// Units: meters/second
    pub fn height_rate_ms(&self) -> Option<f64> {
        self.measured.map(|m| m.rate[0])
    }

    /// Units: radians/second
    pub fn angle_rate_rads(&self) -> Option<f64> {
        self.measured.map(|m| m.rate[1])
    }

    // ---- MODES ----

    /// Mode idle.
    ///
    /// Holds the last demanded position, or the measured one if nothing has been demanded yet.
    fn mode_idle(&mut self, measured: &Measured) -> WristevatorDems {
        self.hold_dems(Some(measured))
    }

    /// Mode manual.
    ///
    /// Operator rates are passed straight on, the envelope is applied afterwards.
    fn mode_manual(&mut self) -> WristevatorDems {
        WristevatorDems {
            elevator: AxisDem::Rate(self.manual_rates[0]),
            wrist: AxisDem::Rate(self.manual_rates[1]),
        }
    }

    /// Mode decelerate.
    ///
    /// Ramps the demanded rates down to zero at the maximum acceleration of each axis. An axis
    /// whose demand is already at rest but which is measured to still be moving is ramped down
    /// from its measured state. Returns `None` once both axes are demanded and measured at rest.
    fn mode_decelerate(&mut self, measured: &Measured, dt_s: f64) -> Option<WristevatorDems> {
        let rate_tol = [
            self.params.elevator.rate_tolerance,
            self.params.wrist.rate_tolerance,
        ];
        let max_accel = [
            self.params.elevator.max_accel,
            self.params.wrist.max_accel,
        ];

        let at_rest = |i: usize| self.dem_rate[i] == 0.0 && measured.rate[i].abs() <= rate_tol[i];
        if at_rest(0) && at_rest(1) {
            return None;
        }

        let dem_pos = self.dem_pos.unwrap_or(measured.pos);
        let mut dems = [AxisDem::default(); 2];

        for i in 0..2 {
            let (start_pos, start_rate) = if self.dem_rate[i] == 0.0 && !at_rest(i) {
                (measured.pos[i], measured.rate[i])
            } else {
                (dem_pos[i], self.dem_rate[i])
            };

            let rate = approach(start_rate, 0.0, max_accel[i] * dt_s);

            dems[i] = AxisDem::ProfilePoint {
                pos: start_pos + 0.5 * (start_rate + rate) * dt_s,
                rate,
                accel: (rate - start_rate) / dt_s,
            };
        }

        Some(WristevatorDems {
            elevator: dems[0],
            wrist: dems[1],
        })
    }

    /// Mode goal tracking.
    ///
    /// Selects a leg when none is active, steps the synchronised profiles along it, and moves on
    /// once it converges.
    fn mode_goal_tracking(&mut self, measured: &Measured, dt_s: f64) -> WristevatorDems {
        let goal = match self.goal {
            Some(g) => g,
            None => {
                self.set_mode(Mode::Idle);
                return self.hold_dems(Some(measured));
            }
        };

        if self.is_goal_complete() {
            let p = self.catalog.get(goal).position();
            return WristevatorDems {
                elevator: AxisDem::hold(p[0]),
                wrist: AxisDem::hold(p[1]),
            };
        }

        // ---- LEG SELECTION ----

        if !self.leg_active {
            let state = RouteState {
                previous: self.previous,
                next: self.next,
                is_manual: self.is_manual,
                leg_finished: self.finished_leg,
            };

            let next = route::select_next(
                &self.catalog,
                goal,
                &state,
                measured.pos,
                self.params.angle_scale_m_per_rad,
            );

            debug!(
                "Leg selected towards {}: {} -> {}{}",
                self.catalog.get(goal).name,
                self.catalog.get(self.previous).name,
                self.catalog.get(next).name,
                if state.is_manual { " (from manual)" } else { "" }
            );

            self.next = next;
            self.finished_leg = false;
            self.leg_active = true;
            self.sync.reset();
        }

        // ---- PROFILE EXECUTION ----

        let target = self.catalog.get(self.next).position();
        let out = self.sync.advance(target, measured, dt_s);

        if out.done {
            self.previous = self.next;
            self.finished_leg = true;
            self.is_manual = false;
            self.leg_active = false;

            if self.next == goal {
                info!("Goal {} reached", self.catalog.get(goal).name);
            } else {
                debug!("Reached intermediate {}", self.catalog.get(self.next).name);
            }
        }

        WristevatorDems {
            elevator: profile_dem(&out.elevator),
            wrist: profile_dem(&out.wrist),
        }
    }

    // ---- HELPERS ----

    fn exec_cmd(&mut self, cmd: &WristevatorCmd) -> Result<(), WristCtrlError> {
        match cmd {
            WristevatorCmd::Goal { name } => self.set_goal(name),
            WristevatorCmd::Speeds {
                height_rate_ms,
                angle_rate_rads,
            } => self.set_manual_velocities(*height_rate_ms, *angle_rate_rads),
            WristevatorCmd::Manual => {
                self.switch_to_manual();
                Ok(())
            }
            WristevatorCmd::Release => {
                self.release();
                Ok(())
            }
        }
    }

    fn enter_manual(&mut self) {
        self.goal = None;
        self.is_manual = true;
        self.finished_leg = false;
        self.leg_active = false;
        self.sync.reset();
        self.set_mode(Mode::Manual);
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            info!("WristCtrl mode change: {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    /// Validate the sensor data, applying the homing offset.
    fn check_sens(&mut self, input: &InputData) -> Result<Measured, SensFault> {
        if !input.dt_s.is_finite() || input.dt_s <= 0.0 {
            return Err(SensFault::InvalidCycleTime(input.dt_s));
        }

        let sens = input.sens.ok_or(SensFault::Missing)?;

        if !sens.is_finite() {
            return Err(SensFault::NonFinite);
        }

        let age_s = input.time_s - sens.timestamp_s;
        if age_s > self.params.max_sens_age_s {
            return Err(SensFault::Stale { age_s });
        }

        // Re-zero the height on the rising edge of the home switch
        if sens.home_switch && !self.home_switch {
            let offset_m = self.params.elevator.min_pos - sens.height_m;

            // Keep the last demand at the same physical height
            if let Some(ref mut p) = self.dem_pos {
                p[0] += offset_m - self.height_offset_m;
            }
            self.height_offset_m = offset_m;
            info!(
                "Home switch closed, height offset set to {:.4} m",
                self.height_offset_m
            );
        }
        self.home_switch = sens.home_switch;

        let height_m = sens.height_m + self.height_offset_m;

        let (e, w) = (&self.params.elevator, &self.params.wrist);
        let [h_margin, a_margin] = self.params.sens_range_margin;

        if height_m < e.min_pos - h_margin || height_m > e.max_pos + h_margin {
            return Err(SensFault::HeightOutOfRange(height_m));
        }
        if sens.angle_rad < w.min_pos - a_margin || sens.angle_rad > w.max_pos + a_margin {
            return Err(SensFault::AngleOutOfRange(sens.angle_rad));
        }

        Ok(Measured {
            pos: [height_m, sens.angle_rad],
            rate: [sens.height_rate_ms, sens.angle_rate_rads],
        })
    }

    /// Demands holding the last demanded position.
    fn hold_dems(&self, measured: Option<&Measured>) -> WristevatorDems {
        match self.dem_pos.or_else(|| measured.map(|m| m.pos)) {
            Some(p) => WristevatorDems {
                elevator: AxisDem::hold(p[0]),
                wrist: AxisDem::hold(p[1]),
            },
            None => WristevatorDems::default(),
        }
    }

    /// Apply the envelope limiter to the demands.
    ///
    /// An inhibited rate demand is zeroed, an inhibited profile demand holds the measured position
    /// of that axis. The leg itself carries on.
    fn apply_envelope(
        &mut self,
        dems: WristevatorDems,
        measured: &Measured,
        dt_s: f64,
    ) -> WristevatorDems {
        let limited = self.limiter.limit(
            measured.pos[0],
            measured.pos[1],
            dems.elevator.rate(),
            dems.wrist.rate(),
            self.home_switch,
            dt_s,
        );

        self.report.stop_flags = limited.flags;

        if !limited.limited {
            return dems;
        }

        self.report.limited = true;

        WristevatorDems {
            elevator: limit_dem(dems.elevator, limited.height_rate_ms, measured.pos[0]),
            wrist: limit_dem(dems.wrist, limited.angle_rate_rads, measured.pos[1]),
        }
    }

    /// Record the demands and fill in the status report.
    fn end_cycle(&mut self, dems: WristevatorDems, measured: Option<&Measured>) {
        let measured_pos = measured.map(|m| m.pos);

        self.dem_rate = [dems.elevator.rate(), dems.wrist.rate()];

        let elev_pos = dems.elevator.pos().or_else(|| measured_pos.map(|p| p[0]));
        let wrist_pos = dems.wrist.pos().or_else(|| measured_pos.map(|p| p[1]));
        if let (Some(e), Some(w)) = (elev_pos, wrist_pos) {
            self.dem_pos = Some([e, w]);
        }

        // Actuators work in the raw frame, before homing
        self.output = WristevatorDems {
            elevator: offset_dem(dems.elevator, -self.height_offset_m),
            wrist: dems.wrist,
        };

        self.report.mode = self.mode;
        self.report.goal = self.goal;
        self.report.previous = self.previous;
        self.report.next = self.next;
        self.report.done = self.is_goal_complete();
        self.report.manual_rate_clamped = self.mode == Mode::Manual && self.manual_rates_clamped;
    }
}

impl Archived for WristCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let r = &self.report;
        let name = |id: SetpointId| self.catalog.get(id).name.clone();

        let record = ArchRecord {
            time_s: self.time_s,
            mode: r.mode,
            goal: r.goal.map(name).unwrap_or_default(),
            previous: name(r.previous),
            next: name(r.next),
            done: r.done,
            limited: r.limited,
            manual_rate_clamped: r.manual_rate_clamped,
            cmd_rejected: r.cmd_rejected,
            elevator_stop_down: r.stop_flags.elevator_stop_down,
            elevator_stop_up: r.stop_flags.elevator_stop_up,
            wrist_stop_lower: r.stop_flags.wrist_stop_lower,
            wrist_stop_upper: r.stop_flags.wrist_stop_upper,
            fault: r.fault.map(|f| f.to_string()).unwrap_or_default(),
            height_m: self.height_m(),
            angle_rad: self.angle_rad(),
            height_rate_ms: self.height_rate_ms(),
            angle_rate_rads: self.angle_rate_rads(),
            dem_height_rate_ms: self.output.elevator.rate(),
            dem_angle_rate_rads: self.output.wrist.rate(),
        };

        self.arch_report.serialise(record)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn profile_dem(state: &ProfileState) -> AxisDem {
    AxisDem::ProfilePoint {
        pos: state.pos,
        rate: state.rate,
        accel: state.accel,
    }
}

fn offset_dem(dem: AxisDem, offset: f64) -> AxisDem {
    match dem {
        AxisDem::ProfilePoint { pos, rate, accel } => AxisDem::ProfilePoint {
            pos: pos + offset,
            rate,
            accel,
        },
        AxisDem::Rate(r) => AxisDem::Rate(r),
    }
}

fn limit_dem(dem: AxisDem, limited_rate: f64, measured_pos: f64) -> AxisDem {
    if dem.rate() == limited_rate {
        return dem;
    }

    match dem {
        AxisDem::Rate(_) => AxisDem::Rate(limited_rate),
        AxisDem::ProfilePoint { .. } => AxisDem::hold(measured_pos),
    }
}
