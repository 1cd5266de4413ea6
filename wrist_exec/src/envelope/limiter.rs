//! Implementation of the envelope limiter

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use super::{EnvelopeError, EnvelopeParams, StopFlags};
use util::maths::{interp_piecewise, is_monotonic};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Evaluates the safe envelope and clamps candidate axis rates against it.
#[derive(Debug, Default, Clone)]
pub struct EnvelopeLimiter {
    lower_knots: Vec<[f64; 2]>,
    upper_knots: Vec<[f64; 2]>,

    /// Soft limits of the elevator, `[min, max]`.
    ///
    /// Units: meters
    height_range_m: [f64; 2],

    /// Hard limits of the wrist, `[min, max]`.
    ///
    /// Units: radians
    angle_range_rad: [f64; 2],
}

/// Result of limiting a pair of candidate rates.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LimitedRates {
    /// Units: meters/second
    pub height_rate_ms: f64,

    /// Units: radians/second
    pub angle_rate_rads: f64,

    pub flags: StopFlags,

    /// True if either rate was changed.
    pub limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EnvelopeLimiter {
    /// Build the limiter, checking that the envelope tables describe a valid band.
    pub fn new(
        params: &EnvelopeParams,
        height_range_m: [f64; 2],
        angle_range_rad: [f64; 2],
    ) -> Result<Self, EnvelopeError> {
        check_range("elevator", height_range_m)?;
        check_range("wrist", angle_range_rad)?;
        check_table("lower", &params.lower_angle_limit)?;
        check_table("upper", &params.upper_angle_limit)?;

        let limiter = Self {
            lower_knots: params.lower_angle_limit.clone(),
            upper_knots: params.upper_angle_limit.clone(),
            height_range_m,
            angle_range_rad,
        };

        // The band must be non-empty at every knot of either table, which, since both are piecewise
        // linear, means it is non-empty everywhere.
        for knot in limiter.lower_knots.iter().chain(limiter.upper_knots.iter()) {
            let lower = limiter.lower_angle_limit(knot[0]);
            let upper = limiter.upper_angle_limit(knot[0]);

            if lower >= upper {
                return Err(EnvelopeError::EmptyBand {
                    height_m: knot[0],
                    lower,
                    upper,
                });
            }
        }

        Ok(limiter)
    }

    /// The lowest safe wrist angle at the given height.
    ///
    /// Units: radians
    pub fn lower_angle_limit(&self, height_m: f64) -> f64 {
        match interp_piecewise(&self.lower_knots, height_m) {
            Some(a) => a.max(self.angle_range_rad[0]),
            None => self.angle_range_rad[0],
        }
    }

    /// The highest safe wrist angle at the given height.
    ///
    /// Units: radians
    pub fn upper_angle_limit(&self, height_m: f64) -> f64 {
        match interp_piecewise(&self.upper_knots, height_m) {
            Some(a) => a.min(self.angle_range_rad[1]),
            None => self.angle_range_rad[1],
        }
    }

    /// Returns true if the given position lies inside the safe band.
    pub fn contains(&self, height_m: f64, angle_rad: f64) -> bool {
        angle_rad > self.lower_angle_limit(height_m) && angle_rad < self.upper_angle_limit(height_m)
    }

    /// Determine whether the wrist must be stopped at its lower and/or upper limit.
    ///
    /// The decision is made on the position projected one `dt_s` ahead with the candidate rates.
    ///
    /// # Outputs
    /// - `(stop_lower, stop_upper)`
    pub fn compute_stop_motion(
        &self,
        height_m: f64,
        angle_rad: f64,
        height_rate_ms: f64,
        angle_rate_rads: f64,
        dt_s: f64,
    ) -> (bool, bool) {
        let next_height = height_m + height_rate_ms * dt_s;
        let next_angle = angle_rad + angle_rate_rads * dt_s;

        (
            next_angle <= self.lower_angle_limit(next_height),
            next_angle >= self.upper_angle_limit(next_height),
        )
    }

    /// Clamp a pair of candidate rates so that neither axis moves further into a limit.
    ///
    /// The wrist is inhibited first. If the height motion alone would still carry the projected
    /// position into the band limit, and that motion narrows the margin to it, the elevator is
    /// stopped too.
    pub fn limit(
        &self,
        height_m: f64,
        angle_rad: f64,
        height_rate_ms: f64,
        angle_rate_rads: f64,
        home_switch: bool,
        dt_s: f64,
    ) -> LimitedRates {
        let mut vh = height_rate_ms;
        let mut va = angle_rate_rads;
        let mut flags = StopFlags::default();

        // ---- ELEVATOR SOFT LIMITS ----

        let next_height = height_m + vh * dt_s;
        flags.elevator_stop_down = next_height < self.height_range_m[0] || home_switch;
        flags.elevator_stop_up = next_height > self.height_range_m[1];

        if (flags.elevator_stop_down && vh < 0.0) || (flags.elevator_stop_up && vh > 0.0) {
            vh = 0.0;
        }

        // ---- WRIST BAND ----

        let (stop_lower, stop_upper) =
            self.compute_stop_motion(height_m, angle_rad, vh, va, dt_s);
        flags.wrist_stop_lower = stop_lower;
        flags.wrist_stop_upper = stop_upper;

        if (stop_lower && va < 0.0) || (stop_upper && va > 0.0) {
            va = 0.0;
        }

        // ---- COUPLED HEIGHT INHIBIT ----

        if vh != 0.0 {
            let (still_lower, still_upper) =
                self.compute_stop_motion(height_m, angle_rad, vh, va, dt_s);
            let next_height = height_m + vh * dt_s;

            let lower_rising =
                self.lower_angle_limit(next_height) > self.lower_angle_limit(height_m);
            let upper_falling =
                self.upper_angle_limit(next_height) < self.upper_angle_limit(height_m);

            if (still_lower && lower_rising) || (still_upper && upper_falling) {
                if vh < 0.0 {
                    flags.elevator_stop_down = true;
                } else {
                    flags.elevator_stop_up = true;
                }
                flags.wrist_stop_lower |= still_lower;
                flags.wrist_stop_upper |= still_upper;
                vh = 0.0;
            }
        }

        let limited = vh != height_rate_ms || va != angle_rate_rads;

        if limited {
            trace!(
                "Envelope limited rates ({:.3}, {:.3}) to ({:.3}, {:.3}), flags: {:?}",
                height_rate_ms,
                angle_rate_rads,
                vh,
                va,
                flags
            );
        }

        LimitedRates {
            height_rate_ms: vh,
            angle_rate_rads: va,
            flags,
            limited,
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_range(axis: &'static str, range: [f64; 2]) -> Result<(), EnvelopeError> {
    if !range[0].is_finite() || !range[1].is_finite() || range[0] >= range[1] {
        return Err(EnvelopeError::InvalidRange(axis, range[0], range[1]));
    }

    Ok(())
}

fn check_table(name: &'static str, knots: &[[f64; 2]]) -> Result<(), EnvelopeError> {
    if knots.is_empty() {
        return Err(EnvelopeError::EmptyTable(name));
    }
    if knots.iter().flatten().any(|v| !v.is_finite()) {
        return Err(EnvelopeError::NonFinite(name));
    }
    if knots.windows(2).any(|w| w[1][0] <= w[0][0]) {
        return Err(EnvelopeError::NotIncreasing(name));
    }
    if !is_monotonic(knots) {
        return Err(EnvelopeError::NotMonotonic(name));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
