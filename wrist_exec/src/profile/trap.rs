//! Single axis trapezoidal motion profiles

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Displacements smaller than this are treated as no motion at all.
const MIN_DISPLACEMENT: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Kinematic limits of an axis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
pub struct AxisLimits {
    /// Maximum magnitude of the axis rate.
    pub max_rate: f64,

    /// Maximum magnitude of the axis acceleration.
    pub max_accel: f64,
}

/// Position, rate and acceleration of an axis at an instant.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ProfileState {
    pub pos: f64,
    pub rate: f64,
    pub accel: f64,
}

/// A rest to rest trapezoidal motion profile.
///
/// The profile accelerates at `accel` for `t_accel_s`, cruises at `peak_rate` for `t_cruise_s`,
/// then decelerates at `accel` for `t_accel_s`. A profile with no cruise phase is triangular.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TrapProfile {
    start: f64,
    target: f64,

    /// +1 or -1
    direction: f64,

    /// Magnitude of the cruise rate
    peak_rate: f64,

    /// Magnitude of the acceleration
    accel: f64,

    t_accel_s: f64,
    t_cruise_s: f64,
    total_time_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrapProfile {
    /// Fastest profile between `start` and `target` under the given limits.
    pub fn new(start: f64, target: f64, limits: &AxisLimits) -> Self {
        let dist = (target - start).abs();

        if dist < MIN_DISPLACEMENT || limits.max_rate <= 0.0 || limits.max_accel <= 0.0 {
            return Self::stationary(start, target);
        }

        let mut t_accel_s = limits.max_rate / limits.max_accel;
        let mut peak_rate = limits.max_rate;
        let t_cruise_s;

        // Distance covered by the accel and decel phases together
        if peak_rate * t_accel_s >= dist {
            t_accel_s = (dist / limits.max_accel).sqrt();
            peak_rate = limits.max_accel * t_accel_s;
            t_cruise_s = 0.0;
        } else {
            t_cruise_s = (dist - peak_rate * t_accel_s) / peak_rate;
        }

        Self {
            start,
            target,
            direction: (target - start).signum(),
            peak_rate,
            accel: limits.max_accel,
            t_accel_s,
            t_cruise_s,
            total_time_s: 2.0 * t_accel_s + t_cruise_s,
        }
    }

    /// Profile between `start` and `target` with the given phase timings.
    ///
    /// The peak rate and acceleration are whatever is needed to cover the distance in exactly
    /// `2 * t_accel_s + t_cruise_s`.
    pub fn with_timing(start: f64, target: f64, t_accel_s: f64, t_cruise_s: f64) -> Self {
        let dist = (target - start).abs();
        let t_cruise_s = t_cruise_s.max(0.0);

        if t_accel_s <= 0.0 {
            return Self::stationary(start, target).with_total_time(t_cruise_s);
        }

        let peak_rate = dist / (t_accel_s + t_cruise_s);

        Self {
            start,
            target,
            direction: (target - start).signum(),
            peak_rate,
            accel: peak_rate / t_accel_s,
            t_accel_s,
            t_cruise_s,
            total_time_s: 2.0 * t_accel_s + t_cruise_s,
        }
    }

    /// Profile between `start` and `target` lasting exactly `duration_s`, using the full
    /// acceleration `max_accel` and the lowest cruise rate that achieves it.
    ///
    /// If the distance cannot be covered in `duration_s` at `max_accel` the resulting profile is
    /// the triangle at `max_accel`, which lasts longer than `duration_s`.
    pub fn with_duration(start: f64, target: f64, duration_s: f64, max_accel: f64) -> Self {
        let dist = (target - start).abs();

        if dist < MIN_DISPLACEMENT || max_accel <= 0.0 || duration_s <= 0.0 {
            return Self::stationary(start, target).with_total_time(duration_s.max(0.0));
        }

        // Peak rate v solves v^2 - a T v + a d = 0, taking the smaller root.
        let a = max_accel;
        let disc = a * a * duration_s * duration_s - 4.0 * a * dist;
        if disc < 0.0 {
            return Self::with_timing(start, target, (dist / a).sqrt(), 0.0);
        }

        let peak_rate = 0.5 * (a * duration_s - disc.sqrt());
        let t_accel_s = peak_rate / a;
        let t_cruise_s = (duration_s - 2.0 * t_accel_s).max(0.0);

        Self::with_timing(start, target, t_accel_s, t_cruise_s)
    }

    fn stationary(start: f64, target: f64) -> Self {
        Self {
            start,
            target,
            direction: 1.0,
            ..Default::default()
        }
    }

    fn with_total_time(mut self, total_time_s: f64) -> Self {
        self.t_cruise_s = total_time_s;
        self.total_time_s = total_time_s;
        self
    }

    /// Sample the profile `t_s` seconds after it started.
    ///
    /// Before the start the profile sits at `start`, after the end it sits at `target`.
    pub fn sample(&self, t_s: f64) -> ProfileState {
        if t_s <= 0.0 {
            return ProfileState {
                pos: self.start,
                ..Default::default()
            };
        }
        if t_s >= self.total_time_s {
            return ProfileState {
                pos: self.target,
                ..Default::default()
            };
        }

        let (dist, rate, accel) = if t_s < self.t_accel_s {
            (0.5 * self.accel * t_s * t_s, self.accel * t_s, self.accel)
        } else if t_s < self.t_accel_s + self.t_cruise_s {
            (
                0.5 * self.accel * self.t_accel_s * self.t_accel_s
                    + self.peak_rate * (t_s - self.t_accel_s),
                self.peak_rate,
                0.0,
            )
        } else {
            let t_rem = self.total_time_s - t_s;
            (
                (self.target - self.start).abs() - 0.5 * self.accel * t_rem * t_rem,
                self.accel * t_rem,
                -self.accel,
            )
        };

        ProfileState {
            pos: self.start + self.direction * dist,
            rate: self.direction * rate,
            accel: self.direction * accel,
        }
    }

    pub fn total_time_s(&self) -> f64 {
        self.total_time_s
    }

    pub fn t_accel_s(&self) -> f64 {
        self.t_accel_s
    }

    pub fn t_cruise_s(&self) -> f64 {
        self.t_cruise_s
    }

    /// Magnitude of the cruise rate.
    pub fn peak_rate(&self) -> f64 {
        self.peak_rate
    }

    /// Magnitude of the acceleration.
    pub fn accel(&self) -> f64 {
        self.accel
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Returns true if the profile respects the given limits, with a small relative margin.
    pub fn within(&self, limits: &AxisLimits) -> bool {
        const MARGIN: f64 = 1.0 + 1e-9;

        self.peak_rate <= limits.max_rate * MARGIN && self.accel <= limits.max_accel * MARGIN
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
