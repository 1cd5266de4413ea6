//! Synchronised pairs of trapezoidal profiles

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use super::{AxisLimits, ProfileState, TrapProfile};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Elevator and wrist profiles which finish at the same instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualProfile {
    pub elevator: TrapProfile,
    pub wrist: TrapProfile,

    /// Which axis set the duration of the pair.
    pub slower: Axis,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Elevator,
    Wrist,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DualProfile {
    /// Build profiles for both axes from `start` to `target` (both `[height, angle]`), slowing the
    /// faster axis so both arrive together.
    ///
    /// The faster profile takes the timing of the slower one: the same acceleration time and the
    /// same cruise time, with its own rate and acceleration scaled to its own displacement. If that
    /// would break the faster axis's limits it is instead given the slowest profile of the same
    /// duration which uses its full acceleration.
    pub fn synchronise(
        start: [f64; 2],
        target: [f64; 2],
        elevator_limits: &AxisLimits,
        wrist_limits: &AxisLimits,
    ) -> Self {
        let elevator = TrapProfile::new(start[0], target[0], elevator_limits);
        let wrist = TrapProfile::new(start[1], target[1], wrist_limits);

        // On a tie the elevator is treated as the slower of the two
        let (slower, fast, fast_limits, fast_start, fast_target) =
            if wrist.total_time_s() <= elevator.total_time_s() {
                (Axis::Elevator, wrist, wrist_limits, start[1], target[1])
            } else {
                (Axis::Wrist, elevator, elevator_limits, start[0], target[0])
            };
        let slow = match slower {
            Axis::Elevator => elevator,
            Axis::Wrist => wrist,
        };

        let mut rescaled =
            TrapProfile::with_timing(fast_start, fast_target, slow.t_accel_s(), slow.t_cruise_s());

        if !rescaled.within(fast_limits) {
            rescaled = TrapProfile::with_duration(
                fast_start,
                fast_target,
                slow.total_time_s(),
                fast_limits.max_accel,
            );
        }

        trace!(
            "Synchronised profiles: {:?} is slower, T = {:.3} s (faster axis alone {:.3} s)",
            slower,
            slow.total_time_s(),
            fast.total_time_s()
        );

        match slower {
            Axis::Elevator => Self {
                elevator: slow,
                wrist: rescaled,
                slower,
            },
            Axis::Wrist => Self {
                elevator: rescaled,
                wrist: slow,
                slower,
            },
        }
    }

    /// Duration of the pair, set by the slower axis.
    pub fn total_time_s(&self) -> f64 {
        match self.slower {
            Axis::Elevator => self.elevator.total_time_s(),
            Axis::Wrist => self.wrist.total_time_s(),
        }
    }

    /// Sample both profiles, returning `(elevator, wrist)`.
    pub fn sample(&self, t_s: f64) -> (ProfileState, ProfileState) {
        (self.elevator.sample(t_s), self.wrist.sample(t_s))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    const ELEV: AxisLimits = AxisLimits {
        max_rate: 1.0,
        max_accel: 2.0,
    };
    const WRIST: AxisLimits = AxisLimits {
        max_rate: PI,
        max_accel: 2.0 * PI,
    };

    #[test]
    fn test_synchronised_arrival() {
        let legs = [
            ([0.5, 0.0], [1.6, 1.2]),
            ([0.0, 0.0], [0.5, 0.0]),
            ([1.6, 1.2], [0.3, 0.5]),
            ([0.1, 0.6], [0.15, -0.3]),
            ([0.0, -1.0], [0.02, 2.0]),
        ];

        for (start, target) in legs.iter() {
            let isolated_e = TrapProfile::new(start[0], target[0], &ELEV).total_time_s();
            let isolated_w = TrapProfile::new(start[1], target[1], &WRIST).total_time_s();
            let dp = DualProfile::synchronise(*start, *target, &ELEV, &WRIST);

            let t_max = isolated_e.max(isolated_w);
            assert!((dp.elevator.total_time_s() - t_max).abs() < 1e-3, "{:?}", start);
            assert!((dp.wrist.total_time_s() - t_max).abs() < 1e-3, "{:?}", start);
            assert!((dp.total_time_s() - t_max).abs() < 1e-3);

            // Both limits are respected
            assert!(dp.elevator.within(&ELEV));
            assert!(dp.wrist.within(&WRIST));

            // Both arrive
            let (e, w) = dp.sample(dp.total_time_s());
            assert_eq!(e.pos, target[0]);
            assert_eq!(w.pos, target[1]);

            // And are still moving just before the end, unless one axis has nothing to do
            let (e, w) = dp.sample(dp.total_time_s() - 0.01);
            if (target[0] - start[0]).abs() > 1e-6 {
                assert!(e.rate != 0.0);
            }
            if (target[1] - start[1]).abs() > 1e-6 {
                assert!(w.rate != 0.0);
            }
        }
    }

    #[test]
    fn test_slower_axis() {
        // Long wrist move, short elevator move
        let dp = DualProfile::synchronise([0.0, -1.0], [0.02, 2.0], &ELEV, &WRIST);
        assert_eq!(dp.slower, Axis::Wrist);

        let dp = DualProfile::synchronise([0.5, 0.0], [1.6, 1.2], &ELEV, &WRIST);
        assert_eq!(dp.slower, Axis::Elevator);

        // Tie
        let dp = DualProfile::synchronise([0.0, 0.0], [0.0, 0.0], &ELEV, &WRIST);
        assert_eq!(dp.slower, Axis::Elevator);
    }

    #[test]
    fn test_straight_line_path() {
        // When the faster axis takes the slower axis's timing both move in proportion, so the path
        // through configuration space is a straight line.
        let start = [0.5, 0.0];
        let target = [1.6, 1.2];
        let dp = DualProfile::synchronise(start, target, &ELEV, &WRIST);

        for i in 1..20 {
            let t = dp.total_time_s() * i as f64 / 20.0;
            let (e, w) = dp.sample(t);
            let fe = (e.pos - start[0]) / (target[0] - start[0]);
            let fw = (w.pos - start[1]) / (target[1] - start[1]);
            assert!((fe - fw).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rescale_fallback() {
        // A wrist with lots of rate but little acceleration: copying the elevator's short
        // acceleration phase would need more acceleration than it has
        let weak_wrist = AxisLimits {
            max_rate: 10.0,
            max_accel: 0.5,
        };
        let slow_elev = AxisLimits {
            max_rate: 0.1,
            max_accel: 10.0,
        };

        let dp = DualProfile::synchronise([0.0, 0.0], [1.0, 0.5], &slow_elev, &weak_wrist);

        assert_eq!(dp.slower, Axis::Elevator);
        assert!(dp.wrist.within(&weak_wrist));
        assert!((dp.wrist.total_time_s() - dp.elevator.total_time_s()).abs() < 1e-3);
        assert!((dp.sample(dp.total_time_s()).1.pos - 0.5).abs() < 1e-12);
    }
}
