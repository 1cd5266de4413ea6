//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Evaluate a piecewise linear function at `x`.
///
/// `knots` are `[x, y]` pairs sorted by strictly increasing `x`. Outside the range of the knots
/// the value of the nearest end knot is held. Returns `None` if there are no knots.
pub fn interp_piecewise<T>(knots: &[[T; 2]], x: T) -> Option<T>
where
    T: Float,
{
    let first = knots.first()?;
    let last = knots.last()?;

    if x <= first[0] {
        return Some(first[1]);
    }
    if x >= last[0] {
        return Some(last[1]);
    }

    knots
        .windows(2)
        .find(|w| x >= w[0][0] && x <= w[1][0])
        .map(|w| lin_map((w[0][0], w[1][0]), (w[0][1], w[1][1]), x))
}

/// Returns true if the `y` values of the knots never decrease, or never increase.
pub fn is_monotonic<T>(knots: &[[T; 2]]) -> bool
where
    T: Float,
{
    let non_decreasing = knots.windows(2).all(|w| w[1][1] >= w[0][1]);
    let non_increasing = knots.windows(2).all(|w| w[1][1] <= w[0][1]);

    non_decreasing || non_increasing
}

/// Step `value` towards `target` by at most `max_step`, without overshooting.
pub fn approach<T>(value: T, target: T, max_step: T) -> T
where
    T: Float,
{
    let diff = target - value;

    if diff.abs() <= max_step {
        target
    } else {
        value + max_step * diff.signum()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_interp_piecewise() {
        let knots = [[0.0, -0.35], [0.4, -0.35], [0.5, -1.5]];

        assert_eq!(interp_piecewise(&knots, -1.0), Some(-0.35));
        assert_eq!(interp_piecewise(&knots, 0.2), Some(-0.35));
        assert!((interp_piecewise(&knots, 0.45).unwrap() + 0.925).abs() < 1e-12);
        assert_eq!(interp_piecewise(&knots, 2.0), Some(-1.5));

        let empty: [[f64; 2]; 0] = [];
        assert_eq!(interp_piecewise(&empty, 0.0), None);
    }

    #[test]
    fn test_is_monotonic() {
        assert!(is_monotonic(&[[0.0, 1.0], [1.0, 1.0], [2.0, 3.0]]));
        assert!(is_monotonic(&[[0.0, 1.0], [1.0, 0.0]]));
        assert!(!is_monotonic(&[[0.0, 1.0], [1.0, 0.0], [2.0, 1.0]]));
    }

    #[test]
    fn test_approach() {
        assert_eq!(approach(1.0, 0.0, 0.25), 0.75);
        assert_eq!(approach(-1.0, 0.0, 0.25), -0.75);
        assert_eq!(approach(0.1, 0.0, 0.25), 0.0);
    }
}
