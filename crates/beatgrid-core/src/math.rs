//! Small numeric helpers shared by the evaluation pass.

/// Bound `value` to the inclusive range `[lo, hi]`.
///
/// Unlike [`f64::clamp`] this never panics: if `lo > hi` the bounds are
/// swapped first, and a NaN input is returned as `lo`.
#[inline]
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if value.is_nan() || value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_inside_range() {
        assert_eq!(clamp(0.25, 0.0, 1.0), 0.25);
        assert_eq!(clamp(0.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(1.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_outside_range() {
        assert_eq!(clamp(-3.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(7.5, 0.0, 1.0), 1.0);
        assert_eq!(clamp(f64::INFINITY, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_clamp_swapped_bounds_and_nan() {
        assert_eq!(clamp(5.0, 1.0, 0.0), 1.0);
        assert_eq!(clamp(f64::NAN, 0.0, 1.0), 0.0);
    }
}
