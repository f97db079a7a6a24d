//! Fixed-point weight helpers. Weight is carried internally as centigrams
//! (1 cg = 0.01 g, an `i32`) rather than `f64`, so snapshot history and
//! stability comparisons are exact rather than float-approximate.

/// Round grams to the nearest centigram, saturating on overflow.
pub fn grams_to_cg(g: f64) -> i32 {
    let scaled = (g * 100.0).round();
    if scaled >= i32::MAX as f64 {
        i32::MAX
    } else if scaled <= i32::MIN as f64 {
        i32::MIN
    } else {
        scaled as i32
    }
}

pub fn cg_to_grams(cg: i32) -> f64 {
    f64::from(cg) / 100.0
}

/// Absolute difference between two centigram values, losslessly (no i32
/// overflow even at the extremes).
pub fn abs_diff_cg(a: i32, b: i32) -> u32 {
    (i64::from(a) - i64::from(b)).unsigned_abs() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grams_to_cg_rounds_to_nearest() {
        assert_eq!(grams_to_cg(0.004), 0);
        assert_eq!(grams_to_cg(0.005), 1);
        assert_eq!(grams_to_cg(-0.005), -1);
    }

    #[test]
    fn round_trip_is_exact_at_cg_resolution() {
        assert_eq!(cg_to_grams(grams_to_cg(56.50)), 56.50);
        assert_eq!(cg_to_grams(grams_to_cg(-0.01)), -0.01);
    }

    #[test]
    fn abs_diff_handles_extremes_losslessly() {
        assert_eq!(abs_diff_cg(i32::MAX, i32::MIN), u32::MAX);
        assert_eq!(abs_diff_cg(5, 5), 0);
    }

    #[test]
    fn grams_to_cg_saturates_instead_of_overflowing() {
        assert_eq!(grams_to_cg(f64::MAX), i32::MAX);
        assert_eq!(grams_to_cg(-f64::MAX), i32::MIN);
    }
}
