//! Adaptive two-pulse dispense math. The first (initial) pulse is a
//! fixed-duration open-loop dispense used only to measure the flow rate;
//! the second (adaptive) pulse is sized from that measurement to land on
//! `fill_weight`. There is no retry: a second-pulse shortfall is a
//! failure, not another iteration.

/// `slope = (d1 - offset) / t1_ms`, grams per millisecond.
pub fn flow_rate_g_per_ms(d1_g: f64, offset_g: f64, t1_ms: f64) -> f64 {
    (d1_g - offset_g) / t1_ms
}

/// `T2 = trunc((r - offset) / slope)` where `r = target - d1`.
///
/// `offset_g` captures the fixed per-pulse over/under-shoot (valve
/// open/close transient); the model assumes a linear pulse-mass relation
/// `mass ~= slope * time + offset`. Truncates toward zero, matching the
/// worked scenario in the testable-properties table exactly.
pub fn second_pulse_ms(d1_g: f64, target_g: f64, offset_g: f64, t1_ms: f64) -> i64 {
    let slope = flow_rate_g_per_ms(d1_g, offset_g, t1_ms);
    let remaining = target_g - d1_g;
    ((remaining - offset_g) / slope) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(6.50, 28.12, 1.5, 1500.0, 6036)]
    fn second_pulse_matches_worked_scenarios(
        #[case] d1_g: f64,
        #[case] target_g: f64,
        #[case] offset_g: f64,
        #[case] t1_ms: f64,
        #[case] expected_t2_ms: i64,
    ) {
        assert_eq!(second_pulse_ms(d1_g, target_g, offset_g, t1_ms), expected_t2_ms);
    }

    #[test]
    fn flow_rate_matches_worked_example() {
        let slope = flow_rate_g_per_ms(6.50, 1.5, 1500.0);
        assert!((slope - 0.003333333333333333).abs() < 1e-12);
    }
}
