//! Short-game cost model
//!
//! Once a trial's ball is inside chip range no more full shots are sampled.
//! The remaining cost is a deterministic expectation: putts from the
//! current distance, or a chip that leaves a short putt.

use crate::config::SimulationConfig;

/// Expected putts from `distance` yards.
///
/// 1.0 at or inside a yard, then `putt_base + putt_log_coeff * ln(d)`,
/// capped at `putt_cap`.
pub fn expected_putts(distance: f64, config: &SimulationConfig) -> f64 {
    if !distance.is_finite() || distance <= 1.0 {
        return config.putt_base;
    }
    (config.putt_base + config.putt_log_coeff * distance.ln()).min(config.putt_cap)
}

/// Strokes still needed once full shots stop.
///
/// Beyond the holed-out tolerance but inside `chip_range` the player chips
/// once and putts from `chip_leave_yards`. Anywhere else, including a ball
/// left outside chip range by the shot cap, the cost is expected putts from
/// `remaining`, which the putt cap bounds.
pub fn finish_cost(remaining: f64, chip_range: f64, config: &SimulationConfig) -> f64 {
    if remaining > config.holed_tolerance_yards && remaining <= chip_range {
        1.0 + expected_putts(config.chip_leave_yards, config)
    } else {
        expected_putts(remaining, config)
    }
}

/// Distance inside which full shots stop.
pub fn chip_range(shortest_carry: f64, config: &SimulationConfig) -> f64 {
    config
        .chip_min_yards
        .max(shortest_carry * config.chip_carry_fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_putt_inside_a_yard() {
        let config = SimulationConfig::default();
        assert_eq!(expected_putts(0.0, &config), 1.0);
        assert_eq!(expected_putts(1.0, &config), 1.0);
    }

    #[test]
    fn test_putts_grow_then_cap() {
        let config = SimulationConfig::default();
        let three = expected_putts(3.0, &config);
        assert!((three - (1.0 + 0.42 * 3.0_f64.ln())).abs() < 1e-12);
        assert!(expected_putts(10.0, &config) > three);
        assert_eq!(expected_putts(1_000.0, &config), 3.0);
    }

    #[test]
    fn test_finish_cost_chip_beyond_tolerance() {
        let config = SimulationConfig::default();
        assert_eq!(finish_cost(8.0, 50.0, &config), expected_putts(8.0, &config));
        let chip = finish_cost(40.0, 50.0, &config);
        assert!((chip - (1.0 + expected_putts(3.0, &config))).abs() < 1e-12);
    }

    #[test]
    fn test_finish_cost_outside_chip_range_is_capped_putts() {
        let config = SimulationConfig::default();
        assert_eq!(finish_cost(300.0, 50.0, &config), config.putt_cap);
        assert_eq!(finish_cost(60.0, 50.0, &config), expected_putts(60.0, &config));
        assert!(finish_cost(300.0, 50.0, &config) > finish_cost(40.0, 50.0, &config));
    }

    #[test]
    fn test_chip_range_floor() {
        let config = SimulationConfig::default();
        assert_eq!(chip_range(12.0, &config), 10.0);
        assert_eq!(chip_range(100.0, &config), 50.0);
    }
}
