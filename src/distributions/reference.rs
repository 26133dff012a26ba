//! Physics reference curve
//!
//! Hand-fit launch data indexed by static loft at a tour-average swing speed.
//! Used to fill in a full metric set for clubs the golfer has only given a
//! manual carry for.

use crate::types::ClubMetrics;

/// One row of the reference curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceRow {
    /// Static loft (degrees)
    pub loft: f64,
    /// Carry (yards)
    pub carry: f64,
    /// Ball speed (mph)
    pub ball_speed: f64,
    /// Launch angle (degrees)
    pub launch_angle: f64,
    /// Backspin (rpm)
    pub spin_rate: f64,
    /// Apex height (yards)
    pub apex: f64,
    /// Descent angle (degrees)
    pub descent_angle: f64,
}

const fn row(
    loft: f64,
    carry: f64,
    ball_speed: f64,
    launch_angle: f64,
    spin_rate: f64,
    apex: f64,
    descent_angle: f64,
) -> ReferenceRow {
    ReferenceRow { loft, carry, ball_speed, launch_angle, spin_rate, apex, descent_angle }
}

/// Reference rows, sorted by ascending loft.
pub const REFERENCE_TABLE: [ReferenceRow; 14] = [
    row(10.5, 275.0, 167.0, 10.9, 2686.0, 32.0, 38.0),
    row(15.0, 243.0, 158.0, 9.2, 3655.0, 30.0, 43.0),
    row(18.0, 230.0, 152.0, 9.3, 4350.0, 31.0, 47.0),
    row(21.0, 225.0, 146.0, 10.2, 4437.0, 29.0, 47.0),
    row(24.0, 210.0, 143.0, 10.4, 4836.0, 28.0, 48.0),
    row(27.0, 194.0, 135.0, 11.0, 5361.0, 31.0, 49.0),
    row(30.0, 183.0, 132.0, 12.1, 6231.0, 30.0, 50.0),
    row(33.0, 172.0, 123.0, 16.3, 7097.0, 32.0, 50.0),
    row(37.0, 160.0, 118.0, 18.1, 7998.0, 31.0, 50.0),
    row(41.0, 148.0, 112.0, 20.4, 8647.0, 30.0, 51.0),
    row(45.0, 136.0, 104.0, 24.2, 9304.0, 29.0, 52.0),
    row(50.0, 120.0, 96.0, 27.0, 9800.0, 28.0, 52.0),
    row(56.0, 100.0, 86.0, 30.0, 10200.0, 25.0, 53.0),
    row(60.0, 85.0, 78.0, 32.0, 10400.0, 22.0, 54.0),
];

/// Reference values at an arbitrary loft.
///
/// Linear between neighbouring rows; clamped to the first/last row outside
/// the table's loft range.
pub fn reference_at_loft(loft: f64) -> ReferenceRow {
    let first = REFERENCE_TABLE[0];
    let last = REFERENCE_TABLE[REFERENCE_TABLE.len() - 1];
    if loft <= first.loft {
        return ReferenceRow { loft, ..first };
    }
    if loft >= last.loft {
        return ReferenceRow { loft, ..last };
    }
    if let Some(exact) = REFERENCE_TABLE.iter().find(|r| r.loft == loft) {
        return *exact;
    }

    for pair in REFERENCE_TABLE.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if loft <= hi.loft {
            let t = (loft - lo.loft) / (hi.loft - lo.loft);
            let lerp = |a: f64, b: f64| a + (b - a) * t;
            return ReferenceRow {
                loft,
                carry: lerp(lo.carry, hi.carry),
                ball_speed: lerp(lo.ball_speed, hi.ball_speed),
                launch_angle: lerp(lo.launch_angle, hi.launch_angle),
                spin_rate: lerp(lo.spin_rate, hi.spin_rate),
                apex: lerp(lo.apex, hi.apex),
                descent_angle: lerp(lo.descent_angle, hi.descent_angle),
            };
        }
    }
    ReferenceRow { loft, ..last }
}

/// Full metric set for a club of `loft` that carries `carry` yards.
///
/// Ball speed, spin and apex scale with `carry / reference carry`; launch and
/// descent depend on loft alone and are taken unscaled.
pub fn scaled_metrics(loft: f64, carry: f64) -> ClubMetrics {
    let reference = reference_at_loft(loft);
    let scale = carry / reference.carry;
    ClubMetrics {
        carry,
        ball_speed: Some(reference.ball_speed * scale),
        launch_angle: Some(reference.launch_angle),
        spin_rate: Some(reference.spin_rate * scale),
        apex: Some(reference.apex * scale),
        descent_angle: Some(reference.descent_angle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sorted_by_loft() {
        assert!(REFERENCE_TABLE.windows(2).all(|w| w[0].loft < w[1].loft));
        assert!(REFERENCE_TABLE.windows(2).all(|w| w[0].carry > w[1].carry));
    }

    #[test]
    fn test_exact_row_lookup() {
        let r = reference_at_loft(33.0);
        assert_eq!(r.carry, 172.0);
        assert_eq!(r.ball_speed, 123.0);
    }

    #[test]
    fn test_interpolates_between_rows() {
        let r = reference_at_loft(35.0);
        assert!((r.carry - 166.0).abs() < 1e-9);
        assert!((r.spin_rate - 7547.5).abs() < 1e-9);
    }

    #[test]
    fn test_clamps_outside_table() {
        assert_eq!(reference_at_loft(8.0).carry, 275.0);
        assert_eq!(reference_at_loft(64.0).carry, 85.0);
    }

    #[test]
    fn test_scale_one_is_identity() {
        let m = scaled_metrics(33.0, 172.0);
        assert_eq!(m.ball_speed, Some(123.0));
        assert_eq!(m.spin_rate, Some(7097.0));
        assert_eq!(m.apex, Some(32.0));
        assert_eq!(m.launch_angle, Some(16.3));
        assert_eq!(m.descent_angle, Some(50.0));
    }

    #[test]
    fn test_scaling_leaves_loft_metrics_unchanged() {
        let m = scaled_metrics(33.0, 150.5);
        let scale = 150.5 / 172.0;
        assert!((m.ball_speed.unwrap() - 123.0 * scale).abs() < 1e-9);
        assert_eq!(m.launch_angle, Some(16.3));
        assert_eq!(m.descent_angle, Some(50.0));
    }
}
