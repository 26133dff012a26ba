//! Imputation for clubs without enough practice data
//!
//! Two routes to a carry/metric set:
//! - **Manual carry**: golfer-entered carry (or total) mapped onto the
//!   physics reference curve at the club's loft
//! - **Interpolation**: piecewise-linear across other clubs' loft/metric
//!   pairs, extrapolating from the end segments
//!
//! Dispersion for imputed clubs is regressed from measured clubs' carry vs.
//! spread, or taken as a fixed fraction of carry when fewer than two measured
//! clubs exist.

use crate::config::DistributionConfig;
use crate::types::{Club, ClubDistribution, ClubMetrics, DistributionSource};

use super::reference::scaled_metrics;

/// Carry a club can be assumed to have if it reports no usable value.
const MIN_IMPUTED_CARRY: f64 = 1.0;

/// Known (loft, metrics) pair used as an interpolation anchor.
#[derive(Debug, Clone, Copy)]
pub struct LoftAnchor {
    pub loft: f64,
    pub metrics: ClubMetrics,
}

impl From<&ClubDistribution> for LoftAnchor {
    fn from(d: &ClubDistribution) -> Self {
        Self { loft: d.loft, metrics: d.metrics }
    }
}

/// Least-squares line through `(x, y)` points.
///
/// Returns `(slope, intercept)`, or `None` with fewer than two points or no
/// spread in `x`.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    if sxx.abs() < f64::EPSILON {
        return None;
    }
    let sxy: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    let slope = sxy / sxx;
    Some((slope, mean_y - slope * mean_x))
}

/// Piecewise-linear interpolation of `y` at `x`, extrapolating beyond the
/// ends with the first/last segment's slope.
///
/// Points sharing an `x` are averaged. Needs at least two distinct `x`.
pub fn piecewise_linear(points: &[(f64, f64)], x: f64) -> Option<f64> {
    let mut sorted: Vec<(f64, f64)> = points
        .iter()
        .copied()
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f64, f64, usize)> = Vec::with_capacity(sorted.len());
    for (px, py) in sorted {
        match merged.last_mut() {
            Some(last) if (last.0 - px).abs() < 1e-9 => {
                last.1 += py;
                last.2 += 1;
            }
            _ => merged.push((px, py, 1)),
        }
    }
    let knots: Vec<(f64, f64)> = merged
        .into_iter()
        .map(|(px, sum, n)| (px, sum / n as f64))
        .collect();
    if knots.len() < 2 {
        return None;
    }

    let segment = if x <= knots[0].0 {
        (knots[0], knots[1])
    } else if x >= knots[knots.len() - 1].0 {
        (knots[knots.len() - 2], knots[knots.len() - 1])
    } else {
        let i = knots.iter().position(|k| k.0 >= x).unwrap_or(knots.len() - 1);
        (knots[i - 1], knots[i])
    };
    let ((x0, y0), (x1, y1)) = segment;
    Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
}

/// Carry the golfer entered for a club, preferring carry over total.
pub fn manual_carry(club: &Club, config: &DistributionConfig) -> Option<f64> {
    club.manual_carry
        .filter(|c| c.is_finite() && *c > 0.0)
        .or_else(|| {
            club.manual_total
                .filter(|t| t.is_finite() && *t > 0.0)
                .map(|t| t * config.carry_to_total_ratio)
        })
}

/// Metric set from a manual carry value and the reference curve.
pub fn metrics_from_manual_carry(loft: f64, carry: f64) -> ClubMetrics {
    scaled_metrics(loft, carry)
}

/// Metric set interpolated across anchors by loft.
///
/// Carry needs two anchors. Any other metric with fewer than two anchors
/// supplying it is filled from the reference curve scaled to the
/// interpolated carry.
pub fn metrics_from_interpolation(loft: f64, anchors: &[LoftAnchor]) -> Option<ClubMetrics> {
    let carry_points: Vec<(f64, f64)> = anchors.iter().map(|a| (a.loft, a.metrics.carry)).collect();
    let carry = piecewise_linear(&carry_points, loft)?.max(MIN_IMPUTED_CARRY);
    let fallback = scaled_metrics(loft, carry);

    let metric = |pick: fn(&ClubMetrics) -> Option<f64>, fallback: Option<f64>| {
        let points: Vec<(f64, f64)> = anchors
            .iter()
            .filter_map(|a| pick(&a.metrics).map(|v| (a.loft, v)))
            .collect();
        piecewise_linear(&points, loft).or(fallback)
    };

    Some(ClubMetrics {
        carry,
        ball_speed: metric(|m| m.ball_speed, fallback.ball_speed),
        launch_angle: metric(|m| m.launch_angle, fallback.launch_angle),
        spin_rate: metric(|m| m.spin_rate, fallback.spin_rate),
        apex: metric(|m| m.apex, fallback.apex),
        descent_angle: metric(|m| m.descent_angle, fallback.descent_angle),
    })
}

/// Carry → dispersion model fitted to measured clubs.
#[derive(Debug, Clone, Copy)]
pub struct DispersionModel {
    std_carry: Option<(f64, f64)>,
    mean_offline: Option<(f64, f64)>,
    std_offline: Option<(f64, f64)>,
}

impl DispersionModel {
    /// Fit against measured distributions. Each regression is only used with
    /// at least two measured clubs.
    pub fn fit(measured: &[ClubDistribution]) -> Self {
        let pairs = |pick: fn(&ClubDistribution) -> f64| -> Vec<(f64, f64)> {
            measured.iter().map(|d| (d.mean_carry, pick(d))).collect()
        };
        Self {
            std_carry: linear_fit(&pairs(|d| d.std_carry)),
            mean_offline: linear_fit(&pairs(|d| d.mean_offline)),
            std_offline: linear_fit(&pairs(|d| d.std_offline)),
        }
    }

    /// `(std_carry, mean_offline, std_offline)` for a club of `carry`, with
    /// both spreads floored.
    pub fn estimate(&self, carry: f64, config: &DistributionConfig) -> (f64, f64, f64) {
        let eval = |fit: Option<(f64, f64)>| fit.map(|(m, b)| m * carry + b);
        let std_carry = eval(self.std_carry)
            .unwrap_or(carry * config.default_carry_std_pct)
            .max(config.min_std_yards);
        let mean_offline = eval(self.mean_offline).unwrap_or(0.0);
        let std_offline = eval(self.std_offline)
            .unwrap_or(carry * config.default_offline_std_pct)
            .max(config.min_std_yards);
        (std_carry, mean_offline, std_offline)
    }
}

/// Assemble an imputed distribution.
pub fn imputed_distribution(
    club: &Club,
    loft: f64,
    metrics: ClubMetrics,
    source: DistributionSource,
    dispersion: &DispersionModel,
    config: &DistributionConfig,
) -> ClubDistribution {
    let (std_carry, mean_offline, std_offline) = dispersion.estimate(metrics.carry, config);
    ClubDistribution {
        club_id: club.id,
        club_name: club.name.clone(),
        loft,
        mean_carry: metrics.carry,
        std_carry,
        mean_offline,
        std_offline,
        source,
        shot_count: 0,
        preferred_shape: club.preferred_shape,
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_fit_exact_line() {
        let (m, b) = linear_fit(&[(100.0, 5.0), (200.0, 10.0), (150.0, 7.5)]).unwrap();
        assert!((m - 0.05).abs() < 1e-12);
        assert!(b.abs() < 1e-9);
        assert!(linear_fit(&[(1.0, 1.0)]).is_none());
        assert!(linear_fit(&[(1.0, 1.0), (1.0, 3.0)]).is_none());
    }

    #[test]
    fn test_piecewise_interpolates_and_extrapolates() {
        let pts = [(20.0, 220.0), (30.0, 180.0), (45.0, 135.0)];
        assert!((piecewise_linear(&pts, 25.0).unwrap() - 200.0).abs() < 1e-9);
        assert!((piecewise_linear(&pts, 40.0).unwrap() - 150.0).abs() < 1e-9);
        // Extrapolated with the end segment slopes
        assert!((piecewise_linear(&pts, 10.0).unwrap() - 260.0).abs() < 1e-9);
        assert!((piecewise_linear(&pts, 50.0).unwrap() - 120.0).abs() < 1e-9);
        assert!(piecewise_linear(&pts[..1], 25.0).is_none());
    }

    #[test]
    fn test_piecewise_merges_duplicate_x() {
        let pts = [(30.0, 170.0), (30.0, 190.0), (40.0, 150.0)];
        assert!((piecewise_linear(&pts, 30.0).unwrap() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_dispersion_defaults_without_measured_clubs() {
        let config = DistributionConfig::default();
        let model = DispersionModel::fit(&[]);
        let (sc, mo, so) = model.estimate(200.0, &config);
        assert!((sc - 10.0).abs() < 1e-9);
        assert_eq!(mo, 0.0);
        assert!((so - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_fills_missing_metrics_from_reference() {
        let anchor = |loft: f64, carry: f64, spin: Option<f64>| LoftAnchor {
            loft,
            metrics: ClubMetrics { carry, spin_rate: spin, ..Default::default() },
        };
        let anchors = [anchor(27.0, 190.0, Some(5000.0)), anchor(41.0, 150.0, Some(8000.0))];
        let m = metrics_from_interpolation(34.0, &anchors).unwrap();
        assert!((m.carry - 170.0).abs() < 1e-9);
        assert!((m.spin_rate.unwrap() - 6500.0).abs() < 1e-9);
        // No anchor recorded ball speed: reference scaled to the carry
        assert!(m.ball_speed.is_some());
        assert!(m.launch_angle.is_some());
    }
}
