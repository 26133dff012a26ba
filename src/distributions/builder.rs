//! Measured distributions from recorded practice shots

use statrs::statistics::Statistics;
use std::collections::HashMap;

use crate::config::DistributionConfig;
use crate::types::{
    Club, ClubDistribution, ClubId, ClubMetrics, DistributionSource, Shot, ShotQuality,
};

/// Whether a shot may contribute to a club's statistics.
pub fn is_valid_shot(shot: &Shot, config: &DistributionConfig) -> bool {
    if !shot.carry_yards.is_finite() || shot.carry_yards <= 0.0 {
        return false;
    }
    !(config.exclude_mishits && shot.quality == Some(ShotQuality::Mishit))
}

/// Group valid shots by club.
pub fn group_valid_shots<'a>(
    shots: &'a [Shot],
    config: &DistributionConfig,
) -> HashMap<ClubId, Vec<&'a Shot>> {
    let mut by_club: HashMap<ClubId, Vec<&Shot>> = HashMap::new();
    for shot in shots.iter().filter(|s| is_valid_shot(s, config)) {
        by_club.entry(shot.club_id).or_default().push(shot);
    }
    by_club
}

/// Sample standard deviation floored at `floor`.
///
/// A single value (or an empty set) has no spread and returns the floor.
pub fn floored_std_dev(values: &[f64], floor: f64) -> f64 {
    if values.len() < 2 {
        return floor;
    }
    let sd = values.iter().std_dev();
    if sd.is_finite() { sd.max(floor) } else { floor }
}

fn mean_of_present<F>(shots: &[&Shot], field: F) -> Option<f64>
where
    F: Fn(&Shot) -> Option<f64>,
{
    let values: Vec<f64> = shots
        .iter()
        .filter_map(|s| field(s))
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().mean())
    }
}

/// Sample statistics for one club.
///
/// `shots` must already be filtered to valid shots for this club and be
/// non-empty. Offline spread falls back to a fraction of carry when no shot
/// recorded an offline value.
pub fn measured_distribution(
    club: &Club,
    loft: f64,
    shots: &[&Shot],
    config: &DistributionConfig,
) -> ClubDistribution {
    let carries: Vec<f64> = shots.iter().map(|s| s.carry_yards).collect();
    let mean_carry = carries.iter().mean();
    let std_carry = floored_std_dev(&carries, config.min_std_yards);

    let offlines: Vec<f64> = shots
        .iter()
        .filter_map(|s| s.offline_yards)
        .filter(|v| v.is_finite())
        .collect();
    let (mean_offline, std_offline) = if offlines.is_empty() {
        (
            0.0,
            (mean_carry * config.default_offline_std_pct).max(config.min_std_yards),
        )
    } else {
        (
            offlines.iter().mean(),
            floored_std_dev(&offlines, config.min_std_yards),
        )
    };

    ClubDistribution {
        club_id: club.id,
        club_name: club.name.clone(),
        loft,
        mean_carry,
        std_carry,
        mean_offline,
        std_offline,
        source: DistributionSource::Measured,
        shot_count: shots.len(),
        preferred_shape: club.preferred_shape,
        metrics: ClubMetrics {
            carry: mean_carry,
            ball_speed: mean_of_present(shots, |s| s.ball_speed_mph),
            launch_angle: mean_of_present(shots, |s| s.launch_angle_deg),
            spin_rate: mean_of_present(shots, |s| s.spin_rpm),
            apex: mean_of_present(shots, |s| s.apex_yards),
            descent_angle: mean_of_present(shots, |s| s.descent_angle_deg),
        },
    }
}
