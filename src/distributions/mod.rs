//! Distribution Builder
//!
//! Turns a club bag and its practice shots into per-club Gaussian
//! carry/offline models.
//!
//! ## Pipeline
//!
//! 1. Drop clubs with no loft and putters
//! 2. Clubs with at least `min_shots` valid shots get measured statistics
//! 3. Remaining clubs are imputed, in bag order:
//!    - from a manual carry/total on the reference curve, else
//!    - by interpolation across clubs already known (needs two)
//! 4. Imputed dispersion is regressed from measured clubs
//!
//! Every standard deviation is floored so sampling never degenerates.
//!
//! ## Modules
//!
//! - `builder`: sample statistics over shots
//! - `imputation`: manual-carry scaling, interpolation, dispersion regression
//! - `reference`: the loft-indexed physics reference curve

pub mod builder;
pub mod imputation;
pub mod reference;

use tracing::{debug, info};

use crate::config::DistributionConfig;
use crate::types::{Club, ClubCategory, ClubDistribution, DistributionSource, Shot};

use builder::{group_valid_shots, measured_distribution};
use imputation::{
    imputed_distribution, manual_carry, metrics_from_interpolation, metrics_from_manual_carry,
    DispersionModel, LoftAnchor,
};

/// Loft of a club that may be modelled, or `None` if it is excluded.
fn modelled_loft(club: &Club) -> Option<f64> {
    if club.category == ClubCategory::Putter {
        return None;
    }
    club.loft.filter(|l| l.is_finite() && *l > 0.0)
}

/// Build distributions for every modelled club, in bag order.
///
/// Clubs that can be neither measured nor imputed are left out.
pub fn build_distributions(
    clubs: &[Club],
    shots: &[Shot],
    config: &DistributionConfig,
) -> Vec<ClubDistribution> {
    let by_club = group_valid_shots(shots, config);

    // Pass 1: measured
    let mut slots: Vec<Option<ClubDistribution>> = clubs
        .iter()
        .map(|club| {
            let loft = modelled_loft(club)?;
            let club_shots = by_club.get(&club.id)?;
            if club_shots.len() < config.min_shots {
                return None;
            }
            Some(measured_distribution(club, loft, club_shots, config))
        })
        .collect();

    let measured: Vec<ClubDistribution> = slots.iter().flatten().cloned().collect();
    let dispersion = DispersionModel::fit(&measured);

    // Pass 2: manual carry
    for (slot, club) in slots.iter_mut().zip(clubs) {
        if slot.is_some() {
            continue;
        }
        let Some(loft) = modelled_loft(club) else { continue };
        if let Some(carry) = manual_carry(club, config) {
            let metrics = metrics_from_manual_carry(loft, carry);
            *slot = Some(imputed_distribution(
                club,
                loft,
                metrics,
                DistributionSource::ManualCarry,
                &dispersion,
                config,
            ));
        }
    }

    // Pass 3: interpolation across everything known so far
    let anchors: Vec<LoftAnchor> = slots.iter().flatten().map(LoftAnchor::from).collect();
    for (slot, club) in slots.iter_mut().zip(clubs) {
        if slot.is_some() {
            continue;
        }
        let Some(loft) = modelled_loft(club) else {
            debug!(club = %club.name, "Club excluded (no loft or putter)");
            continue;
        };
        match metrics_from_interpolation(loft, &anchors) {
            Some(metrics) => {
                *slot = Some(imputed_distribution(
                    club,
                    loft,
                    metrics,
                    DistributionSource::Interpolated,
                    &dispersion,
                    config,
                ));
            }
            None => {
                debug!(club = %club.name, "No data to impute club from, skipped");
            }
        }
    }

    let distributions: Vec<ClubDistribution> = slots.into_iter().flatten().collect();
    info!(
        clubs = clubs.len(),
        measured = measured.len(),
        modelled = distributions.len(),
        "Club distributions built"
    );
    distributions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShotShape;

    fn club(id: i64, name: &str, category: ClubCategory, loft: Option<f64>) -> Club {
        Club {
            id,
            name: name.to_string(),
            category,
            loft,
            manual_carry: None,
            manual_total: None,
            preferred_shape: None,
        }
    }

    fn shots_for(club_id: i64, carries: &[f64], offline: f64) -> Vec<Shot> {
        carries
            .iter()
            .enumerate()
            .map(|(i, &carry)| Shot {
                club_id,
                carry_yards: carry,
                offline_yards: Some(offline + if i % 2 == 0 { 4.0 } else { -4.0 }),
                ball_speed_mph: Some(carry * 0.7),
                launch_angle_deg: None,
                spin_rpm: None,
                apex_yards: None,
                descent_angle_deg: None,
                quality: None,
                shape: None,
            })
            .collect()
    }

    #[test]
    fn test_putter_and_loftless_clubs_excluded() {
        let config = DistributionConfig::default();
        let mut putter = club(1, "Putter", ClubCategory::Putter, Some(3.0));
        putter.manual_carry = Some(20.0);
        let mut mystery = club(2, "Mystery", ClubCategory::Iron, None);
        mystery.manual_carry = Some(150.0);
        let dists = build_distributions(&[putter, mystery], &[], &config);
        assert!(dists.is_empty());
    }

    #[test]
    fn test_manual_carry_identity_with_reference_row() {
        let config = DistributionConfig::default();
        let mut seven = club(7, "7 Iron", ClubCategory::Iron, Some(33.0));
        seven.manual_carry = Some(172.0);
        seven.preferred_shape = Some(ShotShape::Draw);

        let dists = build_distributions(&[seven], &[], &config);
        assert_eq!(dists.len(), 1);
        let d = &dists[0];
        assert_eq!(d.source, DistributionSource::ManualCarry);
        assert_eq!(d.metrics.ball_speed, Some(123.0));
        assert_eq!(d.metrics.apex, Some(32.0));
        assert_eq!(d.metrics.spin_rate, Some(7097.0));
        assert_eq!(d.preferred_shape, Some(ShotShape::Draw));
    }

    #[test]
    fn test_manual_total_converted_to_carry() {
        let config = DistributionConfig::default();
        let mut hybrid = club(4, "Hybrid", ClubCategory::Hybrid, Some(21.0));
        hybrid.manual_total = Some(200.0);
        let dists = build_distributions(&[hybrid], &[], &config);
        assert!((dists[0].mean_carry - 186.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_between_measured_clubs() {
        let config = DistributionConfig::default();
        let clubs = vec![
            club(5, "5 Iron", ClubCategory::Iron, Some(27.0)),
            club(7, "7 Iron", ClubCategory::Iron, Some(33.0)),
            club(9, "9 Iron", ClubCategory::Iron, Some(41.0)),
        ];
        let mut shots = shots_for(5, &[185.0, 190.0, 195.0, 190.0], 3.0);
        shots.extend(shots_for(9, &[145.0, 150.0, 155.0, 150.0], 1.0));

        let dists = build_distributions(&clubs, &shots, &config);
        assert_eq!(dists.len(), 3);
        assert_eq!(dists[1].club_id, 7);
        assert_eq!(dists[1].source, DistributionSource::Interpolated);
        // 190 at 27°, 150 at 41° → 172.857 at 33°
        assert!((dists[1].mean_carry - (190.0 - 40.0 * 6.0 / 14.0)).abs() < 1e-6);
        // Offline mean regressed between the two measured clubs
        assert!(dists[1].mean_offline > 1.0 && dists[1].mean_offline < 3.0);
        assert_eq!(dists[1].shot_count, 0);
    }

    #[test]
    fn test_too_few_shots_falls_through_to_imputation() {
        let config = DistributionConfig::default();
        let mut pw = club(10, "PW", ClubCategory::Wedge, Some(45.0));
        pw.manual_carry = Some(130.0);
        let shots = shots_for(10, &[120.0, 121.0], 0.0);
        let dists = build_distributions(&[pw], &shots, &config);
        assert_eq!(dists[0].source, DistributionSource::ManualCarry);
        assert!((dists[0].mean_carry - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_spread_is_always_positive() {
        let config = DistributionConfig::default();
        let clubs = vec![
            club(1, "Driver", ClubCategory::Driver, Some(10.5)),
            club(5, "5 Iron", ClubCategory::Iron, Some(27.0)),
            club(8, "8 Iron", ClubCategory::Iron, Some(37.0)),
            club(12, "SW", ClubCategory::Wedge, Some(56.0)),
        ];
        let mut shots = shots_for(1, &[250.0, 250.0, 250.0], 0.0);
        shots.extend(shots_for(5, &[190.0, 190.0, 190.0], 0.0));
        for s in shots.iter_mut() {
            s.offline_yards = Some(0.0);
        }
        let dists = build_distributions(&clubs, &shots, &config);
        assert_eq!(dists.len(), 4);
        for d in &dists {
            assert!(d.std_carry > 0.0, "{} std_carry", d.club_name);
            assert!(d.std_offline > 0.0, "{} std_offline", d.club_name);
        }
    }

    #[test]
    fn test_single_known_club_cannot_interpolate() {
        let config = DistributionConfig::default();
        let clubs = vec![
            club(5, "5 Iron", ClubCategory::Iron, Some(27.0)),
            club(7, "7 Iron", ClubCategory::Iron, Some(33.0)),
        ];
        let shots = shots_for(5, &[185.0, 190.0, 195.0], 0.0);
        let dists = build_distributions(&clubs, &shots, &config);
        assert_eq!(dists.len(), 1);
        assert_eq!(dists[0].club_id, 5);
    }
}
