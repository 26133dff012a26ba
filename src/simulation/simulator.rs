//! Trial loop
//!
//! One trial plays the hole from the tee: planned shots first, then greedy
//! closest-carry shots at the pin until the ball is inside chip range or
//! the full-shot cap is reached, then the short-game cost from
//! [`super::putting`]. Every full shot goes through [`take_shot`].

use rand::Rng;
use rand_distr::{Distribution, Normal};
use statrs::statistics::Statistics;
use tracing::debug;

use crate::config::SimulationConfig;
use crate::geo::{bearing_deg, distance_yards, move_toward, offset_point};
use crate::hazards::check_hazards;
use crate::strategy::{closest_club, shortest_club};
use crate::types::{
    ClubDistribution, CourseHole, Hazard, LatLng, NamedStrategyPlan, OptimizedStrategy,
    ScoreDistribution,
};

use super::annotations::annotate_plan;
use super::putting::{chip_range, finish_cost};

/// Spread used when a distribution's own spread is unusable.
const MIN_SAMPLING_STD: f64 = 0.5;

// ============================================================================
// Single Shot
// ============================================================================

/// Where a simulated shot finished and what it cost beyond the stroke itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotOutcome {
    pub landing: LatLng,
    pub penalty: f64,
}

/// Aim point that cancels the club's average lateral miss.
///
/// Shifting the aim by `-mean_offline` perpendicular to the line of play
/// centres the expected landing on `target`.
pub fn bias_corrected_aim(from: LatLng, target: LatLng, club: &ClubDistribution) -> LatLng {
    if club.mean_offline == 0.0 || from == target {
        return target;
    }
    offset_point(target, bearing_deg(from, target), 0.0, -club.mean_offline)
}

fn gaussian(mean: f64, std: f64) -> Option<Normal<f64>> {
    let std = if std.is_finite() && std > 0.0 { std } else { MIN_SAMPLING_STD };
    Normal::new(mean, std).ok()
}

/// Sample (carry, offline) for one swing. Carry never goes negative.
///
/// A club with non-finite means produces a whiff: no carry, no miss.
pub fn sample_swing<R: Rng + ?Sized>(rng: &mut R, club: &ClubDistribution) -> (f64, f64) {
    match (
        gaussian(club.mean_carry, club.std_carry),
        gaussian(club.mean_offline, club.std_offline),
    ) {
        (Some(carry), Some(offline)) => (carry.sample(rng).max(0.0), offline.sample(rng)),
        _ => (0.0, 0.0),
    }
}

/// Play one simulated full shot from `from` toward `target`.
///
/// A ball finishing in a hazard costs that hazard's penalty and is dropped a
/// short way back toward where it was played from.
pub fn take_shot<R: Rng + ?Sized>(
    rng: &mut R,
    from: LatLng,
    target: LatLng,
    club: &ClubDistribution,
    hazards: &[Hazard],
    config: &SimulationConfig,
) -> ShotOutcome {
    let aim = bias_corrected_aim(from, target, club);
    let heading = bearing_deg(from, aim);
    let (carry, offline) = sample_swing(rng, club);
    let landing = offset_point(from, heading, carry, offline);

    match check_hazards(landing, hazards) {
        Some(hazard) => ShotOutcome {
            landing: move_toward(landing, from, config.hazard_drop_yards),
            penalty: hazard.penalty,
        },
        None => ShotOutcome { landing, penalty: 0.0 },
    }
}

// ============================================================================
// Trials
// ============================================================================

/// Chip threshold for a bag: the configured floor or a fraction of the
/// shortest club's carry, whichever is larger.
pub fn chip_threshold(clubs: &[ClubDistribution], config: &SimulationConfig) -> f64 {
    let shortest = shortest_club(clubs).map(|c| c.mean_carry).unwrap_or(0.0);
    chip_range(shortest, config)
}

/// Total strokes for one trial, before rounding.
pub fn run_trial<R: Rng + ?Sized>(
    rng: &mut R,
    plan: &NamedStrategyPlan,
    hole: &CourseHole,
    clubs: &[ClubDistribution],
    chip_range: f64,
    config: &SimulationConfig,
) -> f64 {
    let pin = hole.pin;
    let mut position = hole.tee;
    let mut full_shots = 0u32;
    let mut strokes = 0.0;

    let play = |rng: &mut R, club: &ClubDistribution, target: LatLng, position: &mut LatLng| {
        let outcome = take_shot(rng, *position, target, club, &hole.hazards, config);
        *position = outcome.landing;
        1.0 + outcome.penalty
    };

    for shot in &plan.shots {
        if full_shots >= config.max_shots {
            break;
        }
        strokes += play(&mut *rng, &shot.club, shot.aim, &mut position);
        full_shots += 1;
        if distance_yards(position, pin) <= chip_range {
            break;
        }
    }

    while full_shots < config.max_shots {
        let remaining = distance_yards(position, pin);
        if remaining <= chip_range {
            break;
        }
        let Some(club) = closest_club(clubs, remaining) else {
            break;
        };
        strokes += play(&mut *rng, club, pin, &mut position);
        full_shots += 1;
    }

    strokes + finish_cost(distance_yards(position, pin), chip_range, config)
}

/// Evaluate a strategy over `trials` randomized trials.
///
/// A trial count of zero runs a single trial.
pub fn simulate_strategy<R: Rng + ?Sized>(
    plan: &NamedStrategyPlan,
    hole: &CourseHole,
    distributions: &[ClubDistribution],
    config: &SimulationConfig,
    trials: u32,
    rng: &mut R,
) -> OptimizedStrategy {
    let trials = trials.max(1);
    let chip_range = chip_threshold(distributions, config);
    let par = i32::from(hole.par);

    let totals: Vec<f64> = (0..trials)
        .map(|_| run_trial(&mut *rng, plan, hole, distributions, chip_range, config))
        .collect();

    let relative: Vec<i32> = totals.iter().map(|t| t.round() as i32 - par).collect();
    let score_distribution = ScoreDistribution::from_relative_scores(&relative);

    let expected_strokes = totals.iter().mean();
    let std_strokes = if totals.len() > 1 {
        totals.iter().std_dev()
    } else {
        0.0
    };

    debug!(
        hole = hole.number,
        strategy = %plan.name,
        trials,
        expected_strokes,
        "Strategy simulated"
    );

    OptimizedStrategy {
        name: plan.name.clone(),
        category: plan.category,
        expected_strokes,
        std_strokes,
        blowup_risk: score_distribution.blowup(),
        score_distribution,
        trials,
        shots: annotate_plan(plan, hole),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{offset_point, project, signed_lateral_yards};
    use crate::types::{
        ClubMetrics, DistributionSource, HazardStatus, HazardType, PlannedShot, StrategyCategory,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeMap;

    fn club(id: i64, carry: f64, std: f64, mean_offline: f64) -> ClubDistribution {
        ClubDistribution {
            club_id: id,
            club_name: format!("Club {id}"),
            loft: 20.0,
            mean_carry: carry,
            std_carry: std,
            mean_offline,
            std_offline: std,
            source: DistributionSource::Measured,
            shot_count: 20,
            preferred_shape: None,
            metrics: ClubMetrics { carry, ..Default::default() },
        }
    }

    fn hole(par: u8, length: f64, hazards: Vec<Hazard>) -> CourseHole {
        let tee = LatLng::new(40.0, -75.0);
        CourseHole {
            number: 7,
            par,
            yardages: BTreeMap::new(),
            plays_like_yardages: BTreeMap::new(),
            tee,
            tee_elevation_m: None,
            pin: project(tee, 0.0, length),
            pin_elevation_m: None,
            centerline: Vec::new(),
            targets: Vec::new(),
            hazards,
            fairways: Vec::new(),
            greens: Vec::new(),
        }
    }

    fn one_shot_plan(c: &ClubDistribution, aim: LatLng) -> NamedStrategyPlan {
        NamedStrategyPlan {
            name: "Test".to_string(),
            category: StrategyCategory::Balanced,
            shots: vec![PlannedShot { club: c.clone(), aim }],
        }
    }

    #[test]
    fn test_bias_correction_centres_expected_landing() {
        let tee = LatLng::new(40.0, -75.0);
        let target = project(tee, 0.0, 200.0);
        let c = club(1, 200.0, 1e-9, 8.0);
        let aim = bias_corrected_aim(tee, target, &c);
        assert!((signed_lateral_yards(tee, target, aim) + 8.0).abs() < 0.1);

        // Near-zero spread: the sampled shot lands on the target.
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = take_shot(&mut rng, tee, target, &c, &[], &SimulationConfig::default());
        assert!(distance_yards(outcome.landing, target) < 5.0);
        assert_eq!(outcome.penalty, 0.0);
    }

    #[test]
    fn test_hazard_landing_penalised_and_dropped_back() {
        let tee = LatLng::new(40.0, -75.0);
        let target = project(tee, 0.0, 150.0);
        let pond = Hazard {
            name: "Pond".to_string(),
            hazard_type: HazardType::Water,
            penalty: 1.0,
            confidence: 1.0,
            polygon: vec![
                offset_point(target, 0.0, 30.0, -30.0),
                offset_point(target, 0.0, 30.0, 30.0),
                offset_point(target, 0.0, -30.0, 30.0),
                offset_point(target, 0.0, -30.0, -30.0),
            ],
            status: HazardStatus::Accepted,
        };
        let c = club(1, 150.0, 1.0, 0.0);
        let mut rng = StdRng::seed_from_u64(3);
        let outcome = take_shot(&mut rng, tee, target, &c, &[pond], &SimulationConfig::default());
        assert_eq!(outcome.penalty, 1.0);
        assert!(distance_yards(tee, outcome.landing) < 145.0);
    }

    #[test]
    fn test_score_distribution_sums_to_one() {
        let c = club(1, 230.0, 12.0, 2.0);
        let h = hole(4, 380.0, Vec::new());
        let plan = one_shot_plan(&c, project(h.tee, 0.0, 230.0));
        let mut rng = StdRng::seed_from_u64(42);
        let bag = [c, club(2, 140.0, 8.0, 0.0)];
        let result =
            simulate_strategy(&plan, &h, &bag, &SimulationConfig::default(), 500, &mut rng);

        assert!((result.score_distribution.total() - 1.0).abs() < 1e-9);
        assert!(result.expected_strokes >= 1.0);
        assert!(result.std_strokes >= 0.0);
        assert_eq!(result.blowup_risk, result.score_distribution.blowup());
        assert_eq!(result.shots.len(), 1);
    }

    #[test]
    fn test_zero_trials_runs_one() {
        let c = club(1, 150.0, 5.0, 0.0);
        let h = hole(3, 150.0, Vec::new());
        let plan = one_shot_plan(&c, h.pin);
        let mut rng = StdRng::seed_from_u64(9);
        let result = simulate_strategy(&plan, &h, &[c], &SimulationConfig::default(), 0, &mut rng);
        assert_eq!(result.trials, 1);
        assert_eq!(result.std_strokes, 0.0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let c = club(1, 250.0, 10.0, 0.0);
        let h = hole(4, 400.0, Vec::new());
        let plan = one_shot_plan(&c, project(h.tee, 0.0, 250.0));
        let config = SimulationConfig::default();
        let bag = [c];
        let a = simulate_strategy(&plan, &h, &bag, &config, 300, &mut StdRng::seed_from_u64(5));
        let b = simulate_strategy(&plan, &h, &bag, &config, 300, &mut StdRng::seed_from_u64(5));
        assert_eq!(a.expected_strokes, b.expected_strokes);
        assert_eq!(a.score_distribution, b.score_distribution);
    }

    #[test]
    fn test_shot_cap_bounds_strokes() {
        // A club that barely moves never reaches chip range.
        let c = club(1, 1.0, 0.1, 0.0);
        let h = hole(4, 400.0, Vec::new());
        let plan = one_shot_plan(&c, h.pin);
        let config = SimulationConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let total = run_trial(&mut rng, &plan, &h, &[c], chip_threshold(&[], &config), &config);
        // Eight full shots, then capped putts from ~390 yards out
        assert_eq!(total, f64::from(config.max_shots) + config.putt_cap);
    }
}
