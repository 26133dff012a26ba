//! Game Plan Aggregator
//!
//! Runs the simulator over every candidate strategy of every hole, keeps the
//! winner per hole for the active [`PlanMode`] and rolls the holes up into a
//! round forecast.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::defaults::YARDS_PER_METRE;
use crate::config::{EngineConfig, PlanConfig};
use crate::geo::distance_yards;
use crate::hazards::share_hazards_across_holes;
use crate::simulation::simulate_strategy;
use crate::strategy::generate_strategies;
use crate::types::{
    ClubDistribution, Course, CourseHole, GamePlan, HolePlan, OptimizedStrategy, PlanMode,
    RiskTier, ScoreDistribution, StrategySummary,
};

// ============================================================================
// Per-hole helpers
// ============================================================================

/// Scorecard yardage for a tee box, or the straight tee→pin distance.
pub fn scorecard_yardage(hole: &CourseHole, tee_box: &str) -> f64 {
    hole.yardages
        .get(tee_box)
        .copied()
        .filter(|y| *y > 0.0)
        .unwrap_or_else(|| distance_yards(hole.tee, hole.pin))
}

/// Plays-like yardage for a tee box.
///
/// Uses the stored value when present, else adjusts the scorecard yardage by
/// the pin-minus-tee elevation change.
pub fn plays_like_yardage(hole: &CourseHole, tee_box: &str) -> f64 {
    if let Some(y) = hole.plays_like_yardages.get(tee_box).copied().filter(|y| *y > 0.0) {
        return y;
    }
    let yardage = scorecard_yardage(hole, tee_box);
    match (hole.tee_elevation_m, hole.pin_elevation_m) {
        (Some(tee), Some(pin)) => yardage + (pin - tee) * YARDS_PER_METRE,
        _ => yardage,
    }
}

pub fn risk_tier(distribution: &ScoreDistribution, config: &PlanConfig) -> RiskTier {
    let blowup = distribution.blowup();
    if blowup >= config.red_blowup_threshold {
        RiskTier::Red
    } else if distribution.birdie_or_better() >= config.green_birdie_threshold
        && blowup < config.green_max_blowup
    {
        RiskTier::Green
    } else {
        RiskTier::Yellow
    }
}

/// Order strategies best-first for `mode`.
///
/// Scoring ranks by expected strokes, safe by blow-up risk; each breaks ties
/// with the other measure.
pub fn rank_strategies(strategies: &mut [OptimizedStrategy], mode: PlanMode) {
    strategies.sort_by(|a, b| match mode {
        PlanMode::Scoring => a
            .expected_strokes
            .total_cmp(&b.expected_strokes)
            .then(a.blowup_risk.total_cmp(&b.blowup_risk)),
        PlanMode::Safe => a
            .blowup_risk
            .total_cmp(&b.blowup_risk)
            .then(a.expected_strokes.total_cmp(&b.expected_strokes)),
    });
}

/// Simulate every candidate for a hole, ranked best-first.
///
/// Candidates run in parallel, each on its own generator seeded from `rng`,
/// so a fixed seed gives the same answer regardless of thread scheduling.
/// Empty when the hole has no candidates.
pub fn optimize_hole<R: Rng + ?Sized>(
    hole: &CourseHole,
    tee_box: &str,
    distributions: &[ClubDistribution],
    mode: PlanMode,
    config: &EngineConfig,
    rng: &mut R,
) -> Vec<OptimizedStrategy> {
    let plans = generate_strategies(hole, tee_box, distributions, &config.strategy, &config.hazards);
    if plans.is_empty() {
        return Vec::new();
    }

    let base_seed: u64 = rng.gen();
    let trials = config.simulation.trials;
    let mut results: Vec<OptimizedStrategy> = plans
        .par_iter()
        .enumerate()
        .map(|(i, plan)| {
            let mut trial_rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));
            simulate_strategy(plan, hole, distributions, &config.simulation, trials, &mut trial_rng)
        })
        .collect();

    rank_strategies(&mut results, mode);
    results
}

/// Winning strategy and summary for one hole. `None` when nothing could be planned.
pub fn plan_hole<R: Rng + ?Sized>(
    hole: &CourseHole,
    tee_box: &str,
    distributions: &[ClubDistribution],
    mode: PlanMode,
    config: &EngineConfig,
    rng: &mut R,
) -> Option<HolePlan> {
    let ranked = optimize_hole(hole, tee_box, distributions, mode, config, rng);

    let candidates: Vec<StrategySummary> = ranked
        .iter()
        .map(|s| StrategySummary {
            name: s.name.clone(),
            category: s.category,
            expected_strokes: s.expected_strokes,
            blowup_risk: s.blowup_risk,
        })
        .collect();
    let (best, worst) = ranked.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.expected_strokes), hi.max(s.expected_strokes))
    });

    let winner = ranked.into_iter().next()?;
    Some(HolePlan {
        hole_number: hole.number,
        par: hole.par,
        yardage: scorecard_yardage(hole, tee_box),
        plays_like_yardage: plays_like_yardage(hole, tee_box),
        risk_tier: risk_tier(&winner.score_distribution, &config.plan),
        strategy: winner,
        candidates,
        strategy_spread: worst - best,
    })
}

/// Holes with the largest best-to-worst spread, largest first.
pub fn key_holes(holes: &[HolePlan], count: usize) -> Vec<u32> {
    let mut by_spread: Vec<&HolePlan> = holes.iter().collect();
    by_spread.sort_by(|a, b| {
        b.strategy_spread
            .total_cmp(&a.strategy_spread)
            .then(a.hole_number.cmp(&b.hole_number))
    });
    by_spread.into_iter().take(count).map(|h| h.hole_number).collect()
}

// ============================================================================
// Whole round
// ============================================================================

/// Plan every hole of `course` from `tee_box`.
///
/// Shared hazards are imported across neighbouring holes first. Holes that
/// produce no strategies are left out of the plan and its totals.
pub fn build_game_plan<R: Rng + ?Sized>(
    course: &Course,
    tee_box: &str,
    mode: PlanMode,
    distributions: &[ClubDistribution],
    config: &EngineConfig,
    rng: &mut R,
) -> GamePlan {
    let mut holes = course.holes.clone();
    share_hazards_across_holes(&mut holes, &config.hazards);

    let mut plans = Vec::with_capacity(holes.len());
    for hole in &holes {
        match plan_hole(hole, tee_box, distributions, mode, config, rng) {
            Some(plan) => plans.push(plan),
            None => debug!(course_id = course.id, hole = hole.number, "Hole skipped, no strategies"),
        }
    }

    let total_par: u32 = plans.iter().map(|h| u32::from(h.par)).sum();
    let total_expected_strokes: f64 = plans.iter().map(|h| h.strategy.expected_strokes).sum();
    let total_plays_like_yards: f64 = plans.iter().map(|h| h.plays_like_yardage).sum();
    let distributions_per_hole: Vec<ScoreDistribution> =
        plans.iter().map(|h| h.strategy.score_distribution).collect();
    let key_holes = key_holes(&plans, config.plan.key_hole_count);

    info!(
        course_id = course.id,
        tee = %tee_box,
        %mode,
        holes = plans.len(),
        expected = total_expected_strokes,
        "Game plan built"
    );

    GamePlan {
        course_id: course.id,
        course_name: course.name.clone(),
        tee_box: tee_box.to_string(),
        mode,
        holes: plans,
        total_par,
        total_expected_strokes,
        score_distribution: ScoreDistribution::mean_of(&distributions_per_hole),
        total_plays_like_yards,
        key_holes,
        generated_at: Utc::now(),
    }
}
