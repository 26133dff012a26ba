//! Candidate strategies and their simulated outcomes

use serde::{Deserialize, Serialize};

use super::{ClubDistribution, LatLng};

// ============================================================================
// Candidate Plans
// ============================================================================

/// Risk posture a strategy is designed around.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StrategyCategory {
    Scoring,
    Safe,
    Balanced,
}

impl std::fmt::Display for StrategyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyCategory::Scoring => write!(f, "scoring"),
            StrategyCategory::Safe => write!(f, "safe"),
            StrategyCategory::Balanced => write!(f, "balanced"),
        }
    }
}

/// One planned shot: which club, aimed where.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedShot {
    pub club: ClubDistribution,
    pub aim: LatLng,
}

/// A named sequence of planned shots. Always holds at least one shot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedStrategyPlan {
    pub name: String,
    pub category: StrategyCategory,
    pub shots: Vec<PlannedShot>,
}

// ============================================================================
// Simulated Outcome
// ============================================================================

/// Fraction of trials finishing in each score bucket relative to par.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ScoreDistribution {
    /// -2 or better
    pub eagle: f64,
    pub birdie: f64,
    pub par: f64,
    pub bogey: f64,
    pub double: f64,
    /// +3 or worse
    pub worse: f64,
}

impl ScoreDistribution {
    /// Build from per-trial scores relative to par, already rounded.
    pub fn from_relative_scores(scores: &[i32]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let mut counts = [0usize; 6];
        for &s in scores {
            let bucket = (s.clamp(-2, 3) + 2) as usize;
            counts[bucket] += 1;
        }
        let n = scores.len() as f64;
        Self {
            eagle: counts[0] as f64 / n,
            birdie: counts[1] as f64 / n,
            par: counts[2] as f64 / n,
            bogey: counts[3] as f64 / n,
            double: counts[4] as f64 / n,
            worse: counts[5] as f64 / n,
        }
    }

    /// Element-wise mean of several distributions.
    pub fn mean_of(items: &[ScoreDistribution]) -> Self {
        if items.is_empty() {
            return Self::default();
        }
        let n = items.len() as f64;
        let sum = items.iter().fold(Self::default(), |acc, d| Self {
            eagle: acc.eagle + d.eagle,
            birdie: acc.birdie + d.birdie,
            par: acc.par + d.par,
            bogey: acc.bogey + d.bogey,
            double: acc.double + d.double,
            worse: acc.worse + d.worse,
        });
        Self {
            eagle: sum.eagle / n,
            birdie: sum.birdie / n,
            par: sum.par / n,
            bogey: sum.bogey / n,
            double: sum.double / n,
            worse: sum.worse / n,
        }
    }

    pub fn total(&self) -> f64 {
        self.eagle + self.birdie + self.par + self.bogey + self.double + self.worse
    }

    /// P(double) + P(worse)
    pub fn blowup(&self) -> f64 {
        self.double + self.worse
    }

    pub fn birdie_or_better(&self) -> f64 {
        self.eagle + self.birdie
    }
}

/// Per-shot guidance attached to a simulated strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShotAnnotation {
    pub club_name: String,
    /// Expected carry of the club, yards
    pub carry_yards: f64,
    /// Where the golfer should actually aim (bias-corrected)
    pub aim: LatLng,
    /// Where the shot is intended to finish
    pub target: LatLng,
    pub carry_note: Option<String>,
    pub caddie_tip: String,
}

/// A candidate strategy after Monte Carlo evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizedStrategy {
    pub name: String,
    pub category: StrategyCategory,
    /// Mean strokes over all trials, always >= 1
    pub expected_strokes: f64,
    pub std_strokes: f64,
    pub score_distribution: ScoreDistribution,
    pub blowup_risk: f64,
    pub trials: u32,
    pub shots: Vec<ShotAnnotation>,
}
