//! Per-hole and whole-round game plans

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CourseId, OptimizedStrategy, ScoreDistribution, StrategyCategory};

/// Ranking mode used to pick the winning strategy on each hole.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// Lowest expected strokes
    #[default]
    Scoring,
    /// Lowest blow-up risk
    Safe,
}

impl PlanMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanMode::Scoring => "scoring",
            PlanMode::Safe => "safe",
        }
    }
}

impl std::fmt::Display for PlanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scoring" => Ok(PlanMode::Scoring),
            "safe" => Ok(PlanMode::Safe),
            other => Err(format!("unknown plan mode '{other}' (expected scoring|safe)")),
        }
    }
}

/// Colour-coded difficulty of a hole under its winning strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Green,
    Yellow,
    Red,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Green => write!(f, "GREEN"),
            RiskTier::Yellow => write!(f, "YELLOW"),
            RiskTier::Red => write!(f, "RED"),
        }
    }
}

/// Headline numbers for a candidate that did not necessarily win.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategySummary {
    pub name: String,
    pub category: StrategyCategory,
    pub expected_strokes: f64,
    pub blowup_risk: f64,
}

/// Winning strategy for a single hole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HolePlan {
    pub hole_number: u32,
    pub par: u8,
    pub yardage: f64,
    pub plays_like_yardage: f64,
    pub strategy: OptimizedStrategy,
    pub risk_tier: RiskTier,
    pub candidates: Vec<StrategySummary>,
    /// Worst minus best candidate expected strokes
    pub strategy_spread: f64,
}

/// Whole-round plan for one course, tee box and mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GamePlan {
    pub course_id: CourseId,
    pub course_name: String,
    pub tee_box: String,
    pub mode: PlanMode,
    pub holes: Vec<HolePlan>,
    pub total_par: u32,
    pub total_expected_strokes: f64,
    pub score_distribution: ScoreDistribution,
    pub total_plays_like_yards: f64,
    /// Hole numbers where strategy choice matters most
    pub key_holes: Vec<u32>,
    pub generated_at: DateTime<Utc>,
}
