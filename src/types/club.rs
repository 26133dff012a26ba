//! Club bag, practice shots and the per-club dispersion model derived from them

use serde::{Deserialize, Serialize};

/// Row identifier handed out by the persistence collaborator.
pub type ClubId = i64;

// ============================================================================
// Club Bag
// ============================================================================

/// Broad club family. Putters never receive a distribution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClubCategory {
    Driver,
    Wood,
    Hybrid,
    #[default]
    Iron,
    Wedge,
    Putter,
}

/// Curvature of a ball flight, relative to a right-handed golfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ShotShape {
    Straight,
    Draw,
    Fade,
    Hook,
    Slice,
}

impl ShotShape {
    /// Side the ball finishes on when this shape is over-done.
    /// `None` for a straight ball.
    pub fn miss_side(self) -> Option<Side> {
        match self {
            ShotShape::Straight => None,
            ShotShape::Draw | ShotShape::Hook => Some(Side::Left),
            ShotShape::Fade | ShotShape::Slice => Some(Side::Right),
        }
    }
}

impl std::fmt::Display for ShotShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShotShape::Straight => write!(f, "straight"),
            ShotShape::Draw => write!(f, "draw"),
            ShotShape::Fade => write!(f, "fade"),
            ShotShape::Hook => write!(f, "hook"),
            ShotShape::Slice => write!(f, "slice"),
        }
    }
}

/// Lateral side of a flight line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// A club in the golfer's bag as stored by the persistence collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Club {
    pub id: ClubId,
    pub name: String,
    #[serde(default)]
    pub category: ClubCategory,
    /// Static loft in degrees. Clubs without a loft are never modelled.
    #[serde(default)]
    pub loft: Option<f64>,
    /// Golfer-entered carry yardage, used when no practice data exists
    #[serde(default)]
    pub manual_carry: Option<f64>,
    /// Golfer-entered total (carry + roll) yardage
    #[serde(default)]
    pub manual_total: Option<f64>,
    #[serde(default)]
    pub preferred_shape: Option<ShotShape>,
}

// ============================================================================
// Practice Shots
// ============================================================================

/// Self-reported or monitor-tagged strike quality.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ShotQuality {
    Good,
    Average,
    Mishit,
}

/// One recorded practice shot. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shot {
    pub club_id: ClubId,
    pub carry_yards: f64,
    /// Signed lateral miss: negative = left, positive = right
    #[serde(default)]
    pub offline_yards: Option<f64>,
    #[serde(default)]
    pub ball_speed_mph: Option<f64>,
    #[serde(default)]
    pub launch_angle_deg: Option<f64>,
    #[serde(default)]
    pub spin_rpm: Option<f64>,
    #[serde(default)]
    pub apex_yards: Option<f64>,
    #[serde(default)]
    pub descent_angle_deg: Option<f64>,
    #[serde(default)]
    pub quality: Option<ShotQuality>,
    #[serde(default)]
    pub shape: Option<ShotShape>,
}

// ============================================================================
// Derived Dispersion Model
// ============================================================================

/// Launch and flight metrics for a club, either averaged from shots or imputed.
///
/// `carry` is always known; the rest are absent when no shot or reference
/// data could supply them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ClubMetrics {
    pub carry: f64,
    pub ball_speed: Option<f64>,
    pub launch_angle: Option<f64>,
    pub spin_rate: Option<f64>,
    pub apex: Option<f64>,
    pub descent_angle: Option<f64>,
}

/// Where a distribution's numbers came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DistributionSource {
    /// Sample statistics over recorded shots
    Measured,
    /// Manual carry scaled onto the physics reference curve
    ManualCarry,
    /// Interpolated across the other clubs' loft/metric pairs
    Interpolated,
}

impl std::fmt::Display for DistributionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionSource::Measured => write!(f, "measured"),
            DistributionSource::ManualCarry => write!(f, "manual carry"),
            DistributionSource::Interpolated => write!(f, "interpolated"),
        }
    }
}

/// Gaussian carry/offline model for one club.
///
/// Derived, never persisted: rebuilt from the current shot set on every run.
/// Both standard deviations are strictly positive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClubDistribution {
    pub club_id: ClubId,
    pub club_name: String,
    pub loft: f64,
    pub mean_carry: f64,
    pub std_carry: f64,
    pub mean_offline: f64,
    pub std_offline: f64,
    pub source: DistributionSource,
    pub shot_count: usize,
    pub preferred_shape: Option<ShotShape>,
    pub metrics: ClubMetrics,
}
