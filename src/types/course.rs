//! Course and hole geometry as mapped by the course-import collaborator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::LatLng;

pub type CourseId = i64;

// ============================================================================
// Hazards
// ============================================================================

/// Kind of hazard polygon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HazardType {
    Water,
    Bunker,
    OutOfBounds,
    Trees,
    Other,
}

impl HazardType {
    /// Boundary-like hazards run along a hole rather than across it, so they
    /// get a wider attribution corridor.
    pub fn is_boundary_like(self) -> bool {
        matches!(self, HazardType::OutOfBounds | HazardType::Trees)
    }

    /// Types commonly shared between adjacent holes.
    pub fn is_shared(self) -> bool {
        matches!(
            self,
            HazardType::OutOfBounds | HazardType::Trees | HazardType::Water
        )
    }
}

impl std::fmt::Display for HazardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HazardType::Water => write!(f, "water"),
            HazardType::Bunker => write!(f, "bunker"),
            HazardType::OutOfBounds => write!(f, "out of bounds"),
            HazardType::Trees => write!(f, "trees"),
            HazardType::Other => write!(f, "hazard"),
        }
    }
}

/// Review state of an auto-detected hazard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum HazardStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

/// A hazard polygon attached to a hole.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hazard {
    pub name: String,
    pub hazard_type: HazardType,
    /// Strokes added when a ball comes to rest inside the polygon
    pub penalty: f64,
    /// Detection confidence in [0, 1]
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    pub polygon: Vec<LatLng>,
    #[serde(default)]
    pub status: HazardStatus,
}

fn default_confidence() -> f64 {
    1.0
}

impl Hazard {
    /// Only rings with three or more vertices that were not rejected take part
    /// in containment tests or corridor filtering.
    pub fn is_testable(&self) -> bool {
        self.polygon.len() >= 3 && self.status != HazardStatus::Rejected
    }
}

// ============================================================================
// Holes & Courses
// ============================================================================

/// One hole: scorecard data plus mapped geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseHole {
    pub number: u32,
    pub par: u8,
    /// Scorecard yardage keyed by tee box name
    #[serde(default)]
    pub yardages: BTreeMap<String, f64>,
    /// Elevation-adjusted yardage keyed by tee box name
    #[serde(default)]
    pub plays_like_yardages: BTreeMap<String, f64>,
    pub tee: LatLng,
    #[serde(default)]
    pub tee_elevation_m: Option<f64>,
    pub pin: LatLng,
    #[serde(default)]
    pub pin_elevation_m: Option<f64>,
    /// Ordered points from tee towards the green, excluding tee and pin
    #[serde(default)]
    pub centerline: Vec<LatLng>,
    /// Ordered layup targets placed by the course mapper
    #[serde(default)]
    pub targets: Vec<LatLng>,
    #[serde(default)]
    pub hazards: Vec<Hazard>,
    #[serde(default)]
    pub fairways: Vec<Vec<LatLng>>,
    #[serde(default)]
    pub greens: Vec<Vec<LatLng>>,
}

/// A course with its holes in playing order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub holes: Vec<CourseHole>,
}
