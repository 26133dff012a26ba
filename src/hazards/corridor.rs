//! Hazard corridor attribution
//!
//! Hazards detected from map data are not labelled with a hole. A hazard
//! belongs to a hole when its centroid lies within a lateral band around the
//! tee→pin segment. Out-of-bounds and tree lines run alongside holes, so their
//! band is wider.
//!
//! Shared hazard types (out of bounds, trees, water) often border two holes
//! but were saved against only one. They can be imported from neighbouring
//! holes when they fall inside this hole's corridor and do not duplicate a
//! hazard already present.

use tracing::debug;

use crate::config::HazardConfig;
use crate::geo::{distance_to_segment_yards, distance_yards, polygon_centroid};
use crate::types::{CourseHole, Hazard, LatLng};

/// Lateral threshold for a hazard of this type.
pub fn corridor_threshold(hazard: &Hazard, config: &HazardConfig) -> f64 {
    if hazard.hazard_type.is_boundary_like() {
        config.corridor_half_width_yards * config.wide_corridor_multiplier
    } else {
        config.corridor_half_width_yards
    }
}

/// Perpendicular distance from the hazard's centroid to the tee→pin segment.
///
/// `None` for hazards that are not testable.
pub fn corridor_distance(hazard: &Hazard, tee: LatLng, pin: LatLng) -> Option<f64> {
    if !hazard.is_testable() {
        return None;
    }
    let centroid = polygon_centroid(&hazard.polygon)?;
    Some(distance_to_segment_yards(centroid, tee, pin))
}

/// Whether the hazard lies within its corridor around tee→pin.
pub fn is_within_corridor(hazard: &Hazard, tee: LatLng, pin: LatLng, config: &HazardConfig) -> bool {
    corridor_distance(hazard, tee, pin)
        .is_some_and(|d| d <= corridor_threshold(hazard, config))
}

/// Keep only hazards attributable to the hole running tee→pin.
pub fn filter_to_corridor(
    tee: LatLng,
    pin: LatLng,
    hazards: Vec<Hazard>,
    config: &HazardConfig,
) -> Vec<Hazard> {
    let before = hazards.len();
    let kept: Vec<Hazard> = hazards
        .into_iter()
        .filter(|h| is_within_corridor(h, tee, pin, config))
        .collect();
    debug!(before, kept = kept.len(), "Hazards filtered to hole corridor");
    kept
}

fn duplicates_existing(candidate: &Hazard, existing: &[Hazard], config: &HazardConfig) -> bool {
    let Some(c) = polygon_centroid(&candidate.polygon) else {
        return true;
    };
    existing
        .iter()
        .filter(|e| e.hazard_type == candidate.hazard_type)
        .filter_map(|e| polygon_centroid(&e.polygon))
        .any(|ec| distance_yards(c, ec) <= config.dedup_radius_yards)
}

/// Shared-type hazards from `others` that should also apply to `hole`.
///
/// `others` may include `hole` itself (matched by hole number and skipped).
pub fn import_shared_hazards(
    hole: &CourseHole,
    others: &[CourseHole],
    config: &HazardConfig,
) -> Vec<Hazard> {
    let mut present: Vec<Hazard> = hole.hazards.clone();
    let mut imported = Vec::new();

    for other in others.iter().filter(|o| o.number != hole.number) {
        for hazard in other.hazards.iter().filter(|h| h.hazard_type.is_shared()) {
            if !is_within_corridor(hazard, hole.tee, hole.pin, config) {
                continue;
            }
            if duplicates_existing(hazard, &present, config) {
                continue;
            }
            debug!(
                hole = hole.number,
                from_hole = other.number,
                hazard = %hazard.name,
                "Imported shared hazard"
            );
            present.push(hazard.clone());
            imported.push(hazard.clone());
        }
    }
    imported
}

/// Apply [`import_shared_hazards`] to every hole of a course.
///
/// Imports are computed against the hazards as loaded, so a hazard imported
/// into one hole is not re-exported from it.
pub fn share_hazards_across_holes(holes: &mut [CourseHole], config: &HazardConfig) {
    let snapshot: Vec<CourseHole> = holes.to_vec();
    for hole in holes.iter_mut() {
        let extra = import_shared_hazards(hole, &snapshot, config);
        hole.hazards.extend(extra);
    }
}
