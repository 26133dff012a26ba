//! Hazard containment tests

use crate::geo::{self, distance_yards, polygon_centroid};
use crate::types::{Hazard, LatLng};

/// First hazard, in input order, whose polygon contains `point`.
///
/// Rings with fewer than three vertices and rejected hazards are skipped.
pub fn check_hazards(point: LatLng, hazards: &[Hazard]) -> Option<&Hazard> {
    hazards
        .iter()
        .filter(|h| h.is_testable())
        .find(|h| geo::point_in_polygon(point, &h.polygon))
}

/// Testable hazard whose centroid is closest to `point`, with that distance.
pub fn nearest_hazard(point: LatLng, hazards: &[Hazard]) -> Option<(&Hazard, f64)> {
    hazards
        .iter()
        .filter(|h| h.is_testable())
        .filter_map(|h| polygon_centroid(&h.polygon).map(|c| (h, distance_yards(point, c))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
