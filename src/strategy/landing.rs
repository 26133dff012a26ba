//! Club selection and hazard-avoiding landing spots

use crate::geo::{self, bearing_deg, offset_point, polygon_centroid, signed_lateral_yards};
use crate::hazards::check_hazards;
use crate::types::{ClubDistribution, Hazard, LatLng};

/// Club whose mean carry is closest to `distance`. Ties go to the first in
/// bag order.
pub fn closest_club(clubs: &[ClubDistribution], distance: f64) -> Option<&ClubDistribution> {
    clubs.iter().min_by(|a, b| {
        (a.mean_carry - distance)
            .abs()
            .total_cmp(&(b.mean_carry - distance).abs())
    })
}

/// Club with the greatest mean carry.
pub fn longest_club(clubs: &[ClubDistribution]) -> Option<&ClubDistribution> {
    clubs
        .iter()
        .reduce(|best, c| if c.mean_carry > best.mean_carry { c } else { best })
}

/// Club with the smallest mean carry.
pub fn shortest_club(clubs: &[ClubDistribution]) -> Option<&ClubDistribution> {
    clubs
        .iter()
        .reduce(|best, c| if c.mean_carry < best.mean_carry { c } else { best })
}

/// Longest club that carries at least `gap` yards less than `longest`.
pub fn layup_club(clubs: &[ClubDistribution], longest: f64, gap: f64) -> Option<&ClubDistribution> {
    clubs
        .iter()
        .filter(|c| c.mean_carry <= longest - gap)
        .reduce(|best, c| if c.mean_carry > best.mean_carry { c } else { best })
}

/// Move a target out of any hazard it sits in.
///
/// Tries the given lateral offsets (relative to the `from`→`target` line)
/// on both sides, trying the side away from the offending hazard first, and
/// returns the first clear spot. Falls back to the raw target when every
/// candidate spot is wet.
pub fn find_safe_landing(
    from: LatLng,
    target: LatLng,
    hazards: &[Hazard],
    offsets: &[f64],
) -> LatLng {
    let Some(hazard) = check_hazards(target, hazards) else {
        return target;
    };
    if geo::distance_yards(from, target) == 0.0 {
        return target;
    }

    let heading = bearing_deg(from, target);
    // Hazard centroid right of the line → try left first.
    let away = match polygon_centroid(&hazard.polygon) {
        Some(c) if signed_lateral_yards(from, target, c) > 0.0 => -1.0,
        _ => 1.0,
    };

    for &offset in offsets {
        for side in [away, -away] {
            let spot = offset_point(target, heading, 0.0, side * offset);
            if check_hazards(spot, hazards).is_none() {
                return spot;
            }
        }
    }
    target
}
