//! Per-shot guidance for a simulated plan
//!
//! Built once per strategy from the planned geometry, not per trial.

use crate::config::defaults::{FLIGHT_LINE_STEP_YARDS, NEARBY_HAZARD_RADIUS_YARDS, NOTABLE_BIAS_YARDS};
use crate::geo::{bearing_deg, distance_yards, polygon_centroid, project, signed_lateral_yards};
use crate::hazards::check_hazards;
use crate::types::{
    ClubDistribution, CourseHole, Hazard, LatLng, NamedStrategyPlan, ShotAnnotation, Side,
};

use super::simulator::bias_corrected_aim;

/// A hazard crossed by a flight line, as distances from the start of the line.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightLineCrossing<'a> {
    pub hazard: &'a Hazard,
    pub front_yards: f64,
    pub back_yards: f64,
}

/// First hazard the straight line `from`→`to` passes through before landing.
///
/// The line is sampled every few yards. A hazard the target itself sits in
/// is not reported; that is a landing problem, not a carry.
pub fn first_crossing<'a>(from: LatLng, to: LatLng, hazards: &'a [Hazard]) -> Option<FlightLineCrossing<'a>> {
    let length = distance_yards(from, to);
    if length <= FLIGHT_LINE_STEP_YARDS {
        return None;
    }
    let heading = bearing_deg(from, to);
    let samples = (length / FLIGHT_LINE_STEP_YARDS).floor() as usize;

    let mut crossing: Option<FlightLineCrossing<'a>> = None;
    for i in 1..samples {
        let along = i as f64 * FLIGHT_LINE_STEP_YARDS;
        let hit = check_hazards(project(from, heading, along), hazards);
        if let Some(current) = crossing.as_mut() {
            match hit {
                Some(h) if std::ptr::eq(current.hazard, h) => current.back_yards = along,
                _ => break,
            }
        } else if let Some(h) = hit {
            crossing = Some(FlightLineCrossing {
                hazard: h,
                front_yards: along,
                back_yards: along,
            });
        }
    }

    let crossing = crossing?;
    match check_hazards(to, hazards) {
        Some(h) if std::ptr::eq(h, crossing.hazard) => None,
        _ => Some(crossing),
    }
}

/// "Carry the water: 185 to clear, 7-iron carries 200 (+15)".
pub fn carry_note(from: LatLng, target: LatLng, club: &ClubDistribution, hazards: &[Hazard]) -> Option<String> {
    let crossing = first_crossing(from, target, hazards)?;
    let clear = crossing.back_yards + FLIGHT_LINE_STEP_YARDS;
    let margin = club.mean_carry - clear;
    Some(format!(
        "Carry the {} ({}): {:.0} to clear, {} carries {:.0} ({:+.0})",
        crossing.hazard.hazard_type, crossing.hazard.name, clear, club.club_name, club.mean_carry, margin
    ))
}

fn side_of(from: LatLng, target: LatLng, point: LatLng) -> Side {
    if signed_lateral_yards(from, target, point) < 0.0 {
        Side::Left
    } else {
        Side::Right
    }
}

/// Natural-language tip for one shot.
pub fn caddie_tip(from: LatLng, target: LatLng, club: &ClubDistribution, hazards: &[Hazard]) -> String {
    let mut parts: Vec<String> = Vec::new();

    let nearby: Vec<(&Hazard, Side)> = hazards
        .iter()
        .filter(|h| h.is_testable())
        .filter_map(|h| polygon_centroid(&h.polygon).map(|c| (h, c)))
        .filter(|(_, c)| distance_yards(*c, target) <= NEARBY_HAZARD_RADIUS_YARDS)
        .map(|(h, c)| (h, side_of(from, target, c)))
        .collect();

    let left = nearby.iter().find(|(_, s)| *s == Side::Left);
    let right = nearby.iter().find(|(_, s)| *s == Side::Right);
    match (left, right) {
        (Some((l, _)), Some((r, _))) => parts.push(format!(
            "Trouble both sides ({} left, {} right); commit to the middle.",
            l.hazard_type, r.hazard_type
        )),
        (Some((h, side)), None) | (None, Some((h, side))) => parts.push(format!(
            "Favor the {}; {} {}.",
            side.opposite(),
            h.hazard_type,
            side
        )),
        (None, None) => {}
    }

    if club.mean_offline.abs() > NOTABLE_BIAS_YARDS {
        let side = if club.mean_offline < 0.0 { Side::Left } else { Side::Right };
        parts.push(format!(
            "Your {} averages {:.0} yds {}; aim is adjusted {}.",
            club.club_name,
            club.mean_offline.abs(),
            side,
            side.opposite()
        ));
    }

    if let Some(shape) = club.preferred_shape {
        match shape.miss_side() {
            Some(miss) if nearby.iter().any(|(_, s)| *s == miss) => parts.push(format!(
                "Careful with the {shape}, an over-cooked one finds the {miss} trouble."
            )),
            Some(_) => parts.push(format!("Play your stock {shape}.")),
            None => {}
        }
    }

    if parts.is_empty() {
        format!("Clear look. Smooth {} at the target.", club.club_name)
    } else {
        parts.join(" ")
    }
}

/// Annotate every shot of a plan along its planned positions.
pub fn annotate_plan(plan: &NamedStrategyPlan, hole: &CourseHole) -> Vec<ShotAnnotation> {
    let mut from = hole.tee;
    let mut out = Vec::with_capacity(plan.shots.len());
    for shot in &plan.shots {
        let aim = bias_corrected_aim(from, shot.aim, &shot.club);
        out.push(ShotAnnotation {
            club_name: shot.club.club_name.clone(),
            carry_yards: shot.club.mean_carry,
            aim,
            target: shot.aim,
            carry_note: carry_note(from, shot.aim, &shot.club, &hole.hazards),
            caddie_tip: caddie_tip(from, shot.aim, &shot.club, &hole.hazards),
        });
        from = shot.aim;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::offset_point;
    use crate::types::{ClubMetrics, DistributionSource, HazardStatus, HazardType, ShotShape};

    fn club(carry: f64, mean_offline: f64) -> ClubDistribution {
        ClubDistribution {
            club_id: 1,
            club_name: "7i".to_string(),
            loft: 33.0,
            mean_carry: carry,
            std_carry: 6.0,
            mean_offline,
            std_offline: 6.0,
            source: DistributionSource::Measured,
            shot_count: 12,
            preferred_shape: None,
            metrics: ClubMetrics { carry, ..Default::default() },
        }
    }

    fn band(center: LatLng, half_lateral: f64, half_depth: f64, hazard_type: HazardType) -> Hazard {
        Hazard {
            name: "Creek".to_string(),
            hazard_type,
            penalty: 1.0,
            confidence: 1.0,
            polygon: vec![
                offset_point(center, 0.0, half_depth, -half_lateral),
                offset_point(center, 0.0, half_depth, half_lateral),
                offset_point(center, 0.0, -half_depth, half_lateral),
                offset_point(center, 0.0, -half_depth, -half_lateral),
            ],
            status: HazardStatus::Accepted,
        }
    }

    fn tee() -> LatLng {
        LatLng::new(40.0, -75.0)
    }

    #[test]
    fn test_carry_note_for_creek_across_line() {
        let target = project(tee(), 0.0, 170.0);
        let creek = band(project(tee(), 0.0, 140.0), 30.0, 6.0, HazardType::Water);
        let hazards = vec![creek];

        let crossing = first_crossing(tee(), target, &hazards).unwrap();
        assert!((crossing.front_yards - 135.0).abs() <= 5.0);
        assert!((crossing.back_yards - 145.0).abs() <= 5.0);

        let note = carry_note(tee(), target, &club(172.0, 0.0), &hazards).unwrap();
        assert!(note.contains("water"), "{note}");
        assert!(note.contains("7i carries 172"), "{note}");
    }

    #[test]
    fn test_no_carry_note_when_landing_in_hazard() {
        let target = project(tee(), 0.0, 140.0);
        let hazards = vec![band(target, 30.0, 20.0, HazardType::Water)];
        assert!(carry_note(tee(), target, &club(140.0, 0.0), &hazards).is_none());
    }

    #[test]
    fn test_tip_favours_side_away_from_hazard() {
        let target = project(tee(), 0.0, 150.0);
        let bunker = band(offset_point(tee(), 0.0, 150.0, 20.0), 5.0, 5.0, HazardType::Bunker);
        let tip = caddie_tip(tee(), target, &club(150.0, 0.0), &[bunker]);
        assert!(tip.starts_with("Favor the left; bunker right."), "{tip}");
    }

    #[test]
    fn test_tip_mentions_bias_and_shape() {
        let target = project(tee(), 0.0, 150.0);
        let mut c = club(150.0, 6.0);
        c.preferred_shape = Some(ShotShape::Fade);
        let tip = caddie_tip(tee(), target, &c, &[]);
        assert!(tip.contains("averages 6 yds right"), "{tip}");
        assert!(tip.contains("stock fade"), "{tip}");
    }

    #[test]
    fn test_clear_look_without_hazards() {
        let target = project(tee(), 0.0, 150.0);
        let tip = caddie_tip(tee(), target, &club(150.0, 1.0), &[]);
        assert!(tip.starts_with("Clear look"));
    }
}
