//! Per-par strategy shapes
//!
//! Each hole shape owns a fixed menu of named strategies:
//!
//! | Shape | Scoring | Balanced | Safe |
//! |-------|---------|----------|------|
//! | Par 3 | Pin Hunting | Center Green | Bail Out |
//! | Par 4 | Aggressive | Conservative | Layup |
//! | Par 5 | Go-For-It | Safe Layup | Conservative 3-Shot |
//!
//! Bail Out needs a hazard to bail away from and Layup needs a club
//! noticeably shorter than the longest, so a shape yields two or three plans.

use crate::config::{HazardConfig, StrategyConfig};
use crate::geo::{
    along_track_yards, bearing_deg, distance_yards, move_toward, path_length_yards,
    point_along_path, polygon_centroid, project,
};
use crate::hazards::nearest_hazard;
use crate::types::{
    ClubDistribution, CourseHole, LatLng, NamedStrategyPlan, PlannedShot, StrategyCategory,
};

use super::landing::{closest_club, find_safe_landing, layup_club, longest_club};

/// Minimum forward progress a par-5 second layup must make over the first (yards).
const MIN_LAYUP_PROGRESS_YARDS: f64 = 20.0;

/// Strategy menu keyed by par.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoleShape {
    Par3,
    Par4,
    Par5,
}

impl HoleShape {
    /// Shape for a scorecard par. Pars outside 3..=5 use the nearest shape.
    pub fn from_par(par: u8) -> Self {
        match par {
            0..=3 => HoleShape::Par3,
            4 => HoleShape::Par4,
            _ => HoleShape::Par5,
        }
    }

    /// Candidate plans for this shape.
    pub fn plans(self, ctx: &PlanContext<'_>) -> Vec<NamedStrategyPlan> {
        let candidates = match self {
            HoleShape::Par3 => vec![
                ctx.pin_hunting(),
                ctx.center_green(),
                ctx.bail_out(),
            ],
            HoleShape::Par4 => vec![
                ctx.par4_conservative(),
                ctx.par4_aggressive(),
                ctx.par4_layup(),
            ],
            HoleShape::Par5 => vec![
                ctx.par5_three_shot(),
                ctx.par5_go_for_it(),
                ctx.par5_safe_layup(),
            ],
        };
        candidates
            .into_iter()
            .flatten()
            .filter(|p| !p.shots.is_empty())
            .collect()
    }
}

/// Everything a shape needs to lay out its plans.
pub struct PlanContext<'a> {
    pub hole: &'a CourseHole,
    pub tee_box: &'a str,
    pub clubs: &'a [ClubDistribution],
    pub config: &'a StrategyConfig,
    pub hazard_config: &'a HazardConfig,
    /// Tee → centerline → pin
    path: Vec<LatLng>,
}

impl<'a> PlanContext<'a> {
    pub fn new(
        hole: &'a CourseHole,
        tee_box: &'a str,
        clubs: &'a [ClubDistribution],
        config: &'a StrategyConfig,
        hazard_config: &'a HazardConfig,
    ) -> Self {
        let mut path = Vec::with_capacity(hole.centerline.len() + 2);
        path.push(hole.tee);
        path.extend(hole.centerline.iter().copied());
        path.push(hole.pin);
        Self { hole, tee_box, clubs, config, hazard_config, path }
    }

    fn pin(&self) -> LatLng {
        self.hole.pin
    }

    fn corridor_length(&self) -> f64 {
        path_length_yards(&self.path)
    }

    /// Point `yards` down the corridor, never past the pin.
    fn along_corridor(&self, yards: f64) -> LatLng {
        point_along_path(&self.path, yards).unwrap_or(self.hole.pin)
    }

    /// Nudge a target out of hazards, judged from where the shot is played.
    fn safe(&self, from: LatLng, target: LatLng) -> LatLng {
        find_safe_landing(from, target, &self.hole.hazards, &self.hazard_config.safe_landing_offsets)
    }

    /// Club closest to the distance between two points.
    fn club_for(&self, from: LatLng, to: LatLng) -> Option<&'a ClubDistribution> {
        closest_club(self.clubs, distance_yards(from, to))
    }

    fn shot(club: &ClubDistribution, aim: LatLng) -> PlannedShot {
        PlannedShot { club: club.clone(), aim }
    }

    /// Approach from `from` straight at the pin.
    fn approach(&self, from: LatLng) -> Option<PlannedShot> {
        let club = self.club_for(from, self.pin())?;
        Some(Self::shot(club, self.pin()))
    }

    /// Shot from `from` to a hazard-checked `target` with the closest club.
    fn layup_to(&self, from: LatLng, target: LatLng) -> Option<(PlannedShot, LatLng)> {
        let target = self.safe(from, target);
        let club = self.club_for(from, target)?;
        Some((Self::shot(club, target), target))
    }

    fn plan(name: &str, category: StrategyCategory, shots: Vec<PlannedShot>) -> NamedStrategyPlan {
        NamedStrategyPlan { name: name.to_string(), category, shots }
    }

    /// Tee-shot target for two-shot holes: the first mapped target, else
    /// where the longest club reaches along the corridor.
    fn tee_target_raw(&self) -> Option<LatLng> {
        if let Some(first) = self.hole.targets.first() {
            return Some(*first);
        }
        let longest = longest_club(self.clubs)?;
        Some(self.along_corridor(longest.mean_carry))
    }

    /// Longest club down the corridor, hazard-checked.
    fn longest_off_tee(&self) -> Option<(PlannedShot, LatLng)> {
        let longest = longest_club(self.clubs)?;
        let target = self.safe(self.hole.tee, self.along_corridor(longest.mean_carry));
        Some((Self::shot(longest, target), target))
    }

    // ========================================================================
    // Par 3
    // ========================================================================

    fn par3_distance(&self) -> f64 {
        self.hole
            .plays_like_yardages
            .get(self.tee_box)
            .copied()
            .filter(|y| *y > 0.0)
            .unwrap_or_else(|| distance_yards(self.hole.tee, self.pin()))
    }

    fn pin_hunting(&self) -> Option<NamedStrategyPlan> {
        let club = closest_club(self.clubs, self.par3_distance())?;
        Some(Self::plan(
            "Pin Hunting",
            StrategyCategory::Scoring,
            vec![Self::shot(club, self.pin())],
        ))
    }

    fn green_center(&self) -> LatLng {
        let testable = || self.hole.greens.iter().filter(|g| g.len() >= 3);
        let green = testable()
            .find(|g| crate::geo::point_in_polygon(self.pin(), g))
            .or_else(|| testable().next());
        if let Some(center) = green.and_then(|g| polygon_centroid(g)) {
            return center;
        }
        let tee = self.hole.tee;
        let heading = bearing_deg(tee, self.pin());
        let reach = (distance_yards(tee, self.pin()) - self.config.green_fallback_short_yards).max(0.0);
        project(tee, heading, reach)
    }

    fn center_green(&self) -> Option<NamedStrategyPlan> {
        let target = self.green_center();
        let club = self.club_for(self.hole.tee, target)?;
        Some(Self::plan(
            "Center Green",
            StrategyCategory::Balanced,
            vec![Self::shot(club, target)],
        ))
    }

    fn bail_out(&self) -> Option<NamedStrategyPlan> {
        let (hazard, _) = nearest_hazard(self.pin(), &self.hole.hazards)?;
        let centroid = polygon_centroid(&hazard.polygon)?;
        let away = bearing_deg(centroid, self.pin());
        let raw = project(self.pin(), away, self.config.bail_out_offset_yards);
        let (shot, _) = self.layup_to(self.hole.tee, raw)?;
        Some(Self::plan("Bail Out", StrategyCategory::Safe, vec![shot]))
    }

    // ========================================================================
    // Par 4
    // ========================================================================

    fn two_shot_plan(
        &self,
        name: &str,
        category: StrategyCategory,
        raw_tee_target: LatLng,
    ) -> Option<NamedStrategyPlan> {
        let (tee_shot, landing) = self.layup_to(self.hole.tee, raw_tee_target)?;
        let mut shots = vec![tee_shot];
        shots.extend(self.approach(landing));
        Some(Self::plan(name, category, shots))
    }

    fn par4_conservative(&self) -> Option<NamedStrategyPlan> {
        let raw = self.tee_target_raw()?;
        self.two_shot_plan("Conservative", StrategyCategory::Balanced, raw)
    }

    fn par4_aggressive(&self) -> Option<NamedStrategyPlan> {
        let raw = self.tee_target_raw()?;
        let nudged = move_toward(raw, self.pin(), self.config.aggressive_nudge_yards);
        self.two_shot_plan("Aggressive", StrategyCategory::Scoring, nudged)
    }

    fn par4_layup(&self) -> Option<NamedStrategyPlan> {
        let longest = longest_club(self.clubs)?;
        let club = layup_club(self.clubs, longest.mean_carry, self.config.layup_gap_yards)?;
        let target = self.safe(self.hole.tee, self.along_corridor(club.mean_carry));
        let mut shots = vec![Self::shot(club, target)];
        shots.extend(self.approach(target));
        Some(Self::plan("Layup", StrategyCategory::Safe, shots))
    }

    // ========================================================================
    // Par 5
    // ========================================================================

    fn par5_three_shot(&self) -> Option<NamedStrategyPlan> {
        let tee = self.hole.tee;
        let first_raw = self.tee_target_raw()?;
        let (first, first_landing) = self.layup_to(tee, first_raw)?;
        let mut shots = vec![first];

        let second_raw = match self.hole.targets.get(1) {
            Some(t) => Some(*t),
            None => {
                let progress = along_track_yards(tee, self.pin(), first_landing);
                let reach = self.corridor_length() - self.config.par5_leave_yards;
                (reach - progress >= MIN_LAYUP_PROGRESS_YARDS).then(|| self.along_corridor(reach))
            }
        };

        let mut from = first_landing;
        if let Some(raw) = second_raw {
            let (second, second_landing) = self.layup_to(first_landing, raw)?;
            shots.push(second);
            from = second_landing;
        }
        shots.extend(self.approach(from));
        Some(Self::plan("Conservative 3-Shot", StrategyCategory::Safe, shots))
    }

    fn par5_go_for_it(&self) -> Option<NamedStrategyPlan> {
        let (tee_shot, landing) = self.longest_off_tee()?;
        let mut shots = vec![tee_shot];
        shots.extend(self.approach(landing));
        Some(Self::plan("Go-For-It", StrategyCategory::Scoring, shots))
    }

    fn par5_safe_layup(&self) -> Option<NamedStrategyPlan> {
        let (tee_shot, landing) = self.longest_off_tee()?;
        let mut shots = vec![tee_shot];

        let remaining = distance_yards(landing, self.pin());
        let need = remaining - self.config.scoring_zone_yards;
        let mut from = landing;
        if need > 0.0 {
            let raw = project(landing, bearing_deg(landing, self.pin()), need);
            let (mid, mid_landing) = self.layup_to(landing, raw)?;
            shots.push(mid);
            from = mid_landing;
        }
        shots.extend(self.approach(from));
        Some(Self::plan("Safe Layup", StrategyCategory::Balanced, shots))
    }
}
