//! Strategy Generator
//!
//! Lays out a handful of named multi-shot plans for a hole. The menu depends
//! on par ([`HoleShape`]); every waypoint goes through hazard avoidance and
//! every club is the one whose mean carry best matches the required distance.

pub mod landing;
pub mod shapes;

pub use landing::{closest_club, find_safe_landing, layup_club, longest_club, shortest_club};
pub use shapes::{HoleShape, PlanContext};

use tracing::debug;

use crate::config::{HazardConfig, StrategyConfig};
use crate::types::{ClubDistribution, CourseHole, NamedStrategyPlan};

/// Candidate strategies for `hole` played from `tee_box`.
///
/// Empty when no club distributions are available; the caller skips the hole.
pub fn generate_strategies(
    hole: &CourseHole,
    tee_box: &str,
    distributions: &[ClubDistribution],
    config: &StrategyConfig,
    hazard_config: &HazardConfig,
) -> Vec<NamedStrategyPlan> {
    if distributions.is_empty() {
        debug!(hole = hole.number, "No club distributions, no strategies");
        return Vec::new();
    }

    let shape = HoleShape::from_par(hole.par);
    let ctx = PlanContext::new(hole, tee_box, distributions, config, hazard_config);
    let plans = shape.plans(&ctx);

    debug!(
        hole = hole.number,
        par = hole.par,
        count = plans.len(),
        "Generated strategies"
    );
    plans
}
