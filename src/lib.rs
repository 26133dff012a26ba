//! Caddie Engine: on-course strategy optimization
//!
//! Turns a golfer's measured club performance and a course's mapped
//! geometry into a per-hole game plan.
//!
//! ## Pipeline
//!
//! - **Distribution Builder**: practice shots → per-club carry/offline models
//! - **Hazard Filter**: corridor filtering and cross-hole hazard sharing
//! - **Strategy Generator**: candidate shot sequences per hole shape
//! - **Monte Carlo Simulator**: expected strokes and score distribution
//! - **Game Plan Aggregator**: ranking, risk tiers and round totals
//! - **Cache Manager**: stale marking and debounced background regeneration

pub mod config;
pub mod types;
pub mod geo;
pub mod distributions;
pub mod hazards;
pub mod strategy;
pub mod simulation;
pub mod game_plan;
pub mod cache;

// Re-export engine configuration
pub use config::EngineConfig;

// Re-export commonly used types
pub use types::{
    CachedPlanRecord, Club, ClubDistribution, Course, CourseHole, GamePlan, Hazard, HazardType,
    HolePlan, LatLng, NamedStrategyPlan, OptimizedStrategy, PlanHistoryEntry, PlanKey, PlanMode,
    RiskTier, ScoreDistribution, Shot,
};

// Re-export pipeline entry points
pub use distributions::build_distributions;
pub use game_plan::{build_game_plan, optimize_hole};
pub use simulation::simulate_strategy;
pub use strategy::generate_strategies;

// Re-export cache components
pub use cache::{
    FileAdvisoryLock, GolferDataSource, InMemoryPlanStore, PlanStore, RegenerationScheduler,
    SledPlanStore, SnapshotSource, SweepReport,
};
