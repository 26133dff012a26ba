//! Shared data structures for the caddie planning pipeline
//!
//! This module defines the core types passed between stages:
//! - Raw inputs from the persistence collaborator: Club, Shot, Course, CourseHole, Hazard
//! - Distribution Builder output: ClubDistribution
//! - Strategy Generator output: NamedStrategyPlan
//! - Simulator output: OptimizedStrategy
//! - Aggregator output: HolePlan, GamePlan
//! - Cache rows: CachedPlanRecord, PlanHistoryEntry

mod geo;
mod club;
mod course;
mod strategy;
mod plan;
mod cache;

pub use geo::*;
pub use club::*;
pub use course::*;
pub use strategy::*;
pub use plan::*;
pub use cache::*;
