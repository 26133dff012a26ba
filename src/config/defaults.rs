//! System-wide constants that are not worth exposing as configuration.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Geo
// ============================================================================

/// Mean Earth radius (metres).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Yards per metre.
pub const YARDS_PER_METRE: f64 = 1.093_613;

// ============================================================================
// Annotations
// ============================================================================

/// Step used when walking a flight line for hazard crossings (yards).
pub const FLIGHT_LINE_STEP_YARDS: f64 = 5.0;

/// Hazards whose centroid is within this of a target count as "nearby" (yards).
pub const NEARBY_HAZARD_RADIUS_YARDS: f64 = 40.0;

/// Mean lateral miss that is worth telling the golfer about (yards).
pub const NOTABLE_BIAS_YARDS: f64 = 3.0;

// ============================================================================
// Cache
// ============================================================================

/// Sled database directory name under `cache.data_dir`.
pub const PLAN_DB_DIR: &str = "plans.db";

/// Lock directory name under `cache.data_dir`.
pub const LOCK_DIR: &str = "locks";
