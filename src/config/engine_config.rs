//! Engine Configuration - every tuned constant of the planner as TOML values
//!
//! The chip threshold, putting curve and hazard corridor widths are empirical
//! fits, not physical constants, so they live here rather than in code.
//! Each struct implements `Default` with the tuned values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "CADDIE_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "caddie.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$CADDIE_CONFIG` env var
/// 2. `./caddie.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub distributions: DistributionConfig,

    #[serde(default)]
    pub hazards: HazardConfig,

    #[serde(default)]
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub plan: PlanConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl EngineConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded engine config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded engine config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Distances, standard-deviation floors and delays must be positive
    /// - Fractions must lie in (0, 1]
    /// - Risk-tier thresholds must be ordered (green blow-up < red blow-up)
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();
        let s = &self.simulation;

        Self::check_positive(s.chip_min_yards, "simulation.chip_min_yards", &mut errors);
        Self::check_fraction(s.chip_carry_fraction, "simulation.chip_carry_fraction", &mut errors);
        Self::check_positive(s.holed_tolerance_yards, "simulation.holed_tolerance_yards", &mut errors);
        Self::check_positive(s.chip_leave_yards, "simulation.chip_leave_yards", &mut errors);
        Self::check_positive(s.putt_base, "simulation.putt_base", &mut errors);
        Self::check_positive(s.putt_log_coeff, "simulation.putt_log_coeff", &mut errors);
        if s.putt_cap < s.putt_base {
            errors.push(format!(
                "simulation.putt_cap ({}) must be >= simulation.putt_base ({})",
                s.putt_cap, s.putt_base
            ));
        }
        if s.trials == 0 {
            errors.push("simulation.trials must be > 0".to_string());
        }
        if s.max_shots == 0 {
            errors.push("simulation.max_shots must be > 0".to_string());
        }
        if !s.hazard_drop_yards.is_finite() || s.hazard_drop_yards < 0.0 {
            errors.push(format!(
                "simulation.hazard_drop_yards ({}) must be >= 0",
                s.hazard_drop_yards
            ));
        }

        let d = &self.distributions;
        if d.min_shots == 0 {
            errors.push("distributions.min_shots must be > 0".to_string());
        }
        Self::check_positive(d.min_std_yards, "distributions.min_std_yards", &mut errors);
        Self::check_fraction(d.default_offline_std_pct, "distributions.default_offline_std_pct", &mut errors);
        Self::check_fraction(d.default_carry_std_pct, "distributions.default_carry_std_pct", &mut errors);
        Self::check_fraction(d.carry_to_total_ratio, "distributions.carry_to_total_ratio", &mut errors);

        let h = &self.hazards;
        Self::check_positive(h.corridor_half_width_yards, "hazards.corridor_half_width_yards", &mut errors);
        if h.wide_corridor_multiplier < 1.0 {
            errors.push(format!(
                "hazards.wide_corridor_multiplier ({}) must be >= 1",
                h.wide_corridor_multiplier
            ));
        }
        Self::check_positive(h.dedup_radius_yards, "hazards.dedup_radius_yards", &mut errors);
        if h.safe_landing_offsets.iter().any(|o| !o.is_finite() || *o <= 0.0) {
            errors.push("hazards.safe_landing_offsets must all be > 0".to_string());
        }

        let st = &self.strategy;
        Self::check_positive(st.layup_gap_yards, "strategy.layup_gap_yards", &mut errors);
        Self::check_positive(st.scoring_zone_yards, "strategy.scoring_zone_yards", &mut errors);
        Self::check_positive(st.par5_leave_yards, "strategy.par5_leave_yards", &mut errors);

        let p = &self.plan;
        if p.key_hole_count == 0 {
            errors.push("plan.key_hole_count must be > 0".to_string());
        }
        Self::check_fraction(p.green_birdie_threshold, "plan.green_birdie_threshold", &mut errors);
        Self::check_fraction(p.green_max_blowup, "plan.green_max_blowup", &mut errors);
        Self::check_fraction(p.red_blowup_threshold, "plan.red_blowup_threshold", &mut errors);
        if p.green_max_blowup >= p.red_blowup_threshold {
            errors.push(format!(
                "plan.green_max_blowup ({}) must be < plan.red_blowup_threshold ({})",
                p.green_max_blowup, p.red_blowup_threshold
            ));
        }

        let c = &self.cache;
        if c.lock_key.trim().is_empty() {
            errors.push("cache.lock_key must not be empty".to_string());
        }
        if c.history_limit == 0 {
            errors.push("cache.history_limit must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} ({value}) must be a positive number"));
        }
    }

    fn check_fraction(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            errors.push(format!("{name} ({value}) must be in (0, 1]"));
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error ({0:?}): {1}")]
    Io(PathBuf, std::io::Error),
    #[error("config parse error ({0:?}): {1}")]
    Parse(PathBuf, toml::de::Error),
    #[error("config serialization error: {0}")]
    Serialize(toml::ser::Error),
    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Simulation Config
// ============================================================================

/// Monte Carlo trial parameters and the short-game cost model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    /// Trials per candidate strategy
    #[serde(default = "default_trials")]
    pub trials: u32,

    /// Lower bound of the chip threshold (yards)
    #[serde(default = "default_chip_min_yards")]
    pub chip_min_yards: f64,

    /// Chip threshold as a fraction of the shortest club's mean carry
    #[serde(default = "default_chip_carry_fraction")]
    pub chip_carry_fraction: f64,

    /// Distances at or inside this are putted out directly (yards)
    #[serde(default = "default_holed_tolerance_yards")]
    pub holed_tolerance_yards: f64,

    /// Distance a chip leaves to the hole (yards)
    #[serde(default = "default_chip_leave_yards")]
    pub chip_leave_yards: f64,

    /// Expected putts from one yard or closer
    #[serde(default = "default_putt_base")]
    pub putt_base: f64,

    /// Coefficient of the log term in `base + coeff * ln(distance)`
    #[serde(default = "default_putt_log_coeff")]
    pub putt_log_coeff: f64,

    /// Ceiling on expected putts
    #[serde(default = "default_putt_cap")]
    pub putt_cap: f64,

    /// Cap on full shots per trial (planned + greedy)
    #[serde(default = "default_max_shots")]
    pub max_shots: u32,

    /// How far a ball found in a hazard is moved back toward where it came from (yards)
    #[serde(default = "default_hazard_drop_yards")]
    pub hazard_drop_yards: f64,

    /// Fixed RNG seed. Unset means a fresh entropy seed per run.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_trials() -> u32 {
    2000
}
fn default_chip_min_yards() -> f64 {
    10.0
}
fn default_chip_carry_fraction() -> f64 {
    0.5
}
fn default_holed_tolerance_yards() -> f64 {
    10.0
}
fn default_chip_leave_yards() -> f64 {
    3.0
}
fn default_putt_base() -> f64 {
    1.0
}
fn default_putt_log_coeff() -> f64 {
    0.42
}
fn default_putt_cap() -> f64 {
    3.0
}
fn default_max_shots() -> u32 {
    8
}
fn default_hazard_drop_yards() -> f64 {
    10.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            chip_min_yards: default_chip_min_yards(),
            chip_carry_fraction: default_chip_carry_fraction(),
            holed_tolerance_yards: default_holed_tolerance_yards(),
            chip_leave_yards: default_chip_leave_yards(),
            putt_base: default_putt_base(),
            putt_log_coeff: default_putt_log_coeff(),
            putt_cap: default_putt_cap(),
            max_shots: default_max_shots(),
            hazard_drop_yards: default_hazard_drop_yards(),
            seed: None,
        }
    }
}

// ============================================================================
// Distribution Config
// ============================================================================

/// Shot aggregation and imputation parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DistributionConfig {
    /// Valid shots required before a club gets a measured distribution
    #[serde(default = "default_min_shots")]
    pub min_shots: usize,

    /// Floor applied to every standard deviation (yards)
    #[serde(default = "default_min_std_yards")]
    pub min_std_yards: f64,

    /// Offline std as a fraction of carry when it cannot be regressed
    #[serde(default = "default_offline_std_pct")]
    pub default_offline_std_pct: f64,

    /// Carry std as a fraction of carry when it cannot be regressed
    #[serde(default = "default_carry_std_pct")]
    pub default_carry_std_pct: f64,

    /// Carry / total ratio used when only a manual total is known
    #[serde(default = "default_carry_to_total_ratio")]
    pub carry_to_total_ratio: f64,

    /// Drop shots tagged as mishits before computing statistics
    #[serde(default = "default_exclude_mishits")]
    pub exclude_mishits: bool,
}

fn default_min_shots() -> usize {
    3
}
fn default_min_std_yards() -> f64 {
    1.0
}
fn default_offline_std_pct() -> f64 {
    0.06
}
fn default_carry_std_pct() -> f64 {
    0.05
}
fn default_carry_to_total_ratio() -> f64 {
    0.93
}
fn default_exclude_mishits() -> bool {
    true
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            min_shots: default_min_shots(),
            min_std_yards: default_min_std_yards(),
            default_offline_std_pct: default_offline_std_pct(),
            default_carry_std_pct: default_carry_std_pct(),
            carry_to_total_ratio: default_carry_to_total_ratio(),
            exclude_mishits: default_exclude_mishits(),
        }
    }
}

// ============================================================================
// Hazard Config
// ============================================================================

/// Corridor attribution and safe-landing search parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HazardConfig {
    /// Max perpendicular distance from the tee→pin line (yards)
    #[serde(default = "default_corridor_half_width_yards")]
    pub corridor_half_width_yards: f64,

    /// Multiplier applied for out-of-bounds and tree lines
    #[serde(default = "default_wide_corridor_multiplier")]
    pub wide_corridor_multiplier: f64,

    /// Imported hazards closer than this to an existing one of the same type are duplicates (yards)
    #[serde(default = "default_dedup_radius_yards")]
    pub dedup_radius_yards: f64,

    /// Lateral offsets tried, on both sides, when a target sits in a hazard (yards)
    #[serde(default = "default_safe_landing_offsets")]
    pub safe_landing_offsets: Vec<f64>,
}

fn default_corridor_half_width_yards() -> f64 {
    40.0
}
fn default_wide_corridor_multiplier() -> f64 {
    2.0
}
fn default_dedup_radius_yards() -> f64 {
    15.0
}
fn default_safe_landing_offsets() -> Vec<f64> {
    vec![10.0, 20.0, 30.0]
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            corridor_half_width_yards: default_corridor_half_width_yards(),
            wide_corridor_multiplier: default_wide_corridor_multiplier(),
            dedup_radius_yards: default_dedup_radius_yards(),
            safe_landing_offsets: default_safe_landing_offsets(),
        }
    }
}

// ============================================================================
// Strategy Config
// ============================================================================

/// Geometry knobs for candidate strategy generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyConfig {
    /// How far the aggressive tee target moves toward the pin (yards)
    #[serde(default = "default_aggressive_nudge_yards")]
    pub aggressive_nudge_yards: f64,

    /// Minimum carry gap below the longest club for a layup club (yards)
    #[serde(default = "default_layup_gap_yards")]
    pub layup_gap_yards: f64,

    /// Approach distance a par-5 safe layup tries to leave (yards)
    #[serde(default = "default_scoring_zone_yards")]
    pub scoring_zone_yards: f64,

    /// Approach distance the par-5 three-shot plan leaves when no waypoint exists (yards)
    #[serde(default = "default_par5_leave_yards")]
    pub par5_leave_yards: f64,

    /// How far a bail-out aim moves away from the nearest hazard (yards)
    #[serde(default = "default_bail_out_offset_yards")]
    pub bail_out_offset_yards: f64,

    /// Short-of-pin distance for the center-green aim without a green polygon (yards)
    #[serde(default = "default_green_fallback_short_yards")]
    pub green_fallback_short_yards: f64,
}

fn default_aggressive_nudge_yards() -> f64 {
    12.0
}
fn default_layup_gap_yards() -> f64 {
    20.0
}
fn default_scoring_zone_yards() -> f64 {
    90.0
}
fn default_par5_leave_yards() -> f64 {
    100.0
}
fn default_bail_out_offset_yards() -> f64 {
    10.0
}
fn default_green_fallback_short_yards() -> f64 {
    5.0
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            aggressive_nudge_yards: default_aggressive_nudge_yards(),
            layup_gap_yards: default_layup_gap_yards(),
            scoring_zone_yards: default_scoring_zone_yards(),
            par5_leave_yards: default_par5_leave_yards(),
            bail_out_offset_yards: default_bail_out_offset_yards(),
            green_fallback_short_yards: default_green_fallback_short_yards(),
        }
    }
}

// ============================================================================
// Plan Config
// ============================================================================

/// Round aggregation and risk-tier colouring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanConfig {
    #[serde(default = "default_key_hole_count")]
    pub key_hole_count: usize,

    /// Birdie-or-better probability needed for a green hole
    #[serde(default = "default_green_birdie_threshold")]
    pub green_birdie_threshold: f64,

    /// Blow-up risk a green hole must stay under
    #[serde(default = "default_green_max_blowup")]
    pub green_max_blowup: f64,

    /// Blow-up risk at or above which a hole is red
    #[serde(default = "default_red_blowup_threshold")]
    pub red_blowup_threshold: f64,
}

fn default_key_hole_count() -> usize {
    4
}
fn default_green_birdie_threshold() -> f64 {
    0.15
}
fn default_green_max_blowup() -> f64 {
    0.10
}
fn default_red_blowup_threshold() -> f64 {
    0.25
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            key_hole_count: default_key_hole_count(),
            green_birdie_threshold: default_green_birdie_threshold(),
            green_max_blowup: default_green_max_blowup(),
            red_blowup_threshold: default_red_blowup_threshold(),
        }
    }
}

// ============================================================================
// Cache Config
// ============================================================================

/// Stale-plan regeneration settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Quiet period after the last stale mark before a sweep runs (ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Name of the cross-instance regeneration lock
    #[serde(default = "default_lock_key")]
    pub lock_key: String,

    /// Maximum history entries returned per plan
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Directory holding the sled database and lock files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_debounce_ms() -> u64 {
    5_000
}
fn default_lock_key() -> String {
    "caddie-plan-regeneration".to_string()
}
fn default_history_limit() -> usize {
    100
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            lock_key: default_lock_key(),
            history_limit: default_history_limit(),
            data_dir: default_data_dir(),
        }
    }
}
