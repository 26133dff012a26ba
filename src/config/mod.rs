//! Engine Configuration Module
//!
//! Provides planner tuning loaded from TOML, replacing hardcoded simulation,
//! imputation, corridor and cache constants with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `CADDIE_CONFIG` environment variable (path to TOML file)
//! 2. `caddie.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(EngineConfig::load());
//!
//! // Anywhere in the binary:
//! let trials = config::get().simulation.trials;
//! ```
//!
//! Library code takes the relevant section by reference instead, so tests can
//! run with their own values without touching the global.

mod engine_config;
pub mod defaults;

pub use engine_config::*;

use std::sync::OnceLock;

/// Global engine configuration, initialized once at startup.
static ENGINE_CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Initialize the global engine configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: EngineConfig) {
    if ENGINE_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global engine configuration.
///
/// Panics if `init()` has not been called. A missing config is a fatal
/// startup error, not a recoverable condition.
pub fn get() -> &'static EngineConfig {
    ENGINE_CONFIG
        .get()
        .expect("config::get() called before config::init()")
}
