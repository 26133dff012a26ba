//! Caddie Engine: command-line entry point
//!
//! Subcommands:
//! - `plan`: build a game plan from a golfer snapshot and cache it
//! - `mark-stale`: flag cached plans stale and wait for the debounced sweep
//! - `sweep`: regenerate every stale plan now
//! - `history`: list regenerated versions of one cached plan
//! - `config`: print the effective configuration as TOML

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use caddie_engine::cache::{
    FileAdvisoryLock, PlanStore, RegenerationScheduler, SledPlanStore, SnapshotSource,
};
use caddie_engine::config::{self, defaults, EngineConfig};
use caddie_engine::types::{CourseId, PlanKey, PlanMode};
use caddie_engine::{build_distributions, build_game_plan, GolferDataSource};

// ============================================================================
// CLI Arguments
// ============================================================================

/// Caddie Engine - Monte Carlo course strategy planner
#[derive(Parser, Debug)]
#[command(name = "caddie-engine")]
#[command(about = "Per-hole game plans from club dispersion and course geometry", long_about = None)]
#[command(version)]
struct CliArgs {
    /// Data directory for the plan cache and lock files (overrides config)
    #[arg(long, env = "CADDIE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Build a game plan for one course and tee, print it and cache it
    Plan {
        /// Golfer snapshot JSON ({clubs, shots, courses})
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        course: CourseId,
        /// Tee box name, e.g. "white"
        #[arg(long)]
        tee: String,
        /// Ranking mode: scoring | safe
        #[arg(long, default_value = "scoring")]
        mode: PlanMode,
        /// Trials per strategy (overrides config)
        #[arg(long)]
        trials: Option<u32>,
        /// Fixed RNG seed for reproducible plans (overrides config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Mark cached plans stale and wait for the debounced regeneration
    MarkStale {
        #[arg(long)]
        snapshot: PathBuf,
        /// Why the plans changed, e.g. "bag changed"
        #[arg(long)]
        reason: String,
        /// Limit to one course; all courses when omitted
        #[arg(long)]
        course: Option<CourseId>,
    },

    /// Regenerate every stale plan immediately
    Sweep {
        #[arg(long)]
        snapshot: PathBuf,
    },

    /// List history for a cached plan, newest first
    History {
        #[arg(long)]
        course: CourseId,
        #[arg(long)]
        tee: String,
        #[arg(long, default_value = "scoring")]
        mode: PlanMode,
    },

    /// Print the effective configuration
    Config,
}

// ============================================================================
// Storage
// ============================================================================

fn open_store(data_dir: &Path) -> Result<SledPlanStore> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
    let path = data_dir.join(defaults::PLAN_DB_DIR);
    SledPlanStore::open(&path).with_context(|| format!("Failed to open plan store at {}", path.display()))
}

fn build_scheduler(data_dir: &Path, snapshot: &Path, engine: &EngineConfig) -> Result<RegenerationScheduler> {
    let store = Arc::new(open_store(data_dir)?);
    let lock = Arc::new(FileAdvisoryLock::new(data_dir.join(defaults::LOCK_DIR)));
    let source = Arc::new(
        SnapshotSource::load(snapshot)
            .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))?,
    );
    Ok(RegenerationScheduler::new(store, lock, source, engine.clone()))
}

// ============================================================================
// Subcommands
// ============================================================================

fn run_plan(data_dir: &Path, snapshot: &Path, course_id: CourseId, tee: &str, mode: PlanMode) -> Result<()> {
    let engine = config::get();
    let source = SnapshotSource::load(snapshot)
        .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))?;
    let course = source
        .course(course_id)?
        .with_context(|| format!("Course {course_id} not in snapshot"))?;

    let distributions = build_distributions(&source.clubs()?, &source.shots()?, &engine.distributions);
    if distributions.is_empty() {
        warn!("No club could be modelled, plan will be empty");
    }
    info!(clubs = distributions.len(), course = %course.name, "Club distributions built");

    let mut rng = match engine.simulation.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let plan = build_game_plan(&course, tee, mode, &distributions, engine, &mut rng);

    let store = open_store(data_dir)?;
    let key = PlanKey::new(course_id, tee, mode);
    store.upsert_plan(&key, &plan)?;
    store.append_history(&key, &plan, Some("generated"))?;
    store.flush()?;

    println!("{}", serde_json::to_string_pretty(&plan)?);
    info!(
        plan = %key,
        par = plan.total_par,
        expected = plan.total_expected_strokes,
        key_holes = ?plan.key_holes,
        "Plan cached"
    );
    Ok(())
}

fn run_history(data_dir: &Path, course_id: CourseId, tee: &str, mode: PlanMode) -> Result<()> {
    let store = open_store(data_dir)?;
    let key = PlanKey::new(course_id, tee, mode);
    let entries = store.list_history(&key, config::get().cache.history_limit)?;
    if entries.is_empty() {
        info!(plan = %key, "No history");
    }
    for entry in entries {
        println!(
            "{:>6}  {}  {:>6.1}  {}",
            entry.id,
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.plan.total_expected_strokes,
            entry.reason.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut engine = EngineConfig::load();
    if let SubCommand::Plan { trials, seed, .. } = &args.command {
        if let Some(trials) = trials {
            engine.simulation.trials = *trials;
        }
        if seed.is_some() {
            engine.simulation.seed = *seed;
        }
    }
    if let Some(dir) = &args.data_dir {
        engine.cache.data_dir.clone_from(dir);
    }
    config::init(engine);
    let engine = config::get();
    let data_dir = engine.cache.data_dir.as_path();

    match args.command {
        SubCommand::Plan { snapshot, course, tee, mode, .. } => {
            run_plan(data_dir, &snapshot, course, &tee, mode)?;
        }
        SubCommand::MarkStale { snapshot, reason, course } => {
            let scheduler = build_scheduler(data_dir, &snapshot, engine)?;
            let flipped = scheduler.mark_plans_stale(&reason, course)?;
            if flipped == 0 {
                info!("No fresh plans to mark");
            }
            info!(debounce_ms = engine.cache.debounce_ms, "Waiting for regeneration sweep");
            match scheduler.wait_for_scheduled().await {
                Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                None => warn!("Regeneration sweep did not run"),
            }
        }
        SubCommand::Sweep { snapshot } => {
            let scheduler = build_scheduler(data_dir, &snapshot, engine)?;
            let report = scheduler.run_sweep().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        SubCommand::History { course, tee, mode } => {
            run_history(data_dir, course, &tee, mode)?;
        }
        SubCommand::Config => {
            print!("{}", engine.to_toml()?);
        }
    }

    Ok(())
}
