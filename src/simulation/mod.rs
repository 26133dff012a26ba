//! Monte Carlo Simulator
//!
//! Evaluates a candidate strategy by playing it many times with shot
//! outcomes drawn from each club's carry/offline distribution.
//!
//! - `simulator`: the single-shot primitive and the trial loop
//! - `putting`: chip-range threshold and the short-game cost model
//! - `annotations`: carry notes and caddie tips for the planned shots
//!
//! The random source is always passed in, so a seeded `StdRng` gives
//! reproducible results.

pub mod annotations;
pub mod putting;
pub mod simulator;

pub use annotations::{annotate_plan, caddie_tip, carry_note};
pub use putting::{expected_putts, finish_cost};
pub use simulator::{bias_corrected_aim, chip_threshold, run_trial, simulate_strategy, take_shot};
