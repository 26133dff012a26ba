//! Hazard & Corridor Filter
//!
//! - `detection`: point-in-hazard tests used by simulation and planning
//! - `corridor`: attribution of detected hazards to holes, and cross-hole
//!   import of shared boundary/water hazards

pub mod corridor;
pub mod detection;

pub use corridor::{
    filter_to_corridor, import_shared_hazards, is_within_corridor, share_hazards_across_holes,
};
pub use detection::{check_hazards, nearest_hazard};
