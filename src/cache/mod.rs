//! Stale-Plan Cache Manager
//!
//! - `store`: the `PlanStore` contract and its in-memory backend
//! - `sled_store`: embedded on-disk backend
//! - `lock`: non-blocking advisory locks guarding the sweep
//! - `source`: read access to clubs, shots and courses
//! - `scheduler`: stale marking, debounce timer and the regeneration sweep
//!
//! Per-plan lifecycle: fresh → stale(reason) on any upstream change →
//! fresh again after a successful regeneration, or still stale after a
//! failed one.

pub mod lock;
pub mod scheduler;
pub mod sled_store;
pub mod source;
pub mod store;

pub use lock::{try_lock, AdvisoryLock, FileAdvisoryLock, InMemoryLock, LockError, LockGuard};
pub use scheduler::{PlanError, RegenerationScheduler, SweepReport};
pub use sled_store::SledPlanStore;
pub use source::{GolferDataSource, SnapshotSource, SourceError};
pub use store::{InMemoryPlanStore, PlanStore, StoreError};
