//! PlanStore trait: pluggable storage for cached plans
//!
//! The cache contract consumed by request handlers and the regeneration
//! sweep:
//! - `InMemoryPlanStore`: in-memory store for tests and minimal deployments
//! - `SledPlanStore` (see `sled_store`): embedded on-disk store
//!
//! Plans are unique per [`PlanKey`]. History is append-only; entries are
//! only removed when their course is purged.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::Utc;

use crate::types::{CachedPlanRecord, CourseId, GamePlan, PlanHistoryEntry, PlanKey};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

/// Trait for cached-plan backends
///
/// Implementations must be thread-safe (Send + Sync); the store is shared
/// between request handlers and the background sweep.
pub trait PlanStore: Send + Sync {
    /// Cached plan for a key, with its stale flag. `None` if never generated.
    fn get_plan(&self, key: &PlanKey) -> Result<Option<CachedPlanRecord>, StoreError>;

    /// Replace the payload for a key and mark it fresh.
    fn upsert_plan(&self, key: &PlanKey, plan: &GamePlan) -> Result<CachedPlanRecord, StoreError>;

    /// Delete every plan and history entry of a course. Returns plans removed.
    fn purge_course(&self, course_id: CourseId) -> Result<usize, StoreError>;

    /// History for a key, most recent first, at most `limit` entries.
    fn list_history(&self, key: &PlanKey, limit: usize) -> Result<Vec<PlanHistoryEntry>, StoreError>;

    fn get_history(&self, id: u64) -> Result<Option<PlanHistoryEntry>, StoreError>;

    /// Append an immutable snapshot of a regenerated plan.
    fn append_history(
        &self,
        key: &PlanKey,
        plan: &GamePlan,
        reason: Option<&str>,
    ) -> Result<PlanHistoryEntry, StoreError>;

    /// Flip fresh plans to stale, for one course or all of them.
    ///
    /// Rows already stale keep their original reason. Returns rows flipped.
    fn mark_stale(&self, reason: &str, course_id: Option<CourseId>) -> Result<usize, StoreError>;

    /// Write a regenerated plan for a row listed by [`PlanStore::list_stale`].
    ///
    /// Stores `plan` fresh only if no stale mark reached the row since `seen`
    /// was read. Returns `None`, leaving the row untouched, when it was marked
    /// again or purged in the meantime.
    fn complete_regeneration(
        &self,
        seen: &CachedPlanRecord,
        plan: &GamePlan,
    ) -> Result<Option<CachedPlanRecord>, StoreError>;

    /// Every plan currently flagged stale.
    fn list_stale(&self) -> Result<Vec<CachedPlanRecord>, StoreError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Fresh record for `key`, keeping `created_at` from any previous row.
pub(crate) fn fresh_record(
    key: &PlanKey,
    plan: &GamePlan,
    previous: Option<&CachedPlanRecord>,
) -> CachedPlanRecord {
    let now = Utc::now();
    CachedPlanRecord {
        key: key.clone(),
        plan: plan.clone(),
        is_stale: false,
        stale_reason: None,
        stale_marks: previous.map_or(0, |p| p.stale_marks),
        created_at: previous.map_or(now, |p| p.created_at),
        updated_at: now,
    }
}

/// Effect of a stale mark on one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StaleMark {
    /// Outside the mark's scope
    Untouched,
    /// Fresh row flipped to stale
    Flipped,
    /// Row was already stale; only its mark counter moved
    Repeated,
}

/// Apply a stale mark to `record` if it matches the scope.
///
/// Already stale rows keep their reason but still count the mark, so an
/// in-flight regeneration can tell its inputs are out of date.
pub(crate) fn apply_stale(
    record: &mut CachedPlanRecord,
    reason: &str,
    course_id: Option<CourseId>,
) -> StaleMark {
    if course_id.is_some_and(|id| id != record.key.course_id) {
        return StaleMark::Untouched;
    }
    record.stale_marks += 1;
    if record.is_stale {
        return StaleMark::Repeated;
    }
    record.is_stale = true;
    record.stale_reason = Some(reason.to_string());
    record.updated_at = Utc::now();
    StaleMark::Flipped
}

// ============================================================================
// In-memory backend
// ============================================================================

/// In-memory plan store
///
/// Thread-safe via `RwLock`. Not durable: data is lost on restart.
pub struct InMemoryPlanStore {
    plans: RwLock<BTreeMap<PlanKey, CachedPlanRecord>>,
    history: RwLock<Vec<PlanHistoryEntry>>,
    next_history_id: AtomicU64,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self {
            plans: RwLock::new(BTreeMap::new()),
            history: RwLock::new(Vec::new()),
            next_history_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryPlanStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Storage(e.to_string())
}

impl PlanStore for InMemoryPlanStore {
    fn get_plan(&self, key: &PlanKey) -> Result<Option<CachedPlanRecord>, StoreError> {
        let plans = self.plans.read().map_err(poisoned)?;
        Ok(plans.get(key).cloned())
    }

    fn upsert_plan(&self, key: &PlanKey, plan: &GamePlan) -> Result<CachedPlanRecord, StoreError> {
        let mut plans = self.plans.write().map_err(poisoned)?;
        let record = fresh_record(key, plan, plans.get(key));
        plans.insert(key.clone(), record.clone());
        Ok(record)
    }

    fn purge_course(&self, course_id: CourseId) -> Result<usize, StoreError> {
        let mut plans = self.plans.write().map_err(poisoned)?;
        let before = plans.len();
        plans.retain(|k, _| k.course_id != course_id);
        let removed = before - plans.len();

        let mut history = self.history.write().map_err(poisoned)?;
        history.retain(|h| h.key.course_id != course_id);
        Ok(removed)
    }

    fn list_history(&self, key: &PlanKey, limit: usize) -> Result<Vec<PlanHistoryEntry>, StoreError> {
        let history = self.history.read().map_err(poisoned)?;
        Ok(history
            .iter()
            .rev()
            .filter(|h| &h.key == key)
            .take(limit)
            .cloned()
            .collect())
    }

    fn get_history(&self, id: u64) -> Result<Option<PlanHistoryEntry>, StoreError> {
        let history = self.history.read().map_err(poisoned)?;
        Ok(history.iter().find(|h| h.id == id).cloned())
    }

    fn append_history(
        &self,
        key: &PlanKey,
        plan: &GamePlan,
        reason: Option<&str>,
    ) -> Result<PlanHistoryEntry, StoreError> {
        let entry = PlanHistoryEntry {
            id: self.next_history_id.fetch_add(1, Ordering::SeqCst),
            key: key.clone(),
            plan: plan.clone(),
            reason: reason.map(str::to_string),
            created_at: Utc::now(),
        };
        let mut history = self.history.write().map_err(poisoned)?;
        history.push(entry.clone());
        Ok(entry)
    }

    fn mark_stale(&self, reason: &str, course_id: Option<CourseId>) -> Result<usize, StoreError> {
        let mut plans = self.plans.write().map_err(poisoned)?;
        let mut flipped = 0;
        for record in plans.values_mut() {
            if apply_stale(record, reason, course_id) == StaleMark::Flipped {
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    fn complete_regeneration(
        &self,
        seen: &CachedPlanRecord,
        plan: &GamePlan,
    ) -> Result<Option<CachedPlanRecord>, StoreError> {
        let mut plans = self.plans.write().map_err(poisoned)?;
        let Some(current) = plans.get(&seen.key) else {
            return Ok(None);
        };
        if current.stale_marks != seen.stale_marks {
            return Ok(None);
        }
        let record = fresh_record(&seen.key, plan, Some(current));
        plans.insert(seen.key.clone(), record.clone());
        Ok(Some(record))
    }

    fn list_stale(&self) -> Result<Vec<CachedPlanRecord>, StoreError> {
        let plans = self.plans.read().map_err(poisoned)?;
        Ok(plans.values().filter(|r| r.is_stale).cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_plan;
    use super::*;
    use crate::types::PlanMode;

    fn key(course: i64, tee: &str) -> PlanKey {
        PlanKey::new(course, tee, PlanMode::Scoring)
    }

    #[test]
    fn test_upsert_and_get() {
        let store = InMemoryPlanStore::new();
        assert!(store.get_plan(&key(1, "white")).unwrap().is_none());

        let first = store.upsert_plan(&key(1, "white"), &sample_plan(1, 80.0)).unwrap();
        let second = store.upsert_plan(&key(1, "white"), &sample_plan(1, 78.5)).unwrap();
        assert_eq!(first.created_at, second.created_at);

        let got = store.get_plan(&key(1, "white")).unwrap().unwrap();
        assert_eq!(got.plan.total_expected_strokes, 78.5);
        assert!(!got.is_stale);
    }

    #[test]
    fn test_mark_stale_scoped_and_idempotent() {
        let store = InMemoryPlanStore::new();
        store.upsert_plan(&key(1, "white"), &sample_plan(1, 80.0)).unwrap();
        store.upsert_plan(&key(1, "blue"), &sample_plan(1, 82.0)).unwrap();
        store.upsert_plan(&key(2, "white"), &sample_plan(2, 75.0)).unwrap();

        assert_eq!(store.mark_stale("shots changed", Some(1)).unwrap(), 2);
        assert_eq!(store.mark_stale("bag changed", None).unwrap(), 1);
        assert_eq!(store.mark_stale("again", None).unwrap(), 0);

        let row = store.get_plan(&key(1, "white")).unwrap().unwrap();
        assert_eq!(row.stale_reason.as_deref(), Some("shots changed"));
        assert_eq!(store.list_stale().unwrap().len(), 3);

        store.upsert_plan(&key(1, "white"), &sample_plan(1, 79.0)).unwrap();
        let row = store.get_plan(&key(1, "white")).unwrap().unwrap();
        assert!(!row.is_stale);
        assert!(row.stale_reason.is_none());
    }

    #[test]
    fn test_regeneration_not_written_over_newer_mark() {
        let store = InMemoryPlanStore::new();
        store.upsert_plan(&key(1, "white"), &sample_plan(1, 80.0)).unwrap();
        store.mark_stale("bag changed", None).unwrap();
        let seen = store.list_stale().unwrap().remove(0);

        // Arrives while the sweep is rebuilding from older data
        assert_eq!(store.mark_stale("shots imported", Some(1)).unwrap(), 0);
        assert!(store.complete_regeneration(&seen, &sample_plan(1, 79.0)).unwrap().is_none());
        let row = store.get_plan(&key(1, "white")).unwrap().unwrap();
        assert!(row.is_stale);
        assert_eq!(row.stale_reason.as_deref(), Some("bag changed"));

        let seen = store.list_stale().unwrap().remove(0);
        let written = store.complete_regeneration(&seen, &sample_plan(1, 78.0)).unwrap().unwrap();
        assert!(!written.is_stale);
        assert_eq!(written.plan.total_expected_strokes, 78.0);
    }

    #[test]
    fn test_regeneration_of_purged_row_not_written() {
        let store = InMemoryPlanStore::new();
        store.upsert_plan(&key(1, "white"), &sample_plan(1, 80.0)).unwrap();
        store.mark_stale("geometry", None).unwrap();
        let seen = store.list_stale().unwrap().remove(0);

        store.purge_course(1).unwrap();
        assert!(store.complete_regeneration(&seen, &sample_plan(1, 79.0)).unwrap().is_none());
        assert!(store.get_plan(&key(1, "white")).unwrap().is_none());
    }

    #[test]
    fn test_history_newest_first_and_capped() {
        let store = InMemoryPlanStore::new();
        for i in 0..5 {
            store
                .append_history(&key(1, "white"), &sample_plan(1, 80.0 - i as f64), Some("regen"))
                .unwrap();
        }
        store.append_history(&key(1, "blue"), &sample_plan(1, 90.0), None).unwrap();

        let list = store.list_history(&key(1, "white"), 3).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].plan.total_expected_strokes, 76.0);
        assert!(list[0].id > list[1].id);

        let one = store.get_history(list[2].id).unwrap().unwrap();
        assert_eq!(one, list[2]);
    }

    #[test]
    fn test_purge_cascades_history() {
        let store = InMemoryPlanStore::new();
        store.upsert_plan(&key(1, "white"), &sample_plan(1, 80.0)).unwrap();
        store.upsert_plan(&key(2, "white"), &sample_plan(2, 80.0)).unwrap();
        store.append_history(&key(1, "white"), &sample_plan(1, 80.0), None).unwrap();

        assert_eq!(store.purge_course(1).unwrap(), 1);
        assert!(store.get_plan(&key(1, "white")).unwrap().is_none());
        assert!(store.list_history(&key(1, "white"), 100).unwrap().is_empty());
        assert!(store.get_plan(&key(2, "white")).unwrap().is_some());
    }

    #[test]
    fn test_trait_object() {
        let store: Box<dyn PlanStore> = Box::new(InMemoryPlanStore::new());
        assert_eq!(store.backend_name(), "InMemory");
    }
}
