//! Sled-backed plan store
//!
//! Two trees:
//! - `plans`: `{course_id:020}/{tee}/{mode}` → JSON [`CachedPlanRecord`]
//! - `history`: history id as u64 big-endian → JSON [`PlanHistoryEntry`]
//!
//! Big-endian ids sort chronologically, so reverse iteration is newest first.
//! The zero-padded course prefix lets a course's plans be found by prefix scan.

use std::path::Path;

use chrono::Utc;
use tracing::debug;

use super::store::{apply_stale, fresh_record, PlanStore, StaleMark, StoreError};
use crate::types::{CachedPlanRecord, CourseId, GamePlan, PlanHistoryEntry, PlanKey};

const PLANS_TREE: &str = "plans";
const HISTORY_TREE: &str = "history";

/// Plan store on an embedded sled database
#[derive(Clone)]
pub struct SledPlanStore {
    db: sled::Db,
    plans: sled::Tree,
    history: sled::Tree,
}

impl SledPlanStore {
    /// Open or create the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::from_db(sled::open(path)?)
    }

    /// Throwaway store that is deleted on drop.
    pub fn temporary() -> Result<Self, StoreError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self, StoreError> {
        let plans = db.open_tree(PLANS_TREE)?;
        let history = db.open_tree(HISTORY_TREE)?;
        Ok(Self { db, plans, history })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    fn read_plan(bytes: &[u8]) -> Result<CachedPlanRecord, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn read_history(bytes: &[u8]) -> Result<PlanHistoryEntry, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl PlanStore for SledPlanStore {
    fn get_plan(&self, key: &PlanKey) -> Result<Option<CachedPlanRecord>, StoreError> {
        self.plans
            .get(key.storage_key())?
            .map(|v| Self::read_plan(&v))
            .transpose()
    }

    fn upsert_plan(&self, key: &PlanKey, plan: &GamePlan) -> Result<CachedPlanRecord, StoreError> {
        let previous = self.get_plan(key)?;
        let record = fresh_record(key, plan, previous.as_ref());
        self.plans
            .insert(key.storage_key(), serde_json::to_vec(&record)?)?;
        Ok(record)
    }

    fn purge_course(&self, course_id: CourseId) -> Result<usize, StoreError> {
        let mut removed = 0;
        for item in self.plans.scan_prefix(PlanKey::course_prefix(course_id)) {
            let (k, _) = item?;
            self.plans.remove(k)?;
            removed += 1;
        }

        let mut history_removed = 0;
        for item in self.history.iter() {
            let (k, v) = item?;
            if Self::read_history(&v)?.key.course_id == course_id {
                self.history.remove(k)?;
                history_removed += 1;
            }
        }
        debug!(course_id, removed, history_removed, "Purged course plans");
        Ok(removed)
    }

    fn list_history(&self, key: &PlanKey, limit: usize) -> Result<Vec<PlanHistoryEntry>, StoreError> {
        let mut out = Vec::new();
        for item in self.history.iter().rev() {
            if out.len() >= limit {
                break;
            }
            let (_, v) = item?;
            let entry = Self::read_history(&v)?;
            if &entry.key == key {
                out.push(entry);
            }
        }
        Ok(out)
    }

    fn get_history(&self, id: u64) -> Result<Option<PlanHistoryEntry>, StoreError> {
        self.history
            .get(id.to_be_bytes())?
            .map(|v| Self::read_history(&v))
            .transpose()
    }

    fn append_history(
        &self,
        key: &PlanKey,
        plan: &GamePlan,
        reason: Option<&str>,
    ) -> Result<PlanHistoryEntry, StoreError> {
        // generate_id starts at 0; keep ids positive
        let id = self.db.generate_id()? + 1;
        let entry = PlanHistoryEntry {
            id,
            key: key.clone(),
            plan: plan.clone(),
            reason: reason.map(str::to_string),
            created_at: Utc::now(),
        };
        self.history
            .insert(id.to_be_bytes(), serde_json::to_vec(&entry)?)?;
        Ok(entry)
    }

    fn mark_stale(&self, reason: &str, course_id: Option<CourseId>) -> Result<usize, StoreError> {
        let prefix = course_id.map(PlanKey::course_prefix).unwrap_or_default();
        let mut flipped = 0;
        for item in self.plans.scan_prefix(prefix) {
            let (k, v) = item?;
            let mut record = Self::read_plan(&v)?;
            match apply_stale(&mut record, reason, course_id) {
                StaleMark::Untouched => {}
                StaleMark::Flipped => {
                    self.plans.insert(k, serde_json::to_vec(&record)?)?;
                    flipped += 1;
                }
                StaleMark::Repeated => {
                    self.plans.insert(k, serde_json::to_vec(&record)?)?;
                }
            }
        }
        Ok(flipped)
    }

    fn complete_regeneration(
        &self,
        seen: &CachedPlanRecord,
        plan: &GamePlan,
    ) -> Result<Option<CachedPlanRecord>, StoreError> {
        let storage_key = seen.key.storage_key();
        // Compare-and-swap against the bytes we checked; retry if a mark or
        // upsert lands in between.
        loop {
            let Some(current_bytes) = self.plans.get(&storage_key)? else {
                return Ok(None);
            };
            let current = Self::read_plan(&current_bytes)?;
            if current.stale_marks != seen.stale_marks {
                return Ok(None);
            }
            let record = fresh_record(&seen.key, plan, Some(&current));
            let swapped = self.plans.compare_and_swap(
                &storage_key,
                Some(current_bytes),
                Some(serde_json::to_vec(&record)?),
            )?;
            if swapped.is_ok() {
                return Ok(Some(record));
            }
        }
    }

    fn list_stale(&self) -> Result<Vec<CachedPlanRecord>, StoreError> {
        let mut out = Vec::new();
        for item in self.plans.iter() {
            let (_, v) = item?;
            let record = Self::read_plan(&v)?;
            if record.is_stale {
                out.push(record);
            }
        }
        Ok(out)
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}
