//! Cached plan rows and their append-only history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CourseId, GamePlan, PlanMode};

/// Unique identity of a cached plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanKey {
    pub course_id: CourseId,
    pub tee_box: String,
    pub mode: PlanMode,
}

impl PlanKey {
    pub fn new(course_id: CourseId, tee_box: impl Into<String>, mode: PlanMode) -> Self {
        Self {
            course_id,
            tee_box: tee_box.into(),
            mode,
        }
    }

    /// Byte key used by ordered stores.
    ///
    /// Format: `{course_id:020}/{tee_box}/{mode}` so that a course prefix scan
    /// returns every plan for that course.
    pub fn storage_key(&self) -> String {
        format!("{}{}/{}", Self::course_prefix(self.course_id), self.tee_box, self.mode)
    }

    pub fn course_prefix(course_id: CourseId) -> String {
        format!("{course_id:020}/")
    }
}

impl std::fmt::Display for PlanKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "course {} / {} / {}", self.course_id, self.tee_box, self.mode)
    }
}

/// One cached plan. Unique per [`PlanKey`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedPlanRecord {
    pub key: PlanKey,
    pub plan: GamePlan,
    pub is_stale: bool,
    pub stale_reason: Option<String>,
    /// Stale marks that matched this row, including ones that arrived while
    /// it was already stale. A sweep only writes back if this is unchanged.
    #[serde(default)]
    pub stale_marks: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable snapshot written each time a plan is regenerated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanHistoryEntry {
    pub id: u64,
    pub key: PlanKey,
    pub plan: GamePlan,
    /// Why the regeneration ran (the stale reason it cleared)
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
