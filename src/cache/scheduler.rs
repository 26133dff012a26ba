//! Debounced background regeneration of stale plans
//!
//! Collaborators call [`RegenerationScheduler::mark_plans_stale`] whenever
//! the bag, practice shots or hole geometry change. That flips matching
//! plans to stale and (re)starts a single debounce timer; only the timer
//! armed by the most recent call fires.
//!
//! A sweep takes the cross-instance advisory lock without waiting. If
//! another instance holds it the sweep is skipped. Otherwise every stale
//! plan is rebuilt against one freshly built set of club distributions,
//! written back fresh, and snapshotted into history. A plan that fails stays
//! stale for the next sweep.
//!
//! A plan marked again while it was being rebuilt is not written back, since
//! its result came from out-of-date data. The sweep reloads golfer data and
//! retries those plans, up to [`MAX_SWEEP_PASSES`] passes in total.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::lock::{try_lock, AdvisoryLock};
use super::source::{GolferDataSource, SourceError};
use super::store::{PlanStore, StoreError};
use crate::config::EngineConfig;
use crate::distributions::build_distributions;
use crate::game_plan::build_game_plan;
use crate::types::{CachedPlanRecord, ClubDistribution, CourseId, PlanKey};

/// Passes one sweep makes before leaving re-marked plans for the next one
pub const MAX_SWEEP_PASSES: usize = 3;

/// Failure to regenerate one plan
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Another instance held the lock; nothing was attempted
    pub skipped: bool,
    pub regenerated: usize,
    pub failed: usize,
    /// Marked again during the last pass; left stale
    pub deferred: usize,
}

/// Everything a sweep needs, shared with the timer task.
struct SweepContext {
    store: Arc<dyn PlanStore>,
    lock: Arc<dyn AdvisoryLock>,
    source: Arc<dyn GolferDataSource>,
    config: EngineConfig,
    sweeps_started: AtomicU64,
}

impl SweepContext {
    fn sweep(&self) -> SweepReport {
        self.sweeps_started.fetch_add(1, Ordering::SeqCst);
        let key = self.config.cache.lock_key.as_str();

        let _guard = match try_lock(self.lock.as_ref(), key) {
            Ok(Some(guard)) => guard,
            Ok(None) => {
                debug!(key, "Regeneration lock held elsewhere, skipping sweep");
                return SweepReport { skipped: true, ..Default::default() };
            }
            Err(e) => {
                warn!(key, error = %e, "Could not take regeneration lock, skipping sweep");
                return SweepReport { skipped: true, ..Default::default() };
            }
        };

        let mut report = SweepReport::default();
        let mut retry: Option<Vec<PlanKey>> = None;
        for pass in 1..=MAX_SWEEP_PASSES {
            let deferred = match self.sweep_pass(retry.as_deref(), &mut report) {
                Some(keys) => keys,
                None => {
                    report.deferred = 0;
                    return report;
                }
            };
            report.deferred = deferred.len();
            if deferred.is_empty() {
                break;
            }
            debug!(pass, deferred = deferred.len(), "Plans marked again during regeneration");
            retry = Some(deferred);
        }

        info!(
            regenerated = report.regenerated,
            failed = report.failed,
            deferred = report.deferred,
            "Regeneration sweep finished"
        );
        report
    }

    /// Rebuild stale plans, all of them or only `retry`.
    ///
    /// Returns the keys marked again mid-rebuild, or `None` when there was
    /// nothing to do or the pass could not start.
    fn sweep_pass(
        &self,
        retry: Option<&[PlanKey]>,
        report: &mut SweepReport,
    ) -> Option<Vec<PlanKey>> {
        let mut stale = match self.store.list_stale() {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "Failed to list stale plans");
                return None;
            }
        };
        if let Some(keys) = retry {
            stale.retain(|r| keys.contains(&r.key));
        }
        if stale.is_empty() {
            debug!("No stale plans");
            return None;
        }
        if retry.is_none() {
            info!(count = stale.len(), backend = self.store.backend_name(), "Regeneration sweep started");
        }

        let distributions = match self.load_distributions() {
            Ok(d) => d,
            Err(e) => {
                error!(error = %e, "Failed to load golfer data, plans stay stale");
                report.failed += stale.len();
                return None;
            }
        };

        let mut deferred = Vec::new();
        for record in &stale {
            match self.regenerate(record, &distributions) {
                Ok(true) => report.regenerated += 1,
                Ok(false) => deferred.push(record.key.clone()),
                Err(e) => {
                    warn!(plan = %record.key, error = %e, "Plan regeneration failed, left stale");
                    report.failed += 1;
                }
            }
        }
        Some(deferred)
    }

    fn load_distributions(&self) -> Result<Vec<ClubDistribution>, SourceError> {
        let clubs = self.source.clubs()?;
        let shots = self.source.shots()?;
        Ok(build_distributions(&clubs, &shots, &self.config.distributions))
    }

    /// Rebuild one plan. `Ok(false)` when it was marked again meanwhile.
    fn regenerate(
        &self,
        record: &CachedPlanRecord,
        distributions: &[ClubDistribution],
    ) -> Result<bool, PlanError> {
        let key = &record.key;
        let course = self
            .source
            .course(key.course_id)?
            .ok_or(PlanError::CourseNotFound(key.course_id))?;

        let mut rng = match self.config.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let plan = build_game_plan(&course, &key.tee_box, key.mode, distributions, &self.config, &mut rng);

        if self.store.complete_regeneration(record, &plan)?.is_none() {
            debug!(plan = %key, "Plan changed during regeneration, not written");
            return Ok(false);
        }
        let entry = self
            .store
            .append_history(key, &plan, record.stale_reason.as_deref())?;
        debug!(plan = %key, history_id = entry.id, "Plan regenerated");
        Ok(true)
    }
}

async fn sweep_in_background(ctx: Arc<SweepContext>) -> SweepReport {
    match tokio::task::spawn_blocking(move || ctx.sweep()).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Regeneration sweep aborted");
            SweepReport::default()
        }
    }
}

/// Owns the debounce timer and runs sweeps.
pub struct RegenerationScheduler {
    ctx: Arc<SweepContext>,
    timer: Mutex<Option<JoinHandle<SweepReport>>>,
}

impl RegenerationScheduler {
    pub fn new(
        store: Arc<dyn PlanStore>,
        lock: Arc<dyn AdvisoryLock>,
        source: Arc<dyn GolferDataSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            ctx: Arc::new(SweepContext {
                store,
                lock,
                source,
                config,
                sweeps_started: AtomicU64::new(0),
            }),
            timer: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<dyn PlanStore> {
        &self.ctx.store
    }

    /// Flag plans stale (one course, or all when `course_id` is `None`) and
    /// schedule a debounced sweep. Returns the number of rows flipped.
    pub fn mark_plans_stale(&self, reason: &str, course_id: Option<CourseId>) -> Result<usize, StoreError> {
        let flipped = self.ctx.store.mark_stale(reason, course_id)?;
        info!(reason, course_id = ?course_id, flipped, "Plans marked stale");
        self.schedule_sweep();
        Ok(flipped)
    }

    /// Arm the debounce timer, cancelling any timer not yet fired.
    ///
    /// Returns `false` when called outside a Tokio runtime, in which case no
    /// sweep is scheduled.
    pub fn schedule_sweep(&self) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime, regeneration sweep not scheduled");
            return false;
        };
        let delay = Duration::from_millis(self.ctx.config.cache.debounce_ms);
        let ctx = Arc::clone(&self.ctx);

        let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        *timer = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            sweep_in_background(ctx).await
        }));
        debug!(delay_ms = delay.as_millis() as u64, "Regeneration sweep scheduled");
        true
    }

    /// Whether a scheduled sweep has not finished yet.
    pub fn is_pending(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Wait for the currently scheduled sweep, if any.
    ///
    /// `None` when nothing was scheduled or the timer was superseded.
    pub async fn wait_for_scheduled(&self) -> Option<SweepReport> {
        let handle = self.timer.lock().unwrap_or_else(|e| e.into_inner()).take()?;
        handle.await.ok()
    }

    /// Run a sweep immediately on a blocking thread.
    pub async fn run_sweep(&self) -> SweepReport {
        sweep_in_background(Arc::clone(&self.ctx)).await
    }

    /// Run a sweep on the calling thread.
    pub fn sweep_now(&self) -> SweepReport {
        self.ctx.sweep()
    }

    /// Sweeps attempted so far, including ones skipped for the lock.
    pub fn sweeps_started(&self) -> u64 {
        self.ctx.sweeps_started.load(Ordering::SeqCst)
    }
}

impl Drop for RegenerationScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lock::InMemoryLock;
    use super::super::source::SnapshotSource;
    use super::super::store::test_support::sample_plan;
    use super::super::store::InMemoryPlanStore;
    use super::*;
    use crate::types::{PlanKey, PlanMode};

    fn scheduler_with(lock: Arc<InMemoryLock>) -> (RegenerationScheduler, Arc<InMemoryPlanStore>) {
        let store = Arc::new(InMemoryPlanStore::new());
        let mut config = EngineConfig::default();
        config.cache.debounce_ms = 20;
        let scheduler = RegenerationScheduler::new(
            store.clone(),
            lock,
            Arc::new(SnapshotSource::default()),
            config,
        );
        (scheduler, store)
    }

    #[test]
    fn test_sweep_skipped_when_lock_held() {
        let lock = Arc::new(InMemoryLock::new());
        let (scheduler, store) = scheduler_with(lock.clone());
        let key = PlanKey::new(1, "white", PlanMode::Scoring);
        store.upsert_plan(&key, &sample_plan(1, 80.0)).unwrap();
        store.mark_stale("shots", None).unwrap();

        assert!(lock.try_acquire("caddie-plan-regeneration").unwrap());
        let report = scheduler.sweep_now();
        assert!(report.skipped);
        assert!(store.get_plan(&key).unwrap().unwrap().is_stale);
    }

    #[test]
    fn test_missing_course_stays_stale_and_lock_released() {
        let lock = Arc::new(InMemoryLock::new());
        let (scheduler, store) = scheduler_with(lock.clone());
        let key = PlanKey::new(42, "white", PlanMode::Scoring);
        store.upsert_plan(&key, &sample_plan(42, 80.0)).unwrap();
        store.mark_stale("geometry", Some(42)).unwrap();

        let report = scheduler.sweep_now();
        assert_eq!(report, SweepReport { skipped: false, regenerated: 0, failed: 1, deferred: 0 });
        assert!(store.get_plan(&key).unwrap().unwrap().is_stale);
        assert!(!lock.is_held("caddie-plan-regeneration"));
    }

    const ONE_HOLE: &str = r#"{
        "clubs": [{"id": 1, "name": "7 Iron", "category": "iron", "loft": 33.0, "manual_carry": 160.0}],
        "shots": [],
        "courses": [{
            "id": 5,
            "name": "Short Course",
            "holes": [{
                "number": 1,
                "par": 3,
                "yardages": {"white": 150.0},
                "tee": {"lat": 40.0, "lng": -75.0},
                "pin": {"lat": 40.00123, "lng": -75.0}
            }]
        }]
    }"#;

    /// Marks every plan stale again the first time the bag is read, as if an
    /// edit landed while the sweep was rebuilding.
    struct EditDuringSweep {
        inner: SnapshotSource,
        store: Arc<InMemoryPlanStore>,
        edited: std::sync::atomic::AtomicBool,
    }

    impl GolferDataSource for EditDuringSweep {
        fn clubs(&self) -> Result<Vec<crate::types::Club>, SourceError> {
            if !self.edited.swap(true, Ordering::SeqCst) {
                self.store.mark_stale("club edited", None).map_err(|e| SourceError::Unavailable(e.to_string()))?;
            }
            self.inner.clubs()
        }

        fn shots(&self) -> Result<Vec<crate::types::Shot>, SourceError> {
            self.inner.shots()
        }

        fn course(&self, id: CourseId) -> Result<Option<crate::types::Course>, SourceError> {
            self.inner.course(id)
        }
    }

    #[test]
    fn test_plan_marked_mid_sweep_rebuilt_from_fresh_data() {
        let store = Arc::new(InMemoryPlanStore::new());
        let source = EditDuringSweep {
            inner: SnapshotSource::from_json_str(ONE_HOLE).unwrap(),
            store: store.clone(),
            edited: std::sync::atomic::AtomicBool::new(false),
        };
        let mut config = EngineConfig::default();
        config.simulation.trials = 50;
        config.simulation.seed = Some(3);
        let scheduler = RegenerationScheduler::new(
            store.clone(),
            Arc::new(InMemoryLock::new()),
            Arc::new(source),
            config,
        );

        let key = PlanKey::new(5, "white", PlanMode::Scoring);
        store.upsert_plan(&key, &sample_plan(5, 0.0)).unwrap();
        store.mark_stale("bag changed", None).unwrap();

        let report = scheduler.sweep_now();
        assert_eq!(report, SweepReport { skipped: false, regenerated: 1, failed: 0, deferred: 0 });

        let row = store.get_plan(&key).unwrap().unwrap();
        assert!(!row.is_stale);
        assert_eq!(row.stale_marks, 2);
        assert_eq!(row.plan.holes.len(), 1);
        assert_eq!(store.list_history(&key, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_schedule_outside_runtime_is_noop() {
        let (scheduler, _) = scheduler_with(Arc::new(InMemoryLock::new()));
        assert!(!scheduler.schedule_sweep());
        assert!(!scheduler.is_pending());
    }

    #[tokio::test]
    async fn test_repeated_marks_coalesce() {
        let (scheduler, store) = scheduler_with(Arc::new(InMemoryLock::new()));
        store
            .upsert_plan(&PlanKey::new(1, "white", PlanMode::Scoring), &sample_plan(1, 80.0))
            .unwrap();

        scheduler.mark_plans_stale("a", None).unwrap();
        scheduler.mark_plans_stale("b", None).unwrap();
        scheduler.mark_plans_stale("c", None).unwrap();
        assert!(scheduler.is_pending());

        let report = scheduler.wait_for_scheduled().await;
        assert!(report.is_some());
        assert_eq!(scheduler.sweeps_started(), 1);
    }
}
