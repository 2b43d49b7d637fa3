use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::local::LocalCache;
use crate::models::{sample_workout_plans, WorkoutPlan};
use crate::remote::{RemoteError, RemoteStore};

/// Outcome of a manual resync of pending completion toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pending: usize,
    pub synced: usize,
    pub failed: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pending == 0 {
            return write!(f, "No pending changes");
        }
        write!(
            f,
            "{} pending, {} synced, {} failed",
            self.pending, self.synced, self.failed
        )
    }
}

/// Offline-first access to workout plans.
///
/// Reads prefer the local cache. Writes land locally first and reach the
/// remote store from a spawned task, whose handle is returned so callers
/// can either drop it or wait for it.
pub struct WorkoutRepository<R> {
    local: LocalCache,
    remote: Arc<R>,
}

impl<R> Clone for WorkoutRepository<R> {
    fn clone(&self) -> Self {
        Self {
            local: self.local.clone(),
            remote: Arc::clone(&self.remote),
        }
    }
}

impl<R: RemoteStore + 'static> WorkoutRepository<R> {
    pub fn new(local: LocalCache, remote: Arc<R>) -> Self {
        Self { local, remote }
    }

    pub fn local(&self) -> &LocalCache {
        &self.local
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Returns cached plans, falling back to the remote store when the
    /// cache is empty. A remote failure yields whatever the cache holds.
    ///
    /// A non-empty cache is returned as is, however old.
    pub async fn get_workout_plans(&self) -> Vec<WorkoutPlan> {
        let local_plans = self.local.read_all().await;
        if !local_plans.is_empty() {
            tracing::debug!("Using {} cached plan(s)", local_plans.len());
            return local_plans;
        }

        tracing::debug!("Local cache empty, fetching plans from remote");
        match self.remote.fetch_all_plans().await {
            Ok(plans) => {
                self.local.write_all(&plans).await;
                tracing::info!("Fetched and cached {} plan(s)", plans.len());
                plans
            }
            Err(e) => {
                tracing::warn!("Remote fetch failed, using local cache: {}", e);
                self.local.read_all().await
            }
        }
    }

    pub async fn get_plan(&self, plan_id: &str) -> Option<WorkoutPlan> {
        self.local.read_by_id(plan_id).await
    }

    /// Fetches every plan from the remote store and overwrites the cache.
    pub async fn refresh_from_server(&self) -> Vec<WorkoutPlan> {
        match self.remote.fetch_all_plans().await {
            Ok(plans) => {
                self.local.write_all(&plans).await;
                tracing::info!("Refreshed {} plan(s) from remote", plans.len());
                plans
            }
            Err(e) => {
                tracing::warn!("Refresh from remote failed: {}", e);
                self.local.read_all().await
            }
        }
    }

    /// Records the toggle locally, then syncs it in the background.
    ///
    /// The shadow row stays unsynced if the remote write fails. Nothing
    /// retries it until [`sync_pending_changes`](Self::sync_pending_changes).
    pub async fn toggle_exercise_completion(
        &self,
        plan_id: &str,
        exercise_id: &str,
        completed: bool,
    ) -> JoinHandle<()> {
        tracing::debug!(
            "Toggling exercise {} in plan {} -> {}",
            exercise_id,
            plan_id,
            completed
        );
        self.local
            .record_exercise_completion(exercise_id, plan_id, completed)
            .await;

        let local = self.local.clone();
        let remote = Arc::clone(&self.remote);
        let plan_id = plan_id.to_string();
        let exercise_id = exercise_id.to_string();

        tokio::spawn(async move {
            match remote
                .update_exercise_completion(&plan_id, &exercise_id, completed)
                .await
            {
                Ok(()) => {
                    local.mark_synced(&exercise_id, completed).await;
                    tracing::info!("Synced exercise {} in plan {}", exercise_id, plan_id);
                }
                Err(e) => {
                    tracing::warn!("Background sync of exercise {} failed: {}", exercise_id, e)
                }
            }
        })
    }

    /// Marks every exercise of the cached plan complete, then syncs.
    pub async fn mark_all_exercises_completed(&self, plan_id: &str) -> JoinHandle<()> {
        let plan = self.local.read_by_id(plan_id).await;
        let exercise_ids: Vec<String> = plan
            .iter()
            .flat_map(|p| p.exercises.iter().map(|e| e.id.clone()))
            .collect();

        if plan.is_none() {
            tracing::debug!("Plan {} not cached, only the remote will be updated", plan_id);
        }
        for exercise_id in &exercise_ids {
            self.local
                .record_exercise_completion(exercise_id, plan_id, true)
                .await;
        }

        let local = self.local.clone();
        let remote = Arc::clone(&self.remote);
        let plan_id = plan_id.to_string();

        tokio::spawn(async move {
            match remote.mark_all_completed(&plan_id).await {
                Ok(()) => {
                    for exercise_id in &exercise_ids {
                        local.mark_synced(exercise_id, true).await;
                    }
                    tracing::info!("Synced completion of plan {}", plan_id);
                }
                Err(e) => tracing::warn!("Background sync of plan {} failed: {}", plan_id, e),
            }
        })
    }

    /// Replays every unsynced toggle against the remote store, one at a
    /// time. Failures are logged and left pending.
    pub async fn sync_pending_changes(&self) -> SyncReport {
        let pending = self.local.pending_unsynced().await;
        let mut report = SyncReport {
            pending: pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            tracing::debug!("No pending changes to sync");
            return report;
        }

        for status in &pending {
            match self
                .remote
                .update_exercise_completion(
                    &status.workout_plan_id,
                    &status.exercise_id,
                    status.is_completed,
                )
                .await
            {
                Ok(()) => {
                    self.local
                        .mark_synced(&status.exercise_id, status.is_completed)
                        .await;
                    report.synced += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to sync exercise {}: {}", status.exercise_id, e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!("Manual sync finished: {}", report);
        report
    }

    /// Pushes the sample plans to the remote store and reloads the cache.
    pub async fn initialize_sample_data(&self) -> Result<Vec<WorkoutPlan>, RemoteError> {
        for plan in sample_workout_plans() {
            self.remote.put_plan(&plan).await?;
        }
        let plans = self.remote.fetch_all_plans().await?;
        self.local.write_all(&plans).await;
        tracing::info!("Sample data initialized ({} plan(s))", plans.len());
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Exercise;
    use crate::remote::InMemoryRemoteStore;
    use tempfile::TempDir;

    struct TestContext {
        repo: WorkoutRepository<InMemoryRemoteStore>,
        remote: Arc<InMemoryRemoteStore>,
        _temp_dir: TempDir,
    }

    async fn setup(remote: InMemoryRemoteStore) -> TestContext {
        let temp_dir = TempDir::new().unwrap();
        let local = LocalCache::open(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let remote = Arc::new(remote);
        TestContext {
            repo: WorkoutRepository::new(local, Arc::clone(&remote)),
            remote,
            _temp_dir: temp_dir,
        }
    }

    #[tokio::test]
    async fn test_empty_cache_fetches_remote_and_caches() {
        let ctx = setup(InMemoryRemoteStore::with_plans(sample_workout_plans())).await;

        let plans = ctx.repo.get_workout_plans().await;
        assert_eq!(plans.len(), 2);

        let mut cached: Vec<String> = ctx
            .repo
            .local()
            .read_all()
            .await
            .into_iter()
            .map(|p| p.id)
            .collect();
        cached.sort();
        assert_eq!(cached, vec!["plan_1", "plan_2"]);
    }

    #[tokio::test]
    async fn test_cached_plans_win_over_remote() {
        let ctx = setup(InMemoryRemoteStore::with_plans(sample_workout_plans())).await;
        ctx.repo
            .local()
            .write_one(&WorkoutPlan::new("local_only", "Local"))
            .await;

        let plans = ctx.repo.get_workout_plans().await;
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, "local_only");
    }

    #[tokio::test]
    async fn test_offline_with_empty_cache_returns_empty() {
        let ctx = setup(InMemoryRemoteStore::with_plans(sample_workout_plans())).await;
        ctx.remote.set_offline(true);

        assert!(ctx.repo.get_workout_plans().await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_syncs_in_background() {
        let ctx = setup(InMemoryRemoteStore::with_plans(sample_workout_plans())).await;
        ctx.repo.get_workout_plans().await;

        let handle = ctx.repo.toggle_exercise_completion("plan_1", "1-2", true).await;

        // Local state reflects the toggle before the remote write lands.
        let cached = ctx.repo.get_plan("plan_1").await.unwrap();
        assert!(cached.exercises[1].is_completed);

        handle.await.unwrap();
        assert!(ctx.remote.plan("plan_1").unwrap().exercises[1].is_completed);
        assert!(ctx.repo.local().pending_unsynced().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_sync_stays_pending_until_resync() {
        let ctx = setup(InMemoryRemoteStore::with_plans(sample_workout_plans())).await;
        ctx.repo.get_workout_plans().await;
        ctx.remote.set_offline(true);

        ctx.repo
            .toggle_exercise_completion("plan_2", "2-1", true)
            .await
            .await
            .unwrap();

        let pending = ctx.repo.local().pending_unsynced().await;
        assert_eq!(pending.len(), 1);
        assert!(!ctx.remote.plan("plan_2").unwrap().exercises[0].is_completed);

        let report = ctx.repo.sync_pending_changes().await;
        assert_eq!(
            report,
            SyncReport {
                pending: 1,
                synced: 0,
                failed: 1
            }
        );

        ctx.remote.set_offline(false);
        let report = ctx.repo.sync_pending_changes().await;
        assert_eq!(report.synced, 1);
        assert!(ctx.repo.local().pending_unsynced().await.is_empty());
        assert!(ctx.remote.plan("plan_2").unwrap().exercises[0].is_completed);
    }

    #[tokio::test]
    async fn test_sync_with_nothing_pending() {
        let ctx = setup(InMemoryRemoteStore::new()).await;
        let report = ctx.repo.sync_pending_changes().await;
        assert_eq!(report, SyncReport::default());
        assert_eq!(report.to_string(), "No pending changes");
    }

    #[tokio::test]
    async fn test_mark_all_exercises_completed() {
        let ctx = setup(InMemoryRemoteStore::with_plans(sample_workout_plans())).await;
        ctx.repo.get_workout_plans().await;

        let handle = ctx.repo.mark_all_exercises_completed("plan_1").await;

        let cached = ctx.repo.get_plan("plan_1").await.unwrap();
        assert!((cached.progress() - 1.0).abs() < f32::EPSILON);
        assert!(cached.exercises.iter().all(|e| e.is_completed));

        handle.await.unwrap();
        let remote = ctx.remote.plan("plan_1").unwrap();
        assert!(remote.exercises.iter().all(|e| e.is_completed));
        assert!(ctx.repo.local().pending_unsynced().await.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_overwrites_cache() {
        let ctx = setup(InMemoryRemoteStore::with_plans(sample_workout_plans())).await;
        ctx.repo.get_workout_plans().await;

        let updated = WorkoutPlan::new("plan_1", "Renamed")
            .with_exercises(vec![Exercise::new("1-1", "Bench Press")]);
        ctx.remote.put_plan(&updated).await.unwrap();

        ctx.repo.refresh_from_server().await;
        assert_eq!(ctx.repo.get_plan("plan_1").await.unwrap().title, "Renamed");
    }

    #[tokio::test]
    async fn test_refresh_offline_returns_cache() {
        let ctx = setup(InMemoryRemoteStore::with_plans(sample_workout_plans())).await;
        ctx.repo.get_workout_plans().await;
        ctx.remote.set_offline(true);

        assert_eq!(ctx.repo.refresh_from_server().await.len(), 2);
    }

    #[tokio::test]
    async fn test_initialize_sample_data() {
        let ctx = setup(InMemoryRemoteStore::new()).await;

        let plans = ctx.repo.initialize_sample_data().await.unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(ctx.remote.plan_count(), 2);
        assert_eq!(ctx.repo.local().read_all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_initialize_sample_data_offline() {
        let ctx = setup(InMemoryRemoteStore::new()).await;
        ctx.remote.set_offline(true);

        assert!(ctx.repo.initialize_sample_data().await.is_err());
        assert!(ctx.repo.local().read_all().await.is_empty());
    }

    /// Answers the first completion update slowly and fails every later one.
    struct SlowThenFailing {
        inner: InMemoryRemoteStore,
        updates: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl RemoteStore for SlowThenFailing {
        async fn fetch_all_plans(&self) -> Result<Vec<WorkoutPlan>, RemoteError> {
            self.inner.fetch_all_plans().await
        }

        async fn fetch_plans_by_creator(
            &self,
            coach_id: &str,
        ) -> Result<Vec<WorkoutPlan>, RemoteError> {
            self.inner.fetch_plans_by_creator(coach_id).await
        }

        async fn fetch_plans_by_assignee(
            &self,
            athlete_id: &str,
        ) -> Result<Vec<WorkoutPlan>, RemoteError> {
            self.inner.fetch_plans_by_assignee(athlete_id).await
        }

        async fn fetch_plan(&self, plan_id: &str) -> Result<Option<WorkoutPlan>, RemoteError> {
            self.inner.fetch_plan(plan_id).await
        }

        async fn put_plan(&self, plan: &WorkoutPlan) -> Result<(), RemoteError> {
            self.inner.put_plan(plan).await
        }

        async fn update_exercise_completion(
            &self,
            plan_id: &str,
            exercise_id: &str,
            completed: bool,
        ) -> Result<(), RemoteError> {
            let call = self
                .updates
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if call > 0 {
                return Err(RemoteError::Offline);
            }
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            self.inner
                .update_exercise_completion(plan_id, exercise_id, completed)
                .await
        }

        async fn mark_all_completed(&self, plan_id: &str) -> Result<(), RemoteError> {
            self.inner.mark_all_completed(plan_id).await
        }

        async fn fetch_progress(
            &self,
            user_id: &str,
        ) -> Result<Vec<crate::models::WorkoutProgress>, RemoteError> {
            self.inner.fetch_progress(user_id).await
        }

        async fn append_progress(
            &self,
            progress: &crate::models::WorkoutProgress,
        ) -> Result<crate::models::WorkoutProgress, RemoteError> {
            self.inner.append_progress(progress).await
        }

        async fn fetch_coaches(&self) -> Result<Vec<crate::models::Coach>, RemoteError> {
            self.inner.fetch_coaches().await
        }
    }

    #[tokio::test]
    async fn test_late_ack_does_not_hide_newer_failed_toggle() {
        let temp_dir = TempDir::new().unwrap();
        let local = LocalCache::open(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let remote = Arc::new(SlowThenFailing {
            inner: InMemoryRemoteStore::with_plans(sample_workout_plans()),
            updates: Default::default(),
        });
        let repo = WorkoutRepository::new(local, remote);
        repo.get_workout_plans().await;

        let first = repo.toggle_exercise_completion("plan_1", "1-1", true).await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        let second = repo.toggle_exercise_completion("plan_1", "1-1", false).await;

        second.await.unwrap();
        first.await.unwrap();

        let pending = repo.local().pending_unsynced().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].exercise_id, "1-1");
        assert!(!pending[0].is_completed);
        assert!(!pending[0].is_synced);
    }
}
