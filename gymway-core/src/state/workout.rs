use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::{WorkoutPlan, WorkoutProgress};
use crate::remote::RemoteStore;
use crate::repository::{ProgressRepository, SyncReport, WorkoutRepository};

struct Inner<R> {
    repository: WorkoutRepository<R>,
    progress: ProgressRepository<R>,
    plans: watch::Sender<Vec<WorkoutPlan>>,
    progress_history: watch::Sender<Vec<WorkoutProgress>>,
    is_loading: watch::Sender<bool>,
    is_syncing: watch::Sender<bool>,
    error_message: watch::Sender<Option<String>>,
}

impl<R: RemoteStore + 'static> Inner<R> {
    fn set_error(&self, message: String) {
        tracing::warn!("{}", message);
        self.error_message.send_replace(Some(message));
    }

    async fn reload_plans(&self) {
        let plans = self.repository.get_workout_plans().await;
        tracing::debug!("Loaded {} plan(s) into view state", plans.len());
        self.plans.send_replace(plans);
    }

    async fn reload_progress(&self, user_id: &str) {
        match self.progress.history(user_id).await {
            Ok(entries) => {
                self.progress_history.send_replace(entries);
            }
            Err(e) => self.set_error(format!("Failed to load progress history: {}", e)),
        }
    }
}

/// Plans, progress log and sync status for the athlete screens.
pub struct WorkoutViewModel<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for WorkoutViewModel<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RemoteStore + 'static> WorkoutViewModel<R> {
    pub fn new(repository: WorkoutRepository<R>, progress: ProgressRepository<R>) -> Self {
        Self {
            inner: Arc::new(Inner {
                repository,
                progress,
                plans: watch::Sender::new(Vec::new()),
                progress_history: watch::Sender::new(Vec::new()),
                is_loading: watch::Sender::new(false),
                is_syncing: watch::Sender::new(false),
                error_message: watch::Sender::new(None),
            }),
        }
    }

    pub fn plans(&self) -> watch::Receiver<Vec<WorkoutPlan>> {
        self.inner.plans.subscribe()
    }

    pub fn progress_history(&self) -> watch::Receiver<Vec<WorkoutProgress>> {
        self.inner.progress_history.subscribe()
    }

    pub fn is_loading(&self) -> watch::Receiver<bool> {
        self.inner.is_loading.subscribe()
    }

    pub fn is_syncing(&self) -> watch::Receiver<bool> {
        self.inner.is_syncing.subscribe()
    }

    pub fn error_message(&self) -> watch::Receiver<Option<String>> {
        self.inner.error_message.subscribe()
    }

    /// Snapshot of the current plan list.
    pub fn current_plans(&self) -> Vec<WorkoutPlan> {
        self.inner.plans.borrow().clone()
    }

    pub fn current_error(&self) -> Option<String> {
        self.inner.error_message.borrow().clone()
    }

    pub fn load_workout_plans(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        inner.is_loading.send_replace(true);
        inner.error_message.send_replace(None);

        tokio::spawn(async move {
            inner.reload_plans().await;
            inner.is_loading.send_replace(false);
        })
    }

    /// Flips one exercise in the published plans, then persists and syncs
    /// it. The returned handle finishes once the remote write has settled.
    pub fn toggle_exercise_completion(
        &self,
        plan_id: &str,
        exercise_id: &str,
        completed: bool,
    ) -> JoinHandle<()> {
        self.inner.plans.send_modify(|plans| {
            if let Some(plan) = plans.iter_mut().find(|p| p.id == plan_id) {
                plan.set_exercise_completed(exercise_id, completed);
                tracing::debug!(
                    "Optimistic update of '{}': {}/{}",
                    plan.title,
                    plan.completed_count(),
                    plan.exercises.len()
                );
            }
        });

        let inner = Arc::clone(&self.inner);
        let plan_id = plan_id.to_string();
        let exercise_id = exercise_id.to_string();

        tokio::spawn(async move {
            let sync = inner
                .repository
                .toggle_exercise_completion(&plan_id, &exercise_id, completed)
                .await;
            if let Err(e) = sync.await {
                inner.set_error(format!("Failed to update exercise: {}", e));
                inner.reload_plans().await;
            }
        })
    }

    pub fn mark_all_exercises_completed(&self, plan_id: &str) -> JoinHandle<()> {
        self.inner.plans.send_modify(|plans| {
            if let Some(plan) = plans.iter_mut().find(|p| p.id == plan_id) {
                plan.mark_all_completed();
            }
        });

        let inner = Arc::clone(&self.inner);
        let plan_id = plan_id.to_string();

        tokio::spawn(async move {
            let sync = inner.repository.mark_all_exercises_completed(&plan_id).await;
            if let Err(e) = sync.await {
                inner.set_error(format!("Failed to complete exercises: {}", e));
                inner.reload_plans().await;
            }
        })
    }

    pub fn load_progress_history(&self, user_id: &str) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let user_id = user_id.to_string();
        inner.is_loading.send_replace(true);

        tokio::spawn(async move {
            inner.reload_progress(&user_id).await;
            inner.is_loading.send_replace(false);
        })
    }

    /// Appends the entry to the published history, then stores it. A
    /// failed write reloads the history from the remote store.
    pub fn record_progress(&self, progress: WorkoutProgress) -> JoinHandle<()> {
        let mut progress = progress;
        if progress.id.is_empty() {
            progress.id = uuid::Uuid::new_v4().to_string();
        }
        self.inner.progress_history.send_modify(|history| {
            history.insert(0, progress.clone());
        });

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let user_id = progress.user_id.clone();
            if let Err(e) = inner.progress.record(progress).await {
                inner.set_error(format!("Failed to record progress: {}", e));
                inner.reload_progress(&user_id).await;
            }
        })
    }

    pub fn sync_pending_changes(&self) -> JoinHandle<SyncReport> {
        let inner = Arc::clone(&self.inner);
        inner.is_syncing.send_replace(true);

        tokio::spawn(async move {
            let report = inner.repository.sync_pending_changes().await;
            if report.failed > 0 {
                inner.set_error(format!(
                    "{} change(s) could not be synced",
                    report.failed
                ));
            }
            inner.reload_plans().await;
            inner.is_syncing.send_replace(false);
            report
        })
    }

    pub fn refresh_from_server(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        inner.is_loading.send_replace(true);

        tokio::spawn(async move {
            let plans = inner.repository.refresh_from_server().await;
            inner.plans.send_replace(plans);
            inner.is_loading.send_replace(false);
        })
    }

    pub fn initialize_sample_data(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        inner.is_loading.send_replace(true);

        tokio::spawn(async move {
            if let Err(e) = inner.repository.initialize_sample_data().await {
                inner.set_error(format!("Failed to create sample data: {}", e));
            }
            inner.reload_plans().await;
            inner.is_loading.send_replace(false);
        })
    }

    pub fn clear_error(&self) {
        self.inner.error_message.send_replace(None);
    }
}
