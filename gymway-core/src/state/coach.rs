use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::{Coach, WorkoutPlan};
use crate::remote::RemoteStore;
use crate::repository::CoachRepository;
use crate::validation::{validate_workout_plan, ValidationError};

struct Inner<R> {
    repository: CoachRepository<R>,
    coaches: watch::Sender<Vec<Coach>>,
    assigned_workouts: watch::Sender<Vec<WorkoutPlan>>,
    is_loading: watch::Sender<bool>,
    error_message: watch::Sender<Option<String>>,
}

impl<R: RemoteStore + 'static> Inner<R> {
    fn set_error(&self, message: String) {
        tracing::warn!("{}", message);
        self.error_message.send_replace(Some(message));
    }

    async fn reload_assigned(&self, coach_id: &str) {
        let plans = self.repository.get_assigned_workouts(coach_id).await;
        self.assigned_workouts.send_replace(plans);
    }
}

/// Coach list and the plans a coach has authored.
pub struct CoachViewModel<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for CoachViewModel<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RemoteStore + 'static> CoachViewModel<R> {
    pub fn new(repository: CoachRepository<R>) -> Self {
        Self {
            inner: Arc::new(Inner {
                repository,
                coaches: watch::Sender::new(Vec::new()),
                assigned_workouts: watch::Sender::new(Vec::new()),
                is_loading: watch::Sender::new(false),
                error_message: watch::Sender::new(None),
            }),
        }
    }

    pub fn coaches(&self) -> watch::Receiver<Vec<Coach>> {
        self.inner.coaches.subscribe()
    }

    pub fn assigned_workouts(&self) -> watch::Receiver<Vec<WorkoutPlan>> {
        self.inner.assigned_workouts.subscribe()
    }

    pub fn is_loading(&self) -> watch::Receiver<bool> {
        self.inner.is_loading.subscribe()
    }

    pub fn error_message(&self) -> watch::Receiver<Option<String>> {
        self.inner.error_message.subscribe()
    }

    pub fn current_error(&self) -> Option<String> {
        self.inner.error_message.borrow().clone()
    }

    pub fn load_coaches(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        inner.is_loading.send_replace(true);
        inner.error_message.send_replace(None);

        tokio::spawn(async move {
            match inner.repository.get_coaches().await {
                Ok(coaches) => {
                    inner.coaches.send_replace(coaches);
                }
                Err(e) => inner.set_error(format!("Failed to load coaches: {}", e)),
            }
            inner.is_loading.send_replace(false);
        })
    }

    pub fn load_assigned_workouts(&self, coach_id: &str) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let coach_id = coach_id.to_string();
        inner.is_loading.send_replace(true);

        tokio::spawn(async move {
            inner.reload_assigned(&coach_id).await;
            inner.is_loading.send_replace(false);
        })
    }

    /// Validates and publishes the plan, then stores it.
    ///
    /// An invalid plan is rejected without touching any store. A failed
    /// remote write reports the error and reloads the list.
    pub fn create_workout_plan(
        &self,
        plan: WorkoutPlan,
    ) -> Result<JoinHandle<()>, ValidationError> {
        if let Err(e) = validate_workout_plan(&plan) {
            self.inner.set_error(e.to_string());
            return Err(e);
        }

        let mut plan = plan;
        if plan.id.is_empty() {
            plan.id = uuid::Uuid::new_v4().to_string();
        }
        self.inner
            .assigned_workouts
            .send_modify(|plans| plans.push(plan.clone()));

        let inner = Arc::clone(&self.inner);
        inner.is_loading.send_replace(true);

        Ok(tokio::spawn(async move {
            let coach_id = plan.created_by.clone();
            if let Err(e) = inner.repository.create_workout_plan(plan).await {
                inner.set_error(format!("Failed to create workout plan: {}", e));
                inner.reload_assigned(&coach_id).await;
            }
            inner.is_loading.send_replace(false);
        }))
    }

    pub fn assign_workout_to_athlete(&self, plan: &WorkoutPlan, athlete_id: &str) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let plan = plan.clone();
        let athlete_id = athlete_id.to_string();

        tokio::spawn(async move {
            match inner
                .repository
                .assign_workout_to_athlete(&plan, &athlete_id)
                .await
            {
                Ok(assigned) => inner
                    .assigned_workouts
                    .send_modify(|plans| plans.push(assigned)),
                Err(e) => inner.set_error(format!("Failed to assign workout plan: {}", e)),
            }
        })
    }

    pub fn clear_error(&self) {
        self.inner.error_message.send_replace(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalCache;
    use crate::remote::InMemoryRemoteStore;
    use tempfile::TempDir;

    async fn setup() -> (
        CoachViewModel<InMemoryRemoteStore>,
        Arc<InMemoryRemoteStore>,
        TempDir,
    ) {
        let temp_dir = TempDir::new().unwrap();
        let local = LocalCache::open(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let remote = Arc::new(InMemoryRemoteStore::new().with_coaches(vec![Coach {
            id: "coach_1".to_string(),
            name: "Sam".to_string(),
            ..Default::default()
        }]));
        let vm = CoachViewModel::new(CoachRepository::new(local, Arc::clone(&remote)));
        (vm, remote, temp_dir)
    }

    #[tokio::test]
    async fn test_load_coaches() {
        let (vm, _remote, _dir) = setup().await;
        vm.load_coaches().await.unwrap();
        assert_eq!(vm.coaches().borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_load_coaches_offline_sets_error() {
        let (vm, remote, _dir) = setup().await;
        remote.set_offline(true);

        vm.load_coaches().await.unwrap();
        assert_eq!(
            vm.current_error().as_deref(),
            Some("Failed to load coaches: Remote store is offline")
        );
        vm.clear_error();
        assert!(vm.current_error().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_untitled_plan() {
        let (vm, remote, _dir) = setup().await;

        let result = vm.create_workout_plan(WorkoutPlan::new("", "  ").with_creator("coach_1"));
        assert!(result.is_err());
        assert_eq!(vm.current_error().as_deref(), Some("Title is required"));
        assert!(vm.assigned_workouts().borrow().is_empty());
        assert_eq!(remote.plan_count(), 0);
    }

    #[tokio::test]
    async fn test_create_is_published_immediately() {
        let (vm, remote, _dir) = setup().await;
        let assigned = vm.assigned_workouts();

        let handle = vm
            .create_workout_plan(WorkoutPlan::new("", "Push Day").with_creator("coach_1"))
            .unwrap();
        assert_eq!(assigned.borrow().len(), 1);

        handle.await.unwrap();
        assert_eq!(remote.plan_count(), 1);
        assert!(vm.current_error().is_none());
    }

    #[tokio::test]
    async fn test_create_offline_reloads_from_cache() {
        let (vm, remote, _dir) = setup().await;
        remote.set_offline(true);

        vm.create_workout_plan(WorkoutPlan::new("p", "Pull Day").with_creator("coach_1"))
            .unwrap()
            .await
            .unwrap();

        assert!(vm.current_error().is_some());
        // The plan was cached locally, so the fallback reload still lists it.
        let assigned = vm.assigned_workouts();
        let plans = assigned.borrow();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, "p");
    }

    #[tokio::test]
    async fn test_assign_appends_copy() {
        let (vm, remote, _dir) = setup().await;
        let template = WorkoutPlan::new("t", "Template").with_creator("coach_1");

        vm.assign_workout_to_athlete(&template, "athlete_1")
            .await
            .unwrap();

        let assigned = vm.assigned_workouts();
        let plans = assigned.borrow();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].assigned_to, "athlete_1");
        assert_eq!(remote.plan_count(), 1);
    }
}
