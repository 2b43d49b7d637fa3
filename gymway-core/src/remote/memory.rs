use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{RemoteError, RemoteStore};
use crate::models::{Coach, WorkoutPlan, WorkoutProgress};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local [`RemoteStore`].
///
/// `set_offline(true)` makes every call fail with [`RemoteError::Offline`]
/// until it is switched back.
#[derive(Debug, Default)]
pub struct InMemoryRemoteStore {
    plans: Mutex<BTreeMap<String, WorkoutPlan>>,
    progress: Mutex<Vec<WorkoutProgress>>,
    coaches: Mutex<Vec<Coach>>,
    offline: AtomicBool,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plans(plans: Vec<WorkoutPlan>) -> Self {
        let store = Self::new();
        {
            let mut map = lock(&store.plans);
            for plan in plans {
                map.insert(plan.id.clone(), plan);
            }
        }
        store
    }

    pub fn with_coaches(self, coaches: Vec<Coach>) -> Self {
        *lock(&self.coaches) = coaches;
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Direct read that bypasses the offline switch.
    pub fn plan(&self, plan_id: &str) -> Option<WorkoutPlan> {
        lock(&self.plans).get(plan_id).cloned()
    }

    pub fn plan_count(&self) -> usize {
        lock(&self.plans).len()
    }

    fn ensure_online(&self) -> Result<(), RemoteError> {
        if self.is_offline() {
            return Err(RemoteError::Offline);
        }
        Ok(())
    }

    fn filter_plans<F>(&self, predicate: F) -> Vec<WorkoutPlan>
    where
        F: Fn(&WorkoutPlan) -> bool,
    {
        lock(&self.plans)
            .values()
            .filter(|p| predicate(p))
            .cloned()
            .collect()
    }

    fn modify_plan<F>(&self, plan_id: &str, apply: F) -> Result<(), RemoteError>
    where
        F: FnOnce(&mut WorkoutPlan),
    {
        self.ensure_online()?;
        let mut plans = lock(&self.plans);
        let plan = plans
            .get_mut(plan_id)
            .ok_or_else(|| RemoteError::NotFound("workout plan".to_string()))?;
        apply(plan);
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn fetch_all_plans(&self) -> Result<Vec<WorkoutPlan>, RemoteError> {
        self.ensure_online()?;
        Ok(self.filter_plans(|_| true))
    }

    async fn fetch_plans_by_creator(
        &self,
        coach_id: &str,
    ) -> Result<Vec<WorkoutPlan>, RemoteError> {
        self.ensure_online()?;
        Ok(self.filter_plans(|p| p.created_by == coach_id))
    }

    async fn fetch_plans_by_assignee(
        &self,
        athlete_id: &str,
    ) -> Result<Vec<WorkoutPlan>, RemoteError> {
        self.ensure_online()?;
        Ok(self.filter_plans(|p| p.assigned_to == athlete_id))
    }

    async fn fetch_plan(&self, plan_id: &str) -> Result<Option<WorkoutPlan>, RemoteError> {
        self.ensure_online()?;
        Ok(self.plan(plan_id))
    }

    async fn put_plan(&self, plan: &WorkoutPlan) -> Result<(), RemoteError> {
        self.ensure_online()?;
        lock(&self.plans).insert(plan.id.clone(), plan.clone());
        Ok(())
    }

    async fn update_exercise_completion(
        &self,
        plan_id: &str,
        exercise_id: &str,
        completed: bool,
    ) -> Result<(), RemoteError> {
        self.modify_plan(plan_id, |plan| {
            plan.set_exercise_completed(exercise_id, completed);
        })
    }

    async fn mark_all_completed(&self, plan_id: &str) -> Result<(), RemoteError> {
        self.modify_plan(plan_id, WorkoutPlan::mark_all_completed)
    }

    async fn fetch_progress(&self, user_id: &str) -> Result<Vec<WorkoutProgress>, RemoteError> {
        self.ensure_online()?;
        Ok(lock(&self.progress)
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn append_progress(
        &self,
        progress: &WorkoutProgress,
    ) -> Result<WorkoutProgress, RemoteError> {
        self.ensure_online()?;
        let mut stored = progress.clone();
        if stored.id.is_empty() {
            stored.id = uuid::Uuid::new_v4().to_string();
        }
        lock(&self.progress).push(stored.clone());
        Ok(stored)
    }

    async fn fetch_coaches(&self) -> Result<Vec<Coach>, RemoteError> {
        self.ensure_online()?;
        Ok(lock(&self.coaches).clone())
    }
}
