use chrono::Utc;
use std::sync::Arc;

use crate::local::LocalCache;
use crate::models::{Coach, WorkoutPlan};
use crate::remote::{RemoteError, RemoteStore};

/// Coach-side operations: browsing coaches and authoring plans.
pub struct CoachRepository<R> {
    local: LocalCache,
    remote: Arc<R>,
}

impl<R> Clone for CoachRepository<R> {
    fn clone(&self) -> Self {
        Self {
            local: self.local.clone(),
            remote: Arc::clone(&self.remote),
        }
    }
}

impl<R: RemoteStore + 'static> CoachRepository<R> {
    pub fn new(local: LocalCache, remote: Arc<R>) -> Self {
        Self { local, remote }
    }

    pub async fn get_coaches(&self) -> Result<Vec<Coach>, RemoteError> {
        let coaches = self.remote.fetch_coaches().await?;
        tracing::debug!("Fetched {} coach(es)", coaches.len());
        Ok(coaches)
    }

    /// Plans authored by `coach_id`.
    ///
    /// Falls back to cached plans with the same creator when the remote
    /// store cannot be reached.
    pub async fn get_assigned_workouts(&self, coach_id: &str) -> Vec<WorkoutPlan> {
        match self.remote.fetch_plans_by_creator(coach_id).await {
            Ok(plans) => {
                self.local.write_all(&plans).await;
                plans
            }
            Err(e) => {
                tracing::warn!("Failed to fetch plans of coach {}: {}", coach_id, e);
                self.local
                    .read_all()
                    .await
                    .into_iter()
                    .filter(|p| p.created_by == coach_id)
                    .collect()
            }
        }
    }

    /// Stores a new plan remotely, generating an id when it has none.
    ///
    /// The plan is cached locally even when the remote write fails; the
    /// error is still returned.
    pub async fn create_workout_plan(
        &self,
        mut plan: WorkoutPlan,
    ) -> Result<WorkoutPlan, RemoteError> {
        if plan.id.is_empty() {
            plan.id = uuid::Uuid::new_v4().to_string();
        }

        let result = self.remote.put_plan(&plan).await;
        self.local.write_one(&plan).await;

        match result {
            Ok(()) => {
                tracing::info!("Created workout plan '{}' ({})", plan.title, plan.id);
                Ok(plan)
            }
            Err(e) => {
                tracing::warn!("Failed to create workout plan '{}': {}", plan.title, e);
                Err(e)
            }
        }
    }

    /// Stores a copy of `plan` assigned to `athlete_id` under a fresh id.
    pub async fn assign_workout_to_athlete(
        &self,
        plan: &WorkoutPlan,
        athlete_id: &str,
    ) -> Result<WorkoutPlan, RemoteError> {
        let now = Utc::now();
        let mut assigned = plan.clone();
        assigned.id = format!("assigned_{}", now.timestamp_millis());
        assigned.assigned_to = athlete_id.to_string();
        assigned.assigned_at = Some(now);

        self.remote.put_plan(&assigned).await?;
        self.local.write_one(&assigned).await;
        tracing::info!("Assigned '{}' to {} as {}", plan.title, athlete_id, assigned.id);
        Ok(assigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_workout_plans;
    use crate::remote::InMemoryRemoteStore;
    use tempfile::TempDir;

    type Fixture = (
        CoachRepository<InMemoryRemoteStore>,
        Arc<InMemoryRemoteStore>,
        TempDir,
    );

    async fn setup(remote: InMemoryRemoteStore) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let local = LocalCache::open(&temp_dir.path().join("test.db"))
            .await
            .unwrap();
        let remote = Arc::new(remote);
        (
            CoachRepository::new(local, Arc::clone(&remote)),
            remote,
            temp_dir,
        )
    }

    fn coach_plans() -> Vec<WorkoutPlan> {
        vec![
            WorkoutPlan::new("c1", "Strength").with_creator("coach_1"),
            WorkoutPlan::new("c2", "Cardio").with_creator("coach_2"),
        ]
    }

    #[tokio::test]
    async fn test_get_coaches() {
        let coaches = vec![Coach {
            id: "coach_1".to_string(),
            name: "Sam".to_string(),
            athletes: vec!["a1".to_string(), "a2".to_string()],
            ..Default::default()
        }];
        let (repo, _remote, _dir) =
            setup(InMemoryRemoteStore::new().with_coaches(coaches.clone())).await;

        assert_eq!(repo.get_coaches().await.unwrap(), coaches);
    }

    #[tokio::test]
    async fn test_assigned_workouts_fall_back_to_cache() {
        let (repo, remote, _dir) = setup(InMemoryRemoteStore::with_plans(coach_plans())).await;

        let online = repo.get_assigned_workouts("coach_1").await;
        assert_eq!(online.len(), 1);

        remote.set_offline(true);
        let offline = repo.get_assigned_workouts("coach_1").await;
        assert_eq!(offline.len(), 1);
        assert_eq!(offline[0].id, "c1");
    }

    #[tokio::test]
    async fn test_create_generates_id() {
        let (repo, remote, _dir) = setup(InMemoryRemoteStore::new()).await;

        let created = repo
            .create_workout_plan(WorkoutPlan::new("", "New Plan").with_creator("coach_1"))
            .await
            .unwrap();

        assert!(!created.id.is_empty());
        assert_eq!(remote.plan(&created.id).unwrap().title, "New Plan");
    }

    #[tokio::test]
    async fn test_create_offline_caches_locally_and_errors() {
        let (repo, remote, _dir) = setup(InMemoryRemoteStore::new()).await;
        remote.set_offline(true);

        let result = repo
            .create_workout_plan(WorkoutPlan::new("draft", "Draft").with_creator("coach_1"))
            .await;

        assert!(result.is_err());
        assert_eq!(remote.plan_count(), 0);
        let cached = repo.get_assigned_workouts("coach_1").await;
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, "draft");
    }

    #[tokio::test]
    async fn test_assign_copies_plan() {
        let (repo, remote, _dir) =
            setup(InMemoryRemoteStore::with_plans(sample_workout_plans())).await;
        let template = remote.plan("plan_1").unwrap();

        let assigned = repo
            .assign_workout_to_athlete(&template, "athlete_9")
            .await
            .unwrap();

        assert!(assigned.id.starts_with("assigned_"));
        assert_eq!(assigned.assigned_to, "athlete_9");
        assert!(assigned.assigned_at.is_some());
        assert_eq!(assigned.exercises, template.exercises);
        assert_eq!(remote.plan_count(), 3);
        assert_eq!(remote.plan("plan_1").unwrap(), template);
    }
}
