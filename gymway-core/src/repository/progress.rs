use std::sync::Arc;

use crate::models::WorkoutProgress;
use crate::remote::{RemoteError, RemoteStore};

/// Athlete progress log, kept only in the remote store.
pub struct ProgressRepository<R> {
    remote: Arc<R>,
}

impl<R> Clone for ProgressRepository<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
        }
    }
}

impl<R: RemoteStore + 'static> ProgressRepository<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self { remote }
    }

    /// Progress entries of one user, newest first.
    pub async fn history(&self, user_id: &str) -> Result<Vec<WorkoutProgress>, RemoteError> {
        let mut entries = self.remote.fetch_progress(user_id).await?;
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    pub async fn record(&self, progress: WorkoutProgress) -> Result<WorkoutProgress, RemoteError> {
        let mut progress = progress;
        if progress.id.is_empty() {
            progress.id = uuid::Uuid::new_v4().to_string();
        }
        let saved = self.remote.append_progress(&progress).await?;
        tracing::info!(
            "Recorded progress for plan {}: {}/{}",
            saved.workout_plan_id,
            saved.completed_exercises,
            saved.total_exercises
        );
        Ok(saved)
    }
}
