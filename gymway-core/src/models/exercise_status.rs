use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local-only record of an exercise completion toggle.
///
/// A row stays `is_synced == false` until the matching remote write has
/// succeeded. Only the latest toggle per exercise is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseStatus {
    pub exercise_id: String,
    pub workout_plan_id: String,
    pub is_completed: bool,
    pub is_synced: bool,
    pub last_updated: DateTime<Utc>,
}

impl ExerciseStatus {
    /// A fresh, not yet synced toggle.
    pub fn pending(
        exercise_id: impl Into<String>,
        workout_plan_id: impl Into<String>,
        is_completed: bool,
    ) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            workout_plan_id: workout_plan_id.into(),
            is_completed,
            is_synced: false,
            last_updated: Utc::now(),
        }
    }
}
