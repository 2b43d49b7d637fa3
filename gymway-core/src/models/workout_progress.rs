use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry in an athlete's progress log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkoutProgress {
    pub id: String,
    pub user_id: String,
    pub workout_plan_id: String,
    pub date: DateTime<Utc>,
    pub completed_exercises: u32,
    pub total_exercises: u32,
    pub notes: String,
    /// Body weight in kilograms.
    pub weight: Option<f64>,
    /// Body fat percentage.
    pub body_fat: Option<f64>,
}

impl Default for WorkoutProgress {
    fn default() -> Self {
        Self {
            id: String::new(),
            user_id: String::new(),
            workout_plan_id: String::new(),
            date: Utc::now(),
            completed_exercises: 0,
            total_exercises: 0,
            notes: String::new(),
            weight: None,
            body_fat: None,
        }
    }
}

impl WorkoutProgress {
    pub fn new(
        user_id: impl Into<String>,
        workout_plan_id: impl Into<String>,
        completed_exercises: u32,
        total_exercises: u32,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            workout_plan_id: workout_plan_id.into(),
            completed_exercises,
            total_exercises,
            ..Default::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_body_metrics(mut self, weight: Option<f64>, body_fat: Option<f64>) -> Self {
        self.weight = weight;
        self.body_fat = body_fat;
        self
    }

    pub fn completion_rate(&self) -> f32 {
        if self.total_exercises == 0 {
            return 0.0;
        }
        self.completed_exercises as f32 / self.total_exercises as f32
    }
}

impl fmt::Display for WorkoutProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  plan {}  {}/{} ({:.0}%)",
            self.date.format("%Y-%m-%d"),
            self.workout_plan_id,
            self.completed_exercises,
            self.total_exercises,
            self.completion_rate() * 100.0
        )?;
        if let Some(weight) = self.weight {
            write!(f, "  {} kg", weight)?;
        }
        if let Some(body_fat) = self.body_fat {
            write!(f, "  {}% fat", body_fat)?;
        }
        if !self.notes.is_empty() {
            write!(f, "\n    {}", self.notes)?;
        }
        Ok(())
    }
}
