use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::difficulty::Difficulty;
use super::exercise::Exercise;

/// A workout plan created by a coach and assigned to an athlete.
///
/// `created_by` and `assigned_to` are user ids. Nothing checks that those
/// users exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkoutPlan {
    pub id: String,
    pub title: String,
    pub description: String,
    pub exercises: Vec<Exercise>,
    /// Planned duration in minutes.
    pub duration: u32,
    pub difficulty: Difficulty,
    pub created_by: String,
    pub assigned_to: String,
    pub assigned_at: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Default for WorkoutPlan {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            exercises: Vec::new(),
            duration: 60,
            difficulty: Difficulty::default(),
            created_by: String::new(),
            assigned_to: String::new(),
            assigned_at: None,
            is_completed: false,
            completed_at: None,
        }
    }
}

impl WorkoutPlan {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_exercises(mut self, exercises: Vec<Exercise>) -> Self {
        self.exercises = exercises;
        self
    }

    pub fn with_creator(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    pub fn with_assignee(mut self, assigned_to: impl Into<String>) -> Self {
        self.assigned_to = assigned_to.into();
        self
    }

    pub fn completed_count(&self) -> usize {
        self.exercises.iter().filter(|e| e.is_completed).count()
    }

    /// Fraction of exercises completed, `0.0` for a plan without exercises.
    pub fn progress(&self) -> f32 {
        if self.exercises.is_empty() {
            return 0.0;
        }
        self.completed_count() as f32 / self.exercises.len() as f32
    }

    /// Sets the completion flag of one exercise.
    ///
    /// Returns false if no exercise has the given id.
    pub fn set_exercise_completed(&mut self, exercise_id: &str, completed: bool) -> bool {
        let mut found = false;
        for exercise in self.exercises.iter_mut().filter(|e| e.id == exercise_id) {
            exercise.is_completed = completed;
            found = true;
        }
        found
    }

    pub fn mark_all_completed(&mut self) {
        for exercise in &mut self.exercises {
            exercise.is_completed = true;
        }
    }
}

impl fmt::Display for WorkoutPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "{}", "=".repeat(self.title.len()))?;
        writeln!(f, "ID: {}", self.id)?;
        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
        }
        writeln!(f, "Duration: {} min", self.duration)?;
        writeln!(f, "Difficulty: {}", self.difficulty)?;
        if !self.created_by.is_empty() {
            writeln!(f, "Coach: {}", self.created_by)?;
        }
        if !self.assigned_to.is_empty() {
            writeln!(f, "Athlete: {}", self.assigned_to)?;
        }
        writeln!(
            f,
            "Progress: {}/{} ({:.0}%)",
            self.completed_count(),
            self.exercises.len(),
            self.progress() * 100.0
        )?;

        if !self.exercises.is_empty() {
            writeln!(f, "\nExercises:")?;
            for exercise in &self.exercises {
                writeln!(f, "  {}  {}", exercise, exercise.id)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_exercise_plan() -> WorkoutPlan {
        WorkoutPlan::new("p1", "Push Day").with_exercises(vec![
            Exercise::new("e1", "Bench Press"),
            Exercise::new("e2", "Dips"),
            Exercise::new("e3", "Triceps Pushdown"),
        ])
    }

    #[test]
    fn test_progress_empty_plan_is_zero() {
        let plan = WorkoutPlan::new("p", "Empty");
        assert_eq!(plan.progress(), 0.0);
    }

    #[test]
    fn test_progress_one_of_three() {
        let mut plan = three_exercise_plan();
        assert!(plan.set_exercise_completed("e2", true));
        assert!((plan.progress() - 0.33).abs() < 0.01);
    }

    #[test]
    fn test_mark_all_completed() {
        let mut plan = three_exercise_plan();
        plan.set_exercise_completed("e1", true);
        plan.mark_all_completed();
        assert_eq!(plan.progress(), 1.0);
        assert!(plan.exercises.iter().all(|e| e.is_completed));
    }

    #[test]
    fn test_set_unknown_exercise() {
        let mut plan = three_exercise_plan();
        assert!(!plan.set_exercise_completed("missing", true));
        assert_eq!(plan.completed_count(), 0);
    }

    #[test]
    fn test_defaults_from_sparse_document() {
        let plan: WorkoutPlan = serde_json::from_str(r#"{"id":"x","title":"T"}"#).unwrap();
        assert_eq!(plan.duration, 60);
        assert_eq!(plan.difficulty, Difficulty::Beginner);
        assert!(plan.exercises.is_empty());
    }

    #[test]
    fn test_display() {
        let plan = three_exercise_plan();
        let output = format!("{}", plan);
        assert!(output.contains("Push Day"));
        assert!(output.contains("0/3"));
        assert!(output.contains("Bench Press"));
    }

    #[test]
    fn test_display_lists_each_exercise_once_with_id() {
        let output = three_exercise_plan().to_string();
        assert_eq!(output.matches("Exercises:").count(), 1);
        for (id, name) in [("e1", "Bench Press"), ("e2", "Dips"), ("e3", "Triceps Pushdown")] {
            assert_eq!(output.matches(name).count(), 1);
            assert!(output.lines().any(|l| l.contains(name) && l.ends_with(id)));
        }
    }
}
