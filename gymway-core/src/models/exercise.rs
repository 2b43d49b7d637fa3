use serde::{Deserialize, Serialize};
use std::fmt;

/// A single exercise inside a workout plan.
///
/// Exercises are embedded in their plan, never referenced on their own, so
/// the id only needs to be unique within one plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    /// Working weight in kilograms, if the exercise is weighted.
    pub weight: Option<f64>,
    /// Rest between sets, in seconds.
    pub rest_time: u32,
    pub notes: String,
    pub muscle_group: String,
    pub is_completed: bool,
}

impl Default for Exercise {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            sets: 3,
            reps: 10,
            weight: None,
            rest_time: 60,
            notes: String::new(),
            muscle_group: String::new(),
            is_completed: false,
        }
    }
}

impl Exercise {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_sets_reps(mut self, sets: u32, reps: u32) -> Self {
        self.sets = sets;
        self.reps = reps;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_muscle_group(mut self, muscle_group: impl Into<String>) -> Self {
        self.muscle_group = muscle_group.into();
        self
    }

    /// Short prescription, e.g. `3 x 10` or `3 x 10 - 60kg`.
    pub fn display_text(&self) -> String {
        match self.weight {
            Some(weight) => format!("{} x {} - {}kg", self.sets, self.reps, weight),
            None => format!("{} x {}", self.sets, self.reps),
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.is_completed { "x" } else { " " };
        write!(f, "[{}] {} ({})", mark, self.name, self.display_text())
    }
}
