mod coach;
mod difficulty;
mod exercise;
mod exercise_status;
mod sample;
mod user;
mod workout_plan;
mod workout_progress;

pub use coach::Coach;
pub use difficulty::Difficulty;
pub use exercise::Exercise;
pub use exercise_status::ExerciseStatus;
pub use sample::sample_workout_plans;
pub use user::{ProfileUpdate, Role, User};
pub use workout_plan::WorkoutPlan;
pub use workout_progress::WorkoutProgress;
