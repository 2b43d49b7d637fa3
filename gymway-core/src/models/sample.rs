//! Fixed demo plans used to seed an empty store.

use super::{Exercise, WorkoutPlan};

pub fn sample_workout_plans() -> Vec<WorkoutPlan> {
    vec![
        WorkoutPlan::new("plan_1", "Day 1 - Chest and Triceps")
            .with_description("Strength work for chest and triceps")
            .with_exercises(vec![
                Exercise::new("1-1", "Bench Press")
                    .with_sets_reps(3, 10)
                    .with_muscle_group("chest"),
                Exercise::new("1-2", "Chest Fly")
                    .with_sets_reps(3, 12)
                    .with_muscle_group("chest"),
                Exercise::new("1-3", "Cable Triceps Pushdown")
                    .with_sets_reps(3, 15)
                    .with_muscle_group("triceps"),
            ]),
        WorkoutPlan::new("plan_2", "Day 2 - Legs and Core")
            .with_description("Lower body and core")
            .with_exercises(vec![
                Exercise::new("2-1", "Squat")
                    .with_sets_reps(4, 8)
                    .with_muscle_group("legs"),
                Exercise::new("2-2", "Leg Press")
                    .with_sets_reps(3, 10)
                    .with_muscle_group("legs"),
                Exercise::new("2-3", "Sit Up")
                    .with_sets_reps(3, 20)
                    .with_muscle_group("core"),
            ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_plans() {
        let plans = sample_workout_plans();
        assert_eq!(plans.len(), 2);
        assert!(plans.iter().all(|p| p.exercises.len() == 3));
        assert_eq!(plans[0].id, "plan_1");
    }
}
