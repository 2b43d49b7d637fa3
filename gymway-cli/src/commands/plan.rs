use clap::{Args, Subcommand};

use gymway_core::{Difficulty, Exercise, HttpRemoteStore, WorkoutPlan, WorkoutViewModel};

use super::{short_id, OutputFormat};
use crate::context::Context;
use crate::error::CliError;

#[derive(Args)]
pub struct PlanCommand {
    #[command(subcommand)]
    pub command: PlanSubcommand,
}

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// List workout plans (cached, fetched on first use)
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a plan and its exercises
    Show {
        /// Plan ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a workout plan (coaches)
    Create {
        /// Plan title
        #[arg(long, short)]
        title: String,

        /// Description
        #[arg(long, short)]
        description: Option<String>,

        /// Planned duration in minutes
        #[arg(long, default_value_t = 60)]
        duration: u32,

        /// Difficulty (beginner, intermediate, advanced)
        #[arg(long, default_value = "beginner")]
        difficulty: String,

        /// Exercise as NAME[:SETSxREPS[@KG]] (can be repeated)
        #[arg(long = "exercise", short = 'e', value_name = "EXERCISE")]
        exercises: Vec<String>,
    },

    /// Assign a copy of a plan to an athlete
    Assign {
        /// Plan ID
        plan_id: String,

        /// Athlete user ID
        athlete_id: String,
    },

    /// Mark one exercise done (or not done with --undo)
    Toggle {
        /// Plan ID
        plan_id: String,

        /// Exercise ID
        exercise_id: String,

        /// Mark the exercise as not done
        #[arg(long)]
        undo: bool,
    },

    /// Mark every exercise of a plan done
    Complete {
        /// Plan ID
        plan_id: String,
    },

    /// Replace the local cache with the server's plans
    Refresh,

    /// Store the demo plans on the server
    Seed,

    /// List the plans you created (coaches)
    Mine {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl PlanCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), CliError> {
        match &self.command {
            PlanSubcommand::List { format } => {
                let view = ctx.workout_view();
                view.load_workout_plans().await?;
                report_error(&view);
                print_plans(&view.current_plans(), format)
            }

            PlanSubcommand::Show { id, format } => {
                let plan = ctx
                    .workouts()
                    .get_plan(id)
                    .await
                    .ok_or_else(|| format!("Plan not found: {}", id))?;

                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
                    OutputFormat::Text => print!("{}", plan),
                }
                Ok(())
            }

            PlanSubcommand::Create {
                title,
                description,
                duration,
                difficulty,
                exercises,
            } => {
                let uid = ctx.require_uid()?;
                let difficulty: Difficulty = difficulty.parse().map_err(CliError::Failed)?;

                let plan_id = uuid::Uuid::new_v4().simple().to_string();
                let exercises = exercises
                    .iter()
                    .enumerate()
                    .map(|(i, arg)| parse_exercise(arg, &format!("{}-{}", &plan_id[..8], i + 1)))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(CliError::Failed)?;

                let mut plan = WorkoutPlan::new(plan_id, title.clone())
                    .with_description(description.clone().unwrap_or_default())
                    .with_exercises(exercises)
                    .with_creator(uid);
                plan.duration = *duration;
                plan.difficulty = difficulty;

                let view = ctx.coach_view();
                view.create_workout_plan(plan.clone())?.await?;
                if let Some(error) = view.current_error() {
                    eprintln!("Warning: {}", error);
                    println!("Saved locally as {}.", plan.id);
                    return Ok(());
                }

                println!("Created workout plan:");
                print!("{}", plan);
                Ok(())
            }

            PlanSubcommand::Assign {
                plan_id,
                athlete_id,
            } => {
                ctx.require_uid()?;
                let plan = ctx
                    .workouts()
                    .get_plan(plan_id)
                    .await
                    .ok_or_else(|| format!("Plan not found: {}", plan_id))?;

                let view = ctx.coach_view();
                view.assign_workout_to_athlete(&plan, athlete_id).await?;
                if let Some(error) = view.current_error() {
                    return Err(CliError::Failed(error));
                }

                let assigned = view.assigned_workouts().borrow().last().cloned();
                match assigned {
                    Some(copy) => println!(
                        "Assigned '{}' to {} as {}",
                        plan.title, athlete_id, copy.id
                    ),
                    None => println!("Assigned '{}' to {}", plan.title, athlete_id),
                }
                Ok(())
            }

            PlanSubcommand::Toggle {
                plan_id,
                exercise_id,
                undo,
            } => {
                let view = ctx.workout_view();
                let plan = loaded_plan(&view, plan_id).await?;
                if !plan.exercises.iter().any(|e| &e.id == exercise_id) {
                    return Err(format!("Exercise {} not found in plan {}", exercise_id, plan_id).into());
                }

                view.toggle_exercise_completion(plan_id, exercise_id, !undo)
                    .await?;
                report_error(&view);
                print_progress(&view, plan_id);
                report_pending(ctx, plan_id).await;
                Ok(())
            }

            PlanSubcommand::Complete { plan_id } => {
                let view = ctx.workout_view();
                loaded_plan(&view, plan_id).await?;

                view.mark_all_exercises_completed(plan_id).await?;
                report_error(&view);
                print_progress(&view, plan_id);
                report_pending(ctx, plan_id).await;
                Ok(())
            }

            PlanSubcommand::Refresh => {
                let view = ctx.workout_view();
                view.refresh_from_server().await?;
                println!("Cached {} plan(s) from the server.", view.current_plans().len());
                Ok(())
            }

            PlanSubcommand::Seed => {
                ctx.require_uid()?;
                let view = ctx.workout_view();
                view.initialize_sample_data().await?;
                if let Some(error) = view.current_error() {
                    return Err(CliError::Failed(error));
                }
                println!("Stored {} plan(s).", view.current_plans().len());
                Ok(())
            }

            PlanSubcommand::Mine { format } => {
                let uid = ctx.require_uid()?;
                let view = ctx.coach_view();
                view.load_assigned_workouts(&uid).await?;
                if let Some(error) = view.current_error() {
                    eprintln!("Warning: {}", error);
                }
                let plans = view.assigned_workouts().borrow().clone();
                print_plans(&plans, format)
            }
        }
    }
}

/// Loads the plan list into the view and returns the requested plan.
async fn loaded_plan(
    view: &WorkoutViewModel<HttpRemoteStore>,
    plan_id: &str,
) -> Result<WorkoutPlan, CliError> {
    view.load_workout_plans().await?;
    view.current_plans()
        .into_iter()
        .find(|p| p.id == plan_id)
        .ok_or_else(|| CliError::Failed(format!("Plan not found: {}", plan_id)))
}

fn report_error(view: &WorkoutViewModel<HttpRemoteStore>) {
    if let Some(error) = view.current_error() {
        eprintln!("Warning: {}", error);
    }
}

fn print_progress(view: &WorkoutViewModel<HttpRemoteStore>, plan_id: &str) {
    if let Some(plan) = view.current_plans().iter().find(|p| p.id == plan_id) {
        println!(
            "{}: {}/{} done ({:.0}%)",
            plan.title,
            plan.completed_count(),
            plan.exercises.len(),
            plan.progress() * 100.0
        );
    }
}

async fn report_pending(ctx: &Context, plan_id: &str) {
    let pending = ctx
        .local
        .statuses_for_plan(plan_id)
        .await
        .iter()
        .filter(|s| !s.is_synced)
        .count();
    if pending > 0 {
        println!(
            "{} change(s) saved locally, run 'gym sync' when the server is reachable.",
            pending
        );
    }
}

fn print_plans(plans: &[WorkoutPlan], format: &OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(plans)?);
        }
        OutputFormat::Text => {
            if plans.is_empty() {
                println!("No workout plans found.");
                return Ok(());
            }

            println!(
                "{:<14} {:<32} {:<13} {:>8} {:>9}",
                "ID", "TITLE", "DIFFICULTY", "DURATION", "PROGRESS"
            );
            println!("{}", "-".repeat(80));
            for plan in plans {
                println!(
                    "{:<14} {:<32} {:<13} {:>5} min {:>5}/{:<3}",
                    short_id(&plan.id),
                    plan.title,
                    plan.difficulty.to_string(),
                    plan.duration,
                    plan.completed_count(),
                    plan.exercises.len()
                );
            }
        }
    }
    Ok(())
}

/// Parses `NAME[:SETSxREPS[@KG]]`, e.g. `Squat:4x8@80`.
fn parse_exercise(arg: &str, id: &str) -> Result<Exercise, String> {
    let (name, prescription) = match arg.rsplit_once(':') {
        Some((name, rest)) => (name.trim(), Some(rest.trim())),
        None => (arg.trim(), None),
    };
    if name.is_empty() {
        return Err(format!("Invalid exercise '{}': name is required", arg));
    }

    let mut exercise = Exercise::new(id, name);
    let Some(prescription) = prescription else {
        return Ok(exercise);
    };

    let (sets_reps, weight) = match prescription.split_once('@') {
        Some((sr, kg)) => (sr, Some(kg)),
        None => (prescription, None),
    };

    let invalid = || format!("Invalid exercise '{}'. Use NAME:SETSxREPS[@KG]", arg);
    let (sets, reps) = sets_reps.split_once(['x', 'X']).ok_or_else(invalid)?;
    let sets: u32 = sets.trim().parse().map_err(|_| invalid())?;
    let reps: u32 = reps.trim().parse().map_err(|_| invalid())?;
    exercise = exercise.with_sets_reps(sets, reps);

    if let Some(kg) = weight {
        let kg: f64 = kg.trim().trim_end_matches("kg").parse().map_err(|_| invalid())?;
        exercise = exercise.with_weight(kg);
    }

    Ok(exercise)
}
