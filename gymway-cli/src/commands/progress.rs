use clap::{Args, Subcommand};

use gymway_core::WorkoutProgress;

use super::{short_id, OutputFormat};
use crate::context::Context;
use crate::error::CliError;

#[derive(Args)]
pub struct ProgressCommand {
    #[command(subcommand)]
    pub command: ProgressSubcommand,
}

#[derive(Subcommand)]
pub enum ProgressSubcommand {
    /// Record a finished workout
    Log {
        /// Plan ID the workout followed
        plan_id: String,

        /// Notes about the session
        #[arg(long, short)]
        notes: Option<String>,

        /// Body weight in kg
        #[arg(long, short)]
        weight: Option<f64>,

        /// Body fat percentage
        #[arg(long)]
        body_fat: Option<f64>,
    },

    /// Show your progress history, newest first
    History {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ProgressCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), CliError> {
        let uid = ctx.require_uid()?;

        match &self.command {
            ProgressSubcommand::Log {
                plan_id,
                notes,
                weight,
                body_fat,
            } => {
                let plan = ctx
                    .workouts()
                    .get_plan(plan_id)
                    .await
                    .ok_or_else(|| format!("Plan not found: {}", plan_id))?;

                let progress = WorkoutProgress::new(
                    uid,
                    plan_id.clone(),
                    plan.completed_count() as u32,
                    plan.exercises.len() as u32,
                )
                .with_notes(notes.clone().unwrap_or_default())
                .with_body_metrics(*weight, *body_fat);

                let view = ctx.workout_view();
                view.record_progress(progress.clone()).await?;
                if let Some(error) = view.current_error() {
                    return Err(CliError::Failed(error));
                }

                println!("Logged workout:");
                println!("{}", progress);
                Ok(())
            }

            ProgressSubcommand::History { format } => {
                let view = ctx.workout_view();
                view.load_progress_history(&uid).await?;
                if let Some(error) = view.current_error() {
                    return Err(CliError::Failed(error));
                }
                let history = view.progress_history().borrow().clone();

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&history)?);
                    }
                    OutputFormat::Text => {
                        if history.is_empty() {
                            println!("No workouts logged yet.");
                            return Ok(());
                        }

                        println!(
                            "{:<11} {:<14} {:>7} {:>8} {:>6}  NOTES",
                            "DATE", "PLAN", "DONE", "WEIGHT", "FAT%"
                        );
                        println!("{}", "-".repeat(70));
                        for entry in &history {
                            println!(
                                "{:<11} {:<14} {:>3}/{:<3} {:>8} {:>6}  {}",
                                entry.date.format("%Y-%m-%d").to_string(),
                                short_id(&entry.workout_plan_id),
                                entry.completed_exercises,
                                entry.total_exercises,
                                entry.weight.map(|w| format!("{}kg", w)).unwrap_or_default(),
                                entry.body_fat.map(|f| f.to_string()).unwrap_or_default(),
                                entry.notes
                            );
                        }
                        println!();
                        println!("Total: {} workout(s)", history.len());
                    }
                }
                Ok(())
            }
        }
    }
}
