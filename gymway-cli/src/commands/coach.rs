use clap::{Args, Subcommand};

use super::{short_id, OutputFormat};
use crate::context::Context;
use crate::error::CliError;

#[derive(Args)]
pub struct CoachCommand {
    #[command(subcommand)]
    command: CoachSubcommand,
}

#[derive(Subcommand)]
enum CoachSubcommand {
    /// List coaches
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl CoachCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), CliError> {
        match &self.command {
            CoachSubcommand::List { format } => {
                let view = ctx.coach_view();
                view.load_coaches().await?;
                if let Some(error) = view.current_error() {
                    return Err(CliError::Failed(error));
                }
                let coaches = view.coaches().borrow().clone();

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&coaches)?);
                    }
                    OutputFormat::Text => {
                        if coaches.is_empty() {
                            println!("No coaches found.");
                            return Ok(());
                        }

                        println!(
                            "{:<14} {:<24} {:<20} {:>8}",
                            "ID", "NAME", "SPECIALTY", "ATHLETES"
                        );
                        println!("{}", "-".repeat(69));
                        for coach in &coaches {
                            println!(
                                "{:<14} {:<24} {:<20} {:>8}",
                                short_id(&coach.id),
                                coach.name,
                                coach.specialty,
                                coach.athletes_count()
                            );
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
