use clap::{Args, Subcommand};

use gymway_core::{IdentityProvider, ProfileUpdate};

use super::OutputFormat;
use crate::context::Context;
use crate::error::CliError;

#[derive(Args)]
pub struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand)]
enum ProfileSubcommand {
    /// Show your profile
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update profile fields
    Update {
        /// New display name
        #[arg(long, short)]
        name: Option<String>,

        /// Age in years
        #[arg(long)]
        age: Option<u32>,

        /// Gender
        #[arg(long)]
        gender: Option<String>,
    },
}

impl ProfileCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), CliError> {
        let uid = ctx.require_uid()?;

        match &self.command {
            ProfileSubcommand::Show { format } => {
                let user = ctx.identity.fetch_profile(&uid).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
                    OutputFormat::Text => print!("{}", user),
                }
                Ok(())
            }

            ProfileSubcommand::Update { name, age, gender } => {
                let update = ProfileUpdate {
                    display_name: name.clone(),
                    age: *age,
                    gender: gender.clone(),
                };
                if update.is_empty() {
                    println!("Nothing to update. Pass --name, --age or --gender.");
                    return Ok(());
                }

                ctx.identity.update_profile(&uid, &update).await?;
                println!("Profile updated.");
                Ok(())
            }
        }
    }
}
