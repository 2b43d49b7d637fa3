mod auth;
mod coach;
mod config_cmd;
mod plan;
mod profile;
mod progress;
mod sync_cmd;

use clap::ValueEnum;
use std::io::{self, Write};

pub use auth::AuthCommand;
pub use coach::CoachCommand;
pub use config_cmd::ConfigCommand;
pub use plan::{PlanCommand, PlanSubcommand};
pub use profile::ProfileCommand;
pub use progress::{ProgressCommand, ProgressSubcommand};
pub use sync_cmd::SyncCommand;

use crate::error::CliError;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Reads one line from stdin after printing `label`.
fn prompt(label: &str) -> Result<String, CliError> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Returns the given password or asks for one.
fn password_or_prompt(password: &Option<String>) -> Result<String, CliError> {
    match password {
        Some(p) => Ok(p.clone()),
        None => prompt("Password: "),
    }
}

/// Shortens ids for table output.
fn short_id(id: &str) -> &str {
    match id.char_indices().nth(12) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("plan_1"), "plan_1");
        assert_eq!(short_id("0123456789abcdef"), "0123456789ab");
    }
}
