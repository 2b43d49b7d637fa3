//! GymWay Admin CLI
//!
//! Administration tool working directly on the server's data directory.
//!
//! # Usage
//!
//! ```bash
//! gymway-admin user list
//! gymway-admin user verify erik@example.com
//! gymway-admin coach add erik@example.com --specialty strength
//! gymway-admin coach list
//! gymway-admin seed --coach <uid>
//! ```
//!
//! # Environment Variables
//!
//! - `GYMWAY_DATA_DIR`: Directory where server stores data (default: ~/.local/share/gymway-server)

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

use gymway::server::config::default_data_dir;
use gymway::server::{AccountStore, Document, DocumentStore};
use gymway_core::remote::collections::{COACHES, USERS, WORKOUT_PLANS};
use gymway_core::{sample_workout_plans, Coach};

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "gymway-admin")]
#[command(version)]
#[command(about = "GymWay server administration tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage accounts
    User(UserCommand),
    /// Manage coaches
    Coach(CoachCommand),
    /// Store the demo workout plans
    Seed {
        /// User id recorded as the plans' creator
        #[arg(long)]
        coach: Option<String>,
        /// Overwrite plans that already exist
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand)]
enum UserSubcommand {
    /// List all accounts
    List,
    /// Mark an account's email as verified
    Verify {
        /// Account email address
        email: String,
    },
}

#[derive(Args)]
struct CoachCommand {
    #[command(subcommand)]
    command: CoachSubcommand,
}

#[derive(Subcommand)]
enum CoachSubcommand {
    /// Make an existing account a coach
    Add {
        /// Account email address
        email: String,
        /// Coaching specialty
        #[arg(long, short)]
        specialty: Option<String>,
    },
    /// List coaches
    List,
}

// ============================================================================
// Storage
// ============================================================================

/// Get the data directory for the server
fn data_dir() -> PathBuf {
    std::env::var("GYMWAY_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_data_dir())
}

fn string_field(doc: &Document, field: &str) -> String {
    doc.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// Commands
// ============================================================================

fn list_users() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = data_dir();
    let accounts = AccountStore::load(&data_dir);
    let documents = DocumentStore::new(&data_dir);

    if accounts.is_empty() {
        println!("No accounts registered.");
        return Ok(());
    }

    println!(
        "{:<34} {:<32} {:<9} {:<8} {:<20}",
        "UID", "EMAIL", "VERIFIED", "ROLE", "NAME"
    );
    println!("{}", "-".repeat(106));

    for account in accounts.list() {
        let profile = documents.get(USERS, &account.uid)?.unwrap_or_default();
        println!(
            "{:<34} {:<32} {:<9} {:<8} {:<20}",
            account.uid,
            account.email,
            if account.email_verified { "yes" } else { "no" },
            string_field(&profile, "role"),
            string_field(&profile, "displayName"),
        );
    }

    println!();
    println!("Total: {} account(s)", accounts.len());

    Ok(())
}

fn verify_user(email: String) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = data_dir();
    let accounts = AccountStore::load(&data_dir);
    let documents = DocumentStore::new(&data_dir);

    let account = accounts.mark_verified(&email)?;

    let mut fields = Document::new();
    fields.insert("emailVerified".to_string(), Value::Bool(true));
    if documents.get(USERS, &account.uid)?.is_some() {
        documents.merge(USERS, &account.uid, fields)?;
    }

    println!("Verified: {} ({})", account.email, account.uid);
    Ok(())
}

fn add_coach(email: String, specialty: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = data_dir();
    let accounts = AccountStore::load(&data_dir);
    let documents = DocumentStore::new(&data_dir);

    let account = accounts
        .get_by_email(&email)
        .ok_or_else(|| format!("No account for '{}'", email))?;

    if documents.get(COACHES, &account.uid)?.is_some() {
        return Err(format!("'{}' is already a coach", account.email).into());
    }

    let profile = documents.get(USERS, &account.uid)?.unwrap_or_default();
    let coach = Coach {
        id: account.uid.clone(),
        name: string_field(&profile, "displayName"),
        email: account.email.clone(),
        specialty: specialty.clone().unwrap_or_default(),
        athletes: Vec::new(),
        created_at: Some(Utc::now()),
    };
    let doc = match serde_json::to_value(&coach)? {
        Value::Object(doc) => doc,
        _ => return Err("coach did not serialize to an object".into()),
    };
    documents.put(COACHES, &account.uid, doc)?;

    if !profile.is_empty() {
        let mut fields = Document::new();
        fields.insert("role".to_string(), Value::String("coach".to_string()));
        documents.merge(USERS, &account.uid, fields)?;
    }

    println!("Added coach: {}", account.email);
    if let Some(s) = specialty {
        println!("  Specialty: {}", s);
    }

    Ok(())
}

fn list_coaches() -> Result<(), Box<dyn std::error::Error>> {
    let documents = DocumentStore::new(data_dir());
    let coaches = documents.list(COACHES, &[])?;

    if coaches.is_empty() {
        println!("No coaches registered.");
        return Ok(());
    }

    println!("{:<34} {:<24} {:<20} {:>8}", "ID", "NAME", "SPECIALTY", "ATHLETES");
    println!("{}", "-".repeat(89));

    for doc in &coaches {
        let coach: Coach = serde_json::from_value(Value::Object(doc.clone()))?;
        println!(
            "{:<34} {:<24} {:<20} {:>8}",
            coach.id,
            coach.name,
            coach.specialty,
            coach.athletes_count()
        );
    }

    println!();
    println!("Total: {} coach(es)", coaches.len());

    Ok(())
}

fn seed(coach: Option<String>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let documents = DocumentStore::new(data_dir());
    let mut stored = 0;

    for mut plan in sample_workout_plans() {
        if !force && documents.get(WORKOUT_PLANS, &plan.id)?.is_some() {
            println!("Skipped {} (exists)", plan.id);
            continue;
        }
        if let Some(coach) = &coach {
            plan.created_by = coach.clone();
        }

        let doc = match serde_json::to_value(&plan)? {
            Value::Object(doc) => doc,
            _ => return Err("plan did not serialize to an object".into()),
        };
        documents.put(WORKOUT_PLANS, &plan.id, doc)?;
        println!("Stored {}: {}", plan.id, plan.title);
        stored += 1;
    }

    println!();
    println!("Seeded {} plan(s)", stored);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::User(user_cmd) => match user_cmd.command {
            UserSubcommand::List => list_users(),
            UserSubcommand::Verify { email } => verify_user(email),
        },
        Commands::Coach(coach_cmd) => match coach_cmd.command {
            CoachSubcommand::Add { email, specialty } => add_coach(email, specialty),
            CoachSubcommand::List => list_coaches(),
        },
        Commands::Seed { coach, force } => seed(coach, force),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
