use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auto_sync;
mod commands;
mod config;
mod context;
mod error;

use auto_sync::try_auto_sync;
use commands::{
    AuthCommand, CoachCommand, ConfigCommand, PlanCommand, PlanSubcommand, ProfileCommand,
    ProgressCommand, ProgressSubcommand, SyncCommand,
};
use config::Config;
use context::Context;
use error::CliError;

#[derive(Parser)]
#[command(name = "gym")]
#[command(version)]
#[command(about = "GymWay workout plans and progress from the command line", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register, sign in and verify your email
    Auth(AuthCommand),

    /// View and edit your profile
    Profile(ProfileCommand),

    /// Browse, create and complete workout plans
    Plan(PlanCommand),

    /// Log workouts and view progress history
    Progress(ProgressCommand),

    /// Browse coaches
    Coach(CoachCommand),

    /// Resend local changes to the server
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("GYM_LOG")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config)?;

    let command = match cli.command {
        // Config commands need neither the cache nor the network
        Some(Commands::Config(cmd)) => return Ok(cmd.run(&config)?),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_command(command, config))?;
    Ok(())
}

async fn run_command(command: Commands, config: Config) -> Result<(), CliError> {
    let ctx = Context::open(config).await?;

    // Auto-sync BEFORE read commands
    if is_read_command(&command) {
        try_auto_sync(&ctx).await;
    }

    let result = execute_command(&command, &ctx).await;

    // Auto-sync AFTER write commands (only if command succeeded)
    if result.is_ok() && is_write_command(&command) {
        try_auto_sync(&ctx).await;
    }

    result
}

async fn execute_command(command: &Commands, ctx: &Context) -> Result<(), CliError> {
    match command {
        Commands::Auth(cmd) => cmd.run(ctx).await,
        Commands::Profile(cmd) => cmd.run(ctx).await,
        Commands::Plan(cmd) => cmd.run(ctx).await,
        Commands::Progress(cmd) => cmd.run(ctx).await,
        Commands::Coach(cmd) => cmd.run(ctx).await,
        Commands::Sync(cmd) => cmd.run(ctx).await,
        Commands::Config(cmd) => cmd.run(&ctx.config),
    }
}

/// Returns true if the command is a read operation that should sync before execution.
fn is_read_command(cmd: &Commands) -> bool {
    matches!(
        cmd,
        Commands::Plan(p) if matches!(p.command,
            PlanSubcommand::List { .. } | PlanSubcommand::Show { .. } | PlanSubcommand::Mine { .. })
    ) || matches!(
        cmd,
        Commands::Progress(p) if matches!(p.command, ProgressSubcommand::History { .. })
    ) || matches!(cmd, Commands::Coach(_))
}

/// Returns true if the command is a write operation that should sync after execution.
fn is_write_command(cmd: &Commands) -> bool {
    matches!(
        cmd,
        Commands::Plan(p) if matches!(p.command,
            PlanSubcommand::Create { .. }
            | PlanSubcommand::Assign { .. }
            | PlanSubcommand::Toggle { .. }
            | PlanSubcommand::Complete { .. })
    ) || matches!(
        cmd,
        Commands::Progress(p) if matches!(p.command, ProgressSubcommand::Log { .. })
    )
}
