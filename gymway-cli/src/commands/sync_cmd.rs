//! Sync CLI commands for resending local changes to the server.

use clap::{Args, Subcommand};

use gymway_core::{check_server, IdentityProvider};

use crate::context::Context;
use crate::error::CliError;

/// Sync with remote server
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Show sync configuration, pending changes and server status
    Status,
}

impl SyncCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), CliError> {
        match &self.command {
            None => self.sync(ctx).await,
            Some(SyncSubcommand::Status) => self.status(ctx).await,
        }
    }

    async fn sync(&self, ctx: &Context) -> Result<(), CliError> {
        ctx.require_uid()?;
        println!("Syncing with server...");

        let view = ctx.workout_view();
        let report = view.sync_pending_changes().await?;

        println!();
        println!("  {}", report);
        if let Some(error) = view.current_error() {
            println!();
            return Err(CliError::Failed(error));
        }

        println!();
        if report.synced > 0 {
            println!("Sync complete.");
        } else {
            println!("Already up to date.");
        }
        Ok(())
    }

    async fn status(&self, ctx: &Context) -> Result<(), CliError> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        println!("Server:    {}", ctx.config.server_url.value);
        println!(
            "Auto-sync: {}",
            if ctx.config.auto_sync {
                "enabled"
            } else {
                "disabled"
            }
        );
        match ctx.identity.current_uid() {
            Some(uid) => println!("User:      {}", uid),
            None => println!("User:      not signed in"),
        }

        let pending = ctx.local.pending_unsynced().await;
        println!("Pending:   {} change(s)", pending.len());
        for status in &pending {
            println!(
                "  {} / {} -> {}",
                status.workout_plan_id,
                status.exercise_id,
                if status.is_completed { "done" } else { "not done" }
            );
        }
        println!();

        match check_server(&ctx.config.server_url.value).await {
            Ok(()) => println!("Server status: ✓ reachable"),
            Err(e) => println!("Server status: ✗ {}", e),
        }

        Ok(())
    }
}
