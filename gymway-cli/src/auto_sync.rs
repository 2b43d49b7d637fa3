//! Auto-sync functionality for CLI commands.
//!
//! Resends pending exercise toggles before read operations and after write
//! operations when `remote.auto_sync` is enabled in the configuration.

use gymway_core::{check_server, IdentityProvider};

use crate::context::Context;

/// Performs auto-sync if enabled, signed in and the server is reachable.
///
/// Failures are reported on stderr and never fail the command; the CLI
/// keeps working offline from the local cache.
pub async fn try_auto_sync(ctx: &Context) {
    if !ctx.config.auto_sync || ctx.identity.current_uid().is_none() {
        return;
    }

    if check_server(&ctx.config.server_url.value).await.is_err() {
        eprintln!("Auto-sync: server unreachable, skipping");
        return;
    }

    let report = ctx.workouts().sync_pending_changes().await;
    if report.failed > 0 {
        eprintln!("Auto-sync: {}", report);
    } else if report.synced > 0 {
        tracing::info!("Auto-sync: {}", report);
    }
}
