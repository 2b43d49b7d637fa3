//! GymWay Document Server
//!
//! Serves accounts, sessions and the shared workout collections to GymWay
//! clients. See [`gymway::server::config`] for the environment variables
//! and config file it reads.

use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gymway::server::{router, AppState, ServerConfig};

const TOKEN_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env();

    std::fs::create_dir_all(&config.data_dir)?;

    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Config file: {}", config.config_path.display());
    if config.smtp.is_none() {
        tracing::warn!("No SMTP settings, verification links will be logged");
    }

    let state = AppState::new(&config);

    let verifications = state.verifications.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TOKEN_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = verifications.cleanup_expired();
            if removed > 0 {
                tracing::debug!("Dropped {} expired verification token(s)", removed);
            }
        }
    });

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gymway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("Server failed: {}", e);
        std::process::exit(1);
    }
}
