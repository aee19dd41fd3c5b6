//! Calendar API server - Handles the /push endpoint.
//!
//! Endpoints:
//! - PUT /push - Replace a user's events for one day
//! - OPTIONS /push - CORS preflight

mod routes;

use anyhow::{Context, Result};
use clap::Parser;
use shared::config::DEFAULT_CONFIG_PATH;
use shared::{bootstrap, CalendarService, Config};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the json config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let args = Args::parse();

    let config = Config::from_file(&args.config).context("Failed to load config")?;
    info!(path = %args.config.display(), "loaded config");
    let port = config.port()?;

    let service = CalendarService::connect(&config)
        .await
        .context("Failed to open database")?;

    bootstrap::provision_test_user(&config, &service)
        .await
        .context("Failed to create test user")?;

    let app = routes::router(service.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.close().await;
    info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
