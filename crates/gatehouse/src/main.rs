//! # Gatehouse - Login Attempt Guard
//!
//! Sits between the admin login form and the portfolio REST API. Each login
//! view gets its own guard: a honeypot field, an arithmetic challenge after
//! repeated failures, and an escalating cooldown.
//!
//! ## Architecture
//! ```text
//! Admin SPA → Gatehouse (guard per login view) → REST API /auth/login
//! ```
//!
//! The guard is a deterrent for casual scripts, not a security boundary.
//! Anyone can call the REST API directly; real throttling lives there.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod auth;
mod clock;
mod config;
mod guard;
mod routes;
mod state;
mod view;

use auth::HttpAuthenticator;
use clock::SystemClock;
use config::AppConfig;
use state::AppState;
use view::{SessionRegistry, random_operands, session_sweeper};

/// Gatehouse - login attempt guard
#[derive(Parser, Debug)]
#[command(name = "gatehouse")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/gatehouse.toml")]
    config: String,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Authentication API base URL (overrides config)
    #[arg(long, env = "AUTH_API_URL")]
    auth_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level, args.json_logs)?;

    info!("Starting Gatehouse v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::load(&args.config, &args)?;
    info!(path = %args.config, "Configuration loaded");

    // Create shutdown broadcast channel
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    let authenticator = HttpAuthenticator::new(&config.auth.base_url, config.auth.timeout())?;
    info!(url = %authenticator.login_url(), "Authentication API configured");

    let sessions = Arc::new(SessionRegistry::new(
        config.guard,
        Arc::new(SystemClock),
        random_operands(),
        config.session.idle_ttl(),
    ));

    // Spawn idle session sweeper
    let sweeper_sessions = sessions.clone();
    let sweeper_shutdown = shutdown_tx.subscribe();
    let sweep_interval = config.session.sweep_interval();
    tokio::spawn(async move {
        session_sweeper(sweeper_sessions, sweep_interval, sweeper_shutdown).await;
    });

    // Initialize application state
    let state = AppState::new(config.clone(), sessions, Arc::new(authenticator));

    // Build router
    let app = routes::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Gatehouse listening on {}", config.listen_addr);

    // Handle graceful shutdown
    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("Gatehouse shutdown complete");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    Ok(())
}
