//! Push relay web server.
//!
//! Receives signed GitHub push webhooks and fans main-branch pushes out to the
//! configured repositories as `repository_dispatch` events.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay::{router, AppState, Config, Dispatcher};

#[tokio::main]
async fn main() -> Result<()> {
    // Local .env is optional
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!(dotenv_loaded = dotenv_loaded, "web_server_starting");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        port = config.port,
        github_token_configured = config.github_token.is_some(),
        event_type = %config.event_type,
        targets = ?config.targets.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
        api_url = %config.api_url,
        dispatch_timeout_ms = config.dispatch_timeout_ms,
        "config_loaded"
    );

    let dispatcher = Dispatcher::from_config(&config).context("Failed to create HTTP client")?;

    // Create application state
    let port = config.port;
    let state = AppState::new(config, dispatcher);

    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
