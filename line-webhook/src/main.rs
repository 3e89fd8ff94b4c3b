//! LINE webhook server.
//!
//! Receives signed webhook batches from the LINE platform, replies to
//! messages, follows and postbacks, and acknowledges every authenticated
//! batch.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use line_webhook::web::{router, AppState};
use line_webhook::{Config, EventDispatcher, IngestionPipeline, KeywordComposer, LineReplyClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration; a missing secret is fatal
    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        port = config.port,
        channel_secret_set = !config.channel_secret.is_empty(),
        channel_access_token_set = !config.channel_access_token.is_empty(),
        api_base_url = %config.api_base_url,
        reply_timeout_ms = config.reply_timeout_ms,
        dispatch_concurrency = config.dispatch_concurrency,
        "config_loaded"
    );

    // Create the reply client shared by all requests
    let reply_client = LineReplyClient::new(
        &config.api_base_url,
        config.channel_access_token.clone(),
        config.reply_timeout(),
    )
    .context("Failed to create reply client")?;
    info!(endpoint = %reply_client.endpoint(), "line_reply_client_created");

    let dispatcher = EventDispatcher::new(Arc::new(reply_client), Arc::new(KeywordComposer))
        .with_concurrency(config.dispatch_concurrency);

    let pipeline = IngestionPipeline::new(
        config.channel_secret.clone(),
        dispatcher,
        config.reply_timeout(),
    )
    .context("Failed to build ingestion pipeline")?;

    // Build the router
    let app = router(AppState::new(pipeline));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
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
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
