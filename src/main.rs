//! HrFlow webhook relay
//!
//! Receives signed HrFlow webhook deliveries, verifies them and logs every
//! event. Serves as the reference host for the library's webhook router.

use hrflow_client::{
    router, AppConfig, HrFlowClient, RelayState, WebhookEvent, WebhookHandler,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    tracing::info!("Starting HrFlow webhook relay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        api_url = %config.api.url,
        "Configuration loaded"
    );

    let mut client = HrFlowClient::from_config(&config)?;
    for event in WebhookEvent::ALL {
        client
            .webhooks_mut()
            .set_handler(event, WebhookHandler::with_event(log_delivery));
    }
    tracing::info!(
        handlers = client.webhooks().handler_count(),
        "Webhook handlers registered"
    );

    let state = Arc::new(RelayState::new(client.into_webhooks()));
    let app = router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    tracing::info!(%addr, "Listening for webhook deliveries");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Webhook relay stopped");
    Ok(())
}

fn log_delivery(payload: &serde_json::Value, event: WebhookEvent) {
    if event.is_error() {
        tracing::warn!(event = %event, payload = %payload, "HrFlow reported a failure");
    } else {
        tracing::info!(event = %event, payload = %payload, "HrFlow event received");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hrflow_client=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Load and validate configuration
fn load_config() -> anyhow::Result<AppConfig> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    config
        .validate_relay()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    Ok(config)
}
