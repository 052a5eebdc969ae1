//! Health check endpoint

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use super::RelayState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Uptime in seconds
    pub uptime_seconds: i64,
    /// Whether deliveries can be verified at all
    pub webhook_secret_configured: bool,
    /// Number of events with a registered handler
    pub handlers: usize,
}

/// Health check handler
///
/// GET /health
///
/// Reports `degraded` with 503 when no webhook secret is configured, since
/// every delivery would be rejected.
pub async fn health_check(State(state): State<Arc<RelayState>>) -> (StatusCode, Json<HealthResponse>) {
    let uptime = (Utc::now() - state.started_at).num_seconds();
    let secret_configured = state.verifier.has_secret();

    let (status_code, status) = if secret_configured {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            uptime_seconds: uptime,
            webhook_secret_configured: secret_configured,
            handlers: state.verifier.handler_count(),
        }),
    )
}
