//! HTTP handlers for the webhook relay

mod health;
mod webhook;

pub use health::*;
pub use webhook::*;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::webhook::WebhookVerifier;

/// Shared state for the relay routes
pub struct RelayState {
    /// Verifier with its handlers already registered
    pub verifier: WebhookVerifier,
    /// Application start time
    pub started_at: DateTime<Utc>,
}

impl RelayState {
    pub fn new(verifier: WebhookVerifier) -> Self {
        Self {
            verifier,
            started_at: Utc::now(),
        }
    }
}

/// Routes: `POST /webhook` and `GET /health`
pub fn router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
