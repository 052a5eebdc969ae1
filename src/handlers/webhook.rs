//! Webhook handler for incoming HrFlow deliveries

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::RelayState;
use crate::error::HrFlowError;
use crate::webhook::{Dispatch, WebhookEvent};

/// Webhook response
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Always `accepted`; rejections are returned as errors
    pub status: &'static str,
    /// Event type of the delivery
    pub event: WebhookEvent,
    /// Whether a handler was registered for the event
    pub handled: bool,
}

/// Webhook handler
///
/// POST /webhook
///
/// The signed envelope travels in the `HTTP-HRFLOW-SIGNATURE` header; the
/// request body is ignored. Registered handlers run on the request task, so
/// they should not block for long.
pub async fn webhook_handler(
    State(state): State<Arc<RelayState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<WebhookResponse>), HrFlowError> {
    let dispatch = state.verifier.handle(&headers, None)?;

    Ok((
        StatusCode::OK,
        Json(WebhookResponse {
            status: "accepted",
            event: dispatch.event(),
            handled: matches!(dispatch, Dispatch::Handled(_)),
        }),
    ))
}
