//! Error types for the HrFlow client

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Library-level errors
#[derive(Error, Debug)]
pub enum HrFlowError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Transport error talking to the REST API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// No webhook secret configured on this client
    #[error("Error: no webhook secret.")]
    MissingSecret,

    /// Signature header absent from both the explicit argument and the headers
    #[error("Error: No {0} given")]
    MissingSignature(&'static str),

    /// Envelope could not be split into signature and payload
    #[error("Error invalid request: {0}")]
    MalformedEnvelope(String),

    /// HMAC mismatch. Deliberately carries no detail.
    #[error("Error: invalid signature.")]
    InvalidSignature,

    /// Payload segment is not valid base64, UTF-8 or JSON
    #[error("Error invalid payload: {0}")]
    InvalidPayload(String),

    /// Decoded payload has no `type` field
    #[error("Error invalid request: no type field found.")]
    MissingEventType,

    /// Event name outside the fixed vocabulary
    #[error("{0} is not a valid event")]
    UnknownEvent(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response structure for the webhook endpoint
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HrFlowError {
    /// HTTP status and machine-readable reason for this error
    fn classify(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            HrFlowError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error",
                "configuration_error",
            ),
            HrFlowError::MissingSecret => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error",
                "configuration_error",
            ),
            HrFlowError::Http(_) => (StatusCode::BAD_GATEWAY, "error", "upstream_error"),
            HrFlowError::Api { .. } => (StatusCode::BAD_GATEWAY, "error", "upstream_error"),
            HrFlowError::MissingSignature(_) => {
                (StatusCode::UNAUTHORIZED, "rejected", "missing_signature")
            }
            HrFlowError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "rejected",
                "authentication_failed",
            ),
            HrFlowError::MalformedEnvelope(_) => {
                (StatusCode::BAD_REQUEST, "rejected", "malformed_envelope")
            }
            HrFlowError::InvalidPayload(_) => {
                (StatusCode::BAD_REQUEST, "rejected", "invalid_payload")
            }
            HrFlowError::MissingEventType => {
                (StatusCode::BAD_REQUEST, "rejected", "invalid_request")
            }
            HrFlowError::UnknownEvent(_) => {
                (StatusCode::BAD_REQUEST, "rejected", "unknown_event")
            }
            HrFlowError::Validation(_) => {
                (StatusCode::BAD_REQUEST, "rejected", "validation_failed")
            }
        }
    }
}

impl IntoResponse for HrFlowError {
    fn into_response(self) -> Response {
        let (status_code, status, reason) = self.classify();

        // Signature failures never echo anything back
        let details = match &self {
            HrFlowError::InvalidSignature => None,
            other => Some(other.to_string()),
        };

        let error_response = ErrorResponse {
            status,
            reason: reason.to_string(),
            details,
        };

        tracing::warn!(
            error_type = %self,
            status_code = %status_code,
            "Webhook delivery rejected"
        );

        (status_code, Json(json!(error_response))).into_response()
    }
}

/// Result type alias for convenience
pub type HrFlowResult<T> = Result<T, HrFlowError>;
