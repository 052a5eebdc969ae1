//! HrFlow Client Library
//!
//! Client for the HrFlow HR REST API: request transport with client-side
//! rate limiting, and verification and dispatch of signed webhook deliveries.

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod rate_limiter;
pub mod webhook;

pub use client::{ApiResponse, FilePart, HrFlowClient, Params, Payload};
pub use config::{AppConfig, CLIENT_API_URL};
pub use error::{HrFlowError, HrFlowResult};
pub use handlers::{router, RelayState};
pub use rate_limiter::{rate_limited, RateLimitPolicy, RateLimited, RateLimiter};
pub use webhook::{
    Dispatch, HeaderLookup, SignedEnvelope, VerifiedDelivery, WebhookEvent, WebhookHandler,
    WebhookVerifier, SIGNATURE_HEADER,
};
