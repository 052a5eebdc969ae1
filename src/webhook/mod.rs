//! Inbound webhook support
//!
//! Decodes the signed envelope sent in the `HTTP-HRFLOW-SIGNATURE` header,
//! authenticates it with the shared webhook secret and dispatches the
//! payload to the handler registered for its event type.

mod envelope;
mod events;
mod handler;
mod verifier;

pub use envelope::{sign, SignedEnvelope, SIGNATURE_HEADER};
pub use events::WebhookEvent;
pub use handler::WebhookHandler;
pub use verifier::{Dispatch, HeaderLookup, VerifiedDelivery, WebhookVerifier};
