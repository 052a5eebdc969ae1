//! Webhook handler registry and delivery pipeline
//!
//! A delivery moves through decode, signature check and dispatch. Any failing
//! step rejects the whole delivery with an error; there is no partial success.
//! A recognised event with no registered handler is a successful no-op.
//!
//! Handlers are expected to be registered before deliveries are processed.
//! Mutation takes `&mut self`, so registering while another thread dispatches
//! requires the caller to hold its own lock.

use axum::http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::collections::HashMap;
use std::hash::BuildHasher;

use super::envelope::{SignedEnvelope, SIGNATURE_HEADER};
use super::events::WebhookEvent;
use super::handler::WebhookHandler;
use crate::error::{HrFlowError, HrFlowResult};

/// Source of request headers for [`WebhookVerifier::handle`]
pub trait HeaderLookup {
    fn header(&self, name: &str) -> Option<&str>;
}

/// Case-insensitive, as HTTP header names are
impl HeaderLookup for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Exact-match lookup for header mappings built by the caller
impl<S: BuildHasher> HeaderLookup for HashMap<String, String, S> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// An authenticated, decoded delivery
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedDelivery {
    pub event: WebhookEvent,
    pub payload: Value,
}

/// Outcome of a successful [`WebhookVerifier::handle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The registered handler ran
    Handled(WebhookEvent),
    /// Recognised event, nothing registered for it
    NoHandler(WebhookEvent),
}

impl Dispatch {
    pub fn event(&self) -> WebhookEvent {
        match self {
            Dispatch::Handled(event) | Dispatch::NoHandler(event) => *event,
        }
    }
}

/// Verifies signed webhook deliveries and dispatches them to handlers
#[derive(Debug, Default)]
pub struct WebhookVerifier {
    secret: Option<SecretString>,
    handlers: HashMap<WebhookEvent, WebhookHandler>,
}

impl WebhookVerifier {
    /// Create a verifier. Without a secret every delivery is rejected.
    pub fn new(secret: Option<SecretString>) -> Self {
        Self {
            secret,
            handlers: HashMap::new(),
        }
    }

    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self::new(Some(SecretString::new(secret.into())))
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Number of events with a registered handler
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Register `handler` for `event`, replacing any previous one
    pub fn set_handler(&mut self, event: WebhookEvent, handler: WebhookHandler) {
        tracing::debug!(event = %event, "Webhook handler registered");
        self.handlers.insert(event, handler);
    }

    pub fn remove_handler(&mut self, event: WebhookEvent) {
        self.handlers.remove(&event);
    }

    pub fn is_handler_present(&self, event: WebhookEvent) -> bool {
        self.handlers.contains_key(&event)
    }

    /// String-keyed [`WebhookVerifier::set_handler`]. Fails on unknown names.
    pub fn set_handler_by_name(&mut self, event_name: &str, handler: WebhookHandler) -> HrFlowResult<()> {
        let event = event_name.parse()?;
        self.set_handler(event, handler);
        Ok(())
    }

    pub fn remove_handler_by_name(&mut self, event_name: &str) -> HrFlowResult<()> {
        let event = event_name.parse()?;
        self.remove_handler(event);
        Ok(())
    }

    pub fn is_handler_present_by_name(&self, event_name: &str) -> HrFlowResult<bool> {
        let event = event_name.parse()?;
        Ok(self.is_handler_present(event))
    }

    /// Decode and authenticate a delivery without dispatching it
    ///
    /// The envelope comes from `signature_header` when given, otherwise from
    /// the `HTTP-HRFLOW-SIGNATURE` entry of `headers`.
    pub fn verify<H>(&self, headers: &H, signature_header: Option<&str>) -> HrFlowResult<VerifiedDelivery>
    where
        H: HeaderLookup + ?Sized,
    {
        let secret = self.secret.as_ref().ok_or(HrFlowError::MissingSecret)?;

        let encoded = signature_header
            .or_else(|| headers.header(SIGNATURE_HEADER))
            .ok_or(HrFlowError::MissingSignature(SIGNATURE_HEADER))?;

        let envelope = SignedEnvelope::parse(encoded)?;

        if let Err(e) = envelope.verify(secret.expose_secret().as_bytes()) {
            tracing::warn!(
                payload_size = envelope.payload().len(),
                "Webhook signature verification failed"
            );
            return Err(e);
        }

        let payload = envelope.payload_json()?;
        let event = match payload.get("type") {
            None => return Err(HrFlowError::MissingEventType),
            Some(Value::String(name)) => name.parse::<WebhookEvent>()?,
            Some(other) => return Err(HrFlowError::UnknownEvent(other.to_string())),
        };

        Ok(VerifiedDelivery { event, payload })
    }

    /// Decode, authenticate and dispatch a delivery
    ///
    /// Any error means the delivery must be rejected.
    pub fn handle<H>(&self, headers: &H, signature_header: Option<&str>) -> HrFlowResult<Dispatch>
    where
        H: HeaderLookup + ?Sized,
    {
        let delivery = self.verify(headers, signature_header)?;
        Ok(self.dispatch(&delivery))
    }

    /// [`WebhookVerifier::handle`] for a bare envelope string
    pub fn handle_signature(&self, signature_header: &str) -> HrFlowResult<Dispatch> {
        self.handle(&HeaderMap::new(), Some(signature_header))
    }

    fn dispatch(&self, delivery: &VerifiedDelivery) -> Dispatch {
        match self.handlers.get(&delivery.event) {
            Some(handler) => {
                handler.invoke(&delivery.payload, delivery.event);
                tracing::info!(event = %delivery.event, "Webhook delivery dispatched");
                Dispatch::Handled(delivery.event)
            }
            None => {
                tracing::debug!(event = %delivery.event, "No handler registered for webhook event");
                Dispatch::NoHandler(delivery.event)
            }
        }
    }
}
