//! Registered webhook callbacks

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use super::events::WebhookEvent;

/// A callback for one event type
///
/// Two explicit shapes instead of inspecting the callback's arity: a
/// payload-only callback, or one that also receives the event.
#[derive(Clone)]
pub enum WebhookHandler {
    /// Receives the decoded payload only
    Payload(Arc<dyn Fn(&Value) + Send + Sync>),
    /// Receives the decoded payload and its event type
    PayloadWithEvent(Arc<dyn Fn(&Value, WebhookEvent) + Send + Sync>),
}

impl WebhookHandler {
    pub fn payload<F>(callback: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        WebhookHandler::Payload(Arc::new(callback))
    }

    pub fn with_event<F>(callback: F) -> Self
    where
        F: Fn(&Value, WebhookEvent) + Send + Sync + 'static,
    {
        WebhookHandler::PayloadWithEvent(Arc::new(callback))
    }

    pub(crate) fn invoke(&self, payload: &Value, event: WebhookEvent) {
        match self {
            WebhookHandler::Payload(callback) => callback(payload),
            WebhookHandler::PayloadWithEvent(callback) => callback(payload, event),
        }
    }
}

impl fmt::Debug for WebhookHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookHandler::Payload(_) => f.write_str("WebhookHandler::Payload"),
            WebhookHandler::PayloadWithEvent(_) => f.write_str("WebhookHandler::PayloadWithEvent"),
        }
    }
}
