//! Webhook Verifier Unit Tests
//!
//! Tests the decode / verify / dispatch pipeline end to end:
//! - Signing then verifying round-trips the payload
//! - Tampering and wrong secrets are rejected
//! - Unknown events are rejected at registration and at delivery
//! - Recognised events without a handler are a no-op

use hrflow_client::webhook::sign;
use hrflow_client::{
    Dispatch, HrFlowError, WebhookEvent, WebhookHandler, WebhookVerifier, SIGNATURE_HEADER,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

const SECRET: &str = "topsecret";

fn envelope(payload: &Value) -> String {
    sign(SECRET.as_bytes(), &payload.to_string()).unwrap()
}

#[test]
fn test_profile_parse_success_scenario() {
    let mut verifier = WebhookVerifier::with_secret(SECRET);
    let received = Arc::new(Mutex::new(Vec::new()));

    let sink = received.clone();
    verifier.set_handler(
        WebhookEvent::ProfileParseSuccess,
        WebhookHandler::payload(move |payload| sink.lock().push(payload.clone())),
    );

    let payload = json!({"type": "profile.parse.success", "id": 42});
    let dispatch = verifier
        .handle(&HashMap::<String, String>::new(), Some(&envelope(&payload)))
        .unwrap();

    assert_eq!(dispatch, Dispatch::Handled(WebhookEvent::ProfileParseSuccess));
    assert_eq!(*received.lock(), vec![payload]);
}

#[test]
fn test_round_trip_preserves_payload() {
    let verifier = WebhookVerifier::with_secret(SECRET);
    let payloads = [
        json!({"type": "job.train.success", "job": {"key": "abc", "tags": ["a", "b"]}}),
        json!({"type": "action.rating.error", "message": "unicode é ✓", "score": 0.25}),
        json!({"type": "job.score.start", "nested": [[1, 2], {"x": null}]}),
    ];

    for payload in payloads {
        let delivery = verifier.verify(&HashMap::<String, String>::new(), Some(&envelope(&payload))).unwrap();
        assert_eq!(delivery.payload, payload);
    }
}

#[test]
fn test_header_mapping_is_used_when_no_explicit_signature() {
    let verifier = WebhookVerifier::with_secret(SECRET);
    let mut headers = HashMap::new();
    headers.insert(
        SIGNATURE_HEADER.to_string(),
        envelope(&json!({"type": "action.stage.error"})),
    );

    let dispatch = verifier.handle(&headers, None).unwrap();
    assert_eq!(dispatch, Dispatch::NoHandler(WebhookEvent::ActionStageError));
}

#[test]
fn test_no_handler_is_silent_success() {
    let mut verifier = WebhookVerifier::with_secret(SECRET);
    let touched = Arc::new(Mutex::new(0));

    // Handler for a different event must not fire
    let counter = touched.clone();
    verifier.set_handler(
        WebhookEvent::JobScoreError,
        WebhookHandler::payload(move |_| *counter.lock() += 1),
    );

    let result = verifier.handle_signature(&envelope(&json!({"type": "job.score.success"})));
    assert_eq!(result.unwrap(), Dispatch::NoHandler(WebhookEvent::JobScoreSuccess));
    assert_eq!(*touched.lock(), 0);
}

#[test]
fn test_removed_handler_no_longer_fires() {
    let mut verifier = WebhookVerifier::with_secret(SECRET);
    verifier.set_handler(
        WebhookEvent::ProfileScoreSuccess,
        WebhookHandler::payload(|_| panic!("removed handler called")),
    );
    verifier.remove_handler_by_name("profile.score.success").unwrap();

    let dispatch = verifier
        .handle_signature(&envelope(&json!({"type": "profile.score.success"})))
        .unwrap();
    assert_eq!(dispatch, Dispatch::NoHandler(WebhookEvent::ProfileScoreSuccess));
}

#[test]
fn test_event_handler_receives_event_type() {
    let mut verifier = WebhookVerifier::with_secret(SECRET);
    let seen = Arc::new(Mutex::new(Vec::new()));

    for event in WebhookEvent::ALL {
        let sink = seen.clone();
        verifier.set_handler(
            event,
            WebhookHandler::with_event(move |_, event| sink.lock().push(event)),
        );
    }

    for event in WebhookEvent::ALL {
        verifier
            .handle_signature(&envelope(&json!({"type": event.as_str()})))
            .unwrap();
    }
    assert_eq!(*seen.lock(), WebhookEvent::ALL.to_vec());
}

#[test]
fn test_unknown_event_rejected_consistently() {
    let mut verifier = WebhookVerifier::with_secret(SECRET);

    let registration = verifier.set_handler_by_name("not.a.real.event", WebhookHandler::payload(|_| {}));
    let delivery = verifier.handle_signature(&envelope(&json!({"type": "not.a.real.event"})));

    assert!(matches!(registration, Err(HrFlowError::UnknownEvent(_))));
    assert!(matches!(delivery, Err(HrFlowError::UnknownEvent(_))));
}

#[test]
fn test_secret_checked_before_envelope() {
    let verifier = WebhookVerifier::new(None);
    let result = verifier.handle_signature("not-even-an-envelope");
    assert!(matches!(result, Err(HrFlowError::MissingSecret)));
}

#[test]
fn test_wrong_secret_gives_generic_error() {
    let verifier = WebhookVerifier::with_secret("another-secret");
    let err = verifier
        .handle_signature(&envelope(&json!({"type": "job.train.error"})))
        .unwrap_err();

    assert!(matches!(err, HrFlowError::InvalidSignature));
    assert_eq!(err.to_string(), "Error: invalid signature.");
}

#[test]
fn test_single_segment_rejected() {
    let verifier = WebhookVerifier::with_secret(SECRET);
    let result = verifier.handle_signature("c2lnbmF0dXJl");
    assert!(matches!(result, Err(HrFlowError::MalformedEnvelope(_))));
}
