//! API Client Integration Tests
//!
//! Runs the client against a local axum server standing in for the API:
//! - Authentication headers on every request
//! - Parameter encoding (lists as JSON text)
//! - Form, JSON and multipart bodies
//! - Webhook check / test endpoints
//! - Error statuses surfaced as errors
//! - Client-side throttling

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::{get, patch, post},
    Form, Json, Router,
};
use hrflow_client::config::ApiConfig;
use hrflow_client::{HrFlowClient, HrFlowError, Params, RateLimitPolicy, WebhookEvent};
use parking_lot::Mutex;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct Recorded {
    headers: Vec<HeaderMap>,
    bodies: Vec<Value>,
    queries: Vec<HashMap<String, String>>,
    forms: Vec<HashMap<String, String>>,
    raw: Vec<Bytes>,
}

type Shared = Arc<Mutex<Recorded>>;

async fn spawn_api() -> (String, Shared) {
    let recorded: Shared = Arc::new(Mutex::new(Recorded::default()));

    let app = Router::new()
        .route(
            "/v1/jobs/searching",
            get(
                |State(rec): State<Shared>,
                 headers: HeaderMap,
                 Query(query): Query<HashMap<String, String>>| async move {
                    let mut rec = rec.lock();
                    rec.headers.push(headers);
                    rec.queries.push(query);
                    Json(json!({"code": 200, "data": {"jobs": []}}))
                },
            ),
        )
        .route(
            "/v1/profile/parsing/file",
            post(
                |State(rec): State<Shared>, headers: HeaderMap, body: Bytes| async move {
                    let mut rec = rec.lock();
                    rec.headers.push(headers);
                    rec.raw.push(body);
                    Json(json!({"code": 201, "message": "Profile parsed"}))
                },
            ),
        )
        .route(
            "/v1/profile/tags",
            patch(
                |State(rec): State<Shared>,
                 Form(form): Form<HashMap<String, String>>| async move {
                    rec.lock().forms.push(form);
                    Json(json!({"code": 200}))
                },
            )
            .put(|State(rec): State<Shared>, Json(body): Json<Value>| async move {
                rec.lock().bodies.push(body);
                Json(json!({"code": 200}))
            }),
        )
        .route(
            "/v1/webhook/check",
            post(
                |State(rec): State<Shared>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let mut rec = rec.lock();
                    rec.headers.push(headers);
                    rec.bodies.push(body.clone());
                    Json(json!({"code": 200, "message": "Webhook check", "data": body}))
                },
            ),
        )
        .route(
            "/v1/webhook/test",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"code": 401, "message": "Unauthorized"})),
                )
            }),
        )
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v1/", addr), recorded)
}

fn client(url: &str, policy: RateLimitPolicy) -> HrFlowClient {
    let api = ApiConfig {
        url: url.to_string(),
        secret: Some(SecretString::new("api-secret".to_string())),
        user: Some("dev@example.com".to_string()),
        timeout_ms: 5000,
    };
    HrFlowClient::new(&api, None, policy).unwrap()
}

#[tokio::test]
async fn test_get_sends_auth_headers_and_encodes_lists() {
    let (url, recorded) = spawn_api().await;
    let client = client(&url, RateLimitPolicy::unlimited());

    let mut query = Params::new();
    query.insert("board_keys".to_string(), json!(["b1", "b2"]));
    query.insert("page".to_string(), json!(1));

    let response = client.get("jobs/searching", query).await.unwrap();
    assert!(response.is_success());
    assert_eq!(response.body["data"]["jobs"], json!([]));

    let rec = recorded.lock();
    let headers = &rec.headers[0];
    assert_eq!(headers["x-api-key"], "api-secret");
    assert_eq!(headers["x-user-email"], "dev@example.com");
    assert_eq!(rec.queries[0]["board_keys"], r#"["b1","b2"]"#);
    assert_eq!(rec.queries[0]["page"], "1");
}

#[tokio::test]
async fn test_webhook_check_posts_url_and_type() {
    let (url, recorded) = spawn_api().await;
    let client = client(&url, RateLimitPolicy::unlimited());

    let body = client
        .webhook_check("https://example.com/hooks", WebhookEvent::ProfileParseSuccess)
        .await
        .unwrap();

    assert_eq!(body["code"], 200);
    assert_eq!(
        recorded.lock().bodies[0],
        json!({"url": "https://example.com/hooks", "type": "profile.parse.success"})
    );
}

#[tokio::test]
async fn test_error_status_surfaces_as_api_error() {
    let (url, _recorded) = spawn_api().await;
    let client = client(&url, RateLimitPolicy::unlimited());

    let err = client.webhook_test().await.unwrap_err();
    assert!(matches!(err, HrFlowError::Api { status: 401, .. }));
}

#[tokio::test]
async fn test_requests_are_throttled() {
    let (url, _recorded) = spawn_api().await;
    let policy = RateLimitPolicy::unlimited().with_min_sleep(Duration::from_millis(50));
    let client = client(&url, policy);

    let start = Instant::now();
    for _ in 0..3 {
        client.get("jobs/searching", Params::new()).await.unwrap();
    }
    assert!(start.elapsed() >= Duration::from_millis(150));
    assert_eq!(client.limiter().requests_in_window(), 3);
}

#[tokio::test]
async fn test_post_files_sends_multipart_upload() {
    let (url, recorded) = spawn_api().await;
    let client = client(&url, RateLimitPolicy::unlimited());

    let mut form = Params::new();
    form.insert("source_key".to_string(), json!("src-1"));
    form.insert("tags".to_string(), json!(["a", "b"]));
    let files = vec![(
        "file".to_string(),
        "resume.pdf".to_string(),
        b"%PDF-1.4 resume bytes".to_vec(),
    )];

    let body = client
        .post_files("profile/parsing/file", form, files)
        .await
        .unwrap()
        .into_json()
        .unwrap();
    assert_eq!(body["code"], 201);

    let rec = recorded.lock();
    let content_type = rec.headers[0][CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert_eq!(rec.headers[0]["x-api-key"], "api-secret");

    let raw = String::from_utf8_lossy(&rec.raw[0]);
    assert!(raw.contains(r#"name="file"; filename="resume.pdf""#));
    assert!(raw.contains("%PDF-1.4 resume bytes"));
    assert!(raw.contains(r#"name="source_key""#));
    assert!(raw.contains("src-1"));
    assert!(raw.contains(r#"name="tags""#));
    assert!(raw.contains(r#"["a","b"]"#));
}

#[tokio::test]
async fn test_patch_form_encodes_lists_and_put_sends_json() {
    let (url, recorded) = spawn_api().await;
    let client = client(&url, RateLimitPolicy::unlimited());

    let mut form = Params::new();
    form.insert("tags".to_string(), json!(["a", "b"]));
    form.insert("key".to_string(), json!("profile-1"));
    let response = client.patch("profile/tags", form).await.unwrap();
    assert!(response.is_success());

    let response = client
        .put("profile/tags", json!({"key": "profile-1", "tags": ["c"]}))
        .await
        .unwrap();
    assert!(response.is_success());

    let rec = recorded.lock();
    assert_eq!(rec.forms[0]["tags"], r#"["a","b"]"#);
    assert_eq!(rec.forms[0]["key"], "profile-1");
    assert_eq!(rec.bodies[0], json!({"key": "profile-1", "tags": ["c"]}));
}
