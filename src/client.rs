//! REST API client
//!
//! Thin async transport over the HrFlow API. Every request goes through the
//! client's rate limiter; the client's webhook verifier shares its webhook
//! secret.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::config::{ApiConfig, AppConfig};
use crate::error::{HrFlowError, HrFlowResult};
use crate::rate_limiter::{RateLimitPolicy, RateLimiter};
use crate::webhook::{WebhookEvent, WebhookVerifier};

/// Header carrying the API secret
pub const API_KEY_HEADER: &str = "X-API-KEY";
/// Header carrying the user email
pub const USER_EMAIL_HEADER: &str = "X-USER-EMAIL";

/// Query or form parameters
pub type Params = Map<String, Value>;

/// One uploaded file: form field name, file name and contents
pub type FilePart = (String, String, Vec<u8>);

/// Request body variants
#[derive(Debug, Clone)]
pub enum Payload {
    Empty,
    Query(Params),
    Json(Value),
    Form(Params),
    /// `multipart/form-data` with text fields and file parts
    Multipart { form: Params, files: Vec<FilePart> },
}

/// Status, headers and body of an API exchange
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON, or the raw text as a JSON string when the body is not JSON
    pub body: Value,
}

impl ApiResponse {
    async fn read(response: reqwest::Response) -> HrFlowResult<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The body, or an error for non-success statuses
    pub fn into_json(self) -> HrFlowResult<Value> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(HrFlowError::Api {
                status: self.status.as_u16(),
                body: self.body.to_string(),
            })
        }
    }
}

/// HrFlow API client
#[derive(Debug)]
pub struct HrFlowClient {
    api_url: String,
    http: reqwest::Client,
    limiter: RateLimiter,
    policy: RateLimitPolicy,
    webhooks: WebhookVerifier,
}

impl HrFlowClient {
    /// Create a client
    pub fn new(
        api: &ApiConfig,
        webhook_secret: Option<SecretString>,
        policy: RateLimitPolicy,
    ) -> HrFlowResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(api.timeout_ms))
            .default_headers(auth_headers(api)?)
            .build()?;

        let api_url = if api.url.ends_with('/') {
            api.url.clone()
        } else {
            format!("{}/", api.url)
        };

        Ok(Self {
            api_url,
            http,
            limiter: RateLimiter::new(),
            policy,
            webhooks: WebhookVerifier::new(webhook_secret),
        })
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &AppConfig) -> HrFlowResult<Self> {
        Self::new(
            &config.api,
            config.webhook.secret(),
            config.rate_limit.policy(),
        )
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Policy applied by the convenience request methods
    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: RateLimitPolicy) {
        self.policy = policy;
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn webhooks(&self) -> &WebhookVerifier {
        &self.webhooks
    }

    pub fn webhooks_mut(&mut self) -> &mut WebhookVerifier {
        &mut self.webhooks
    }

    /// Detach the verifier, e.g. to share it with a web server
    pub fn into_webhooks(self) -> WebhookVerifier {
        self.webhooks
    }

    fn request_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_url, endpoint.trim_start_matches('/'))
    }

    /// Send one request under `policy`
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        payload: Payload,
        policy: &RateLimitPolicy,
    ) -> HrFlowResult<ApiResponse> {
        let url = self.request_url(endpoint);
        let builder = self.http.request(method.clone(), &url);
        let builder = match payload {
            Payload::Empty => builder,
            Payload::Query(params) => builder.query(&encode_params(&params)),
            Payload::Json(body) => builder.json(&body),
            Payload::Form(params) => builder.form(&encode_params(&params)),
            Payload::Multipart { form, files } => {
                builder.multipart(multipart_form(&form, files))
            }
        };

        self.limiter.acquire_async(policy).await;
        let response = ApiResponse::read(builder.send().await?).await?;

        tracing::debug!(
            method = %method,
            endpoint = %endpoint,
            status = response.status.as_u16(),
            "API request completed"
        );

        Ok(response)
    }

    pub async fn get(&self, endpoint: &str, query: Params) -> HrFlowResult<ApiResponse> {
        let payload = if query.is_empty() {
            Payload::Empty
        } else {
            Payload::Query(query)
        };
        self.request(Method::GET, endpoint, payload, &self.policy).await
    }

    pub async fn post(&self, endpoint: &str, body: Value) -> HrFlowResult<ApiResponse> {
        self.request(Method::POST, endpoint, Payload::Json(body), &self.policy)
            .await
    }

    pub async fn post_form(&self, endpoint: &str, form: Params) -> HrFlowResult<ApiResponse> {
        self.request(Method::POST, endpoint, Payload::Form(form), &self.policy)
            .await
    }

    /// Upload files along with form fields, e.g. a resume to parse
    pub async fn post_files(
        &self,
        endpoint: &str,
        form: Params,
        files: Vec<FilePart>,
    ) -> HrFlowResult<ApiResponse> {
        self.request(
            Method::POST,
            endpoint,
            Payload::Multipart { form, files },
            &self.policy,
        )
        .await
    }

    pub async fn patch(&self, endpoint: &str, form: Params) -> HrFlowResult<ApiResponse> {
        self.request(Method::PATCH, endpoint, Payload::Form(form), &self.policy)
            .await
    }

    pub async fn put(&self, endpoint: &str, body: Value) -> HrFlowResult<ApiResponse> {
        self.request(Method::PUT, endpoint, Payload::Json(body), &self.policy)
            .await
    }

    /// Ask the API to validate a webhook endpoint for an event type
    ///
    /// POST webhook/check
    pub async fn webhook_check(&self, url: &str, event: WebhookEvent) -> HrFlowResult<Value> {
        self.post("webhook/check", json!({ "url": url, "type": event }))
            .await?
            .into_json()
    }

    /// Ask the API to send a test delivery to the configured webhook
    ///
    /// POST webhook/test
    pub async fn webhook_test(&self) -> HrFlowResult<Value> {
        self.post("webhook/test", json!({})).await?.into_json()
    }
}

fn auth_headers(api: &ApiConfig) -> HrFlowResult<HeaderMap> {
    let mut headers = HeaderMap::new();

    if let Some(secret) = &api.secret {
        let mut value = HeaderValue::from_str(secret.expose_secret())
            .map_err(|_| HrFlowError::Validation("api secret is not a valid header value".to_string()))?;
        value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, value);
    }

    if let Some(user) = &api.user {
        let value = HeaderValue::from_str(user)
            .map_err(|_| HrFlowError::Validation("api user is not a valid header value".to_string()))?;
        headers.insert(USER_EMAIL_HEADER, value);
    }

    Ok(headers)
}

/// Flatten parameters to strings. Lists and objects are sent as JSON text.
fn encode_params(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| {
            let encoded = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), encoded))
        })
        .collect()
}

fn multipart_form(form: &Params, files: Vec<FilePart>) -> Form {
    let text_parts = encode_params(form)
        .into_iter()
        .fold(Form::new(), |multipart, (key, value)| multipart.text(key, value));

    files
        .into_iter()
        .fold(text_parts, |multipart, (field, file_name, contents)| {
            multipart.part(field, Part::bytes(contents).file_name(file_name))
        })
}
