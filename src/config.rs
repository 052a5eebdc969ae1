//! Configuration management for the HrFlow client
//!
//! Loads configuration from YAML files and environment variables.
//! Environment variables override YAML values.

use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

use crate::rate_limiter::RateLimitPolicy;

/// Default REST API base URL
pub const CLIENT_API_URL: &str = "https://api.hrflow.ai/v1/";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// REST API access
    #[serde(default)]
    pub api: ApiConfig,
    /// Inbound webhook settings
    #[serde(default)]
    pub webhook: WebhookConfig,
    /// Default throttling for API calls
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Webhook relay HTTP server
    #[serde(default)]
    pub server: ServerConfig,
}

/// REST API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL, endpoints are appended to it
    #[serde(default = "default_api_url")]
    pub url: String,
    /// Sent as `X-API-KEY`
    pub secret: Option<SecretString>,
    /// Sent as `X-USER-EMAIL`
    pub user: Option<String>,
    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub timeout_ms: u64,
}

fn default_api_url() -> String {
    CLIENT_API_URL.to_string()
}

fn default_request_timeout() -> u64 {
    30000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            secret: None,
            user: None,
            timeout_ms: default_request_timeout(),
        }
    }
}

/// Webhook configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret used by the signing service
    #[serde(default)]
    pub secret: Option<SecretString>,
}

impl WebhookConfig {
    /// The secret, treating an empty value as unset
    pub fn secret(&self) -> Option<SecretString> {
        self.secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty())
            .cloned()
    }
}

/// Rate limit configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum API calls per rolling minute (unset = no cap)
    #[serde(default)]
    pub max_requests_per_minute: Option<u32>,
    /// Seconds to sleep before every API call
    #[serde(default)]
    pub min_sleep_per_request: f64,
}

impl RateLimitConfig {
    pub fn policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            max_requests_per_minute: self.max_requests_per_minute,
            ..RateLimitPolicy::default()
        }
        .with_min_sleep_secs(self.min_sleep_per_request)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (HRFLOW_*)
    /// 2. config/hrflow.yaml (if exists)
    /// 3. hrflow.yaml (if exists)
    /// 4. Default values
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("hrflow").required(false))
            .add_source(File::with_name("config/hrflow").required(false))
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }

    /// Load from an explicit file, still honouring environment overrides
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.url.trim().is_empty() {
            return Err(ConfigError::Message("api.url must not be empty".to_string()));
        }

        if self.rate_limit.max_requests_per_minute == Some(0) {
            return Err(ConfigError::Message(
                "rate_limit.max_requests_per_minute must be positive".to_string(),
            ));
        }

        if !self.rate_limit.min_sleep_per_request.is_finite()
            || self.rate_limit.min_sleep_per_request < 0.0
        {
            return Err(ConfigError::Message(
                "rate_limit.min_sleep_per_request must be a non-negative number of seconds"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Extra checks for running the webhook relay
    pub fn validate_relay(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.webhook.secret().is_none() {
            return Err(ConfigError::Message(
                "webhook.secret is required to verify deliveries".to_string(),
            ));
        }
        Ok(())
    }
}

// HRFLOW_API__SECRET=... -> api.secret
// HRFLOW_RATE_LIMIT__MAX_REQUESTS_PER_MINUTE=30 -> rate_limit.max_requests_per_minute
fn env_source() -> Environment {
    Environment::with_prefix("HRFLOW")
        .separator("__")
        .try_parsing(true)
}
