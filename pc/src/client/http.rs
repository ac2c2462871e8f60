//! HTTP clients for the generation and formatting service
//!
//! Both clients share one `ServiceHttp` that handles auth, retry with
//! backoff, and classification of error responses.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use super::{ClientError, FormatterClient, GenerationClient};
use crate::config::ServiceConfig;
use crate::domain::{Platform, PlatformCatalogue, PlatformId};

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 500;

/// Upper bound on a single backoff delay
const MAX_BACKOFF_MS: u64 = 30_000;

/// Delay before retry number `attempt` (1-based), doubling up to the cap
fn backoff_ms(attempt: u32) -> u64 {
    let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
    INITIAL_BACKOFF_MS.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

/// Body `code` values that signal an exhausted quota
const RATE_LIMIT_CODES: &[&str] = &["rate_limited", "quota_exceeded"];

/// Check if an HTTP status code is retryable (429 is handled separately)
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 500 | 502 | 503 | 504)
}

/// Error body shapes the service may send on non-2xx responses
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    message: Option<String>,
    code: Option<String>,
}

/// How a non-2xx response should be handled
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rejection {
    RateLimited(Option<String>),
    Retryable(String),
    Fatal(String),
}

/// Classify a non-2xx response from its status and raw body
fn classify_failure(status: u16, body: &str) -> Rejection {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed.detail.or(parsed.message).filter(|m| !m.trim().is_empty());
    let quota_code = parsed
        .code
        .as_deref()
        .is_some_and(|c| RATE_LIMIT_CODES.contains(&c.to_lowercase().as_str()));

    if status == 429 || quota_code {
        return Rejection::RateLimited(message);
    }

    let reason = match message {
        Some(m) => format!("status {}: {}", status, m),
        None => format!("status {}", status),
    };
    if is_retryable_status(status) {
        Rejection::Retryable(reason)
    } else {
        Rejection::Fatal(reason)
    }
}

/// Pull a required string field out of a JSON response
fn extract_field(body: &Value, field: &str) -> Result<String, String> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("response missing '{}'", field))
}

/// Failure of a single service call before it is mapped to `ClientError`
#[derive(Debug)]
enum CallError {
    RateLimited(Option<String>),
    Failed(String),
}

impl CallError {
    fn into_client_error(self, failed: fn(String) -> ClientError) -> ClientError {
        match self {
            CallError::RateLimited(message) => ClientError::RateLimited { message },
            CallError::Failed(reason) => failed(reason),
        }
    }
}

/// Shared HTTP plumbing for the service clients
#[derive(Clone)]
pub struct ServiceHttp {
    base_url: String,
    api_key: Option<String>,
    http: Client,
    max_retries: u32,
}

impl ServiceHttp {
    /// Create from service configuration
    pub fn from_config(config: &ServiceConfig) -> eyre::Result<Self> {
        debug!(?config, "from_config: called");
        let api_key = config.get_api_key()?;
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
            max_retries: config.max_retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return the parsed JSON body of a 2xx response
    async fn send_json(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, CallError> {
        let url = self.url(path);
        debug!(%method, %url, "send_json: called");

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = backoff_ms(attempt);
                warn!(attempt, backoff_ms = backoff, %url, "send_json: retrying after transient error");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let mut request = self.http.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    debug!(attempt, error = %e, "send_json: network error");
                    last_error = Some(CallError::Failed(format!("network error: {}", e)));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                debug!(status = status.as_u16(), "send_json: success");
                return response
                    .json::<Value>()
                    .await
                    .map_err(|e| CallError::Failed(format!("invalid response body: {}", e)));
            }

            let text = response.text().await.unwrap_or_default();
            match classify_failure(status.as_u16(), &text) {
                Rejection::RateLimited(message) => {
                    debug!(?message, "send_json: rate limited");
                    return Err(CallError::RateLimited(message));
                }
                Rejection::Retryable(reason) if attempt < self.max_retries => {
                    debug!(attempt, %reason, "send_json: retryable error");
                    last_error = Some(CallError::Failed(reason));
                }
                Rejection::Retryable(reason) | Rejection::Fatal(reason) => {
                    debug!(%reason, "send_json: API error");
                    return Err(CallError::Failed(reason));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CallError::Failed("max retries exceeded".to_string())))
    }

    /// POST a JSON body and extract one string field from the response
    async fn post_for_field(&self, path: &str, body: Value, field: &str) -> Result<String, CallError> {
        let response = self.send_json(Method::POST, path, Some(&body)).await?;
        extract_field(&response, field).map_err(CallError::Failed)
    }
}

/// Generation service client over HTTP
#[derive(Clone)]
pub struct HttpGenerationClient {
    service: ServiceHttp,
}

impl HttpGenerationClient {
    pub fn new(service: ServiceHttp) -> Self {
        Self { service }
    }

    pub fn from_config(config: &ServiceConfig) -> eyre::Result<Self> {
        Ok(Self::new(ServiceHttp::from_config(config)?))
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn generate(&self, topic: &str) -> Result<String, ClientError> {
        debug!(topic_len = topic.len(), "generate: called");
        self.service
            .post_for_field("/api/generate", json!({ "content": topic }), "generated_content")
            .await
            .map_err(|e| e.into_client_error(ClientError::GenerationFailed))
    }

    async fn refine(&self, current_content: &str, instruction: &str) -> Result<String, ClientError> {
        debug!(content_len = current_content.len(), %instruction, "refine: called");
        self.service
            .post_for_field(
                "/api/refine",
                json!({ "content": current_content, "instruction": instruction }),
                "refined_content",
            )
            .await
            .map_err(|e| e.into_client_error(ClientError::GenerationFailed))
    }
}

/// Formatting service client over HTTP
#[derive(Clone)]
pub struct HttpFormatterClient {
    service: ServiceHttp,
}

impl HttpFormatterClient {
    pub fn new(service: ServiceHttp) -> Self {
        Self { service }
    }

    pub fn from_config(config: &ServiceConfig) -> eyre::Result<Self> {
        Ok(Self::new(ServiceHttp::from_config(config)?))
    }

    /// Fetch the platform catalogue the service advertises
    pub async fn fetch_catalogue(&self) -> eyre::Result<PlatformCatalogue> {
        debug!("fetch_catalogue: called");

        #[derive(Deserialize)]
        struct PlatformsResponse {
            platforms: Vec<Platform>,
        }

        let body = self
            .service
            .send_json(Method::GET, "/api/platforms", None)
            .await
            .map_err(|e| eyre::eyre!("{}", e.into_client_error(ClientError::FormattingFailed)))?;
        let response: PlatformsResponse = serde_json::from_value(body)?;
        Ok(PlatformCatalogue::new(response.platforms)?)
    }
}

#[async_trait]
impl FormatterClient for HttpFormatterClient {
    async fn format_for_platform(&self, platform: &PlatformId, content: &str) -> Result<String, ClientError> {
        debug!(%platform, content_len = content.len(), "format_for_platform: called");
        let path = format!("/api/format/{}", platform);
        self.service
            .post_for_field(&path, json!({ "content": content }), "formatted_content")
            .await
            .map_err(|e| e.into_client_error(ClientError::FormattingFailed))
    }
}
