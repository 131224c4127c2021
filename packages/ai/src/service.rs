// ABOUTME: Reasoning backend trait and Anthropic messages API client
// ABOUTME: Handles API requests, timeout mapping, and response text extraction

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("no API key configured")]
    NoApiKey,

    #[error("invalid response format")]
    InvalidResponse,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// A language-reasoning backend: prompt text in, raw text out.
///
/// The backend itself enforces no output schema; callers that need
/// structured output validate and repair on their side.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    async fn invoke(&self, prompt: &str) -> BackendResult<String>;
}

/// Configuration for the Anthropic-backed reasoning client. Constructed once
/// at process start and passed in; there is no ambient global state.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub system_prompt: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            system_prompt: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    content_type: String,
    text: String,
}

/// Reasoning backend implemented against the Anthropic messages API.
pub struct AnthropicBackend {
    client: Client,
    config: BackendConfig,
}

impl AnthropicBackend {
    pub fn new(config: BackendConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }

    /// Convenience constructor with an api key and everything else defaulted.
    pub fn with_api_key(api_key: String) -> Self {
        Self::new(BackendConfig {
            api_key: Some(api_key),
            ..BackendConfig::default()
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl ReasoningBackend for AnthropicBackend {
    async fn invoke(&self, prompt: &str) -> BackendResult<String> {
        let api_key = self.config.api_key.as_ref().ok_or(BackendError::NoApiKey)?;

        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            system: self.config.system_prompt.clone(),
        };

        info!(
            "Making reasoning backend request: model={}, max_tokens={}",
            request.model, request.max_tokens
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!(
                        "Reasoning backend request timed out after {:?}",
                        self.config.request_timeout
                    );
                    BackendError::Timeout(self.config.request_timeout)
                } else {
                    error!("Reasoning backend request failed: {}", e);
                    BackendError::RequestFailed(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Reasoning backend error: {} - {}", status, body);
            return Err(BackendError::ApiError { status, body });
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|_| BackendError::InvalidResponse)?;

        let text = parsed
            .content
            .first()
            .ok_or(BackendError::InvalidResponse)?
            .text
            .clone();

        Ok(text)
    }
}
