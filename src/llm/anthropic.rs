//! Anthropic LLM client implementation.
//!
//! Implements the LlmClient trait for Anthropic's messages API (Claude models).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{PgAiError, Result};
use crate::llm::{GenerateOptions, LlmClient};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Anthropic API base URL.
pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Maximum tokens to generate when the model config does not say.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic client configuration.
#[derive(Clone)]
pub struct AnthropicConfig {
    /// API key for authentication.
    pub api_key: String,
    /// API base URL, without the endpoint path.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum tokens to generate; the API requires a value.
    pub default_max_tokens: u32,
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("default_max_tokens", &self.default_max_tokens)
            .finish()
    }
}

impl AnthropicConfig {
    /// Creates a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: ANTHROPIC_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/messages", self.base_url.trim_end_matches('/'))
    }
}

/// Anthropic LLM client.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicClient {
    /// Creates a new Anthropic client with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(PgAiError::client_init("Anthropic API key is empty"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PgAiError::client_init(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Converts generation options to an Anthropic request body.
    ///
    /// Anthropic takes the system prompt as a separate parameter.
    fn build_request(&self, options: &GenerateOptions) -> AnthropicRequest {
        AnthropicRequest {
            model: options.model.clone(),
            max_tokens: options.max_tokens.unwrap_or(self.config.default_max_tokens),
            system: options.system_prompt.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: options.user_prompt.clone(),
            }],
            temperature: options.temperature,
        }
    }

    /// Parses an API error response.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> PgAiError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return PgAiError::provider("Authentication failed. Check your Anthropic API key.");
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return PgAiError::provider("Rate limited. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<AnthropicErrorResponse>(body) {
            return PgAiError::provider(format!(
                "Anthropic API error: {}",
                error_response.error.message
            ));
        }

        PgAiError::provider(format!("Anthropic API error ({}): {}", status, body))
    }

    /// Concatenates the text content blocks of a response.
    fn response_text(response: AnthropicResponse) -> String {
        response
            .content
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("")
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn generate_text(&self, options: &GenerateOptions) -> Result<String> {
        let request = self.build_request(options);
        debug!(model = %request.model, "Sending Anthropic messages request");

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PgAiError::provider("Request timed out. Try again.")
                } else if e.is_connect() {
                    PgAiError::provider("Failed to connect to Anthropic API. Check your network.")
                } else {
                    PgAiError::provider(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PgAiError::provider(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let response: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| PgAiError::provider(format!("Failed to parse response: {}", e)))?;

        Ok(Self::response_text(response))
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicError,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    message: String,
}
