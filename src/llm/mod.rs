//! LLM integration for pg-ai-query.
//!
//! Provides the client trait the generation pipeline talks to, the provider
//! enumeration, and the pieces of the pipeline that deal with model text:
//! provider selection, prompt construction, and response extraction.

pub mod anthropic;
pub mod factory;
pub mod mock;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod selector;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use factory::{ClientFactory, ClientSettings, HttpClientFactory};
pub use mock::{MockClientFactory, MockLlmClient};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use parser::{extract_response, ExtractionResult};
pub use prompt::{build_prompt, SYSTEM_PROMPT};
pub use selector::{ApiKeySource, GenerationParams, ProviderSelector, ResolvedProvider};

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::Result;

/// Trait for LLM clients that can generate text.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given options.
    ///
    /// Returns the model's text as-is. Provider-reported failures are
    /// returned as [`PgAiError::Provider`](crate::error::PgAiError::Provider).
    async fn generate_text(&self, options: &GenerateOptions) -> Result<String>;
}

/// Parameters for a single text generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    /// Falls back to the client's default when unset.
    pub max_tokens: Option<u32>,
    /// Falls back to the provider's default when unset.
    pub temperature: Option<f32>,
}

impl GenerateOptions {
    pub fn new(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Applies model-specific generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.max_tokens = params.max_tokens;
        self.temperature = params.temperature;
        self
    }
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Provider {
    /// OpenAI (GPT-4o, etc.)
    #[default]
    OpenAi,
    /// Anthropic (Claude)
    Anthropic,
}

impl Provider {
    /// Every provider, in auto-selection preference order.
    pub const ALL: [Provider; 2] = [Provider::OpenAi, Provider::Anthropic];

    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Human-readable provider name for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    /// Model used when the provider config does not name one.
    pub fn fallback_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::Anthropic => "claude-3-5-sonnet-20241022",
        }
    }

    /// Environment variable consulted for the provider's API key.
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
