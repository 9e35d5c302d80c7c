//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients. The
//! generation pipeline only sees the [`ClientFactory`] trait, so tests can
//! substitute a mock factory.

use crate::config::Config;
use crate::error::Result;
use crate::llm::{
    AnthropicClient, AnthropicConfig, LlmClient, OpenAiClient, OpenAiConfig, Provider,
};

/// Transport settings for a provider client, taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Overrides the provider's default API base URL.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl ClientSettings {
    /// Reads the settings for `provider` from `config`.
    pub fn from_config(config: &Config, provider: Provider) -> Self {
        Self {
            base_url: config
                .provider_config(provider)
                .and_then(|p| p.api_base_url.clone())
                .filter(|url| !url.is_empty()),
            timeout_secs: config.general.request_timeout_secs,
        }
    }
}

/// Creates LLM clients for resolved providers.
pub trait ClientFactory: Send + Sync {
    /// Creates a client for `provider` authenticated with `api_key`.
    fn create_client(
        &self,
        provider: Provider,
        api_key: &str,
        settings: &ClientSettings,
    ) -> Result<Box<dyn LlmClient>>;
}

/// Factory producing the reqwest-based HTTP clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpClientFactory;

impl ClientFactory for HttpClientFactory {
    fn create_client(
        &self,
        provider: Provider,
        api_key: &str,
        settings: &ClientSettings,
    ) -> Result<Box<dyn LlmClient>> {
        match provider {
            Provider::OpenAi => {
                let mut config = OpenAiConfig::new(api_key).with_timeout(settings.timeout_secs);
                if let Some(base_url) = &settings.base_url {
                    config = config.with_base_url(base_url.as_str());
                }
                Ok(Box::new(OpenAiClient::new(config)?))
            }
            Provider::Anthropic => {
                let mut config =
                    AnthropicConfig::new(api_key).with_timeout(settings.timeout_secs);
                if let Some(base_url) = &settings.base_url {
                    config = config.with_base_url(base_url.as_str());
                }
                Ok(Box::new(AnthropicClient::new(config)?))
            }
        }
    }
}
