//! Configuration management for pg-ai-query.
//!
//! Handles loading configuration from a TOML file and environment variables,
//! with per-provider credentials and per-model generation parameters.

use crate::error::{PgAiError, Result};
use crate::llm::Provider;
use crate::safety::SafetyPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Process-wide settings (logging, safety policy, timeouts).
    #[serde(default)]
    pub general: GeneralConfig,

    /// OpenAI provider settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<ProviderConfig>,

    /// Anthropic provider settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<ProviderConfig>,

    /// Per-model generation parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<ModelConfig>,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Whether the generation pipeline emits its own log messages.
    #[serde(default)]
    pub enable_logging: bool,

    /// Default tracing filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Safety policy applied to generated SQL.
    #[serde(default)]
    pub safety: SafetyPolicy,

    /// Timeout for provider HTTP requests.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enable_logging: false,
            log_level: default_log_level(),
            safety: SafetyPolicy::default(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Reference to a model by name. Serialized as a bare string.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ModelRef {
    pub name: String,
}

impl ModelRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Stored settings for a single provider.
#[derive(Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProviderConfig {
    /// API key (not recommended to store in config; prefer the environment).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model used when the request does not name one.
    #[serde(default)]
    pub default_model: ModelRef,

    /// Overrides the provider's API base URL (proxies, gateways).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("default_model", &self.default_model)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl ProviderConfig {
    /// Creates a provider config holding only an API key.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Sets the default model.
    pub fn default_model(mut self, name: impl Into<String>) -> Self {
        self.default_model = ModelRef::new(name);
        self
    }

    /// Returns the API key if it is set and non-empty.
    pub fn key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// Generation parameters for a named model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            name: name.into(),
            max_tokens,
            temperature,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(PgAiError::config(format!(
                "model '{}': max_tokens must be greater than 0",
                self.name
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(PgAiError::config(format!(
                "model '{}': temperature must be between 0 and 2, got {}",
                self.name, self.temperature
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Returns the default config file path (`~/.pg_ai.config`).
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pg_ai.config")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| PgAiError::config(format!("Failed to read config file: {e}")))?;

        Self::from_toml_str(&content).map_err(|e| match e {
            PgAiError::Config(msg) => {
                PgAiError::config(format!("in {}:\n  {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| PgAiError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        for model in &self.models {
            model.validate()?;
        }

        for provider in Provider::ALL {
            let Some(base) = self
                .provider_config(provider)
                .and_then(|p| p.api_base_url.as_deref())
            else {
                continue;
            };
            Url::parse(base).map_err(|e| {
                PgAiError::config(format!("{provider}: invalid api_base_url '{base}': {e}"))
            })?;
        }

        Ok(())
    }

    /// Returns the stored settings for a provider, if configured.
    pub fn provider_config(&self, provider: Provider) -> Option<&ProviderConfig> {
        match provider {
            Provider::OpenAi => self.openai.as_ref(),
            Provider::Anthropic => self.anthropic.as_ref(),
        }
    }

    /// Returns the generation parameters for a model, if configured.
    pub fn model_config(&self, model_name: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.name == model_name)
    }

    /// Sets the stored settings for a provider.
    pub fn with_provider(mut self, provider: Provider, config: ProviderConfig) -> Self {
        match provider {
            Provider::OpenAi => self.openai = Some(config),
            Provider::Anthropic => self.anthropic = Some(config),
        }
        self
    }

    /// Adds a model configuration.
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.models.push(model);
        self
    }

    /// Applies `OPENAI_API_KEY` / `ANTHROPIC_API_KEY` to providers without a stored key.
    pub fn apply_env_defaults(&mut self) {
        self.apply_key_defaults(|name| std::env::var(name).ok());
    }

    fn apply_key_defaults(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for provider in Provider::ALL {
            let Some(key) = lookup(provider.api_key_env_var()).filter(|k| !k.is_empty()) else {
                continue;
            };
            let slot = match provider {
                Provider::OpenAi => &mut self.openai,
                Provider::Anthropic => &mut self.anthropic,
            };
            let entry = slot.get_or_insert_with(ProviderConfig::default);
            if entry.key().is_none() {
                entry.api_key = Some(key);
            }
        }
    }
}
