//! Provider and credential resolution.
//!
//! Decides which provider, API key, and model a request runs against, from
//! the request's own hints and the stored configuration.

use std::fmt;

use crate::config::Config;
use crate::error::{PgAiError, Result};
use crate::llm::Provider;
use crate::logging::Logger;
use crate::query::QueryRequest;

/// Where the resolved API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    /// Supplied with the request.
    Parameter,
    /// Read from the provider's stored configuration.
    ProviderConfig,
}

impl ApiKeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parameter => "parameter",
            Self::ProviderConfig => "provider_config",
        }
    }
}

/// Provider, credential, and model a request will run against.
///
/// `api_key` is never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub provider: Provider,
    pub api_key: String,
    pub api_key_source: ApiKeySource,
    pub model_name: String,
}

impl fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("api_key_source", &self.api_key_source)
            .field("model_name", &self.model_name)
            .finish()
    }
}

/// Model-specific generation parameters; `None` leaves the client default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Resolves providers against a read-only configuration.
#[derive(Debug, Clone, Copy)]
pub struct ProviderSelector<'a> {
    config: &'a Config,
    logger: &'a Logger,
}

impl<'a> ProviderSelector<'a> {
    pub fn new(config: &'a Config, logger: &'a Logger) -> Self {
        Self { config, logger }
    }

    /// Resolves the provider, API key, and model for a request.
    ///
    /// Precedence:
    /// 1. an explicit provider hint, with the request key or else that provider's stored key;
    /// 2. a request key without a hint selects OpenAI;
    /// 3. otherwise the first provider (OpenAI, then Anthropic) with a stored key.
    ///
    /// Fails with [`PgAiError::MissingCredential`] when no non-empty key is found.
    pub fn resolve(&self, request: &QueryRequest) -> Result<ResolvedProvider> {
        let request_key = request.api_key();

        let (provider, credential) = match (request.provider_hint().explicit(), request_key) {
            (Some(provider), key) => {
                self.logger.info(format!(
                    "Explicit {} provider selection from parameter",
                    provider.display_name()
                ));
                let credential = match key {
                    Some(key) => Some((key, ApiKeySource::Parameter)),
                    None => self.configured_key(provider).map(|key| {
                        self.logger.info(format!(
                            "Using {} API key from configuration",
                            provider.display_name()
                        ));
                        (key, ApiKeySource::ProviderConfig)
                    }),
                };
                (provider, credential)
            }
            (None, Some(key)) => {
                self.logger
                    .info("Auto-selecting OpenAI provider (API key provided, no provider specified)");
                (Provider::OpenAi, Some((key, ApiKeySource::Parameter)))
            }
            (None, None) => {
                let Some((provider, key)) = Provider::ALL
                    .into_iter()
                    .find_map(|p| self.configured_key(p).map(|key| (p, key)))
                else {
                    self.logger.warning("No API key found in config");
                    return Err(PgAiError::missing_credential(
                        "API key required. Pass an API key with the request or set an OpenAI \
                         or Anthropic API key in the configuration file.",
                    ));
                };
                self.logger.info(format!(
                    "Auto-selecting {} provider based on configuration",
                    provider.display_name()
                ));
                (provider, Some((key, ApiKeySource::ProviderConfig)))
            }
        };

        let Some((api_key, api_key_source)) = credential else {
            return Err(PgAiError::missing_credential(format!(
                "No API key available for {} provider. Provide an API key with the request \
                 or configure it in the configuration file.",
                provider
            )));
        };

        Ok(ResolvedProvider {
            provider,
            api_key: api_key.to_string(),
            api_key_source,
            model_name: self.model_name(provider),
        })
    }

    /// Returns the configured default model for a provider, or its fallback.
    pub fn model_name(&self, provider: Provider) -> String {
        self.config
            .provider_config(provider)
            .map(|c| c.default_model.name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| provider.fallback_model())
            .to_string()
    }

    /// Looks up generation parameters for a model.
    ///
    /// An unconfigured model is not an error; the client defaults apply.
    pub fn generation_params(&self, model_name: &str) -> GenerationParams {
        match self.config.model_config(model_name) {
            Some(model) => {
                self.logger.info(format!(
                    "Using model: {} with max_tokens={}, temperature={}",
                    model_name, model.max_tokens, model.temperature
                ));
                GenerationParams {
                    max_tokens: Some(model.max_tokens),
                    temperature: Some(model.temperature),
                }
            }
            None => {
                self.logger
                    .info(format!("Using model: {} with default settings", model_name));
                GenerationParams::default()
            }
        }
    }

    fn configured_key(&self, provider: Provider) -> Option<&'a str> {
        self.config.provider_config(provider)?.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelConfig, ProviderConfig};
    use crate::query::ProviderHint;
    use pretty_assertions::assert_eq;

    fn resolve(config: &Config, request: &QueryRequest) -> Result<ResolvedProvider> {
        ProviderSelector::new(config, &Logger::disabled()).resolve(request)
    }

    fn both_configured() -> Config {
        Config::default()
            .with_provider(Provider::OpenAi, ProviderConfig::with_api_key("sk-openai"))
            .with_provider(Provider::Anthropic, ProviderConfig::with_api_key("sk-ant"))
    }

    #[test]
    fn test_explicit_openai_uses_configured_key() {
        let config = both_configured();
        let request =
            QueryRequest::new("show top 5 users").with_provider_hint(ProviderHint::OpenAi);

        let resolved = resolve(&config, &request).unwrap();
        assert_eq!(resolved.provider, Provider::OpenAi);
        assert_eq!(resolved.api_key, "sk-openai");
        assert_eq!(resolved.api_key_source, ApiKeySource::ProviderConfig);
        assert_eq!(resolved.model_name, "gpt-4o");
    }

    #[test]
    fn test_explicit_anthropic_prefers_request_key() {
        let config = both_configured();
        let request = QueryRequest::new("q")
            .with_provider_hint(ProviderHint::Anthropic)
            .with_api_key("sk-request");

        let resolved = resolve(&config, &request).unwrap();
        assert_eq!(resolved.provider, Provider::Anthropic);
        assert_eq!(resolved.api_key, "sk-request");
        assert_eq!(resolved.api_key_source, ApiKeySource::Parameter);
        assert_eq!(resolved.model_name, "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn test_explicit_provider_without_any_key_fails() {
        let config = Config::default()
            .with_provider(Provider::OpenAi, ProviderConfig::with_api_key("sk-openai"));
        let request = QueryRequest::new("q").with_provider_hint(ProviderHint::Anthropic);

        let err = resolve(&config, &request).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MissingCredential);
        assert!(err.to_string().contains("anthropic"));
    }

    #[test]
    fn test_auto_with_request_key_selects_openai() {
        let config = Config::default()
            .with_provider(Provider::Anthropic, ProviderConfig::with_api_key("sk-ant"));
        let request = QueryRequest::new("q").with_api_key("sk-request");

        let resolved = resolve(&config, &request).unwrap();
        assert_eq!(resolved.provider, Provider::OpenAi);
        assert_eq!(resolved.api_key_source, ApiKeySource::Parameter);
    }

    #[test]
    fn test_auto_prefers_openai_config() {
        let resolved = resolve(&both_configured(), &QueryRequest::new("q")).unwrap();
        assert_eq!(resolved.provider, Provider::OpenAi);
        assert_eq!(resolved.api_key, "sk-openai");
    }

    #[test]
    fn test_auto_falls_back_to_anthropic() {
        let config = Config::default()
            .with_provider(Provider::OpenAi, ProviderConfig::with_api_key(""))
            .with_provider(Provider::Anthropic, ProviderConfig::with_api_key("sk-ant"));

        let resolved = resolve(&config, &QueryRequest::new("q")).unwrap();
        assert_eq!(resolved.provider, Provider::Anthropic);
        assert_eq!(resolved.api_key_source, ApiKeySource::ProviderConfig);
    }

    #[test]
    fn test_auto_without_any_key_fails() {
        let err = resolve(&Config::default(), &QueryRequest::new("q")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MissingCredential);
        assert!(err.to_string().contains("API key required"));
    }

    #[test]
    fn test_request_key_never_missing_credential() {
        for hint in [ProviderHint::Auto, ProviderHint::OpenAi, ProviderHint::Anthropic] {
            let request = QueryRequest::new("q").with_provider_hint(hint).with_api_key("sk-x");
            assert!(resolve(&Config::default(), &request).is_ok());
        }
    }

    #[test]
    fn test_configured_default_model() {
        let config = Config::default().with_provider(
            Provider::OpenAi,
            ProviderConfig::with_api_key("sk").default_model("gpt-4o-mini"),
        );
        let resolved = resolve(&config, &QueryRequest::new("q")).unwrap();
        assert_eq!(resolved.model_name, "gpt-4o-mini");
    }

    #[test]
    fn test_blank_default_model_uses_fallback() {
        let config = Config::default().with_provider(
            Provider::Anthropic,
            ProviderConfig::with_api_key("sk").default_model("  "),
        );
        let resolved = resolve(&config, &QueryRequest::new("q")).unwrap();
        assert_eq!(resolved.model_name, "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn test_generation_params() {
        let config = Config::default().with_model(ModelConfig::new("gpt-4o", 1024, 0.3));
        let logger = Logger::disabled();
        let selector = ProviderSelector::new(&config, &logger);

        let params = selector.generation_params("gpt-4o");
        assert_eq!(params.max_tokens, Some(1024));
        assert_eq!(params.temperature, Some(0.3));

        assert_eq!(
            selector.generation_params("unknown-model"),
            GenerationParams::default()
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let resolved = resolve(&both_configured(), &QueryRequest::new("q")).unwrap();
        let debug = format!("{:?}", resolved);
        assert!(!debug.contains("sk-openai"));
        assert!(debug.contains("<redacted>"));
    }
}
