//! Mock LLM client and factory for testing.
//!
//! Provides deterministic replies and records every call so tests can assert
//! on what the pipeline sent, or that it never reached the model at all.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{PgAiError, Result};
use crate::llm::{ClientFactory, ClientSettings, GenerateOptions, LlmClient, Provider};

/// What the mock does when asked to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Return this text.
    Text(String),
    /// Fail with a provider error carrying this message.
    Error(String),
    /// Panic with this message, simulating a faulty client.
    Panic(String),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock LLM client that returns canned replies.
///
/// Clones share their call log.
#[derive(Debug, Clone)]
pub struct MockLlmClient {
    default_reply: MockReply,
    /// Custom reply mappings (pattern -> reply), checked against the user prompt.
    custom_replies: Vec<(String, MockReply)>,
    calls: Arc<Mutex<Vec<GenerateOptions>>>,
}

impl MockLlmClient {
    /// Creates a mock that always answers with `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_reply(MockReply::Text(text.into()))
    }

    /// Creates a mock that always fails with a provider error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(MockReply::Error(message.into()))
    }

    /// Creates a mock that panics when called.
    pub fn panicking(message: impl Into<String>) -> Self {
        Self::with_reply(MockReply::Panic(message.into()))
    }

    pub fn with_reply(reply: MockReply) -> Self {
        Self {
            default_reply: reply,
            custom_replies: Vec::new(),
            calls: Arc::default(),
        }
    }

    /// Adds a custom reply mapping.
    ///
    /// When the user prompt contains `pattern` (case-insensitive), the mock
    /// answers with `text` instead of the default reply.
    pub fn with_response(mut self, pattern: impl Into<String>, text: impl Into<String>) -> Self {
        self.custom_replies
            .push((pattern.into(), MockReply::Text(text.into())));
        self
    }

    /// Returns every set of options this mock (or a clone) was called with.
    pub fn calls(&self) -> Vec<GenerateOptions> {
        lock(&self.calls).clone()
    }

    fn reply_for(&self, user_prompt: &str) -> &MockReply {
        let prompt_lower = user_prompt.to_lowercase();
        self.custom_replies
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(&pattern.to_lowercase()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.default_reply)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate_text(&self, options: &GenerateOptions) -> Result<String> {
        lock(&self.calls).push(options.clone());

        match self.reply_for(&options.user_prompt) {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Error(message) => Err(PgAiError::provider(message.clone())),
            MockReply::Panic(message) => panic!("{}", message),
        }
    }
}

/// A client the mock factory handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedClient {
    pub provider: Provider,
    pub api_key: String,
    pub settings: ClientSettings,
}

/// Mock factory handing out clones of a [`MockLlmClient`].
#[derive(Debug, Clone)]
pub struct MockClientFactory {
    client: MockLlmClient,
    init_error: Option<String>,
    created: Arc<Mutex<Vec<CreatedClient>>>,
}

impl MockClientFactory {
    /// Creates a factory whose clients behave like `client`.
    pub fn new(client: MockLlmClient) -> Self {
        Self {
            client,
            init_error: None,
            created: Arc::default(),
        }
    }

    /// Creates a factory whose client construction always fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            init_error: Some(message.into()),
            ..Self::new(MockLlmClient::new(""))
        }
    }

    /// The client template; shares its call log with every handed-out clone.
    pub fn client(&self) -> &MockLlmClient {
        &self.client
    }

    /// Returns every client construction attempt that succeeded.
    pub fn created(&self) -> Vec<CreatedClient> {
        lock(&self.created).clone()
    }
}

impl ClientFactory for MockClientFactory {
    fn create_client(
        &self,
        provider: Provider,
        api_key: &str,
        settings: &ClientSettings,
    ) -> Result<Box<dyn LlmClient>> {
        if let Some(message) = &self.init_error {
            return Err(PgAiError::client_init(message.clone()));
        }

        lock(&self.created).push(CreatedClient {
            provider,
            api_key: api_key.to_string(),
            settings: settings.clone(),
        });
        Ok(Box::new(self.client.clone()))
    }
}
