//! Natural language to SQL orchestration.
//!
//! [`QueryGenerator`] runs the whole pipeline for one request:
//! provider resolution, client construction, prompt building, the model
//! call, response extraction, and the safety policy. Every failure,
//! including a panic inside a client, comes back as a failed
//! [`QueryResult`]; nothing escapes to the caller.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::{PgAiError, Result};
use crate::llm::{
    build_prompt, extract_response, ClientFactory, ClientSettings, ExtractionResult,
    GenerateOptions, HttpClientFactory, ProviderSelector, SYSTEM_PROMPT,
};
use crate::logging::Logger;
use crate::safety::SafetyPolicy;

use super::{QueryRequest, QueryResult};

/// Everything the pipeline reads besides the request itself.
///
/// Shared read-only across concurrent generations.
#[derive(Debug, Clone)]
pub struct GeneratorContext {
    pub config: Arc<Config>,
    pub logger: Logger,
    pub safety: SafetyPolicy,
}

impl GeneratorContext {
    /// Builds a context whose logging flag and safety policy come from `[general]`.
    pub fn from_config(config: Config) -> Self {
        Self {
            logger: Logger::new(config.general.enable_logging),
            safety: config.general.safety,
            config: Arc::new(config),
        }
    }

    pub fn with_safety(mut self, safety: SafetyPolicy) -> Self {
        self.safety = safety;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }
}

/// Turns natural-language requests into SQL through an LLM provider.
pub struct QueryGenerator {
    context: GeneratorContext,
    factory: Box<dyn ClientFactory>,
}

impl QueryGenerator {
    /// Creates a generator that builds clients with `factory`.
    pub fn new(context: GeneratorContext, factory: Box<dyn ClientFactory>) -> Self {
        Self { context, factory }
    }

    /// Creates a generator backed by the HTTP provider clients.
    pub fn with_http_clients(context: GeneratorContext) -> Self {
        Self::new(context, Box::new(HttpClientFactory))
    }

    pub fn context(&self) -> &GeneratorContext {
        &self.context
    }

    /// Generates SQL for a request.
    ///
    /// Never panics and never fails: errors are reported through
    /// [`QueryResult::failure`].
    pub async fn generate(&self, request: &QueryRequest) -> QueryResult {
        let logger = &self.context.logger;

        match AssertUnwindSafe(self.run(request)).catch_unwind().await {
            Ok(Ok(extraction)) => QueryResult::success(extraction),
            Ok(Err(error)) => {
                logger.warning(format!("Query generation failed: {}", error));
                QueryResult::failure(&error)
            }
            Err(panic) => {
                let error = PgAiError::internal(panic_message(panic.as_ref()));
                logger.error(format!("Query generation aborted: {}", error));
                QueryResult::failure(&error)
            }
        }
    }

    async fn run(&self, request: &QueryRequest) -> Result<ExtractionResult> {
        if request.natural_language().trim().is_empty() {
            return Err(PgAiError::EmptyInput);
        }

        let config = self.context.config.as_ref();
        let logger = &self.context.logger;
        let selector = ProviderSelector::new(config, logger);

        let resolved = selector.resolve(request)?;
        logger.debug(format!(
            "Resolved provider {} (key source: {})",
            resolved.provider,
            resolved.api_key_source.as_str()
        ));

        logger.info(format!(
            "Creating {} client",
            resolved.provider.display_name()
        ));
        let settings = ClientSettings::from_config(config, resolved.provider);
        let client = self
            .factory
            .create_client(resolved.provider, &resolved.api_key, &settings)
            .map_err(|e| {
                logger.error(format!(
                    "Failed to create {} client: {}",
                    resolved.provider, e
                ));
                match e {
                    PgAiError::ClientInit(_) => e,
                    other => PgAiError::client_init(other.to_string()),
                }
            })?;
        logger.info(format!(
            "Using {} provider with model: {}",
            resolved.provider, resolved.model_name
        ));

        let options = GenerateOptions::new(
            resolved.model_name.as_str(),
            SYSTEM_PROMPT,
            build_prompt(request),
        )
        .with_params(selector.generation_params(&resolved.model_name));

        let started = Instant::now();
        let text = client
            .generate_text(&options)
            .await
            .map_err(|e| match e {
                PgAiError::Provider(_) => e,
                other => PgAiError::provider(other.to_string()),
            })?;
        logger.debug(format!(
            "Received {} bytes from {} in {} ms",
            text.len(),
            resolved.provider,
            started.elapsed().as_millis()
        ));

        if text.trim().is_empty() {
            return Err(PgAiError::EmptyResponse);
        }

        let extraction = extract_response(&text);
        if extraction.sql.trim().is_empty() {
            return Err(PgAiError::NoSqlFound);
        }

        self.context.safety.check(&extraction.sql)?;

        Ok(extraction)
    }
}

/// Generates SQL for a request, blocking the calling thread until done.
///
/// Runs the generator on a fresh current-thread runtime. Called from inside
/// a tokio runtime it returns an internal failure instead of blocking; use
/// [`QueryGenerator::generate`] there.
pub fn generate_query(generator: &QueryGenerator, request: &QueryRequest) -> QueryResult {
    if tokio::runtime::Handle::try_current().is_ok() {
        let error = PgAiError::internal(
            "generate_query cannot block inside an async runtime; use QueryGenerator::generate",
        );
        generator
            .context
            .logger
            .error(format!("Query generation aborted: {}", error));
        return QueryResult::failure(&error);
    }

    match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(generator.generate(request)),
        Err(e) => QueryResult::failure(&PgAiError::internal(format!(
            "Failed to start async runtime: {}",
            e
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("Exception: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("Exception: {}", message)
    } else {
        "Exception: unknown panic in model client".to_string()
    }
}
