//! Query generation requests and results.
//!
//! [`QueryRequest`] is the input to the pipeline and [`QueryResult`] its only
//! output. The orchestrator lives in [`generator`].

pub mod generator;

pub use generator::{generate_query, GeneratorContext, QueryGenerator};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ErrorKind, PgAiError};
use crate::llm::{ExtractionResult, Provider};

/// Which provider the caller asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProviderHint {
    /// Pick a provider from the request key and configuration.
    #[default]
    Auto,
    OpenAi,
    Anthropic,
}

impl ProviderHint {
    /// Returns the explicitly requested provider, if any.
    pub fn explicit(&self) -> Option<Provider> {
        match self {
            Self::Auto => None,
            Self::OpenAi => Some(Provider::OpenAi),
            Self::Anthropic => Some(Provider::Anthropic),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

impl FromStr for ProviderHint {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(format!(
                "Unknown provider: {s}. Expected: auto, openai, or anthropic"
            )),
        }
    }
}

impl fmt::Display for ProviderHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A natural-language query generation request.
///
/// Optional text fields set to an empty string behave as if unset.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct QueryRequest {
    natural_language: String,
    table_name: Option<String>,
    schema_context: Option<String>,
    api_key: Option<String>,
    provider_hint: ProviderHint,
}

impl QueryRequest {
    /// Creates a request for the given natural-language text.
    pub fn new(natural_language: impl Into<String>) -> Self {
        Self {
            natural_language: natural_language.into(),
            ..Default::default()
        }
    }

    /// Restricts the request to a table.
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Adds free-form schema information for the prompt.
    pub fn with_schema_context(mut self, schema_context: impl Into<String>) -> Self {
        self.schema_context = Some(schema_context.into());
        self
    }

    /// Supplies an API key, taking precedence over configured keys.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_provider_hint(mut self, hint: ProviderHint) -> Self {
        self.provider_hint = hint;
        self
    }

    pub fn natural_language(&self) -> &str {
        &self.natural_language
    }

    pub fn table_name(&self) -> Option<&str> {
        non_empty(&self.table_name)
    }

    pub fn schema_context(&self) -> Option<&str> {
        non_empty(&self.schema_context)
    }

    pub fn api_key(&self) -> Option<&str> {
        non_empty(&self.api_key)
    }

    pub fn provider_hint(&self) -> ProviderHint {
        self.provider_hint
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl fmt::Debug for QueryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRequest")
            .field("natural_language", &self.natural_language)
            .field("table_name", &self.table_name)
            .field("schema_context", &self.schema_context)
            .field("api_key", &self.api_key().map(|_| "<redacted>"))
            .field("provider_hint", &self.provider_hint)
            .finish()
    }
}

/// Outcome of a generation request.
///
/// Either `success` is true and `generated_query` is non-empty, or `success`
/// is false and `error_message` is non-empty. The constructors are the only
/// way to build one; deserialization rejects JSON that breaks the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QueryResultFields")]
pub struct QueryResult {
    success: bool,
    generated_query: String,
    explanation: String,
    warnings: Vec<String>,
    row_limit_applied: bool,
    suggested_visualization: String,
    error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,
}

/// Unchecked wire form of [`QueryResult`].
#[derive(Deserialize)]
struct QueryResultFields {
    success: bool,
    #[serde(default)]
    generated_query: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    warnings: Vec<String>,
    #[serde(default)]
    row_limit_applied: bool,
    #[serde(default)]
    suggested_visualization: String,
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    error_kind: Option<ErrorKind>,
}

impl TryFrom<QueryResultFields> for QueryResult {
    type Error = String;

    fn try_from(fields: QueryResultFields) -> std::result::Result<Self, Self::Error> {
        if fields.success && fields.generated_query.trim().is_empty() {
            return Err("successful result must carry a generated query".to_string());
        }
        if !fields.success && fields.error_message.trim().is_empty() {
            return Err("failed result must carry an error message".to_string());
        }

        Ok(Self {
            success: fields.success,
            generated_query: fields.generated_query,
            explanation: fields.explanation,
            warnings: fields.warnings,
            row_limit_applied: fields.row_limit_applied,
            suggested_visualization: fields.suggested_visualization,
            error_message: fields.error_message,
            error_kind: fields.error_kind,
        })
    }
}

impl QueryResult {
    /// Builds a successful result from extracted SQL and metadata.
    ///
    /// Extraction without SQL becomes a [`PgAiError::NoSqlFound`] failure.
    pub fn success(extraction: ExtractionResult) -> Self {
        if extraction.sql.trim().is_empty() {
            return Self::failure(&PgAiError::NoSqlFound);
        }

        Self {
            success: true,
            generated_query: extraction.sql,
            explanation: extraction.explanation.unwrap_or_default(),
            warnings: extraction.warnings,
            row_limit_applied: extraction.row_limit_applied,
            suggested_visualization: extraction.suggested_visualization,
            error_message: String::new(),
            error_kind: None,
        }
    }

    /// Builds a failed result from an error.
    pub fn failure(error: &PgAiError) -> Self {
        let mut error_message = error.to_string();
        if error_message.trim().is_empty() {
            error_message = error.category().to_string();
        }

        Self {
            success: false,
            generated_query: String::new(),
            explanation: String::new(),
            warnings: Vec::new(),
            row_limit_applied: false,
            suggested_visualization: String::new(),
            error_message,
            error_kind: Some(error.kind()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn generated_query(&self) -> &str {
        &self.generated_query
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn row_limit_applied(&self) -> bool {
        self.row_limit_applied
    }

    pub fn suggested_visualization(&self) -> &str {
        &self.suggested_visualization
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Machine-readable failure kind; `None` on success.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }
}
