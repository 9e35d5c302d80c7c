//! Error types for pg-ai-query.
//!
//! Defines the error enum shared by every stage of the generation pipeline,
//! plus a machine-readable [`ErrorKind`] that survives into [`QueryResult`].
//!
//! [`QueryResult`]: crate::query::QueryResult

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for pg-ai-query operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PgAiError {
    /// The natural language request was empty.
    #[error("Natural language query cannot be empty")]
    EmptyInput,

    /// No API key could be found for the selected provider.
    #[error("{0}")]
    MissingCredential(String),

    /// The provider client could not be constructed.
    #[error("Failed to create AI client: {0}")]
    ClientInit(String),

    /// The provider reported an error (auth, rate limit, network, etc.)
    #[error("AI API error: {0}")]
    Provider(String),

    /// The provider answered with an empty body.
    #[error("Empty response from AI service")]
    EmptyResponse,

    /// The model answer did not contain any SQL.
    #[error("No SQL found in model response")]
    NoSqlFound,

    /// The generated SQL was rejected by the safety policy.
    #[error("Generated query rejected by safety policy: {0}")]
    UnsafeQuery(String),

    /// Configuration errors (invalid config file, out-of-range values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal faults.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PgAiError {
    /// Creates a missing credential error with the given message.
    pub fn missing_credential(msg: impl Into<String>) -> Self {
        Self::MissingCredential(msg.into())
    }

    /// Creates a client initialization error with the given message.
    pub fn client_init(msg: impl Into<String>) -> Self {
        Self::ClientInit(msg.into())
    }

    /// Creates a provider error with the given message.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Creates an unsafe query error with the given reason.
    pub fn unsafe_query(reason: impl Into<String>) -> Self {
        Self::UnsafeQuery(reason.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::MissingCredential(_) => ErrorKind::MissingCredential,
            Self::ClientInit(_) => ErrorKind::ClientInitError,
            Self::Provider(_) => ErrorKind::ProviderError,
            Self::EmptyResponse => ErrorKind::EmptyResponse,
            Self::NoSqlFound => ErrorKind::NoSqlFound,
            Self::UnsafeQuery(_) => ErrorKind::UnsafeQuery,
            Self::Config(_) => ErrorKind::ConfigError,
            Self::Internal(_) => ErrorKind::InternalException,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyInput => "Input Error",
            Self::MissingCredential(_) | Self::ClientInit(_) => "Provider Setup Error",
            Self::Provider(_) | Self::EmptyResponse => "LLM Error",
            Self::NoSqlFound | Self::UnsafeQuery(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Machine-readable failure classification carried by failed query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyInput,
    MissingCredential,
    ClientInitError,
    ProviderError,
    EmptyResponse,
    NoSqlFound,
    UnsafeQuery,
    ConfigError,
    InternalException,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EmptyInput => "empty_input",
            Self::MissingCredential => "missing_credential",
            Self::ClientInitError => "client_init_error",
            Self::ProviderError => "provider_error",
            Self::EmptyResponse => "empty_response",
            Self::NoSqlFound => "no_sql_found",
            Self::UnsafeQuery => "unsafe_query",
            Self::ConfigError => "config_error",
            Self::InternalException => "internal_exception",
        };
        f.write_str(name)
    }
}

/// Result type alias using PgAiError.
pub type Result<T> = std::result::Result<T, PgAiError>;
