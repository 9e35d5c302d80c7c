//! pg-ai-query - Generate read-only PostgreSQL queries from natural language.
//!
//! The pipeline resolves an LLM provider and credential, builds a prompt,
//! calls the model, extracts SQL and metadata from its answer, and
//! optionally gates the SQL through a safety policy. See
//! [`query::QueryGenerator`] for the entry point.

pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod query;
pub mod safety;

pub use config::Config;
pub use error::{ErrorKind, PgAiError, Result};
pub use query::{generate_query, GeneratorContext, QueryGenerator, QueryRequest, QueryResult};
