//! Command-line argument parsing for pg-ai-query.

use clap::Parser;
use pg_ai_query::query::{ProviderHint, QueryRequest};
use pg_ai_query::safety::SafetyPolicy;
use std::path::PathBuf;

/// Generate a read-only PostgreSQL query from a natural-language request.
#[derive(Parser, Debug)]
#[command(name = "pg-ai-query")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// What the query should do, in plain language
    #[arg(value_name = "REQUEST")]
    pub request: String,

    /// Table the query is about
    #[arg(short = 't', long, value_name = "TABLE")]
    pub table: Option<String>,

    /// Schema information passed to the model verbatim
    #[arg(short = 's', long, value_name = "SCHEMA")]
    pub schema: Option<String>,

    /// API key; overrides keys from the config file
    #[arg(long, value_name = "KEY", env = "PG_AI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// LLM provider: auto, openai, or anthropic
    #[arg(short = 'p', long, value_name = "PROVIDER", default_value = "auto")]
    pub provider: ProviderHint,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Safety policy for the generated SQL (off, lexical, strict); overrides the config file
    #[arg(long, value_name = "POLICY")]
    pub safety: Option<SafetyPolicy>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,

    /// Log pipeline progress regardless of the config file
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Write logs to the state directory instead of stderr
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(pg_ai_query::Config::default_path)
    }

    /// Builds the generation request from the arguments.
    pub fn to_request(&self) -> QueryRequest {
        let mut request = QueryRequest::new(self.request.as_str()).with_provider_hint(self.provider);
        if let Some(table) = &self.table {
            request = request.with_table_name(table.as_str());
        }
        if let Some(schema) = &self.schema {
            request = request.with_schema_context(schema.as_str());
        }
        if let Some(api_key) = &self.api_key {
            request = request.with_api_key(api_key.as_str());
        }
        request
    }
}
