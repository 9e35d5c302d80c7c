//! Config file integration tests.
//!
//! Writes config files to a temp dir and checks that the pipeline honors
//! them.

use pg_ai_query::llm::{MockClientFactory, MockLlmClient, Provider};
use pg_ai_query::safety::SafetyPolicy;
use pg_ai_query::{Config, ErrorKind, GeneratorContext, QueryGenerator, QueryRequest};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use tempfile::TempDir;

const FULL_CONFIG: &str = r#"
[general]
enable_logging = true
log_level = "debug"
safety = "strict"
request_timeout_secs = 10

[anthropic]
api_key = "sk-ant-file"
default_model = "claude-3-5-haiku-20241022"
api_base_url = "http://localhost:4000/v1"

[[models]]
name = "claude-3-5-haiku-20241022"
max_tokens = 1024
temperature = 0.0
"#;

fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".pg_ai.config");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn test_full_config_file_drives_generation() {
    let (_dir, path) = write_config(FULL_CONFIG);
    let config = Config::load_from_file(&path).unwrap();

    let factory = MockClientFactory::new(MockLlmClient::new("SELECT count(*) FROM orders"));
    let generator = QueryGenerator::new(
        GeneratorContext::from_config(config),
        Box::new(factory.clone()),
    );
    assert_eq!(generator.context().safety, SafetyPolicy::Strict);
    assert!(generator.context().logger.is_enabled());

    let result = tokio_test::block_on(generator.generate(&QueryRequest::new("count orders")));
    assert!(result.is_success());

    let created = factory.created();
    assert_eq!(created[0].provider, Provider::Anthropic);
    assert_eq!(created[0].api_key, "sk-ant-file");
    assert_eq!(
        created[0].settings.base_url.as_deref(),
        Some("http://localhost:4000/v1")
    );
    assert_eq!(created[0].settings.timeout_secs, 10);

    let calls = factory.client().calls();
    assert_eq!(calls[0].model, "claude-3-5-haiku-20241022");
    assert_eq!(calls[0].max_tokens, Some(1024));
    assert_eq!(calls[0].temperature, Some(0.0));
}

#[test]
fn test_strict_policy_from_file_blocks_writes() {
    let (_dir, path) = write_config(FULL_CONFIG);
    let config = Config::load_from_file(&path).unwrap();

    let factory = MockClientFactory::new(MockLlmClient::new(
        "WITH gone AS (UPDATE users SET active = false RETURNING id) SELECT * FROM gone",
    ));
    let generator = QueryGenerator::new(GeneratorContext::from_config(config), Box::new(factory));

    let result = tokio_test::block_on(generator.generate(&QueryRequest::new("deactivate users")));
    assert!(!result.is_success());
    assert_eq!(result.error_kind(), Some(ErrorKind::UnsafeQuery));
}

#[test]
fn test_missing_config_file_means_no_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_file(&dir.path().join(".pg_ai.config")).unwrap();

    let factory = MockClientFactory::new(MockLlmClient::new("SELECT 1"));
    let generator = QueryGenerator::new(GeneratorContext::from_config(config), Box::new(factory));

    let result = tokio_test::block_on(generator.generate(&QueryRequest::new("list users")));
    assert_eq!(result.error_kind(), Some(ErrorKind::MissingCredential));
}

#[test]
fn test_invalid_config_file_is_a_config_error() {
    let (_dir, path) = write_config("[[models]]\nname = \"gpt-4o\"\nmax_tokens = 0\ntemperature = 0.5\n");

    let err = Config::load_from_file(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigError);
    assert!(err.to_string().contains(".pg_ai.config"));
}
