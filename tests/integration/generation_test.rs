//! End-to-end generation tests.
//!
//! Runs the full pipeline against a mock client factory and checks the
//! result a caller would see.

use pg_ai_query::config::{ModelConfig, ProviderConfig};
use pg_ai_query::llm::{MockClientFactory, MockLlmClient, Provider};
use pg_ai_query::query::ProviderHint;
use pg_ai_query::safety::SafetyPolicy;
use pg_ai_query::{
    generate_query, Config, ErrorKind, GeneratorContext, QueryGenerator, QueryRequest,
};
use pretty_assertions::assert_eq;

const STRUCTURED_REPLY: &str = r#"Here is the query:
```json
{
  "sql": "SELECT id, email FROM users ORDER BY created_at DESC LIMIT 5",
  "explanation": "Returns the five newest users.",
  "warnings": ["created_at is assumed to be indexed"],
  "row_limit_applied": true,
  "suggested_visualization": "table"
}
```"#;

fn openai_config() -> Config {
    Config::default().with_provider(
        Provider::OpenAi,
        ProviderConfig::with_api_key("sk-openai").default_model("gpt-4o-mini"),
    )
}

fn generator(config: Config, client: MockLlmClient) -> (QueryGenerator, MockClientFactory) {
    let factory = MockClientFactory::new(client);
    let generator = QueryGenerator::new(
        GeneratorContext::from_config(config),
        Box::new(factory.clone()),
    );
    (generator, factory)
}

#[test]
fn test_structured_reply_end_to_end() {
    let (generator, factory) = generator(openai_config(), MockLlmClient::new(STRUCTURED_REPLY));
    let request = QueryRequest::new("show the 5 newest users").with_table_name("users");

    let result = generate_query(&generator, &request);

    assert!(result.is_success());
    assert_eq!(
        result.generated_query(),
        "SELECT id, email FROM users ORDER BY created_at DESC LIMIT 5"
    );
    assert_eq!(result.explanation(), "Returns the five newest users.");
    assert_eq!(result.warnings(), ["created_at is assumed to be indexed"]);
    assert!(result.row_limit_applied());
    assert_eq!(result.suggested_visualization(), "table");
    assert_eq!(result.error_message(), "");

    let created = factory.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].provider, Provider::OpenAi);
    assert_eq!(created[0].api_key, "sk-openai");

    let calls = factory.client().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, "gpt-4o-mini");
    assert!(calls[0].user_prompt.contains("Request: show the 5 newest users"));
    assert!(calls[0].user_prompt.contains("Table: users"));
}

#[test]
fn test_plain_sql_reply_is_returned_raw() {
    let (generator, _) = generator(openai_config(), MockLlmClient::new("SELECT 1"));

    let result = generate_query(&generator, &QueryRequest::new("anything"));

    assert!(result.is_success());
    assert_eq!(result.generated_query(), "SELECT 1");
    assert_eq!(
        result.explanation(),
        "Raw output (no structured data detected)"
    );
    assert!(result.warnings().is_empty());
    assert!(!result.row_limit_applied());
    assert_eq!(result.suggested_visualization(), "table");
}

#[test]
fn test_request_key_overrides_config() {
    let config = openai_config().with_provider(
        Provider::Anthropic,
        ProviderConfig::with_api_key("sk-ant-config"),
    );
    let (generator, factory) = generator(config, MockLlmClient::new("SELECT 1"));
    let request = QueryRequest::new("count orders")
        .with_api_key("sk-ant-request")
        .with_provider_hint(ProviderHint::Anthropic);

    let result = generate_query(&generator, &request);

    assert!(result.is_success());
    let created = factory.created();
    assert_eq!(created[0].provider, Provider::Anthropic);
    assert_eq!(created[0].api_key, "sk-ant-request");
    assert_eq!(
        factory.client().calls()[0].model,
        Provider::Anthropic.fallback_model()
    );
}

#[test]
fn test_model_params_reach_the_client() {
    let config = openai_config().with_model(ModelConfig::new("gpt-4o-mini", 512, 0.2));
    let (generator, factory) = generator(config, MockLlmClient::new("SELECT 1"));

    generate_query(&generator, &QueryRequest::new("anything"));

    let calls = factory.client().calls();
    assert_eq!(calls[0].max_tokens, Some(512));
    assert_eq!(calls[0].temperature, Some(0.2));
}

#[test]
fn test_missing_credentials_never_call_the_model() {
    let (generator, factory) = generator(Config::default(), MockLlmClient::new("SELECT 1"));

    let result = generate_query(&generator, &QueryRequest::new("list users"));

    assert!(!result.is_success());
    assert_eq!(result.generated_query(), "");
    assert_eq!(result.error_kind(), Some(ErrorKind::MissingCredential));
    assert!(result.error_message().contains("API key required"));
    assert!(factory.created().is_empty());
    assert!(factory.client().calls().is_empty());
}

#[test]
fn test_empty_request_is_rejected() {
    let (generator, factory) = generator(openai_config(), MockLlmClient::new("SELECT 1"));

    let result = generate_query(&generator, &QueryRequest::new("   "));

    assert!(!result.is_success());
    assert_eq!(result.error_kind(), Some(ErrorKind::EmptyInput));
    assert!(factory.client().calls().is_empty());
}

#[test]
fn test_provider_failure_is_reported() {
    let (generator, _) = generator(openai_config(), MockLlmClient::failing("Rate limited"));

    let result = generate_query(&generator, &QueryRequest::new("anything"));

    assert!(!result.is_success());
    assert_eq!(result.error_kind(), Some(ErrorKind::ProviderError));
    assert!(result.error_message().contains("Rate limited"));
}

#[test]
fn test_client_panic_is_contained() {
    let (generator, _) = generator(openai_config(), MockLlmClient::panicking("boom"));

    let result = generate_query(&generator, &QueryRequest::new("anything"));

    assert!(!result.is_success());
    assert_eq!(result.error_kind(), Some(ErrorKind::InternalException));
    assert!(result.error_message().contains("boom"));
}

#[test]
fn test_destructive_sql_passes_with_safety_off() {
    let (generator, _) = generator(openai_config(), MockLlmClient::new("DROP TABLE users"));

    let result = generate_query(&generator, &QueryRequest::new("drop users"));

    assert!(result.is_success());
    assert_eq!(result.generated_query(), "DROP TABLE users");
}

#[test]
fn test_destructive_sql_rejected_with_lexical_safety() {
    let factory = MockClientFactory::new(MockLlmClient::new("DROP TABLE users"));
    let context =
        GeneratorContext::from_config(openai_config()).with_safety(SafetyPolicy::Lexical);
    let generator = QueryGenerator::new(context, Box::new(factory));

    let result = generate_query(&generator, &QueryRequest::new("drop users"));

    assert!(!result.is_success());
    assert_eq!(result.error_kind(), Some(ErrorKind::UnsafeQuery));
    assert_eq!(result.generated_query(), "");
}

#[tokio::test]
async fn test_concurrent_generations_share_one_generator() {
    let client = MockLlmClient::new("SELECT 1").with_response("orders", "SELECT COUNT(*) FROM orders");
    let (generator, factory) = generator(openai_config(), client);
    let generator = std::sync::Arc::new(generator);

    let handles: Vec<_> = ["list users", "count orders", "list users"]
        .into_iter()
        .map(|text| {
            let generator = generator.clone();
            tokio::spawn(async move { generator.generate(&QueryRequest::new(text)).await })
        })
        .collect();

    let mut queries = Vec::new();
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.is_success());
        queries.push(result.generated_query().to_string());
    }

    assert_eq!(
        queries,
        ["SELECT 1", "SELECT COUNT(*) FROM orders", "SELECT 1"]
    );
    assert_eq!(factory.client().calls().len(), 3);
}

#[test]
fn test_result_serializes_for_json_output() {
    let (generator, _) = generator(Config::default(), MockLlmClient::new("SELECT 1"));

    let result = generate_query(&generator, &QueryRequest::new("list users"));
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["success"], false);
    assert_eq!(json["error_kind"], "missing_credential");
    assert_eq!(json["generated_query"], "");
}
