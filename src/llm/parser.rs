//! Response extraction for LLM outputs.
//!
//! Recovers a SQL string and optional metadata from model text that may be a
//! JSON object, a fenced JSON block, a fenced SQL block, or plain prose.
//! Extraction never fails: text with no recognizable structure is taken to
//! be the SQL itself.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Explanation attached to results taken verbatim from the model text.
pub const RAW_OUTPUT_EXPLANATION: &str = "Raw output (no structured data detected)";

/// Visualization suggested when the model does not name one.
pub const DEFAULT_VISUALIZATION: &str = "table";

/// SQL and metadata recovered from a model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Extracted SQL; empty when the model answered without a query.
    pub sql: String,
    pub explanation: Option<String>,
    pub warnings: Vec<String>,
    pub row_limit_applied: bool,
    pub suggested_visualization: String,
}

impl ExtractionResult {
    /// Creates a result carrying only SQL, with every other field defaulted.
    pub fn sql_only(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            explanation: None,
            warnings: Vec::new(),
            row_limit_applied: false,
            suggested_visualization: DEFAULT_VISUALIZATION.to_string(),
        }
    }

    /// Sets the explanation.
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Builds a result from a parsed JSON object, defaulting missing or mistyped fields.
    fn from_object(object: &Map<String, Value>) -> Self {
        let text_field = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        Self {
            sql: text_field("sql").unwrap_or_default(),
            // "explaination" is the key older prompt templates asked for
            explanation: text_field("explanation").or_else(|| text_field("explaination")),
            warnings: object.get("warnings").map(read_warnings).unwrap_or_default(),
            row_limit_applied: object
                .get("row_limit_applied")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            suggested_visualization: text_field("suggested_visualization")
                .unwrap_or_else(|| DEFAULT_VISUALIZATION.to_string()),
        }
    }
}

/// Normalizes the `warnings` field.
///
/// Accepts a list of strings or a single string; any other shape, including a
/// list holding a non-string, yields no warnings.
fn read_warnings(value: &Value) -> Vec<String> {
    match value {
        Value::String(warning) => vec![warning.clone()],
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(String::from))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn json_block_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)```(?:json)?\s*(\{[\s\S]*?\})\s*```").ok())
        .as_ref()
}

fn sql_block_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)```sql[ \t]*\r?\n([\s\S]*?)```").ok())
        .as_ref()
}

/// Parses `text` as a JSON object.
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Finds the first fenced JSON block whose body is a valid JSON object.
fn fenced_json(text: &str) -> Option<Map<String, Value>> {
    let captures = json_block_regex()?.captures(text)?;
    parse_object(captures.get(1)?.as_str())
}

/// Extracts the first ```sql block, using the surrounding prose as the explanation.
fn fenced_sql(text: &str) -> Option<ExtractionResult> {
    let captures = sql_block_regex()?.captures(text)?;
    let block = captures.get(0)?;
    let sql = captures.get(1)?.as_str().trim();
    if sql.is_empty() {
        return None;
    }

    let prose = format!(
        "{} {}",
        text[..block.start()].trim(),
        text[block.end()..].trim()
    );
    let prose = prose.trim();

    let result = ExtractionResult::sql_only(sql);
    Some(if prose.is_empty() {
        result
    } else {
        result.with_explanation(prose)
    })
}

/// Extracts SQL and metadata from raw model output.
///
/// Tried in order:
/// 1. a fenced block (optionally tagged `json`) containing a JSON object;
/// 2. the whole text as a JSON object;
/// 3. a fenced ```sql block;
/// 4. the whole text as SQL, with [`RAW_OUTPUT_EXPLANATION`].
pub fn extract_response(raw: &str) -> ExtractionResult {
    if let Some(object) = fenced_json(raw).or_else(|| parse_object(raw.trim())) {
        return ExtractionResult::from_object(&object);
    }

    if let Some(result) = fenced_sql(raw) {
        return result;
    }

    ExtractionResult::sql_only(raw.trim()).with_explanation(RAW_OUTPUT_EXPLANATION)
}
