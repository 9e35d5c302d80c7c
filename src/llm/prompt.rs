//! Prompt construction for LLM requests.

use crate::query::QueryRequest;
use std::fmt::Write;

/// System prompt sent with every generation request.
pub const SYSTEM_PROMPT: &str = r#"You are a SQL assistant for a PostgreSQL database. Translate the user's request into a single PostgreSQL query.

INSTRUCTIONS:
- Generate only valid PostgreSQL SQL
- Generate read-only queries (SELECT); never INSERT, UPDATE, DELETE, DROP, CREATE, ALTER, TRUNCATE, GRANT, or REVOKE
- Use only the tables and columns named in the request or schema info
- Limit results to 1000 rows unless the user specifies otherwise
- If the request cannot be answered safely, explain why in "explanation" and leave "sql" empty

OUTPUT FORMAT:
Respond with a JSON object only, wrapped in a ```json code block:
{
  "sql": "the SQL query",
  "explanation": "short description of what the query does",
  "warnings": ["assumptions or caveats, if any"],
  "row_limit_applied": true,
  "suggested_visualization": "table"
}
Only "sql" is required."#;

/// Builds the user prompt for a request.
///
/// The table and schema sections are omitted when empty.
pub fn build_prompt(request: &QueryRequest) -> String {
    let mut prompt = String::from("Generate a PostgreSQL query for this request:\n\n");

    // Writing to a String cannot fail
    let _ = writeln!(prompt, "Request: {}", request.natural_language());

    if let Some(table) = request.table_name() {
        let _ = writeln!(prompt, "Table: {}", table);
    }

    if let Some(schema) = request.schema_context() {
        let _ = writeln!(prompt, "Schema info:\n{}", schema);
    }

    prompt
}
