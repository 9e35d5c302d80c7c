//! Parser-backed read-only check.
//!
//! Uses sqlparser-rs with the PostgreSQL dialect to confirm that every
//! statement is a plain query with no data-modifying CTEs or `SELECT INTO`.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use crate::error::{PgAiError, Result};

/// Verifies that `sql` parses and contains only read-only statements.
pub fn check_read_only(sql: &str) -> Result<()> {
    let statements = Parser::parse_sql(&PostgreSqlDialect {}, sql)
        .map_err(|e| PgAiError::unsafe_query(format!("could not parse SQL: {}", e)))?;

    if statements.is_empty() {
        return Err(PgAiError::unsafe_query("no SQL statement found"));
    }

    for (idx, statement) in statements.iter().enumerate() {
        if let Some(reason) = statement_violation(statement) {
            return Err(PgAiError::unsafe_query(format!(
                "statement {}: {}",
                idx + 1,
                reason
            )));
        }
    }

    Ok(())
}

fn statement_violation(statement: &Statement) -> Option<String> {
    match statement {
        Statement::Query(query) => query_violation(query),
        // EXPLAIN ANALYZE executes the inner statement
        Statement::Explain { analyze: true, .. } => {
            Some("EXPLAIN ANALYZE executes the query".to_string())
        }
        Statement::Explain { .. } => None,
        other => Some(format!("not a read-only query: {}", first_keyword(other))),
    }
}

fn query_violation(query: &Query) -> Option<String> {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            if let Some(reason) = query_violation(&cte.query) {
                return Some(reason);
            }
        }
    }

    set_expr_violation(&query.body)
}

fn set_expr_violation(set_expr: &SetExpr) -> Option<String> {
    match set_expr {
        SetExpr::Update(_) => Some("data-modifying UPDATE".to_string()),
        SetExpr::Insert(_) => Some("data-modifying INSERT".to_string()),
        SetExpr::Query(query) => query_violation(query),
        SetExpr::Select(select) => select_violation(select),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_violation(left).or_else(|| set_expr_violation(right))
        }
        SetExpr::Values(_) | SetExpr::Table(_) => None,
        // Newer sqlparser releases add DELETE and MERGE bodies
        #[allow(unreachable_patterns)]
        _ => Some("data-modifying statement".to_string()),
    }
}

fn select_violation(select: &Select) -> Option<String> {
    if select.into.is_some() {
        return Some("SELECT INTO creates a table".to_string());
    }

    select.from.iter().find_map(table_with_joins_violation)
}

fn table_with_joins_violation(twj: &TableWithJoins) -> Option<String> {
    table_factor_violation(&twj.relation).or_else(|| {
        twj.joins
            .iter()
            .find_map(|join| table_factor_violation(&join.relation))
    })
}

fn table_factor_violation(factor: &TableFactor) -> Option<String> {
    match factor {
        TableFactor::Derived { subquery, .. } => query_violation(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => table_with_joins_violation(table_with_joins),
        _ => None,
    }
}

/// Returns the leading keyword of a statement's SQL rendering, for messages.
fn first_keyword(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or("UNKNOWN")
        .to_uppercase()
}
