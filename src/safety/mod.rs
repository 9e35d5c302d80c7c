//! Safety validation for generated SQL.
//!
//! [`is_safe`] is a coarse lexical filter over a lowercase copy of the query:
//! the text must mention `select` and must not mention any keyword in
//! [`DENYLIST`]. It is not a parser, and has two known limitations:
//!
//! - substring matching over-rejects legitimate identifiers, e.g. a column
//!   named `inserted_at` or `updated_by`;
//! - a query whose only `select` sits inside a comment or string literal
//!   still passes.
//!
//! [`SafetyPolicy::Strict`] layers a sqlparser-based read-only check on top
//! of the lexical filter for callers that need the stronger guarantee.

mod parser;

pub use parser::check_read_only;

use crate::error::{PgAiError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mutating, DDL, and privilege keywords that reject a query.
pub const DENYLIST: &[&str] = &[
    "insert", "update", "delete", "drop", "create", "alter", "truncate", "grant", "revoke",
    "exec", "execute",
];

/// Returns true if `sql` passes the lexical safety filter.
pub fn is_safe(sql: &str) -> bool {
    lexical_violation(sql).is_none()
}

/// Returns the reason `sql` fails the lexical filter, if it does.
fn lexical_violation(sql: &str) -> Option<String> {
    if sql.is_empty() {
        return Some("query is empty".to_string());
    }

    let lowered = sql.to_lowercase();

    if !lowered.contains("select") {
        return Some("query is not a SELECT".to_string());
    }

    DENYLIST
        .iter()
        .find(|keyword| lowered.contains(*keyword))
        .map(|keyword| format!("query contains forbidden keyword '{}'", keyword))
}

/// How generated SQL is gated before it is returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyPolicy {
    /// Return whatever the model produced.
    #[default]
    Off,
    /// Apply the lexical filter ([`is_safe`]).
    Lexical,
    /// Apply the lexical filter, then require every parsed statement to be read-only.
    Strict,
}

impl SafetyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Lexical => "lexical",
            Self::Strict => "strict",
        }
    }

    /// Returns true if this policy inspects the query at all.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Checks `sql` against this policy.
    ///
    /// Returns [`PgAiError::UnsafeQuery`] with the rejection reason.
    pub fn check(&self, sql: &str) -> Result<()> {
        if *self == Self::Off {
            return Ok(());
        }

        if let Some(reason) = lexical_violation(sql) {
            return Err(PgAiError::unsafe_query(reason));
        }

        if *self == Self::Strict {
            check_read_only(sql)?;
        }

        Ok(())
    }
}

impl FromStr for SafetyPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "lexical" => Ok(Self::Lexical),
            "strict" => Ok(Self::Strict),
            _ => Err(format!(
                "Unknown safety policy: {s}. Expected: off, lexical, or strict"
            )),
        }
    }
}

impl fmt::Display for SafetyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_select_is_safe() {
        assert!(is_safe("SELECT * FROM t"));
        assert!(is_safe("select id from users where active"));
    }

    #[test]
    fn test_drop_is_unsafe() {
        assert!(!is_safe("DROP TABLE t"));
    }

    #[test]
    fn test_empty_is_unsafe() {
        assert!(!is_safe(""));
    }

    #[test]
    fn test_missing_select_is_unsafe() {
        assert!(!is_safe("SHOW search_path"));
        assert!(!is_safe("VALUES (1)"));
    }

    #[test]
    fn test_denylist_is_case_insensitive() {
        assert!(!is_safe("SELECT 1; DeLeTe FROM users"));
        assert!(!is_safe("SELECT * FROM t; EXECUTE plan"));
        assert!(!is_safe("WITH x AS (UPDATE t SET a = 1 RETURNING *) SELECT * FROM x"));
    }

    #[test]
    fn test_substring_match_over_rejects_identifiers() {
        // Known limitation: identifiers containing denylisted words are rejected.
        assert!(!is_safe("select insert_date from t"));
        assert!(!is_safe("SELECT created_at FROM users"));
    }

    #[test]
    fn test_select_in_comment_passes() {
        // Known limitation: the filter does not understand comments.
        assert!(is_safe("-- select\nVACUUM users"));
    }

    #[test]
    fn test_is_safe_does_not_mutate_input() {
        let sql = String::from("SELECT Name FROM Users");
        assert!(is_safe(&sql));
        assert_eq!(sql, "SELECT Name FROM Users");
    }

    #[test]
    fn test_policy_off_accepts_anything() {
        assert!(SafetyPolicy::Off.check("DROP TABLE users").is_ok());
        assert!(SafetyPolicy::Off.check("").is_ok());
    }

    #[test]
    fn test_policy_lexical_reports_keyword() {
        let err = SafetyPolicy::Lexical.check("DROP TABLE users").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnsafeQuery);
        assert!(err.to_string().contains("not a SELECT"));

        let err = SafetyPolicy::Lexical
            .check("SELECT 1; TRUNCATE users")
            .unwrap_err();
        assert!(err.to_string().contains("'truncate'"));
    }

    #[test]
    fn test_policy_strict_applies_lexical_first() {
        let err = SafetyPolicy::Strict.check("select insert_date from t").unwrap_err();
        assert!(err.to_string().contains("'insert'"));
    }

    #[test]
    fn test_policy_strict_rejects_what_lexical_misses() {
        let sql = "-- select\nVACUUM users";
        assert!(SafetyPolicy::Lexical.check(sql).is_ok());
        assert!(SafetyPolicy::Strict.check(sql).is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("off".parse::<SafetyPolicy>().unwrap(), SafetyPolicy::Off);
        assert_eq!("Lexical".parse::<SafetyPolicy>().unwrap(), SafetyPolicy::Lexical);
        assert_eq!("STRICT".parse::<SafetyPolicy>().unwrap(), SafetyPolicy::Strict);
        assert!("paranoid".parse::<SafetyPolicy>().is_err());
    }

    #[test]
    fn test_policy_display_and_default() {
        assert_eq!(SafetyPolicy::default(), SafetyPolicy::Off);
        assert_eq!(SafetyPolicy::Strict.to_string(), "strict");
        assert!(!SafetyPolicy::Off.is_enabled());
        assert!(SafetyPolicy::Lexical.is_enabled());
    }
}
