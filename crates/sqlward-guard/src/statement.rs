//! Lightweight statement classification.
//!
//! Textual helpers shared by the validator, the tenant scoper, and the
//! optimizer. None of this is a parser; it answers the handful of shape
//! questions the heuristics need.

use once_cell::sync::Lazy;
use regex::Regex;

/// The kind of statement, judged from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

/// Classify a statement by its first keyword.
pub fn statement_kind(sql: &str) -> StatementKind {
    let trimmed = sql.trim_start();
    let keyword: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    match keyword.to_ascii_uppercase().as_str() {
        "SELECT" => StatementKind::Select,
        "INSERT" => StatementKind::Insert,
        "UPDATE" => StatementKind::Update,
        "DELETE" => StatementKind::Delete,
        _ => StatementKind::Other,
    }
}

static WHERE_CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bWHERE\b").unwrap());
static GROUP_BY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bGROUP\s+BY\b").unwrap());
static ORDER_BY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").unwrap());
static JOIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bJOIN\b").unwrap());
static ROW_LIMIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(TOP\s+\d+|LIMIT\s+\d+|FETCH\s+FIRST)").unwrap());

/// Whether the statement has a WHERE clause anywhere.
pub fn has_where(sql: &str) -> bool {
    WHERE_CLAUSE.is_match(sql)
}

/// Whether the statement has a GROUP BY clause.
pub fn has_group_by(sql: &str) -> bool {
    GROUP_BY.is_match(sql)
}

/// Whether the statement has an ORDER BY clause.
pub fn has_order_by(sql: &str) -> bool {
    ORDER_BY.is_match(sql)
}

/// Whether the statement carries any row-limiting clause
/// (`TOP`, `LIMIT`, `FETCH FIRST`).
pub fn has_row_limit(sql: &str) -> bool {
    ROW_LIMIT.is_match(sql)
}

/// Number of JOIN keywords in the statement.
pub fn join_count(sql: &str) -> usize {
    JOIN.find_iter(sql).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_kind() {
        assert_eq!(statement_kind("SELECT * FROM t"), StatementKind::Select);
        assert_eq!(statement_kind("  update t set x = 1"), StatementKind::Update);
        assert_eq!(statement_kind("DELETE FROM t"), StatementKind::Delete);
        assert_eq!(statement_kind("INSERT INTO t VALUES (1)"), StatementKind::Insert);
        assert_eq!(statement_kind("WITH cte AS (SELECT 1) SELECT 1"), StatementKind::Other);
    }

    #[test]
    fn test_row_limit_detection() {
        assert!(has_row_limit("SELECT TOP 10 * FROM t"));
        assert!(has_row_limit("SELECT * FROM t LIMIT 5"));
        assert!(has_row_limit("SELECT * FROM t FETCH FIRST 5 ROWS ONLY"));
        assert!(!has_row_limit("SELECT * FROM t"));
    }

    #[test]
    fn test_join_count() {
        let sql = "SELECT * FROM a JOIN b ON a.id = b.id LEFT JOIN c ON b.id = c.id";
        assert_eq!(join_count(sql), 2);
    }
}
