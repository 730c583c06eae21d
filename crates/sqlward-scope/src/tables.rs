//! Textual table-reference extraction.
//!
//! A scan for the keywords that introduce table names, not a parser.
//! Subqueries, CTEs, and derived tables are out of reach by design; the
//! pipeline's validator rejects the statement shapes this scan cannot
//! follow before scoping ever runs.

use once_cell::sync::Lazy;
use regex::Regex;

/// A table referenced by a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReference {
    /// The table name as written (schema prefix preserved).
    pub name: String,
    /// Trailing alias, if one was written.
    pub alias: Option<String>,
}

impl TableReference {
    /// The name predicates should qualify columns with.
    pub fn alias_or_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// The bare table name with any schema prefix stripped.
    pub fn bare_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

static TABLE_INTRODUCER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:DELETE\s+FROM|INSERT\s+INTO|FROM|JOIN|UPDATE)\s+([A-Za-z_][\w.]*)(?:\s+(?:AS\s+)?([A-Za-z_]\w*))?",
    )
    .unwrap()
});

/// Words that can follow a table name but are never an alias.
const ALIAS_STOP_WORDS: &[&str] = &[
    "WHERE", "SET", "ON", "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "CROSS", "OUTER", "ORDER",
    "GROUP", "HAVING", "LIMIT", "OFFSET", "UNION", "VALUES", "FETCH", "AND", "OR",
];

/// Extract table references following FROM, JOIN, UPDATE, INSERT INTO, and
/// DELETE FROM, deduplicated case-insensitively (first occurrence wins).
pub fn extract_tables(sql: &str) -> Vec<TableReference> {
    let mut tables: Vec<TableReference> = Vec::new();

    for caps in TABLE_INTRODUCER.captures_iter(sql) {
        let Some(name) = caps.get(1).map(|m| m.as_str().to_string()) else {
            continue;
        };

        let alias = caps
            .get(2)
            .map(|m| m.as_str())
            .filter(|a| !ALIAS_STOP_WORDS.contains(&a.to_ascii_uppercase().as_str()))
            .map(str::to_string);

        let seen = tables
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(&name));
        if !seen {
            tables.push(TableReference { name, alias });
        }
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_select() {
        let tables = extract_tables("SELECT * FROM Users");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "Users");
        assert_eq!(tables[0].alias, None);
    }

    #[test]
    fn test_aliases() {
        let tables = extract_tables("SELECT * FROM Orders o JOIN Users AS u ON o.UserId = u.Id");
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].alias.as_deref(), Some("o"));
        assert_eq!(tables[1].alias.as_deref(), Some("u"));
    }

    #[test]
    fn test_keyword_is_not_an_alias() {
        let tables = extract_tables("SELECT * FROM Users WHERE Id = @id");
        assert_eq!(tables[0].alias, None);

        let tables = extract_tables("UPDATE Users SET Name = @n");
        assert_eq!(tables[0].alias, None);
    }

    #[test]
    fn test_delete_and_insert_forms() {
        let tables = extract_tables("DELETE FROM Sessions WHERE Expired = 1");
        assert_eq!(tables[0].name, "Sessions");

        let tables = extract_tables("INSERT INTO AuditLog (Msg) VALUES (@m)");
        assert_eq!(tables[0].name, "AuditLog");
    }

    #[test]
    fn test_dedup_is_case_insensitive() {
        let tables = extract_tables("SELECT * FROM Users u JOIN USERS ON 1 = 1");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].alias.as_deref(), Some("u"));
    }

    #[test]
    fn test_schema_prefix() {
        let tables = extract_tables("SELECT * FROM dbo.Orders");
        assert_eq!(tables[0].name, "dbo.Orders");
        assert_eq!(tables[0].bare_name(), "Orders");
    }
}
