//! Injection detection and the two sanitization paths.
//!
//! [`parameterize_sql`] is the fail-closed path: a disallowed keyword
//! rejects the statement outright. [`sanitize_query`] is the best-effort
//! path: it strips what it recognizes and keeps going. The two philosophies
//! are intentionally different and must not be unified — only the
//! fail-closed path may stand between a statement and execution.

use sqlward_core::{ParamMap, ParamValue};

use crate::error::GuardError;
use crate::patterns::{
    BLOCK_COMMENT, DISALLOWED_KEYWORDS, INJECTION_PATTERNS, LINE_COMMENT, NUMERIC_LITERAL,
    REPEATED_SEMICOLONS,
};

/// Whether the text matches any pattern in the injection catalog.
pub fn contains_injection_patterns(text: &str) -> bool {
    INJECTION_PATTERNS.iter().any(|(re, _)| re.is_match(text))
}

/// Descriptions of every injection pattern the text matches.
pub fn injection_matches(text: &str) -> Vec<&'static str> {
    INJECTION_PATTERNS
        .iter()
        .filter(|(re, _)| re.is_match(text))
        .map(|(_, desc)| *desc)
        .collect()
}

/// The first disallowed keyword present in the statement, if any.
pub fn find_disallowed_keyword(sql: &str) -> Option<&'static str> {
    DISALLOWED_KEYWORDS
        .iter()
        .find(|(re, _)| re.is_match(sql))
        .map(|(_, name)| *name)
}

/// Reduce arbitrary text to a safe SQL identifier.
///
/// Strips every non-word character; prefixes `i` when the result does not
/// start with a letter; an empty result becomes the literal `identifier`.
pub fn sanitize_identifier(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if stripped.is_empty() {
        return "identifier".to_string();
    }
    if !stripped.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return format!("i{}", stripped);
    }
    stripped
}

/// Best-effort cleanup: strip comments, collapse repeated semicolons, and
/// blank out disallowed keywords.
///
/// This path degrades rather than rejects. It is NOT a security gate; use
/// [`parameterize_sql`] (or the validator) wherever a verdict is needed.
pub fn sanitize_query(sql: &str) -> String {
    let without_line = LINE_COMMENT.replace_all(sql, "");
    let without_block = BLOCK_COMMENT.replace_all(&without_line, "");
    let mut cleaned = REPEATED_SEMICOLONS
        .replace_all(&without_block, ";")
        .into_owned();

    for (re, keyword) in DISALLOWED_KEYWORDS.iter() {
        if re.is_match(&cleaned) {
            tracing::debug!(keyword = *keyword, "stripping disallowed keyword from statement");
            cleaned = re.replace_all(&cleaned, "[REMOVED]").into_owned();
        }
    }
    cleaned
}

/// A statement with its literals lifted into named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameterized {
    /// The rewritten statement.
    pub sql: String,
    /// All parameters: the caller's existing ones plus the fresh `@p<N>`s.
    pub parameters: ParamMap,
}

/// Replace embedded literals with fresh named parameters.
///
/// Fail-closed: any disallowed keyword rejects the statement with an error
/// naming the keyword — this path never strips and proceeds. String
/// literals go first (doubled `''` unescapes to a single quote), then bare
/// numeric literals not adjacent to `@`, `.`, or identifier characters.
/// Fresh names are `@p<N>` where N is the parameter-map size at the time of
/// each replacement.
pub fn parameterize_sql(sql: &str, existing: &ParamMap) -> Result<Parameterized, GuardError> {
    if let Some(keyword) = find_disallowed_keyword(sql) {
        return Err(GuardError::DisallowedKeyword {
            keyword: keyword.to_string(),
        });
    }

    let mut parameters = existing.clone();
    let lifted = lift_string_literals(sql, &mut parameters)?;
    let lifted = lift_numeric_literals(&lifted, &mut parameters);

    Ok(Parameterized {
        sql: lifted,
        parameters,
    })
}

fn lift_string_literals(sql: &str, parameters: &mut ParamMap) -> Result<String, GuardError> {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;

    while let Some(start) = rest.find('\'') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let Some((content, consumed)) = take_string_literal(after) else {
            return Err(GuardError::UnterminatedLiteral {
                position: sql.len() - rest.len() + start,
            });
        };

        let name = format!("p{}", parameters.len());
        out.push('@');
        out.push_str(&name);
        parameters.insert(name, ParamValue::String(content));
        rest = &after[consumed..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Scan a literal body starting just past the opening quote. Returns the
/// unescaped content and the bytes consumed including the closing quote,
/// or `None` when the literal never closes.
fn take_string_literal(s: &str) -> Option<(String, usize)> {
    let mut content = String::new();
    let mut iter = s.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if c == '\'' {
            if let Some(&(_, '\'')) = iter.peek() {
                content.push('\'');
                iter.next();
            } else {
                return Some((content, i + 1));
            }
        } else {
            content.push(c);
        }
    }
    None
}

fn lift_numeric_literals(sql: &str, parameters: &mut ParamMap) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;

    for m in NUMERIC_LITERAL.find_iter(sql) {
        let prev = sql[..m.start()].chars().next_back();
        let next = sql[m.end()..].chars().next();
        let prev_blocks = prev.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '@' || c == '.');
        let next_blocks = next.is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.');
        if prev_blocks || next_blocks {
            continue;
        }

        out.push_str(&sql[last..m.start()]);
        let name = format!("p{}", parameters.len());
        out.push('@');
        out.push_str(&name);
        parameters.insert(name, numeric_value(m.as_str()));
        last = m.end();
    }

    out.push_str(&sql[last..]);
    out
}

/// Int-vs-decimal typing is decided by the presence of a decimal point.
fn numeric_value(text: &str) -> ParamValue {
    if text.contains('.') {
        return ParamValue::Decimal(text.parse::<f64>().unwrap_or(f64::MAX));
    }
    match text.parse::<i64>() {
        Ok(v) => match i32::try_from(v) {
            Ok(v) => ParamValue::Int(v),
            Err(_) => ParamValue::Long(v),
        },
        // Digits beyond i64 range; keep the magnitude as a double.
        Err(_) => ParamValue::Double(text.parse::<f64>().unwrap_or(f64::MAX)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_injection_catalog_positives() {
        let attacks = [
            "SELECT * FROM Users WHERE name = 'a' OR 1=1",
            "SELECT * FROM Users; DROP TABLE Users",
            "SELECT * FROM Users UNION ALL SELECT login, pass FROM Admins",
            "name'; DELETE FROM Orders;--",
            "EXEC(@cmd)",
            "xp_cmdshell 'dir'",
            "1; SELECT * FROM secrets",
            "/* sneak */ SELECT 1",
        ];
        for attack in attacks {
            assert!(
                contains_injection_patterns(attack),
                "expected injection match for {attack:?}"
            );
        }
    }

    #[test]
    fn test_injection_catalog_negatives() {
        let clean = [
            "SELECT Id, Name FROM Users WHERE Id = @id",
            "UPDATE Users SET Name = @name WHERE Id = @id",
            "SELECT COUNT(1) FROM Orders WHERE Status = @status",
        ];
        for sql in clean {
            assert!(
                !contains_injection_patterns(sql),
                "false positive for {sql:?}"
            );
        }
    }

    #[test]
    fn test_injection_matches_are_named() {
        let matches = injection_matches("SELECT 1; DROP TABLE Users;--");
        assert!(matches.contains(&"DROP TABLE"));
        assert!(matches.contains(&"line comment marker"));
        assert!(matches.contains(&"statement chaining"));
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("user_name"), "user_name");
        assert_eq!(sanitize_identifier("user-name!"), "username");
        assert_eq!(sanitize_identifier("1st_col"), "i1st_col");
        assert_eq!(sanitize_identifier("_hidden"), "i_hidden");
        assert_eq!(sanitize_identifier("!!!"), "identifier");
        assert_eq!(sanitize_identifier(""), "identifier");
    }

    #[test]
    fn test_sanitize_query_strips_comments_and_keywords() {
        let cleaned = sanitize_query("SELECT 1 -- trailing\n;; DROP x /* note */");
        assert!(!cleaned.contains("--"));
        assert!(!cleaned.contains("/*"));
        assert!(!cleaned.contains(";;"));
        assert!(cleaned.contains("[REMOVED]"));
        assert!(!cleaned.to_uppercase().contains("DROP"));
    }

    #[test]
    fn test_sanitize_query_never_rejects() {
        // The degrade path keeps going where the fail-closed path errors.
        let hostile = "SHUTDOWN; TRUNCATE t";
        let cleaned = sanitize_query(hostile);
        assert!(cleaned.contains("[REMOVED]"));
        assert!(parameterize_sql(hostile, &ParamMap::new()).is_err());
    }

    #[test]
    fn test_parameterize_string_literals() {
        let result =
            parameterize_sql("SELECT * FROM Users WHERE name = 'alice'", &ParamMap::new()).unwrap();
        assert_eq!(result.sql, "SELECT * FROM Users WHERE name = @p0");
        assert_eq!(
            result.parameters.get("p0"),
            Some(&ParamValue::String("alice".to_string()))
        );
    }

    #[test]
    fn test_parameterize_unescapes_doubled_quotes() {
        let result =
            parameterize_sql("SELECT * FROM t WHERE note = 'it''s fine'", &ParamMap::new())
                .unwrap();
        assert_eq!(
            result.parameters.get("p0"),
            Some(&ParamValue::String("it's fine".to_string()))
        );
    }

    #[test]
    fn test_parameterize_numeric_literals() {
        let result = parameterize_sql(
            "SELECT * FROM Orders WHERE total > 100 AND rate = 2.5",
            &ParamMap::new(),
        )
        .unwrap();
        assert_eq!(
            result.sql,
            "SELECT * FROM Orders WHERE total > @p0 AND rate = @p1"
        );
        assert_eq!(result.parameters.get("p0"), Some(&ParamValue::Int(100)));
        assert_eq!(result.parameters.get("p1"), Some(&ParamValue::Decimal(2.5)));
    }

    #[test]
    fn test_parameterize_skips_identifier_adjacent_digits() {
        let result =
            parameterize_sql("SELECT col1 FROM table2 WHERE x = @p0", &ParamMap::new()).unwrap();
        assert_eq!(result.sql, "SELECT col1 FROM table2 WHERE x = @p0");
        assert!(result.parameters.is_empty());
    }

    #[test]
    fn test_parameterize_numbers_continue_from_existing_map() {
        let mut existing = ParamMap::new();
        existing.insert("p0".to_string(), ParamValue::Int(1));
        let result = parameterize_sql("SELECT * FROM t WHERE a = 'x' AND b = 7", &existing).unwrap();
        assert_eq!(result.sql, "SELECT * FROM t WHERE a = @p1 AND b = @p2");
        assert_eq!(result.parameters.len(), 3);
    }

    #[test]
    fn test_parameterize_fails_closed_on_keyword() {
        let err = parameterize_sql("SELECT 1; SHUTDOWN", &ParamMap::new()).unwrap_err();
        match err {
            GuardError::DisallowedKeyword { keyword } => assert_eq!(keyword, "SHUTDOWN"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parameterize_unterminated_literal() {
        let err = parameterize_sql("SELECT * FROM t WHERE a = 'oops", &ParamMap::new()).unwrap_err();
        assert!(matches!(err, GuardError::UnterminatedLiteral { .. }));
    }

    #[test]
    fn test_long_literal_kind() {
        let result = parameterize_sql("SELECT * FROM t WHERE id = 5000000000", &ParamMap::new())
            .unwrap();
        assert_eq!(
            result.parameters.get("p0"),
            Some(&ParamValue::Long(5_000_000_000))
        );
    }
}
