//! Process-wide pattern catalogs.
//!
//! Compiled once at first use and never mutated, so they are safe to share
//! across concurrent requests without synchronization. Each entry pairs a
//! compiled regex with a stable description used in validation issues; a
//! match is a named finding, not an anonymous string hit.

use once_cell::sync::Lazy;
use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern)
        .unwrap_or_else(|e| panic!("internal error: invalid catalog pattern '{}': {}", pattern, e))
}

/// Injection pattern catalog. Any single match marks the text as unsafe.
pub static INJECTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (compile(r"(?i)'\s*(--|/\*)"), "comment injection after quote"),
        (compile(r"--"), "line comment marker"),
        (compile(r"/\*|\*/"), "block comment marker"),
        (compile(r"(?i)\bUNION(\s+ALL)?\s+SELECT\b"), "UNION SELECT injection"),
        (compile(r"(?i)\bOR\s+\d+\s*=\s*\d+"), "OR tautology"),
        (compile(r"(?i)\bDROP\s+TABLE\b"), "DROP TABLE"),
        (compile(r"(?i)\bDELETE\s+FROM\b"), "DELETE FROM"),
        (compile(r"(?i)\bINSERT\s+INTO\b"), "INSERT INTO"),
        (compile(r"(?i)\b(EXEC|EXECUTE)\s*\("), "EXEC call"),
        (compile(r"(?i)\bxp_cmdshell\b"), "xp_cmdshell"),
        (compile(r"(?i)\bsp_execute\w*"), "sp_execute"),
        (
            compile(r"(?i);\s*(SELECT|UPDATE|INSERT|DELETE)\b"),
            "statement chaining",
        ),
    ]
});

/// Keywords that are never allowed through the fail-closed path.
///
/// Matched whole-word, case-insensitive. The second element is the keyword
/// name reported to the caller.
pub static DISALLOWED_KEYWORDS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (compile(r"(?i)\bDROP\b"), "DROP"),
        (compile(r"(?i)\bTRUNCATE\b"), "TRUNCATE"),
        (compile(r"(?i)\bALTER\b"), "ALTER"),
        (compile(r"(?i)\bCREATE\b"), "CREATE"),
        (compile(r"(?i)\bMODIFY\b"), "MODIFY"),
        (compile(r"(?i)\bRENAME\b"), "RENAME"),
        (compile(r"(?i)\bEXEC\b"), "EXEC"),
        (compile(r"(?i)\bEXECUTE\b"), "EXECUTE"),
        (compile(r"(?i)\bxp_\w+"), "xp_"),
        (compile(r"(?i)\bsp_\w+"), "sp_"),
        (compile(r"(?i)\bOPENQUERY\b"), "OPENQUERY"),
        (compile(r"(?i)\bOPENROWSET\b"), "OPENROWSET"),
        (compile(r"(?i)\bBULK\s+INSERT\b"), "BULK INSERT"),
        (compile(r"(?i)\bRECONFIGURE\b"), "RECONFIGURE"),
        (compile(r"(?i)\bSHUTDOWN\b"), "SHUTDOWN"),
    ]
});

/// `-- line comments` up to end of line.
pub static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| compile(r"--[^\r\n]*"));

/// `/* block comments */`, including multi-line ones.
pub static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| compile(r"(?s)/\*.*?\*/"));

/// Runs of semicolons collapsed by the best-effort cleanup.
pub static REPEATED_SEMICOLONS: Lazy<Regex> = Lazy::new(|| compile(r";\s*;+"));

/// A bare numeric literal candidate; adjacency checks happen at the call site.
pub static NUMERIC_LITERAL: Lazy<Regex> = Lazy::new(|| compile(r"\d+(?:\.\d+)?"));
