//! # sqlward-guard
//!
//! Injection detection, sanitization, and statement validation for Sqlward.
//!
//! This crate provides functionality to:
//! - Detect injection patterns in SQL text and parameter values
//! - Sanitize identifiers and (best-effort) clean up statements
//! - Convert embedded literals into named parameters
//! - Validate statements against security and performance catalogs
//!
//! ## How It Works
//!
//! Detection is deliberately pattern-based, not a SQL grammar: every check
//! is a named, independently testable regex in a process-wide catalog, so
//! coverage gaps are visible and addable. The catalogs sit behind the
//! [`sanitizer`] and [`validator`] interfaces so an AST-based analyzer could
//! replace them later without changing callers.
//!
//! **Before (from the translation step):**
//! ```sql
//! SELECT * FROM Users WHERE name = 'alice'; DROP TABLE Users;--
//! ```
//!
//! **After validation:**
//! Critical issues for the injection pattern, the statement chaining, and
//! the DROP keyword — the statement never reaches an execution engine.
//!
//! ## Two Sanitization Philosophies
//!
//! | Path | Behavior |
//! |------|----------|
//! | [`sanitizer::parameterize_sql`] | Fail-closed: rejects on any disallowed keyword |
//! | [`sanitizer::sanitize_query`]   | Best-effort: strips and degrades, never rejects |
//!
//! The divergence is intentional; callers choose a mode. Only the
//! fail-closed path may gate execution.

pub mod error;
pub mod patterns;
pub mod sanitizer;
pub mod statement;
pub mod validator;

pub use error::GuardError;
pub use sanitizer::Parameterized;
pub use statement::{StatementKind, statement_kind};
pub use validator::SqlValidator;
