//! Error types for the rules crate.

use thiserror::Error;

/// A rule handler failed internally.
///
/// This is the "handler threw" case: the failure is isolated to the
/// offending rule and surfaced as a Warning-severity `Rule.ExecutionError`
/// issue, never as a process-level fault.
#[derive(Debug, Error)]
pub enum RuleFailure {
    /// A caller-supplied pattern did not compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Any other internal failure.
    #[error("{0}")]
    Internal(String),
}
