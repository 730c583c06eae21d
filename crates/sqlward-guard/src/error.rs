//! Error types for the guard crate.

use thiserror::Error;

/// Errors raised by the fail-closed sanitization path.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The statement contains a keyword that is never allowed through.
    #[error("statement contains disallowed keyword {keyword}")]
    DisallowedKeyword { keyword: String },

    /// A string literal opened but never closed.
    #[error("unterminated string literal at byte {position}")]
    UnterminatedLiteral { position: usize },
}
