//! Error types for the optimizer crate.

use thiserror::Error;

/// Errors raised by optimizer operations.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Pagination arguments must be positive.
    #[error("{argument} must be positive, got {value}")]
    InvalidPage { argument: &'static str, value: i64 },
}
