//! Error types for the scoping crate.

use thiserror::Error;

/// Errors that can occur during tenant scoping.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// A mapped table was referenced without a usable tenant identity.
    #[error("table {table} requires tenant isolation but the context carries no tenant")]
    MissingTenant { table: String },

    /// The rewritten statement failed the independent isolation check.
    #[error("tenant isolation could not be verified for table {table}")]
    IsolationNotVerified { table: String },
}
