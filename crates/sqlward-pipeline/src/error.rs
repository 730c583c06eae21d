//! Error types for the pipeline crate.

use thiserror::Error;

use sqlward_core::ValidationResult;
use sqlward_guard::GuardError;
use sqlward_scope::ScopeError;

/// Errors that stop a pipeline run.
///
/// Validation rejections carry the full result — every issue, not just the
/// first — so a single round-trip surfaces everything wrong with a
/// candidate statement.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A caller-supplied binding collides with the reserved tenant binding.
    #[error("parameter '{name}' collides with the reserved tenant binding")]
    ReservedParameter { name: String },

    /// Validation found at least one Critical issue.
    #[error("statement rejected with {} validation issue(s)", .0.issues.len())]
    Rejected(ValidationResult),

    /// The scoped statement failed the independent isolation check.
    #[error("tenant isolation could not be verified after scoping")]
    IsolationNotVerified,

    /// Scoping failed.
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// The fail-closed sanitization path rejected the statement.
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
