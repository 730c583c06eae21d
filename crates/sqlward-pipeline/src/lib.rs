//! # sqlward-pipeline
//!
//! Fail-closed orchestration of the Sqlward stages: validate →
//! parameterize → tenant-scope → parameter-validate → optimize →
//! re-validate. Each stage's output is the next stage's input; nothing is
//! handed to the execution collaborator until the final text has been
//! re-validated as Critical-free.
//!
//! Every operation is a pure transformation over immutable inputs, so a
//! single [`SqlPipeline`] can serve concurrent requests without locking;
//! the only shared state is read-only configuration loaded at startup.
//! The execution engine and the diagnostics sink are collaborator seams
//! ([`SqlExecutor`], [`DiagnosticsSink`]); this crate never executes SQL
//! itself.

pub mod collaborators;
pub mod error;
pub mod orchestrator;

pub use collaborators::{
    DiagnosticsSink, ExecutionOutcome, PipelineEvent, SqlExecutor, TracingDiagnosticsSink,
};
pub use error::PipelineError;
pub use orchestrator::{PipelineRequest, PreparedSql, RESERVED_TENANT_PARAMETER, SqlPipeline};
