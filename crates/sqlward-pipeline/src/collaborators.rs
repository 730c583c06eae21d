//! Collaborator seams: the execution engine and the diagnostics sink.

use async_trait::async_trait;

use sqlward_core::{ParamMap, ValidationIssue};
use sqlward_optimize::{CostEstimate, OptimizationSuggestion};

/// Outcome reported by the execution collaborator.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// Rows affected (mutations) or returned (queries).
    pub affected_count: u64,
    /// Result payload, engine-defined.
    pub rows: serde_json::Value,
}

/// The execution engine boundary. The pipeline hands over a validated,
/// scoped, optimized statement with its parameter map; it never runs SQL
/// itself.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str, parameters: &ParamMap) -> anyhow::Result<ExecutionOutcome>;
}

/// One pipeline decision, for audit and monitoring.
#[derive(Debug, Clone)]
pub struct PipelineEvent {
    /// Which stage produced the event: `prepared`, `executed`, `rejected`.
    pub stage: &'static str,
    /// The statement text at that stage.
    pub sql: String,
    /// Issues accumulated so far.
    pub issues: Vec<ValidationIssue>,
    /// Optimization findings, when the optimizer has run.
    pub suggestions: Vec<OptimizationSuggestion>,
    /// Cost estimate, when computed.
    pub cost: Option<CostEstimate>,
    /// Complexity score, when computed.
    pub complexity: Option<u8>,
    /// Whether the statement was allowed to proceed.
    pub allowed: bool,
}

/// Trait boundary for the diagnostics collaborator. The pipeline produces
/// events; persistence and rotation are someone else's job.
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, event: PipelineEvent);
}

/// Default sink that emits pipeline events as tracing records.
pub struct TracingDiagnosticsSink;

impl DiagnosticsSink for TracingDiagnosticsSink {
    fn record(&self, event: PipelineEvent) {
        tracing::info!(
            stage = event.stage,
            allowed = event.allowed,
            issues = event.issues.len(),
            suggestions = event.suggestions.len(),
            complexity = event.complexity,
            "pipeline event"
        );
    }
}
