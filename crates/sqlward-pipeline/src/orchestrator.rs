//! The pipeline orchestrator.

use sqlward_core::{
    ParamMap, ParameterBinding, SqlTemplate, TenantColumnMap, TenantContext, ValidationIssue,
    ValidationSettings,
};
use sqlward_guard::sanitizer::{self, Parameterized};
use sqlward_guard::SqlValidator;
use sqlward_optimize::{CostEstimate, OptimizationSuggestion, QueryOptimizer};
use sqlward_rules::ParameterValidator;
use sqlward_scope::TenantScoper;

use crate::collaborators::{DiagnosticsSink, ExecutionOutcome, PipelineEvent, SqlExecutor};
use crate::error::PipelineError;

/// The binding name reserved for the tenant identity. Caller-supplied
/// bindings must never be able to set it.
pub const RESERVED_TENANT_PARAMETER: &str = "tenant_id";

/// One pipeline invocation: candidate SQL, its bindings, the template the
/// SQL came from (when known), and the tenant context it runs under.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    /// The candidate statement from the upstream translation step.
    pub sql: String,
    /// Extracted parameter bindings.
    pub bindings: Vec<ParameterBinding>,
    /// The source template, when the statement came from one.
    pub template: Option<SqlTemplate>,
    /// The resolved tenant identity.
    pub tenant: TenantContext,
}

/// The validated, scoped, optimized statement handed to the execution
/// collaborator.
#[derive(Debug, Clone)]
pub struct PreparedSql {
    /// Final statement text.
    pub sql: String,
    /// Complete parameter map: caller bindings plus lifted literals.
    pub parameters: ParamMap,
    /// Every non-blocking issue accumulated across the stages.
    pub issues: Vec<ValidationIssue>,
    /// Optimization findings for the final statement.
    pub suggestions: Vec<OptimizationSuggestion>,
    /// Heuristic cost estimate of the final statement.
    pub cost: CostEstimate,
    /// Complexity score in [1, 10].
    pub complexity: u8,
    /// Mapped tables that received a tenant predicate.
    pub tables_scoped: Vec<String>,
}

/// Sequences the Sqlward stages, fail-closed at each one.
pub struct SqlPipeline {
    validator: SqlValidator,
    parameters: ParameterValidator,
    scoper: TenantScoper,
    optimizer: QueryOptimizer,
    reserved_parameter: String,
}

impl SqlPipeline {
    /// Build a pipeline over the process-wide configuration.
    pub fn new(map: TenantColumnMap, settings: &ValidationSettings) -> Self {
        Self {
            validator: SqlValidator::new(),
            parameters: ParameterValidator::new(settings),
            scoper: TenantScoper::new(map),
            optimizer: QueryOptimizer::new(),
            reserved_parameter: RESERVED_TENANT_PARAMETER.to_string(),
        }
    }

    /// Override the reserved tenant binding name.
    pub fn with_reserved_parameter(mut self, name: impl Into<String>) -> Self {
        self.reserved_parameter = name.into();
        self
    }

    /// The parameter rule engine, for on-demand rule invocation.
    pub fn parameter_rules(&self) -> &ParameterValidator {
        &self.parameters
    }

    /// The tenant scoper this pipeline enforces.
    pub fn scoper(&self) -> &TenantScoper {
        &self.scoper
    }

    /// Run the full pipeline over one request.
    ///
    /// Stage order is strict and sequential; every rejection carries the
    /// complete issue list. On an optimizer rewrite that fails
    /// re-validation, the already-validated pre-optimization statement is
    /// returned instead — never an unvalidated rewrite.
    pub fn prepare(&self, request: &PipelineRequest) -> Result<PreparedSql, PipelineError> {
        // The reserved tenant binding is system-owned; reject collisions
        // before the scoper ever runs.
        if let Some(binding) = request
            .bindings
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(&self.reserved_parameter))
        {
            return Err(PipelineError::ReservedParameter {
                name: binding.name.clone(),
            });
        }

        let bound: ParamMap = request
            .bindings
            .iter()
            .map(|b| (b.name.clone(), b.value.clone()))
            .collect();

        // Security gate first; performance findings ride along as warnings.
        let initial = self.validator.validate(&request.sql, &bound);
        if !initial.is_valid {
            return Err(PipelineError::Rejected(initial));
        }
        let mut issues = initial.issues;

        // Lift embedded literals into parameters (fail-closed path).
        let Parameterized { sql, parameters } = sanitizer::parameterize_sql(&request.sql, &bound)?;

        // Tenant scoping, then the independent isolation check and a
        // security re-validation of the rewritten text.
        let scoping = self.scoper.apply_tenant_scoping(&sql, &request.tenant)?;
        if !scoping.tables_scoped.is_empty()
            && !self
                .scoper
                .validate_tenant_isolation(&scoping.scoped_sql, &request.tenant)
        {
            return Err(PipelineError::IsolationNotVerified);
        }
        let scoped_check = self
            .validator
            .validate_security(&scoping.scoped_sql, &parameters);
        if !scoped_check.is_valid {
            return Err(PipelineError::Rejected(scoped_check));
        }

        // Parameter validation against the template's specs.
        let specs = request
            .template
            .as_ref()
            .map(|t| t.parameters.as_slice())
            .unwrap_or(&[]);
        let param_result = self.parameters.validate_all(&request.bindings, specs);
        if !param_result.is_valid {
            return Err(PipelineError::Rejected(param_result));
        }
        issues.extend(param_result.issues);

        // Optimize last, and re-validate the rewrite before trusting it.
        let analysis = self.optimizer.analyze_sql(&scoping.scoped_sql, &parameters);
        let optimized_check = self
            .validator
            .validate_security(&analysis.optimized_sql, &parameters);
        let (final_sql, suggestions) = if optimized_check.is_valid {
            (analysis.optimized_sql, analysis.suggestions)
        } else {
            tracing::warn!(
                "optimized statement failed re-validation; reverting to pre-optimization SQL"
            );
            (scoping.scoped_sql.clone(), Vec::new())
        };

        let cost = self.optimizer.estimate_query_cost(&final_sql, &parameters);
        let complexity = self.optimizer.query_complexity(&final_sql, &parameters);

        tracing::debug!(
            tables = ?scoping.tables_scoped,
            complexity,
            issues = issues.len(),
            "statement prepared"
        );

        Ok(PreparedSql {
            sql: final_sql,
            parameters,
            issues,
            suggestions,
            cost,
            complexity,
            tables_scoped: scoping.tables_scoped,
        })
    }

    /// Prepare a request, record the decision, and hand the statement to
    /// the execution collaborator.
    pub async fn execute_and_record(
        &self,
        request: &PipelineRequest,
        executor: &dyn SqlExecutor,
        sink: &dyn DiagnosticsSink,
    ) -> Result<ExecutionOutcome, PipelineError> {
        let prepared = match self.prepare(request) {
            Ok(prepared) => prepared,
            Err(error) => {
                let issues = match &error {
                    PipelineError::Rejected(result) => result.issues.clone(),
                    _ => Vec::new(),
                };
                sink.record(PipelineEvent {
                    stage: "rejected",
                    sql: request.sql.clone(),
                    issues,
                    suggestions: Vec::new(),
                    cost: None,
                    complexity: None,
                    allowed: false,
                });
                return Err(error);
            }
        };

        sink.record(PipelineEvent {
            stage: "prepared",
            sql: prepared.sql.clone(),
            issues: prepared.issues.clone(),
            suggestions: prepared.suggestions.clone(),
            cost: Some(prepared.cost.clone()),
            complexity: Some(prepared.complexity),
            allowed: true,
        });

        let outcome = executor
            .execute(&prepared.sql, &prepared.parameters)
            .await
            .map_err(PipelineError::Internal)?;

        sink.record(PipelineEvent {
            stage: "executed",
            sql: prepared.sql,
            issues: prepared.issues,
            suggestions: prepared.suggestions,
            cost: Some(prepared.cost),
            complexity: Some(prepared.complexity),
            allowed: true,
        });

        Ok(outcome)
    }
}
