//! Shared data model for the Sqlward safety pipeline.
//!
//! Every stage of the pipeline exchanges the types defined here:
//! candidate statements, parameter bindings, validation issues, and the
//! tenant context a request runs under. All of them are created fresh per
//! pipeline invocation; the only process-wide state is the configuration
//! under [`config`], which is loaded once at startup and read-only
//! afterwards.

pub mod config;
pub mod issue;
pub mod param;
pub mod tenant;

pub use config::{ConfigError, TenantColumnMap, ValidationSettings};
pub use issue::{Severity, ValidationIssue, ValidationResult};
pub use param::{
    DeclaredType, ParamMap, ParamValue, ParameterBinding, SqlTemplate, TemplateParameterSpec,
};
pub use tenant::TenantContext;
