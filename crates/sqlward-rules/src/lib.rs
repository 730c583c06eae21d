//! # sqlward-rules
//!
//! Parameter validation for Sqlward: a pluggable set of named rules
//! evaluated against parameter bindings and their template specs,
//! independent of any SQL text.
//!
//! Rules are registered at startup into an immutable-after-init table —
//! a dispatch table of pure function values, not reflection. Each rule is
//! a named, independently testable check; a rule that fails internally is
//! converted into a Warning-severity `Rule.ExecutionError` issue and never
//! aborts the rest of the pass.

pub mod catalog;
pub mod engine;
pub mod error;

pub use catalog::names;
pub use engine::{ParameterValidator, RuleDefinition, RuleHandler};
pub use error::RuleFailure;
