//! # sqlward-optimize
//!
//! Safe mechanical query rewrites, heuristic cost estimation, and
//! complexity scoring for Sqlward.
//!
//! The optimizer never risks returning an unvalidated statement: analysis
//! runs the security catalog first and returns invalid SQL unmodified, and
//! the pipeline re-validates every rewrite before handing it on. Cost
//! estimation is heuristic, not plan-based; it exists to rank and gate
//! statements, not to predict engine behavior.

pub mod cost;
pub mod error;
pub mod optimizer;
pub mod suggestion;

pub use cost::{CostEstimate, CostLevel};
pub use error::OptimizeError;
pub use optimizer::{QueryAnalysis, QueryOptimizer};
pub use suggestion::{OptimizationImpact, OptimizationSuggestion};
