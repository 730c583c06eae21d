//! Heuristic cost estimation.
//!
//! Not a planner: row counts come from fixed multipliers over statement
//! shape, and time/memory/IO are linear in the row estimate. The numbers
//! exist to bucket statements into [`CostLevel`]s for gating and audit,
//! nothing more.

use sqlward_guard::{StatementKind, statement, statement_kind};

/// Cost bucket, derived from the estimated execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CostLevel {
    Negligible,
    Low,
    Medium,
    High,
    VeryHigh,
    Extreme,
}

impl CostLevel {
    /// Bucket an estimated execution time in milliseconds.
    pub fn from_execution_time(ms: f64) -> Self {
        if ms < 10.0 {
            CostLevel::Negligible
        } else if ms < 100.0 {
            CostLevel::Low
        } else if ms < 500.0 {
            CostLevel::Medium
        } else if ms < 2000.0 {
            CostLevel::High
        } else if ms < 10000.0 {
            CostLevel::VeryHigh
        } else {
            CostLevel::Extreme
        }
    }
}

/// Heuristic prediction of a statement's execution cost.
#[derive(Debug, Clone, PartialEq)]
pub struct CostEstimate {
    /// Estimated rows touched.
    pub estimated_rows: u64,
    /// Estimated execution time in milliseconds.
    pub execution_time_ms: f64,
    /// Estimated working memory in kilobytes.
    pub memory_kb: u64,
    /// Estimated IO operations.
    pub io_operations: u64,
    /// Cost bucket for gating and audit.
    pub level: CostLevel,
}

/// Estimate the cost of a statement.
///
/// SELECT starts at 100 rows, ×10 without WHERE, ×2 per join, ÷5 with
/// GROUP BY. UPDATE/DELETE/INSERT use fixed constants. Time and memory are
/// linear functions of the row estimate.
pub fn estimate(sql: &str) -> CostEstimate {
    let (rows, base_ms) = match statement_kind(sql) {
        StatementKind::Select => {
            let mut rows: u64 = 100;
            if !statement::has_where(sql) {
                rows *= 10;
            }
            rows <<= statement::join_count(sql).min(20) as u32;
            if statement::has_group_by(sql) {
                rows = (rows / 5).max(1);
            }
            (rows, 2.0)
        }
        StatementKind::Update => (50, 20.0),
        StatementKind::Delete => (50, 15.0),
        StatementKind::Insert => (1, 5.0),
        StatementKind::Other => (100, 10.0),
    };

    let execution_time_ms = base_ms + rows as f64 * 0.05;
    let memory_kb = 64 + rows / 2;
    let io_operations = 1 + rows / 100;

    CostEstimate {
        estimated_rows: rows,
        execution_time_ms,
        memory_kb,
        io_operations,
        level: CostLevel::from_execution_time(execution_time_ms),
    }
}
