//! # sqlward-scope
//!
//! Tenant scoping for Sqlward: rewrites statements to carry mandatory
//! tenant-isolation predicates and independently verifies that isolation
//! holds.
//!
//! ## How It Works
//!
//! Table references are found by textual scan (no SQL grammar), looked up
//! in the [`TenantColumnMap`](sqlward_core::TenantColumnMap), and every
//! mapped table gets a tenant-equality predicate injected:
//!
//! **Before:**
//! ```sql
//! SELECT * FROM Orders WHERE Status = 'pending'
//! ```
//!
//! **After:**
//! ```sql
//! SELECT * FROM Orders WHERE (Orders.TenantId = '…') AND Status = 'pending'
//! ```
//!
//! | Operation | Scoping behavior |
//! |-----------|------------------|
//! | `SELECT`  | AND into WHERE, or insert WHERE before ORDER BY/GROUP BY/HAVING/LIMIT |
//! | `UPDATE`  | AND into WHERE, or append WHERE |
//! | `DELETE`  | AND into WHERE, or append WHERE |
//! | `INSERT`  | Append tenant column and literal to the column/value lists |
//!
//! [`TenantScoper::validate_tenant_isolation`] is a separate textual check,
//! not a re-derivation of the rewrite, so it also guards against upstream
//! statements that merely claim to be isolated.

pub mod error;
pub mod scoper;
pub mod tables;

pub use error::ScopeError;
pub use scoper::{ScopingOutcome, TenantScoper};
pub use tables::{TableReference, extract_tables};
