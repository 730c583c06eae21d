//! The rewrite catalog, pagination, and complexity scoring.

use once_cell::sync::Lazy;
use regex::Regex;

use sqlward_core::{ParamMap, Severity};
use sqlward_guard::{SqlValidator, StatementKind, statement, statement_kind};

use crate::cost::{self, CostEstimate};
use crate::error::OptimizeError;
use crate::suggestion::{OptimizationImpact, OptimizationSuggestion};

static SELECT_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bSELECT\s+\*").unwrap());
static COUNT_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bCOUNT\s*\(\s*\*\s*\)").unwrap());
static SELECT_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*SELECT(\s+DISTINCT)?\b").unwrap());
static COMMA_JOIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bFROM\s+[\w.]+(\s+\w+)?\s*,\s*[\w.]+").unwrap());
static LEFT_JOIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bLEFT\s+(OUTER\s+)?JOIN\b").unwrap());
static ORDINAL_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(ORDER|GROUP)\s+BY\s+\d+").unwrap());

static OFFSET_FETCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+OFFSET\s+\d+\s+ROWS?(\s+FETCH\s+NEXT\s+\d+\s+ROWS?\s+ONLY)?").unwrap()
});
static LIMIT_OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+LIMIT\s+\d+(\s+OFFSET\s+\d+)?").unwrap());

static STRING_FUNCTIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(UPPER|LOWER|SUBSTRING|REPLACE|CONCAT|LTRIM|RTRIM|TRIM|CHARINDEX|LEN)\s*\(")
        .unwrap()
});
static SET_OPERATIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(UNION|INTERSECT|EXCEPT)\b").unwrap());
static SUBQUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(\s*SELECT\b|\bEXISTS\s*\(|\bIN\s*\(").unwrap());

/// The marker left on `SELECT *` until someone supplies a column list.
const COLUMN_LIST_TODO: &str = "SELECT /* TODO: replace * with an explicit column list */ *";

/// Result of an optimization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAnalysis {
    /// The statement as it arrived.
    pub original_sql: String,
    /// The statement after every applied rewrite.
    pub optimized_sql: String,
    /// Applied rewrites and advisory findings, in catalog order.
    pub suggestions: Vec<OptimizationSuggestion>,
    /// Product of the applied rules' impact factors; 1.0 when nothing
    /// was applied.
    pub improvement_factor: f64,
}

/// Applies the fixed catalog of safe mechanical rewrites.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptimizer {
    validator: SqlValidator,
}

impl QueryOptimizer {
    /// Create a new optimizer.
    pub fn new() -> Self {
        Self {
            validator: SqlValidator::new(),
        }
    }

    /// Walk the rewrite catalog over a statement.
    ///
    /// The security catalog runs first; a statement it rejects is returned
    /// unmodified with no suggestions — the optimizer never touches SQL
    /// that has not passed validation. Rules the optimizer detects but
    /// cannot safely apply are recorded as advisory suggestions only.
    pub fn analyze_sql(&self, sql: &str, params: &ParamMap) -> QueryAnalysis {
        let security = self.validator.validate_security(sql, params);
        if !security.is_valid {
            tracing::warn!("statement failed security validation; skipping optimization");
            return QueryAnalysis {
                original_sql: sql.to_string(),
                optimized_sql: sql.to_string(),
                suggestions: Vec::new(),
                improvement_factor: 1.0,
            };
        }

        let mut current = sql.to_string();
        let mut suggestions = Vec::new();
        let mut improvement_factor = 1.0;

        let mut apply = |current: &mut String,
                         rewritten: String,
                         description: &str,
                         impact: OptimizationImpact| {
            suggestions.push(OptimizationSuggestion::applied(
                description,
                impact,
                current.clone(),
                rewritten.clone(),
            ));
            improvement_factor *= impact.factor();
            *current = rewritten;
        };

        if SELECT_STAR.is_match(&current) {
            let rewritten = SELECT_STAR.replace(&current, COLUMN_LIST_TODO).into_owned();
            apply(
                &mut current,
                rewritten,
                "marked SELECT * for an explicit column list",
                OptimizationImpact::Low,
            );
        }

        if statement_kind(&current) == StatementKind::Select && !statement::has_row_limit(&current)
        {
            let rewritten = SELECT_HEAD
                .replace(&current, "SELECT${1} TOP 1000")
                .into_owned();
            apply(
                &mut current,
                rewritten,
                "injected TOP 1000 row cap on unbounded SELECT",
                OptimizationImpact::High,
            );
        }

        if COUNT_STAR.is_match(&current) {
            let rewritten = COUNT_STAR.replace_all(&current, "COUNT(1)").into_owned();
            apply(
                &mut current,
                rewritten,
                "rewrote COUNT(*) to COUNT(1)",
                OptimizationImpact::Low,
            );
        }

        if COMMA_JOIN.is_match(&current) && !statement::has_where(&current) {
            suggestions.push(OptimizationSuggestion::advisory(
                "comma join without WHERE risks a Cartesian product; use explicit JOIN ... ON",
                OptimizationImpact::High,
            ));
        }

        if LEFT_JOIN.find_iter(&current).count() >= 3 {
            suggestions.push(OptimizationSuggestion::advisory(
                "three or more chained LEFT JOINs; consider splitting the query",
                OptimizationImpact::Medium,
            ));
        }

        if ORDINAL_CLAUSE.is_match(&current) {
            suggestions.push(OptimizationSuggestion::advisory(
                "ORDER BY/GROUP BY by ordinal; name the columns instead",
                OptimizationImpact::Low,
            ));
        }

        QueryAnalysis {
            original_sql: sql.to_string(),
            optimized_sql: current,
            suggestions,
            improvement_factor,
        }
    }

    /// The optimized statement text alone.
    pub fn optimize_sql(&self, sql: &str, params: &ParamMap) -> String {
        self.analyze_sql(sql, params).optimized_sql
    }

    /// Heuristic cost estimate; see [`crate::cost`].
    pub fn estimate_query_cost(&self, sql: &str, _params: &ParamMap) -> CostEstimate {
        cost::estimate(sql)
    }

    /// Rewrite a statement for keyset-free pagination.
    ///
    /// Strips any existing OFFSET/FETCH or LIMIT/OFFSET clause, injects
    /// `ORDER BY 1` when no ordering exists (a placeholder — stable
    /// ordering by a key column is the caller's responsibility), and
    /// appends an OFFSET/FETCH pair for the requested page.
    pub fn apply_pagination(
        &self,
        sql: &str,
        page_size: i64,
        page_number: i64,
    ) -> Result<String, OptimizeError> {
        if page_size <= 0 {
            return Err(OptimizeError::InvalidPage {
                argument: "page_size",
                value: page_size,
            });
        }
        if page_number <= 0 {
            return Err(OptimizeError::InvalidPage {
                argument: "page_number",
                value: page_number,
            });
        }

        let stripped = OFFSET_FETCH.replace_all(sql, "");
        let stripped = LIMIT_OFFSET.replace_all(&stripped, "");
        let mut paged = stripped.trim_end().to_string();

        if !statement::has_order_by(&paged) {
            paged.push_str(" ORDER BY 1");
        }

        let offset = (page_number - 1) * page_size;
        paged.push_str(&format!(
            " OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            offset, page_size
        ));
        Ok(paged)
    }

    /// Additive complexity score in [1, 10].
    pub fn query_complexity(&self, sql: &str, params: &ParamMap) -> u8 {
        let kind = statement_kind(sql);
        let mut score: i32 = 1;

        score += statement::join_count(sql) as i32;

        if !statement::has_where(sql) {
            score += match kind {
                StatementKind::Update | StatementKind::Delete => 3,
                _ => 2,
            };
        }
        if statement::has_group_by(sql) {
            score += 1;
        }
        if STRING_FUNCTIONS.is_match(sql) {
            score += 1;
        }
        if SET_OPERATIONS.is_match(sql) {
            score += 2;
        }
        if SUBQUERY.is_match(sql) {
            score += 1;
        }

        for issue in &self.validator.validate_performance(sql, params).issues {
            score += match issue.severity {
                Severity::Critical => 3,
                Severity::Error => 2,
                Severity::Warning => 1,
                Severity::Info => 0,
            };
        }

        score.clamp(1, 10) as u8
    }
}
