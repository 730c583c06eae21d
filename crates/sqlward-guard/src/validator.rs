//! Statement validation against the security and performance catalogs.
//!
//! Security findings are Critical and block execution; performance findings
//! are Warnings and never do. The combined verdict is fail-closed: a result
//! is valid exactly when the merged issue set carries no Critical issue.

use once_cell::sync::Lazy;
use regex::Regex;

use sqlward_core::{ParamMap, SqlTemplate, ValidationIssue, ValidationResult};

use crate::sanitizer;
use crate::statement::{self, StatementKind, statement_kind};

/// Rule names attached to statement-level issues.
pub mod names {
    pub const SQL_INJECTION: &str = "Security.SqlInjection";
    pub const MULTI_STATEMENT: &str = "Security.MultiStatement";
    pub const PARAMETER_INJECTION: &str = "Security.ParameterInjection";
    pub const DANGEROUS_KEYWORD: &str = "Security.DangerousKeyword";
    pub const EXECUTION: &str = "Security.Execution";

    pub const SELECT_STAR: &str = "Performance.SelectStar";
    pub const COUNT_STAR: &str = "Performance.CountStar";
    pub const ORDINAL_CLAUSE: &str = "Performance.OrdinalClause";
    pub const UNBOUNDED_SELECT: &str = "Performance.UnboundedSelect";
    pub const CARTESIAN_JOIN: &str = "Performance.CartesianJoin";
    pub const CHAINED_LEFT_JOINS: &str = "Performance.ChainedLeftJoins";
    pub const NO_ROW_LIMIT: &str = "Performance.NoRowLimit";

    pub const UNDECLARED_PARAMETER: &str = "Template.UndeclaredParameter";
    pub const UNUSED_PARAMETER: &str = "Template.UnusedParameter";
    pub const FULL_SCAN: &str = "Template.FullScan";
}

static MULTI_STATEMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r";\s*[A-Za-z_]\w*").unwrap());
static EXEC_ATTEMPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(EXEC|EXECUTE)\b").unwrap());

/// DDL and schema-altering keywords flagged by the security pass.
static DANGEROUS_DDL: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    ["DROP", "TRUNCATE", "ALTER", "CREATE", "MODIFY", "RENAME"]
        .iter()
        .map(|kw| (Regex::new(&format!(r"(?i)\b{}\b", kw)).unwrap(), *kw))
        .collect()
});

static SELECT_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bSELECT\s+\*").unwrap());
static COUNT_STAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bCOUNT\s*\(\s*\*\s*\)").unwrap());
static ORDINAL_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(ORDER|GROUP)\s+BY\s+\d+").unwrap());
static COMMA_JOIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bFROM\s+[\w.]+(\s+\w+)?\s*,\s*[\w.]+").unwrap());
static LEFT_JOIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bLEFT\s+(OUTER\s+)?JOIN\b").unwrap());

/// Parameter references in template text: `@name` or `${name}`.
static AT_PARAMETER: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([A-Za-z_]\w*)").unwrap());
static BRACE_PARAMETER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{(\w+)\}").unwrap());

/// Validates statements before any rewriting is allowed to touch them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlValidator;

impl SqlValidator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self
    }

    /// Security validation. Every finding here is Critical.
    ///
    /// Checks the statement text against the injection catalog, rejects
    /// multi-statement chaining, scans string parameter values with the same
    /// catalog, and flags dangerous DDL and EXEC attempts.
    pub fn validate_security(&self, sql: &str, params: &ParamMap) -> ValidationResult {
        let mut issues = Vec::new();

        for desc in sanitizer::injection_matches(sql) {
            issues.push(
                ValidationIssue::critical(
                    names::SQL_INJECTION,
                    format!("statement matches injection pattern: {}", desc),
                )
                .with_recommendation("use parameterized values instead of embedded input"),
            );
        }

        if MULTI_STATEMENT.is_match(sql) {
            issues.push(ValidationIssue::critical(
                names::MULTI_STATEMENT,
                "statement chaining detected; only a single statement is allowed",
            ));
        }

        for (name, value) in params {
            let Some(text) = value.as_str() else { continue };
            for desc in sanitizer::injection_matches(text) {
                issues.push(
                    ValidationIssue::critical(
                        names::PARAMETER_INJECTION,
                        format!("parameter value matches injection pattern: {}", desc),
                    )
                    .for_parameter(name.clone())
                    .with_original_value(text),
                );
            }
        }

        for (re, keyword) in DANGEROUS_DDL.iter() {
            if re.is_match(sql) {
                issues.push(ValidationIssue::critical(
                    names::DANGEROUS_KEYWORD,
                    format!("dangerous keyword {} is not allowed", keyword),
                ));
            }
        }

        if EXEC_ATTEMPT.is_match(sql) {
            issues.push(ValidationIssue::critical(
                names::EXECUTION,
                "EXEC/EXECUTE attempts are not allowed",
            ));
        }

        ValidationResult::from_issues(issues)
    }

    /// Performance validation. Every finding here is a Warning.
    pub fn validate_performance(&self, sql: &str, _params: &ParamMap) -> ValidationResult {
        let mut issues = Vec::new();
        let kind = statement_kind(sql);

        if SELECT_STAR.is_match(sql) {
            issues.push(
                ValidationIssue::warning(names::SELECT_STAR, "SELECT * returns every column")
                    .with_recommendation("list only the columns the caller needs"),
            );
        }

        if COUNT_STAR.is_match(sql) {
            issues.push(
                ValidationIssue::warning(names::COUNT_STAR, "COUNT(*) counts full rows")
                    .with_recommendation("COUNT(1) avoids materializing row contents"),
            );
        }

        if ORDINAL_CLAUSE.is_match(sql) {
            issues.push(ValidationIssue::warning(
                names::ORDINAL_CLAUSE,
                "ORDER BY/GROUP BY by ordinal is fragile under column changes",
            ));
        }

        if kind == StatementKind::Select && !statement::has_where(sql) {
            issues.push(
                ValidationIssue::warning(
                    names::UNBOUNDED_SELECT,
                    "SELECT without WHERE scans the whole table",
                )
                .with_recommendation("add a WHERE clause or an explicit row limit"),
            );
        }

        if COMMA_JOIN.is_match(sql) && !statement::has_where(sql) {
            issues.push(ValidationIssue::warning(
                names::CARTESIAN_JOIN,
                "comma join without WHERE risks a Cartesian product",
            ));
        }

        if LEFT_JOIN.find_iter(sql).count() >= 3 {
            issues.push(ValidationIssue::warning(
                names::CHAINED_LEFT_JOINS,
                "three or more chained LEFT JOINs; verify the access path",
            ));
        }

        if kind == StatementKind::Select && !statement::has_row_limit(sql) {
            issues.push(
                ValidationIssue::warning(
                    names::NO_ROW_LIMIT,
                    "SELECT carries no row-limiting clause (TOP/LIMIT/FETCH FIRST)",
                )
                .with_recommendation("cap result size to protect the execution engine"),
            );
        }

        ValidationResult::from_issues(issues)
    }

    /// Full validation: security first, short-circuiting on failure.
    ///
    /// Performance warnings are merged in only when security passes; they
    /// never flip the verdict.
    pub fn validate(&self, sql: &str, params: &ParamMap) -> ValidationResult {
        let security = self.validate_security(sql, params);
        if !security.is_valid {
            return security;
        }
        security.merge(self.validate_performance(sql, params))
    }

    /// Validate a stored template: statement checks plus declaration
    /// cross-checks in both directions, and the full-scan opt-in gate.
    pub fn validate_template(&self, template: &SqlTemplate) -> ValidationResult {
        let sql = template.sql_text.as_str();
        let mut result = self.validate_security(sql, &ParamMap::new());
        result = result.merge(self.validate_performance(sql, &ParamMap::new()));

        let referenced: Vec<String> = AT_PARAMETER
            .captures_iter(sql)
            .chain(BRACE_PARAMETER.captures_iter(sql))
            .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
            .collect();

        for name in &referenced {
            let declared = template
                .parameters
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(name));
            if !declared {
                result.push(
                    ValidationIssue::warning(
                        names::UNDECLARED_PARAMETER,
                        format!("parameter @{} is used but not declared", name),
                    )
                    .for_parameter(name.clone()),
                );
            }
        }

        for spec in &template.parameters {
            let used = referenced.iter().any(|n| n.eq_ignore_ascii_case(&spec.name));
            if !used {
                result.push(
                    ValidationIssue::warning(
                        names::UNUSED_PARAMETER,
                        format!("parameter @{} is declared but never used", spec.name),
                    )
                    .for_parameter(spec.name.clone()),
                );
            }
        }

        if statement_kind(sql) == StatementKind::Select
            && !statement::has_where(sql)
            && !template.allow_full_scan
        {
            result.push(
                ValidationIssue::critical(
                    names::FULL_SCAN,
                    "SELECT without WHERE requires an explicit full-scan opt-in",
                )
                .with_recommendation("set allow_full_scan on the template or add a WHERE clause"),
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlward_core::{DeclaredType, ParamValue, Severity, TemplateParameterSpec};

    fn validator() -> SqlValidator {
        SqlValidator::new()
    }

    #[test]
    fn test_clean_select_passes_security() {
        let result = validator().validate_security(
            "SELECT Id, Name FROM Users WHERE Id = @id",
            &ParamMap::new(),
        );
        assert!(result.is_valid);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_injection_example_rejected_with_both_findings() {
        // The worked example: chained DROP plus trailing comment.
        let result = validator().validate_security(
            "SELECT * FROM Users WHERE name = 'a'; DROP TABLE Users;--",
            &ParamMap::new(),
        );
        assert!(!result.is_valid);
        assert!(result.issues.iter().any(|i| i.rule_name == names::SQL_INJECTION));
        assert!(result
            .issues
            .iter()
            .any(|i| i.rule_name == names::DANGEROUS_KEYWORD && i.description.contains("DROP")));
    }

    #[test]
    fn test_injection_in_parameter_value() {
        let mut params = ParamMap::new();
        params.insert(
            "name".to_string(),
            ParamValue::String("x' OR 1=1 --".to_string()),
        );
        let result = validator().validate_security("SELECT * FROM Users WHERE name = @name", &params);
        assert!(!result.is_valid);
        let issue = result
            .issues
            .iter()
            .find(|i| i.rule_name == names::PARAMETER_INJECTION)
            .expect("parameter injection issue");
        assert_eq!(issue.parameter_name.as_deref(), Some("name"));
        assert_eq!(issue.severity, Severity::Critical);
    }

    #[test]
    fn test_multi_statement_rejected() {
        let result =
            validator().validate_security("SELECT 1 FROM t; anything", &ParamMap::new());
        assert!(result.issues.iter().any(|i| i.rule_name == names::MULTI_STATEMENT));
    }

    #[test]
    fn test_performance_warnings_do_not_block() {
        let result = validator().validate("SELECT * FROM Orders", &ParamMap::new());
        assert!(result.is_valid);
        let rules: Vec<&str> = result.issues.iter().map(|i| i.rule_name.as_str()).collect();
        assert!(rules.contains(&names::SELECT_STAR));
        assert!(rules.contains(&names::UNBOUNDED_SELECT));
        assert!(rules.contains(&names::NO_ROW_LIMIT));
    }

    #[test]
    fn test_security_short_circuits_combined_validation() {
        let result = validator().validate("SELECT 1; DELETE FROM t", &ParamMap::new());
        assert!(!result.is_valid);
        // Only security findings; the performance pass never ran.
        assert!(result.issues.iter().all(|i| i.severity == Severity::Critical));
    }

    #[test]
    fn test_cartesian_and_ordinal_warnings() {
        let result = validator()
            .validate_performance("SELECT a.x FROM a, b ORDER BY 1", &ParamMap::new());
        let rules: Vec<&str> = result.issues.iter().map(|i| i.rule_name.as_str()).collect();
        assert!(rules.contains(&names::CARTESIAN_JOIN));
        assert!(rules.contains(&names::ORDINAL_CLAUSE));
    }

    #[test]
    fn test_chained_left_joins_warning() {
        let sql = "SELECT x FROM a LEFT JOIN b ON 1=1 LEFT JOIN c ON 1=1 LEFT JOIN d ON 1=1 WHERE a.id = @id";
        let result = validator().validate_performance(sql, &ParamMap::new());
        assert!(result
            .issues
            .iter()
            .any(|i| i.rule_name == names::CHAINED_LEFT_JOINS));
    }

    #[test]
    fn test_template_cross_checks() {
        let template = SqlTemplate::new(
            "orders_by_status",
            "SELECT Id FROM Orders WHERE Status = @status AND Region = @region",
        )
        .with_parameter(TemplateParameterSpec::required("status", DeclaredType::String))
        .with_parameter(TemplateParameterSpec::optional("limit", DeclaredType::Int));

        let result = validator().validate_template(&template);
        assert!(result.is_valid);
        assert!(result.issues.iter().any(|i| {
            i.rule_name == names::UNDECLARED_PARAMETER && i.parameter_name.as_deref() == Some("region")
        }));
        assert!(result.issues.iter().any(|i| {
            i.rule_name == names::UNUSED_PARAMETER && i.parameter_name.as_deref() == Some("limit")
        }));
    }

    #[test]
    fn test_template_full_scan_requires_opt_in() {
        let template = SqlTemplate::new("all_orders", "SELECT Id, Total FROM Orders");
        let result = validator().validate_template(&template);
        assert!(!result.is_valid);
        assert!(result.issues.iter().any(|i| i.rule_name == names::FULL_SCAN));

        let opted_in = SqlTemplate::new("all_orders", "SELECT Id, Total FROM Orders")
            .allowing_full_scan();
        let result = validator().validate_template(&opted_in);
        assert!(result.is_valid);
    }
}
