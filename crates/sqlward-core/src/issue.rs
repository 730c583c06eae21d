//! Validation issues and results.
//!
//! A validation pass accumulates [`ValidationIssue`]s; issues are never
//! removed once recorded. The overall [`ValidationResult`] is valid exactly
//! when no accumulated issue carries [`Severity::Critical`] — warnings are
//! surfaced but never block.

use std::fmt;

/// Severity of a validation issue, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// A single finding produced by a validation rule or statement check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// The parameter this issue concerns, if any.
    pub parameter_name: Option<String>,
    /// Name of the rule that produced the issue, e.g. `Type.Invalid`.
    pub rule_name: String,
    /// Human-readable description of the finding.
    pub description: String,
    /// Severity of the finding.
    pub severity: Severity,
    /// Rendering of the offending value, if applicable.
    pub original_value: Option<String>,
    /// Suggested remediation, if one exists.
    pub recommendation: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue with the given severity.
    pub fn new(
        severity: Severity,
        rule_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            parameter_name: None,
            rule_name: rule_name.into(),
            description: description.into(),
            severity,
            original_value: None,
            recommendation: None,
        }
    }

    /// Create a Critical issue.
    pub fn critical(rule_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Severity::Critical, rule_name, description)
    }

    /// Create a Warning issue.
    pub fn warning(rule_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(Severity::Warning, rule_name, description)
    }

    /// Attach the parameter name this issue concerns.
    pub fn for_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameter_name = Some(name.into());
        self
    }

    /// Attach a rendering of the offending value.
    pub fn with_original_value(mut self, value: impl Into<String>) -> Self {
        self.original_value = Some(value.into());
        self
    }

    /// Attach a remediation hint.
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    /// Whether this issue blocks execution.
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parameter_name {
            Some(p) => write!(
                f,
                "[{}] {} ({}): {}",
                self.severity, self.rule_name, p, self.description
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.rule_name, self.description),
        }
    }
}

/// Outcome of a validation pass over a statement or a set of bindings.
///
/// `is_valid` holds exactly when no issue is Critical; the constructor and
/// every mutation path maintain that invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the validated input may proceed.
    pub is_valid: bool,
    /// All issues found, in the order they were recorded.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// A passing result with no issues.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            issues: Vec::new(),
        }
    }

    /// Build a result from accumulated issues.
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let is_valid = !issues.iter().any(ValidationIssue::is_critical);
        Self { is_valid, issues }
    }

    /// Record one more issue, keeping the validity invariant.
    pub fn push(&mut self, issue: ValidationIssue) {
        if issue.is_critical() {
            self.is_valid = false;
        }
        self.issues.push(issue);
    }

    /// Combine two results; issues concatenate, validity is the conjunction.
    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.is_valid = self.is_valid && other.is_valid;
        self.issues.extend(other.issues);
        self
    }

    /// Whether any issue is Critical.
    pub fn has_critical(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_critical)
    }

    /// Issues at or above the given severity.
    pub fn issues_at_least(&self, severity: Severity) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.severity >= severity)
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}
