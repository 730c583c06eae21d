//! The rule table and its evaluation engine.

use std::fmt;

use regex::Regex;

use sqlward_core::{
    DeclaredType, ParamValue, ParameterBinding, Severity, TemplateParameterSpec, ValidationIssue,
    ValidationResult, ValidationSettings,
};

use crate::catalog::{self, names};
use crate::error::RuleFailure;

/// A rule handler: a pure function from a binding and its spec to an
/// optional issue. `Err` means the handler itself failed.
pub type RuleHandler = Box<
    dyn Fn(&ParameterBinding, &TemplateParameterSpec) -> Result<Option<ValidationIssue>, RuleFailure>
        + Send
        + Sync,
>;

/// A named validation rule registered with the engine.
pub struct RuleDefinition {
    /// Stable rule name, e.g. `Type.Invalid`.
    pub name: &'static str,
    /// What the rule checks.
    pub description: &'static str,
    /// Severity of the issues this rule produces.
    pub severity: Severity,
    /// Declared types the rule applies to; empty means all types.
    pub applies_to: Vec<DeclaredType>,
    /// Whether `validate_all` runs this rule automatically. Rules
    /// registered with `enabled = false` are invoked on demand only.
    pub enabled: bool,
    handler: RuleHandler,
}

impl RuleDefinition {
    /// Register a rule that applies to every declared type.
    pub fn new(
        name: &'static str,
        description: &'static str,
        severity: Severity,
        handler: RuleHandler,
    ) -> Self {
        Self {
            name,
            description,
            severity,
            applies_to: Vec::new(),
            enabled: true,
            handler,
        }
    }

    /// Restrict the rule to the given declared types.
    pub fn for_types(mut self, types: impl IntoIterator<Item = DeclaredType>) -> Self {
        self.applies_to = types.into_iter().collect();
        self
    }

    /// Register the rule for on-demand invocation only.
    pub fn manual(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether the rule applies to a spec's declared type.
    pub fn applies_to_type(&self, declared: &DeclaredType) -> bool {
        self.applies_to.is_empty() || self.applies_to.contains(declared)
    }

    /// Run the handler.
    pub fn run(
        &self,
        binding: &ParameterBinding,
        spec: &TemplateParameterSpec,
    ) -> Result<Option<ValidationIssue>, RuleFailure> {
        (self.handler)(binding, spec)
    }
}

impl fmt::Debug for RuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleDefinition")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .field("applies_to", &self.applies_to)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Evaluates parameter bindings against the registered rule table.
pub struct ParameterValidator {
    rules: Vec<RuleDefinition>,
}

impl ParameterValidator {
    /// Create a validator with the built-in rule catalog.
    pub fn new(settings: &ValidationSettings) -> Self {
        Self {
            rules: catalog::builtin_rules(settings),
        }
    }

    /// Register an additional rule. Intended for startup composition; the
    /// table is not mutated once validation is running.
    pub fn with_rule(mut self, rule: RuleDefinition) -> Self {
        self.rules.push(rule);
        self
    }

    /// Names of every registered rule, in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    fn rule(&self, name: &str) -> Option<&RuleDefinition> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Run a single rule by name against one binding.
    ///
    /// Returns `None` when the rule is unknown, does not apply to the
    /// spec's declared type, or passes. A handler failure is converted to
    /// a `Rule.ExecutionError` warning.
    pub fn validate(
        &self,
        binding: &ParameterBinding,
        spec: &TemplateParameterSpec,
        rule_name: &str,
    ) -> Option<ValidationIssue> {
        let Some(rule) = self.rule(rule_name) else {
            tracing::warn!(rule = rule_name, "unknown validation rule requested");
            return None;
        };
        if !rule.applies_to_type(&spec.declared_type) {
            return None;
        }
        match rule.run(binding, spec) {
            Ok(issue) => issue,
            Err(failure) => Some(execution_error(rule.name, &binding.name, &failure)),
        }
    }

    /// Validate every binding against the template's parameter specs.
    ///
    /// Missing required specs are Critical; bindings without a matching
    /// spec are Warnings; each supplied binding then runs through every
    /// enabled rule whose applicable-type set matches. A failing handler
    /// is isolated to its own rule.
    pub fn validate_all(
        &self,
        bindings: &[ParameterBinding],
        specs: &[TemplateParameterSpec],
    ) -> ValidationResult {
        let mut issues = Vec::new();

        for spec in specs.iter().filter(|s| s.required) {
            let supplied = bindings
                .iter()
                .any(|b| b.name.eq_ignore_ascii_case(&spec.name));
            if !supplied {
                issues.push(
                    ValidationIssue::critical(
                        names::REQUIRED_MISSING,
                        format!("required parameter '{}' was not supplied", spec.name),
                    )
                    .for_parameter(spec.name.clone()),
                );
            }
        }

        for binding in bindings {
            let Some(spec) = specs
                .iter()
                .find(|s| s.name.eq_ignore_ascii_case(&binding.name))
            else {
                issues.push(
                    ValidationIssue::warning(
                        names::PARAMETER_UNKNOWN,
                        format!("parameter '{}' matches no declared spec", binding.name),
                    )
                    .for_parameter(binding.name.clone()),
                );
                continue;
            };

            for rule in self
                .rules
                .iter()
                .filter(|r| r.enabled && r.applies_to_type(&spec.declared_type))
            {
                match rule.run(binding, spec) {
                    Ok(Some(issue)) => issues.push(issue),
                    Ok(None) => {}
                    Err(failure) => {
                        tracing::warn!(
                            rule = rule.name,
                            parameter = %binding.name,
                            error = %failure,
                            "rule handler failed; continuing with remaining rules"
                        );
                        issues.push(execution_error(rule.name, &binding.name, &failure));
                    }
                }
            }
        }

        ValidationResult::from_issues(issues)
    }

    /// On-demand `Format.Pattern` check with a caller-supplied regex.
    ///
    /// Non-string values pass; an uncompilable pattern is a handler
    /// failure and surfaces as `Rule.ExecutionError`.
    pub fn validate_pattern(
        &self,
        binding: &ParameterBinding,
        pattern: &str,
    ) -> Option<ValidationIssue> {
        let text = binding.value.as_str()?;
        match Regex::new(pattern) {
            Ok(re) if re.is_match(text) => None,
            Ok(_) => Some(
                ValidationIssue::warning(
                    names::PATTERN,
                    format!("value does not match required pattern {}", pattern),
                )
                .for_parameter(binding.name.clone())
                .with_original_value(text),
            ),
            Err(e) => Some(execution_error(
                names::PATTERN,
                &binding.name,
                &RuleFailure::from(e),
            )),
        }
    }

    /// On-demand `Business.AllowedValues` check against an allow-list.
    pub fn validate_allowed_values(
        &self,
        binding: &ParameterBinding,
        allowed: &[ParamValue],
    ) -> Option<ValidationIssue> {
        if allowed.contains(&binding.value) {
            return None;
        }
        let rendered: Vec<String> = allowed.iter().map(ToString::to_string).collect();
        Some(
            ValidationIssue::warning(
                names::ALLOWED_VALUES,
                format!("value is not in the allowed set [{}]", rendered.join(", ")),
            )
            .for_parameter(binding.name.clone())
            .with_original_value(binding.value.to_string()),
        )
    }
}

fn execution_error(rule: &str, parameter: &str, failure: &RuleFailure) -> ValidationIssue {
    ValidationIssue::warning(
        names::EXECUTION_ERROR,
        format!("rule {} failed to execute: {}", rule, failure),
    )
    .for_parameter(parameter.to_string())
}
