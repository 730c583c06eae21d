//! The built-in rule catalog.
//!
//! Each rule is constructed once at startup from [`ValidationSettings`]
//! and registered into the engine's immutable table. Handlers are pure
//! functions over the binding and its spec.

use once_cell::sync::Lazy;
use regex::Regex;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlward_core::{DeclaredType, ParamValue, Severity, ValidationIssue, ValidationSettings};

use crate::engine::RuleDefinition;

/// Stable names of the built-in rules.
pub mod names {
    pub const TYPE_INVALID: &str = "Type.Invalid";
    pub const CONFIDENCE_LOW: &str = "Confidence.Low";
    pub const SQL_INJECTION: &str = "Security.SqlInjection";
    pub const RANGE_NUMERIC: &str = "Range.Numeric";
    pub const RANGE_DATE: &str = "Range.Date";
    pub const STRING_LENGTH: &str = "Format.StringLength";
    pub const EMAIL: &str = "Format.Email";
    pub const URL: &str = "Format.Url";
    pub const CONTENT_INAPPROPRIATE: &str = "Content.Inappropriate";
    pub const PATTERN: &str = "Format.Pattern";
    pub const ALLOWED_VALUES: &str = "Business.AllowedValues";

    pub const REQUIRED_MISSING: &str = "Required.Missing";
    pub const PARAMETER_UNKNOWN: &str = "Parameter.Unknown";
    pub const EXECUTION_ERROR: &str = "Rule.ExecutionError";
}

const NUMERIC_INT_BOUND: i64 = 1_000_000_000;
const NUMERIC_WIDE_BOUND: f64 = 1e12;

static EMAIL_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());
static URL_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://[^\s/$.?#][^\s]*$").unwrap());

/// Build the full built-in catalog in evaluation order.
pub fn builtin_rules(settings: &ValidationSettings) -> Vec<RuleDefinition> {
    vec![
        type_invalid(),
        confidence_low(settings.low_confidence_threshold),
        sql_injection(),
        range_numeric(),
        range_date(),
        string_length(settings.max_string_length),
        email_format(),
        url_format(),
        content_inappropriate(settings.blocked_terms.clone()),
        pattern_rule(),
        allowed_values_rule(),
    ]
}

fn type_invalid() -> RuleDefinition {
    RuleDefinition::new(
        names::TYPE_INVALID,
        "runtime value must be compatible with the declared type",
        Severity::Critical,
        Box::new(|binding, spec| {
            if spec.declared_type.is_compatible(&binding.value) {
                return Ok(None);
            }
            Ok(Some(
                ValidationIssue::critical(
                    names::TYPE_INVALID,
                    format!(
                        "value of type {} is not compatible with declared type {}",
                        binding.value.type_name(),
                        spec.declared_type.name()
                    ),
                )
                .for_parameter(binding.name.clone())
                .with_original_value(binding.value.to_string()),
            ))
        }),
    )
}

fn confidence_low(threshold: f64) -> RuleDefinition {
    RuleDefinition::new(
        names::CONFIDENCE_LOW,
        "extraction confidence must reach the configured threshold",
        Severity::Warning,
        Box::new(move |binding, _spec| {
            if binding.confidence >= threshold {
                return Ok(None);
            }
            Ok(Some(
                ValidationIssue::warning(
                    names::CONFIDENCE_LOW,
                    format!(
                        "extraction confidence {:.2} is below {:.2}",
                        binding.confidence, threshold
                    ),
                )
                .for_parameter(binding.name.clone())
                .with_recommendation("confirm the extracted value before execution"),
            ))
        }),
    )
}

fn sql_injection() -> RuleDefinition {
    RuleDefinition::new(
        names::SQL_INJECTION,
        "string values must not match the injection catalog",
        Severity::Critical,
        Box::new(|binding, _spec| {
            let Some(text) = binding.value.as_str() else {
                return Ok(None);
            };
            let matches = sqlward_guard::sanitizer::injection_matches(text);
            if matches.is_empty() {
                return Ok(None);
            }
            Ok(Some(
                ValidationIssue::critical(
                    names::SQL_INJECTION,
                    format!("value matches injection pattern: {}", matches.join(", ")),
                )
                .for_parameter(binding.name.clone())
                .with_original_value(text),
            ))
        }),
    )
    .for_types([DeclaredType::String])
}

fn range_numeric() -> RuleDefinition {
    RuleDefinition::new(
        names::RANGE_NUMERIC,
        "numeric values must fall inside plausible bounds",
        Severity::Warning,
        Box::new(|binding, _spec| {
            let out_of_range = match &binding.value {
                ParamValue::Int(v) => i64::from(*v).abs() > NUMERIC_INT_BOUND,
                ParamValue::Long(v) => v.checked_abs().is_none_or(|a| a as f64 > NUMERIC_WIDE_BOUND),
                ParamValue::Float(v) => !v.is_finite() || f64::from(v.abs()) > NUMERIC_WIDE_BOUND,
                ParamValue::Double(v) | ParamValue::Decimal(v) => {
                    !v.is_finite() || v.abs() > NUMERIC_WIDE_BOUND
                }
                _ => false,
            };
            if !out_of_range {
                return Ok(None);
            }
            Ok(Some(
                ValidationIssue::warning(
                    names::RANGE_NUMERIC,
                    "numeric value is outside the plausible range",
                )
                .for_parameter(binding.name.clone())
                .with_original_value(binding.value.to_string()),
            ))
        }),
    )
}

fn range_date() -> RuleDefinition {
    RuleDefinition::new(
        names::RANGE_DATE,
        "date values must fall inside plausible bounds",
        Severity::Warning,
        Box::new(|binding, _spec| {
            let naive = match &binding.value {
                ParamValue::DateTime(v) => *v,
                ParamValue::DateTimeOffset(v) => v.naive_utc(),
                _ => return Ok(None),
            };
            if date_in_range(naive) {
                return Ok(None);
            }
            Ok(Some(
                ValidationIssue::warning(
                    names::RANGE_DATE,
                    "date is before 1900-01-01 or more than 100 years in the future",
                )
                .for_parameter(binding.name.clone())
                .with_original_value(binding.value.to_string()),
            ))
        }),
    )
}

fn date_in_range(value: NaiveDateTime) -> bool {
    let min = NaiveDate::from_ymd_opt(1900, 1, 1)
        .map(|d| d.and_hms_opt(0, 0, 0))
        .flatten();
    let Some(min) = min else { return true };
    let max = Utc::now().naive_utc() + chrono::Duration::days(36_525);
    value >= min && value <= max
}

fn string_length(max: usize) -> RuleDefinition {
    RuleDefinition::new(
        names::STRING_LENGTH,
        "string values must be non-empty and bounded",
        Severity::Warning,
        Box::new(move |binding, _spec| {
            let Some(text) = binding.value.as_str() else {
                return Ok(None);
            };
            let description = if text.is_empty() {
                "string value is empty"
            } else if text.chars().count() > max {
                "string value exceeds the maximum length"
            } else {
                return Ok(None);
            };
            Ok(Some(
                ValidationIssue::warning(names::STRING_LENGTH, description)
                    .for_parameter(binding.name.clone()),
            ))
        }),
    )
    .for_types([DeclaredType::String])
}

/// Format checks key off the parameter name: a binding named like an email
/// address field is held to the email format, and likewise for URLs.
fn email_format() -> RuleDefinition {
    RuleDefinition::new(
        names::EMAIL,
        "email-named string parameters must look like an address",
        Severity::Warning,
        Box::new(|binding, _spec| {
            if !binding.name.to_ascii_lowercase().contains("email") {
                return Ok(None);
            }
            let Some(text) = binding.value.as_str() else {
                return Ok(None);
            };
            if text.is_empty() || EMAIL_FORMAT.is_match(text) {
                return Ok(None);
            }
            Ok(Some(
                ValidationIssue::warning(names::EMAIL, "value is not a valid email address")
                    .for_parameter(binding.name.clone())
                    .with_original_value(text),
            ))
        }),
    )
    .for_types([DeclaredType::String])
}

fn url_format() -> RuleDefinition {
    RuleDefinition::new(
        names::URL,
        "url-named string parameters must be http(s) URLs",
        Severity::Warning,
        Box::new(|binding, _spec| {
            if !binding.name.to_ascii_lowercase().contains("url") {
                return Ok(None);
            }
            let Some(text) = binding.value.as_str() else {
                return Ok(None);
            };
            if text.is_empty() || URL_FORMAT.is_match(text) {
                return Ok(None);
            }
            Ok(Some(
                ValidationIssue::warning(names::URL, "value is not an http(s) URL")
                    .for_parameter(binding.name.clone())
                    .with_original_value(text),
            ))
        }),
    )
    .for_types([DeclaredType::String])
}

fn content_inappropriate(blocked_terms: Vec<String>) -> RuleDefinition {
    RuleDefinition::new(
        names::CONTENT_INAPPROPRIATE,
        "string values must not contain blocked terms",
        Severity::Warning,
        Box::new(move |binding, _spec| {
            let Some(text) = binding.value.as_str() else {
                return Ok(None);
            };
            let lowered = text.to_lowercase();
            let hit = blocked_terms
                .iter()
                .find(|term| !term.is_empty() && lowered.contains(&term.to_lowercase()));
            let Some(term) = hit else {
                return Ok(None);
            };
            Ok(Some(
                ValidationIssue::warning(
                    names::CONTENT_INAPPROPRIATE,
                    format!("value contains blocked term '{}'", term),
                )
                .for_parameter(binding.name.clone()),
            ))
        }),
    )
    .for_types([DeclaredType::String])
}

/// Registered for discoverability; the real check runs on demand through
/// [`ParameterValidator::validate_pattern`](crate::engine::ParameterValidator::validate_pattern)
/// with a caller-supplied pattern.
fn pattern_rule() -> RuleDefinition {
    RuleDefinition::new(
        names::PATTERN,
        "value must match a caller-supplied pattern",
        Severity::Warning,
        Box::new(|_binding, _spec| Ok(None)),
    )
    .manual()
}

/// Registered for discoverability; the real check runs on demand through
/// [`ParameterValidator::validate_allowed_values`](crate::engine::ParameterValidator::validate_allowed_values)
/// with a caller-supplied allow-list.
fn allowed_values_rule() -> RuleDefinition {
    RuleDefinition::new(
        names::ALLOWED_VALUES,
        "value must be in a caller-supplied allow-list",
        Severity::Warning,
        Box::new(|_binding, _spec| Ok(None)),
    )
    .manual()
}
