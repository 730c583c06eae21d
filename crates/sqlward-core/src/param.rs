//! Parameter bindings, typed scalar values, and template parameter specs.
//!
//! Bindings arrive from the upstream extraction collaborator with an opaque
//! confidence score. Template specs are owned by the template repository and
//! consumed read-only here; the rule engine checks bindings against them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

/// Named parameter values, ordered for deterministic output.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// A typed scalar value carried by a parameter binding.
///
/// `Decimal` keeps an f64 payload but a distinct kind tag; the distinction
/// matters for type compatibility, not for storage precision in this layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<Utc>),
    Duration(chrono::Duration),
    Guid(Uuid),
}

impl ParamValue {
    /// Runtime kind name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Null => "null",
            ParamValue::String(_) => "string",
            ParamValue::Int(_) => "int",
            ParamValue::Long(_) => "long",
            ParamValue::Float(_) => "float",
            ParamValue::Double(_) => "double",
            ParamValue::Decimal(_) => "decimal",
            ParamValue::Bool(_) => "bool",
            ParamValue::DateTime(_) => "datetime",
            ParamValue::DateTimeOffset(_) => "datetimeoffset",
            ParamValue::Duration(_) => "duration",
            ParamValue::Guid(_) => "guid",
        }
    }

    /// The string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => write!(f, "NULL"),
            ParamValue::String(s) => write!(f, "{}", s),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Long(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Double(v) => write!(f, "{}", v),
            ParamValue::Decimal(v) => write!(f, "{}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S")),
            ParamValue::DateTimeOffset(v) => write!(f, "{}", v.to_rfc3339()),
            ParamValue::Duration(v) => write!(f, "{}s", v.num_seconds()),
            ParamValue::Guid(v) => write!(f, "{}", v),
        }
    }
}

/// Declared type of a template parameter, as written in the template spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    String,
    Int,
    Long,
    Double,
    Decimal,
    Float,
    Bool,
    DateTime,
    DateTimeOffset,
    Duration,
    Guid,
    /// A type name this layer does not know; treated as compatible with
    /// every runtime value.
    Other(String),
}

impl DeclaredType {
    /// Parse a declared type name. Unknown names become [`DeclaredType::Other`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" | "varchar" | "nvarchar" | "text" => DeclaredType::String,
            "int" | "int32" | "integer" => DeclaredType::Int,
            "long" | "int64" | "bigint" => DeclaredType::Long,
            "double" | "float64" => DeclaredType::Double,
            "decimal" | "numeric" | "money" => DeclaredType::Decimal,
            "float" | "float32" | "single" | "real" => DeclaredType::Float,
            "bool" | "boolean" | "bit" => DeclaredType::Bool,
            "datetime" | "timestamp" => DeclaredType::DateTime,
            "datetimeoffset" | "timestamptz" => DeclaredType::DateTimeOffset,
            "timespan" | "duration" | "interval" => DeclaredType::Duration,
            "guid" | "uuid" | "uniqueidentifier" => DeclaredType::Guid,
            _ => DeclaredType::Other(name.to_string()),
        }
    }

    /// Declared-type / runtime-value compatibility table.
    ///
    /// String accepts anything. Numeric types accept themselves plus the
    /// narrower kinds that convert implicitly (int and long everywhere,
    /// float into double). Temporal and identity types require an exact
    /// match, except DateTimeOffset, which also accepts DateTime. Unknown
    /// declared types and null values are always compatible.
    pub fn is_compatible(&self, value: &ParamValue) -> bool {
        use DeclaredType as D;
        use ParamValue as V;

        if matches!(value, V::Null) {
            return true;
        }

        match self {
            D::String => true,
            D::Int => matches!(value, V::Int(_)),
            D::Long => matches!(value, V::Int(_) | V::Long(_)),
            D::Float => matches!(value, V::Float(_) | V::Int(_) | V::Long(_)),
            D::Double => matches!(value, V::Double(_) | V::Float(_) | V::Int(_) | V::Long(_)),
            D::Decimal => matches!(value, V::Decimal(_) | V::Int(_) | V::Long(_)),
            D::Bool => matches!(value, V::Bool(_)),
            D::DateTime => matches!(value, V::DateTime(_)),
            D::DateTimeOffset => matches!(value, V::DateTimeOffset(_) | V::DateTime(_)),
            D::Duration => matches!(value, V::Duration(_)),
            D::Guid => matches!(value, V::Guid(_)),
            D::Other(_) => true,
        }
    }

    /// Name for diagnostics.
    pub fn name(&self) -> &str {
        match self {
            DeclaredType::String => "string",
            DeclaredType::Int => "int",
            DeclaredType::Long => "long",
            DeclaredType::Double => "double",
            DeclaredType::Decimal => "decimal",
            DeclaredType::Float => "float",
            DeclaredType::Bool => "bool",
            DeclaredType::DateTime => "datetime",
            DeclaredType::DateTimeOffset => "datetimeoffset",
            DeclaredType::Duration => "duration",
            DeclaredType::Guid => "guid",
            DeclaredType::Other(name) => name.as_str(),
        }
    }
}

/// A named parameter value produced by the upstream extraction step.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    /// Parameter name, without any `@` prefix.
    pub name: String,
    /// The extracted value.
    pub value: ParamValue,
    /// Upstream extraction confidence in [0, 1]; opaque to this pipeline.
    pub confidence: f64,
}

impl ParameterBinding {
    /// Create a binding with full confidence.
    pub fn new(name: impl Into<String>, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            value,
            confidence: 1.0,
        }
    }

    /// Set the extraction confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// The contract a binding must satisfy, owned by the template repository.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParameterSpec {
    /// Parameter name, without any `@` prefix.
    pub name: String,
    /// Declared type from the template definition.
    pub declared_type: DeclaredType,
    /// Whether a binding must be supplied.
    pub required: bool,
    /// Default applied when the binding is absent and not required.
    pub default_value: Option<ParamValue>,
}

impl TemplateParameterSpec {
    /// Create a required spec of the given type.
    pub fn required(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            required: true,
            default_value: None,
        }
    }

    /// Create an optional spec of the given type.
    pub fn optional(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            required: false,
            default_value: None,
        }
    }

    /// Attach a default value.
    pub fn with_default(mut self, value: ParamValue) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// A parameterized SQL template as handed over by the template repository.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlTemplate {
    /// Template name, for diagnostics.
    pub name: String,
    /// The parameterized statement text.
    pub sql_text: String,
    /// Declared parameters.
    pub parameters: Vec<TemplateParameterSpec>,
    /// Explicit opt-in for SELECT statements without a WHERE clause.
    pub allow_full_scan: bool,
}

impl SqlTemplate {
    /// Create a template with no declared parameters.
    pub fn new(name: impl Into<String>, sql_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_text: sql_text.into(),
            parameters: Vec::new(),
            allow_full_scan: false,
        }
    }

    /// Declare a parameter.
    pub fn with_parameter(mut self, spec: TemplateParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    /// Opt in to full-table scans.
    pub fn allowing_full_scan(mut self) -> Self {
        self.allow_full_scan = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declared_types() {
        assert_eq!(DeclaredType::parse("Int32"), DeclaredType::Int);
        assert_eq!(DeclaredType::parse("BIGINT"), DeclaredType::Long);
        assert_eq!(DeclaredType::parse("uniqueidentifier"), DeclaredType::Guid);
        assert_eq!(
            DeclaredType::parse("geography"),
            DeclaredType::Other("geography".to_string())
        );
    }

    #[test]
    fn test_string_accepts_anything() {
        let declared = DeclaredType::String;
        assert!(declared.is_compatible(&ParamValue::Int(5)));
        assert!(declared.is_compatible(&ParamValue::Bool(true)));
        assert!(declared.is_compatible(&ParamValue::Guid(Uuid::nil())));
    }

    #[test]
    fn test_int_requires_exact_match() {
        let declared = DeclaredType::Int;
        assert!(declared.is_compatible(&ParamValue::Int(5)));
        assert!(!declared.is_compatible(&ParamValue::Long(5)));
        assert!(!declared.is_compatible(&ParamValue::String("5".to_string())));
    }

    #[test]
    fn test_long_accepts_int() {
        let declared = DeclaredType::Long;
        assert!(declared.is_compatible(&ParamValue::Int(5)));
        assert!(declared.is_compatible(&ParamValue::Long(5)));
        assert!(!declared.is_compatible(&ParamValue::Double(5.0)));
    }

    #[test]
    fn test_datetimeoffset_accepts_datetime() {
        let declared = DeclaredType::DateTimeOffset;
        let naive = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert!(declared.is_compatible(&ParamValue::DateTime(naive)));
        assert!(declared.is_compatible(&ParamValue::DateTimeOffset(Utc::now())));
        assert!(!declared.is_compatible(&ParamValue::Duration(chrono::Duration::hours(1))));
    }

    #[test]
    fn test_unknown_type_always_compatible() {
        let declared = DeclaredType::parse("hierarchyid");
        assert!(declared.is_compatible(&ParamValue::Bool(false)));
        assert!(declared.is_compatible(&ParamValue::String("x".to_string())));
    }

    #[test]
    fn test_null_always_compatible() {
        assert!(DeclaredType::Int.is_compatible(&ParamValue::Null));
        assert!(DeclaredType::Guid.is_compatible(&ParamValue::Null));
    }
}
