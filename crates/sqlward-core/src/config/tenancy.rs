//! Tenant column mapping.
//!
//! The [`TenantColumnMap`] is the authoritative source of which tables
//! require tenant isolation. Tables absent from the map are not scoped —
//! there is nothing to scope them by — so the map must list every
//! multi-tenant table the upstream translation step can reference.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::ConfigError;

/// Static mapping from table name to tenant column name, case-insensitive.
///
/// Loaded once at startup, read-only thereafter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantColumnMap {
    /// Table name -> tenant column name.
    #[serde(default)]
    tables: HashMap<String, String>,
}

impl TenantColumnMap {
    /// Build a map from `(table, tenant column)` pairs.
    pub fn from_pairs<I, S, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<String>,
    {
        Self {
            tables: pairs
                .into_iter()
                .map(|(t, c)| {
                    let table: String = t.into();
                    (table.to_ascii_lowercase(), c.into())
                })
                .collect(),
        }
    }

    /// Load the mapping from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse the mapping from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let raw: TenantColumnMap = serde_yaml::from_str(content)?;
        // Normalize keys so lookups are case-insensitive.
        Ok(Self::from_pairs(raw.tables))
    }

    /// Register one table. Intended for construction at startup; the map is
    /// not mutated once the pipeline is running.
    pub fn with_table(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        let table: String = table.into();
        self.tables.insert(table.to_ascii_lowercase(), column.into());
        self
    }

    /// The tenant column for a table, or `None` if the table requires no
    /// isolation.
    pub fn tenant_column(&self, table: &str) -> Option<&str> {
        self.tables
            .get(&table.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Whether the table requires tenant isolation.
    pub fn requires_isolation(&self, table: &str) -> bool {
        self.tenant_column(table).is_some()
    }

    /// All mapped table names (lowercased form).
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Number of mapped tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no tables are mapped.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let map = TenantColumnMap::default().with_table("Users", "TenantId");
        assert_eq!(map.tenant_column("users"), Some("TenantId"));
        assert_eq!(map.tenant_column("USERS"), Some("TenantId"));
        assert_eq!(map.tenant_column("Users"), Some("TenantId"));
    }

    #[test]
    fn test_unmapped_table_requires_no_isolation() {
        let map = TenantColumnMap::default().with_table("orders", "tenant_id");
        assert!(map.requires_isolation("orders"));
        assert!(!map.requires_isolation("products"));
        assert_eq!(map.tenant_column("products"), None);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
tables:
  Users: TenantId
  Orders: TenantId
  Invoices: OrgId
"#;
        let map = TenantColumnMap::from_yaml(yaml).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.tenant_column("users"), Some("TenantId"));
        assert_eq!(map.tenant_column("INVOICES"), Some("OrgId"));
    }
}
