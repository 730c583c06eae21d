//! Configuration for the Sqlward pipeline.
//!
//! Configuration is loaded once at startup from YAML and is read-only
//! afterwards; no component mutates it at runtime, which is what makes the
//! pipeline safe to share across concurrent requests without locking.
//!
//! # Configuration Files
//!
//! - **tenancy.yaml**: which tables require tenant isolation and through
//!   which column ([`TenantColumnMap`])
//! - **validation.yaml**: tunables for the parameter rule engine
//!   ([`ValidationSettings`])

pub mod settings;
pub mod tenancy;

use thiserror::Error;

pub use settings::ValidationSettings;
pub use tenancy::TenantColumnMap;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
