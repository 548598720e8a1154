//! Resolver configuration loading and validation

use crate::cache::{SnapshotCache, DEFAULT_MAX_ENTRIES};
use crate::error::{AuthzError, Result};
use crate::roles::ROLES_CONFIG_KEY;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Policy configuration entry holding the role list
    #[serde(default = "default_roles_config_key")]
    pub roles_config_key: String,

    /// Attribute naming a resource's parent in the sub-resource view
    #[serde(default = "default_parent_attribute")]
    pub parent_attribute: String,

    /// Sort every resolved forest by sort index
    #[serde(default = "default_true")]
    pub sort_output: bool,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheSection {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_true() -> bool { true }
fn default_roles_config_key() -> String { ROLES_CONFIG_KEY.to_string() }
fn default_parent_attribute() -> String { "parent".to_string() }
fn default_max_entries() -> usize { DEFAULT_MAX_ENTRIES }
fn default_log_level() -> String { "info".to_string() }

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            roles_config_key: default_roles_config_key(),
            parent_attribute: default_parent_attribute(),
            sort_output: true,
            cache: CacheSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;

        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text; missing entries take defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| AuthzError::Config(e.to_string()))
    }

    /// Empty snapshot cache sized by `[cache] max_entries`
    pub fn snapshot_cache(&self) -> SnapshotCache {
        SnapshotCache::new(self.cache.max_entries)
    }

    /// Reject settings the resolver cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.roles_config_key.trim().is_empty() {
            return Err(AuthzError::Config("roles_config_key must not be empty".into()));
        }

        if self.parent_attribute.trim().is_empty() {
            return Err(AuthzError::Config("parent_attribute must not be empty".into()));
        }

        if self.cache.max_entries == 0 {
            return Err(AuthzError::Config("cache.max_entries must be at least 1".into()));
        }

        Ok(())
    }
}
