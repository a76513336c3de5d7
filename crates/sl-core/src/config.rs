//! Configuration types for migration environments
//!
//! Loading these from a file is left to the caller; every type here derives
//! `Deserialize` so any serde format can produce them.

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_migration_table;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Top-level configuration holding every named environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Schema log table used by environments that don't override it
    #[serde(default = "default_migration_table")]
    pub default_migration_table: String,

    /// Environment used when the caller doesn't name one
    #[serde(default)]
    pub default_environment: Option<String>,

    /// Sort policy for the schema log
    #[serde(default)]
    pub version_order: VersionOrder,

    /// Named environments (e.g., development, production)
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
}

/// Per-environment connection and behaviour settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Engine identifier resolved through the adapter registry
    #[serde(default)]
    pub adapter: Option<String>,

    /// Database file path (`:memory:` for an in-memory database)
    #[serde(default)]
    pub path: Option<String>,

    /// Server host for networked engines
    #[serde(default)]
    pub host: Option<String>,

    /// Server port for networked engines
    #[serde(default)]
    pub port: Option<u16>,

    /// Database name
    #[serde(default)]
    pub name: Option<String>,

    /// Connection user
    #[serde(default)]
    pub user: Option<String>,

    /// Connection password
    #[serde(default)]
    pub pass: Option<String>,

    /// Schema log table override
    #[serde(default)]
    pub migration_table: Option<String>,

    /// Version order override
    #[serde(default)]
    pub version_order: Option<VersionOrder>,

    /// Prefix applied to table names by the table-prefix decorator
    #[serde(default)]
    pub table_prefix: Option<String>,

    /// Suffix applied to table names by the table-prefix decorator
    #[serde(default)]
    pub table_suffix: Option<String>,

    /// Report statements instead of executing them
    #[serde(default)]
    pub dry_run: bool,
}

/// Sort policy for the schema log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum VersionOrder {
    /// Order by migration version (the version encodes creation time)
    #[default]
    CreationTime,
    /// Order by the time each migration actually started
    ExecutionTime,
}

impl VersionOrder {
    /// Configuration spelling of this order
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionOrder::CreationTime => "creation_time",
            VersionOrder::ExecutionTime => "execution_time",
        }
    }

    /// `ORDER BY` clause for reading the schema log in this order
    pub fn order_by(&self) -> &'static str {
        match self {
            VersionOrder::CreationTime => "version ASC",
            VersionOrder::ExecutionTime => "start_time ASC, version ASC",
        }
    }
}

impl std::fmt::Display for VersionOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "creation_time" => Ok(VersionOrder::CreationTime),
            "execution_time" => Ok(VersionOrder::ExecutionTime),
            other => Err(CoreError::ConfigInvalid {
                message: format!(
                    "Invalid version_order configuration option '{}'. Valid values: creation_time, execution_time",
                    other
                ),
            }),
        }
    }
}

impl TryFrom<String> for VersionOrder {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        value.parse()
    }
}

/// Resolved, adapter-facing view of one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Engine identifier
    pub adapter: String,
    /// Database file path
    pub path: Option<String>,
    /// Server host
    pub host: Option<String>,
    /// Server port
    pub port: Option<u16>,
    /// Database name
    pub name: Option<String>,
    /// Connection user
    pub user: Option<String>,
    /// Connection password
    pub pass: Option<String>,
    /// Schema log table name
    pub schema_table: String,
    /// Sort policy for the schema log
    pub version_order: VersionOrder,
    /// Table name prefix for the table-prefix decorator
    pub table_prefix: Option<String>,
    /// Table name suffix for the table-prefix decorator
    pub table_suffix: Option<String>,
    /// Report statements instead of executing them
    pub dry_run: bool,
}

impl AdapterOptions {
    /// Options for `adapter` with every other setting at its default
    pub fn new(adapter: impl Into<String>) -> Self {
        Self {
            adapter: adapter.into(),
            path: None,
            host: None,
            port: None,
            name: None,
            user: None,
            pass: None,
            schema_table: default_migration_table(),
            version_order: VersionOrder::default(),
            table_prefix: None,
            table_suffix: None,
            dry_run: false,
        }
    }

    /// Set the database file path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the schema log table name
    pub fn with_schema_table(mut self, table: impl Into<String>) -> Self {
        self.schema_table = table.into();
        self
    }

    /// Set the version order
    pub fn with_version_order(mut self, order: VersionOrder) -> Self {
        self.version_order = order;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the table prefix and suffix used by the table-prefix decorator
    pub fn with_table_affixes(mut self, prefix: Option<String>, suffix: Option<String>) -> Self {
        self.table_prefix = prefix;
        self.table_suffix = suffix;
        self
    }

    /// Returns `true` when a non-empty table prefix or suffix is configured
    pub fn uses_table_affixes(&self) -> bool {
        self.table_prefix.as_deref().is_some_and(|p| !p.is_empty())
            || self.table_suffix.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.default_migration_table.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "default_migration_table cannot be empty".to_string(),
            });
        }

        if let Some(default) = &self.default_environment {
            if !self.environments.contains_key(default) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "default_environment '{}' is not a configured environment. Available environments: {}",
                        default,
                        self.environment_names().join(", ")
                    ),
                });
            }
        }

        for (name, env) in &self.environments {
            if let Some(table) = &env.migration_table {
                if table.trim().is_empty() {
                    return Err(CoreError::ConfigInvalid {
                        message: format!("migration_table for environment '{}' cannot be empty", name),
                    });
                }
            }
        }

        Ok(())
    }

    /// Sorted names of all configured environments
    pub fn environment_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.environments.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get the raw configuration of a named environment
    pub fn get_environment(&self, name: &str) -> CoreResult<&EnvironmentConfig> {
        self.environments
            .get(name)
            .ok_or_else(|| CoreError::EnvironmentNotFound {
                name: name.to_string(),
            })
    }

    /// Resolve a named environment into adapter options.
    ///
    /// Environment-level settings take precedence over the top-level
    /// defaults. An environment without an `adapter` is rejected.
    pub fn environment(&self, name: &str) -> CoreResult<AdapterOptions> {
        let env = self.get_environment(name)?;
        let adapter = env
            .adapter
            .clone()
            .filter(|a| !a.is_empty())
            .ok_or_else(|| CoreError::MissingAdapter {
                name: name.to_string(),
            })?;

        Ok(AdapterOptions {
            adapter,
            path: env.path.clone(),
            host: env.host.clone(),
            port: env.port,
            name: env.name.clone(),
            user: env.user.clone(),
            pass: env.pass.clone(),
            schema_table: env
                .migration_table
                .clone()
                .unwrap_or_else(|| self.default_migration_table.clone()),
            version_order: env.version_order.unwrap_or(self.version_order),
            table_prefix: env.table_prefix.clone(),
            table_suffix: env.table_suffix.clone(),
            dry_run: env.dry_run,
        })
    }

    /// Resolve the default environment into adapter options
    pub fn default_environment(&self) -> CoreResult<AdapterOptions> {
        let name = self
            .default_environment
            .as_deref()
            .ok_or_else(|| CoreError::ConfigInvalid {
                message: "No default_environment configured".to_string(),
            })?;
        self.environment(name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_migration_table: default_migration_table(),
            default_environment: None,
            version_order: VersionOrder::default(),
            environments: HashMap::new(),
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
