//! Migration environment
//!
//! An environment is one configured database. It resolves its adapter chain
//! on first use and applies migrations one at a time:
//!
//! 1. note the start time
//! 2. open a transaction if the engine supports one
//! 3. run the migration body
//! 4. commit, then append a row to the schema log
//!
//! A failed body rolls the transaction back and leaves the log untouched.

use crate::error::{MigrateError, MigrateResult};
use crate::migration::{Migration, MigrationContext};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use sl_core::{AdapterOptions, Config, SharedOutput};
use sl_db::{Adapter, AdapterRegistry, MigrationRecord, TimedOutputAdapter};

/// One named database and its adapter chain
pub struct Environment {
    name: String,
    options: AdapterOptions,
    output: SharedOutput,
    registry: AdapterRegistry,
    adapter: Option<Box<dyn Adapter>>,
}

impl Environment {
    pub fn new(name: impl Into<String>, options: AdapterOptions, output: SharedOutput) -> Self {
        Self {
            name: name.into(),
            options,
            output,
            registry: AdapterRegistry::with_defaults(),
            adapter: None,
        }
    }

    /// Environment for `name` as resolved from `config`
    pub fn from_config(config: &Config, name: &str, output: SharedOutput) -> MigrateResult<Self> {
        let options = config.environment(name)?;
        Ok(Self::new(name, options, output))
    }

    /// Replace the engine registry used to build the adapter
    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved adapter options
    pub fn config(&self) -> &AdapterOptions {
        &self.options
    }

    pub fn schema_table_name(&self) -> &str {
        &self.options.schema_table
    }

    pub fn output(&self) -> SharedOutput {
        self.output.clone()
    }

    /// Use a pre-built adapter instead of resolving one from the registry
    pub fn set_adapter(&mut self, adapter: Box<dyn Adapter>) {
        self.adapter = Some(adapter);
    }

    /// The adapter chain, built on first call
    pub fn adapter(&mut self) -> MigrateResult<&mut (dyn Adapter + 'static)> {
        if self.adapter.is_none() {
            self.adapter = Some(self.build_adapter()?);
        }
        match self.adapter.as_deref_mut() {
            Some(adapter) => Ok(adapter),
            None => Err(MigrateError::Config(format!(
                "No adapter is available for environment \"{}\"",
                self.name
            ))),
        }
    }

    fn build_adapter(&self) -> MigrateResult<Box<dyn Adapter>> {
        let engine = self.options.adapter.trim();
        if engine.is_empty() {
            return Err(MigrateError::Config(format!(
                "No adapter was specified for environment: {}",
                self.name
            )));
        }
        // TablePrefixAdapter is only installed explicitly, via set_adapter
        if self.options.uses_table_affixes() {
            return Err(MigrateError::Config(format!(
                "Automatic table prefix/suffix option is no longer supported (environment: {}). \
                 Name tables explicitly in migrations instead",
                self.name
            )));
        }
        log::debug!("Building {engine} adapter for environment {}", self.name);

        let adapter = self
            .registry
            .create(engine, self.options.clone(), self.output.clone())?;
        Ok(Box::new(TimedOutputAdapter::new(adapter)))
    }

    /// Apply one migration and record it in the schema log
    pub fn execute_migration(&mut self, migration: &dyn Migration) -> MigrateResult<()> {
        let version = migration.version();
        let name = migration.name().to_string();
        let adapter = self.adapter()?;

        let start_time = now();
        let transactional = adapter.has_transactions();
        if transactional {
            adapter.begin_transaction()?;
        }
        log::info!("Migrating {version} {name}");

        let applied = {
            let mut ctx = MigrationContext::new(&mut *adapter, version);
            migration.up(&mut ctx)
        };

        if let Err(err) = applied {
            if transactional {
                if let Err(rollback_err) = adapter.rollback_transaction() {
                    log::warn!("Rollback of migration {version} failed: {rollback_err}");
                }
            }
            log::debug!("Migration {version} failed: {err}");
            return Err(err);
        }

        if transactional {
            if let Err(commit_err) = adapter.commit_transaction() {
                if let Err(rollback_err) = adapter.rollback_transaction() {
                    log::warn!("Rollback of migration {version} failed: {rollback_err}");
                }
                return Err(commit_err.into());
            }
        }

        adapter.migrated(version, &name, start_time, now())?;
        log::info!("Migrated {version} {name}");
        Ok(())
    }

    /// Applied versions, in the configured order
    pub fn get_versions(&mut self) -> MigrateResult<Vec<i64>> {
        Ok(self.adapter()?.get_versions()?)
    }

    /// Full schema log, in the configured order
    pub fn get_version_log(&mut self) -> MigrateResult<Vec<MigrationRecord>> {
        Ok(self.adapter()?.get_version_log()?)
    }

    /// Last applied version in the configured order, or `0`. Always read
    /// from the schema log.
    pub fn get_current_version(&mut self) -> MigrateResult<i64> {
        Ok(self.get_versions()?.last().copied().unwrap_or(0))
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(0)
}

#[cfg(test)]
#[path = "environment_test.rs"]
mod tests;
