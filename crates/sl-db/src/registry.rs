//! Engine registry: adapter names to factory functions

use crate::error::{DbError, DbResult};
use crate::traits::Adapter;
use crate::{DuckDbAdapter, SqliteAdapter};
use sl_core::{AdapterOptions, SharedOutput};
use std::collections::HashMap;

/// Builds an unconnected adapter from resolved options
pub type AdapterFactory = fn(AdapterOptions, SharedOutput) -> DbResult<Box<dyn Adapter>>;

/// Table of available engines. Passed explicitly wherever adapters are built.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    factories: HashMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `duckdb` and `sqlite` engines
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(crate::duckdb::ADAPTER_TYPE, DuckDbAdapter::factory);
        registry.register(crate::sqlite::ADAPTER_TYPE, SqliteAdapter::factory);
        registry
    }

    /// Register `factory` under `name`, replacing any previous entry
    pub fn register(&mut self, name: impl Into<String>, factory: AdapterFactory) {
        let name = name.into();
        log::debug!("Registering adapter {name}");
        self.factories.insert(name, factory);
    }

    /// Whether `name` is registered
    pub fn has(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build an adapter for `name`
    pub fn create(
        &self,
        name: &str,
        options: AdapterOptions,
        output: SharedOutput,
    ) -> DbResult<Box<dyn Adapter>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            DbError::ConfigurationError(format!("Adapter \"{name}\" has not been registered"))
        })?;
        factory(options, output)
    }
}
