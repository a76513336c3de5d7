//! Shared serde default helpers for configuration types.

/// The schema log table name used when none is configured.
pub(crate) const DEFAULT_MIGRATION_TABLE: &str = "phinxlog";

pub(crate) fn default_migration_table() -> String {
    DEFAULT_MIGRATION_TABLE.to_string()
}
