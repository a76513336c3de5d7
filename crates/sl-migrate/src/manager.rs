//! Migration manager: validates a migration set and applies what is pending

use crate::environment::Environment;
use crate::error::{MigrateError, MigrateResult};
use crate::migration::Migration;
use chrono::NaiveDateTime;
use sl_core::{Output, VersionOrder};
use sl_db::value::TIMESTAMP_FORMAT;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Instant;

/// Where a migration stands relative to the schema log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    /// Known and applied
    Up,
    /// Known, not applied
    Down,
    /// Applied, but no longer known
    Missing,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad, not write_str, so width specifiers apply
        f.pad(match self {
            MigrationState::Up | MigrationState::Missing => "up",
            MigrationState::Down => "down",
        })
    }
}

/// One line of a status report
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationStatus {
    pub version: i64,
    pub name: Option<String>,
    pub state: MigrationState,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
}

/// Status exit code when logged migrations are unknown
pub const EXIT_STATUS_MISSING: i32 = 2;
/// Status exit code when known migrations are pending
pub const EXIT_STATUS_DOWN: i32 = 3;

/// Worst state across a status report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverallStatus {
    /// Every known migration is applied and every logged one is known
    #[default]
    UpToDate,
    /// At least one known migration is pending
    Down,
    /// At least one logged migration is unknown; outranks `Down`
    Missing,
}

impl OverallStatus {
    pub fn from_statuses(statuses: &[MigrationStatus]) -> Self {
        let has = |state: MigrationState| statuses.iter().any(|s| s.state == state);
        if has(MigrationState::Missing) {
            OverallStatus::Missing
        } else if has(MigrationState::Down) {
            OverallStatus::Down
        } else {
            OverallStatus::UpToDate
        }
    }

    /// Process exit code for a status command
    pub fn exit_code(self) -> i32 {
        match self {
            OverallStatus::UpToDate => 0,
            OverallStatus::Missing => EXIT_STATUS_MISSING,
            OverallStatus::Down => EXIT_STATUS_DOWN,
        }
    }
}

/// What [`Manager::print_status`] printed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusReport {
    pub statuses: Vec<MigrationStatus>,
    pub overall: OverallStatus,
}

/// An ordered, validated set of migrations
pub struct Manager {
    migrations: Vec<Box<dyn Migration>>,
}

impl Manager {
    /// Validate and sort `migrations` by version.
    ///
    /// Versions and names must both be unique.
    pub fn new(mut migrations: Vec<Box<dyn Migration>>) -> MigrateResult<Self> {
        migrations.sort_by_key(|m| m.version());

        for pair in migrations.windows(2) {
            if pair[0].version() == pair[1].version() {
                return Err(MigrateError::DuplicateVersion {
                    version: pair[0].version(),
                    first: pair[0].name().to_string(),
                    second: pair[1].name().to_string(),
                });
            }
        }

        let mut seen: HashMap<&str, i64> = HashMap::new();
        for migration in &migrations {
            if let Some(first) = seen.insert(migration.name(), migration.version()) {
                return Err(MigrateError::DuplicateName {
                    name: migration.name().to_string(),
                    first,
                    second: migration.version(),
                });
            }
        }

        Ok(Self { migrations })
    }

    /// Migrations in ascending version order
    pub fn migrations(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    /// Status of every logged and every known migration: log entries first,
    /// in log order, then pending migrations by version
    pub fn status(&self, env: &mut Environment) -> MigrateResult<Vec<MigrationStatus>> {
        let known: HashMap<i64, &dyn Migration> =
            self.migrations().map(|m| (m.version(), m)).collect();
        let log = env.get_version_log()?;
        let applied: HashSet<i64> = log.iter().map(|r| r.version).collect();

        let mut statuses: Vec<MigrationStatus> = log
            .into_iter()
            .map(|record| {
                let migration = known.get(&record.version);
                MigrationStatus {
                    version: record.version,
                    name: migration
                        .map(|m| m.name().to_string())
                        .or(record.migration_name),
                    state: if migration.is_some() {
                        MigrationState::Up
                    } else {
                        MigrationState::Missing
                    },
                    start_time: record.start_time,
                    end_time: record.end_time,
                }
            })
            .collect();

        statuses.extend(
            self.migrations()
                .filter(|m| !applied.contains(&m.version()))
                .map(|m| MigrationStatus {
                    version: m.version(),
                    name: Some(m.name().to_string()),
                    state: MigrationState::Down,
                    start_time: None,
                    end_time: None,
                }),
        );
        Ok(statuses)
    }

    /// Write the status table to the environment's output.
    ///
    /// The bracketed header column is the one the log is sorted by. With no
    /// known migrations only a hint is printed and the report is empty.
    pub fn print_status(&self, env: &mut Environment) -> MigrateResult<StatusReport> {
        let output = env.output();
        if self.migrations.is_empty() {
            output.writeln(NO_MIGRATIONS);
            return Ok(StatusReport::default());
        }

        let statuses = self.status(env)?;
        let header = status_header(env.config().version_order);
        output.writeln(header);
        output.writeln(&"-".repeat(header.len()));
        for status in &statuses {
            output.writeln(&status_line(status));
        }

        let overall = OverallStatus::from_statuses(&statuses);
        Ok(StatusReport { statuses, overall })
    }

    /// Apply pending migrations up to and including `target` (all when
    /// `None`), in version order. Stops at the first failure.
    pub fn migrate(&self, env: &mut Environment, target: Option<i64>) -> MigrateResult<Vec<i64>> {
        let applied: HashSet<i64> = env.get_versions()?.into_iter().collect();
        let output = env.output();
        let mut done = Vec::new();

        for migration in self.migrations() {
            if target.is_some_and(|t| migration.version() > t) {
                break;
            }
            if applied.contains(&migration.version()) {
                continue;
            }

            output.writeln(&format!(
                " == {} {}: migrating",
                migration.version(),
                migration.name()
            ));
            let started = Instant::now();
            env.execute_migration(migration)?;
            output.writeln(&format!(
                " == {} {}: migrated {:.4}s",
                migration.version(),
                migration.name(),
                started.elapsed().as_secs_f64()
            ));
            done.push(migration.version());
        }

        if done.is_empty() {
            log::info!("No pending migrations for environment {}", env.name());
        }
        Ok(done)
    }
}

const NO_MIGRATIONS: &str =
    "There are no available migrations. Try creating one using the create command.";

fn status_header(order: VersionOrder) -> &'static str {
    match order {
        VersionOrder::CreationTime => {
            " Status  [Migration ID]  Started              Finished             Migration Name "
        }
        VersionOrder::ExecutionTime => {
            " Status  Migration ID    [Started          ]  Finished             Migration Name "
        }
    }
}

fn status_line(status: &MigrationStatus) -> String {
    let stamp = |t: Option<NaiveDateTime>| {
        t.map_or(String::new(), |t| t.format(TIMESTAMP_FORMAT).to_string())
    };
    let mut line = format!(
        "{:>6}  {}  {:19}  {:19}  {}",
        status.state,
        status.version,
        stamp(status.start_time),
        stamp(status.end_time),
        status.name.as_deref().unwrap_or("")
    );
    if status.state == MigrationState::Missing {
        line.push_str("  ** MISSING **");
    }
    line
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod tests;
