use super::*;
use crate::migration::MigrationContext;
use sl_core::{AdapterOptions, BufferedOutput, NullOutput, VersionOrder};
use sl_db::testing::{Call, RecordingAdapter};
use sl_db::MigrationRecord;
use std::rc::Rc;

struct Named {
    version: i64,
    name: &'static str,
    fail: bool,
}

impl Migration for Named {
    fn version(&self) -> i64 {
        self.version
    }

    fn name(&self) -> &str {
        self.name
    }

    fn up(&self, ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
        if self.fail {
            return Err(MigrateError::Failed(format!("{} refused", self.name)));
        }
        ctx.execute(&format!("-- {}", self.name))?;
        Ok(())
    }
}

fn migration(version: i64, name: &'static str) -> Box<dyn Migration> {
    Box::new(Named {
        version,
        name,
        fail: false,
    })
}

fn failing(version: i64, name: &'static str) -> Box<dyn Migration> {
    Box::new(Named {
        version,
        name,
        fail: true,
    })
}

fn logged(version: i64, name: &str, start: &str, end: &str) -> MigrationRecord {
    MigrationRecord::new(
        version,
        name,
        sl_db::value::parse_timestamp(start).unwrap(),
        sl_db::value::parse_timestamp(end).unwrap(),
    )
}

fn env_with(adapter: RecordingAdapter, output: Rc<BufferedOutput>) -> Environment {
    let mut env = Environment::new("mockenv", AdapterOptions::new("recording"), output);
    env.set_adapter(Box::new(adapter));
    env
}

fn recording() -> RecordingAdapter {
    RecordingAdapter::new(AdapterOptions::new("recording"), NullOutput::shared())
}

#[test]
fn test_migrations_are_sorted_by_version() {
    let manager = Manager::new(vec![
        migration(20120116183504, "TestMigration2"),
        migration(20120111235330, "TestMigration"),
    ])
    .unwrap();
    let versions: Vec<i64> = manager.migrations().map(|m| m.version()).collect();
    assert_eq!(versions, vec![20120111235330, 20120116183504]);
}

#[test]
fn test_duplicate_versions_are_rejected() {
    let err = Manager::new(vec![
        migration(20120111235330, "TestMigration"),
        migration(20120111235330, "TestMigration2"),
    ])
    .err()
    .unwrap();
    assert!(matches!(
        err,
        MigrateError::DuplicateVersion {
            version: 20120111235330,
            ..
        }
    ));
    assert!(err.to_string().contains("has the same version as"));
}

#[test]
fn test_duplicate_names_are_rejected() {
    let err = Manager::new(vec![
        migration(20120111235330, "CreateUsers"),
        migration(20120116183504, "CreateUsers"),
    ])
    .err()
    .unwrap();
    match err {
        MigrateError::DuplicateName {
            name,
            first,
            second,
        } => {
            assert_eq!(name, "CreateUsers");
            assert_eq!(first, 20120111235330);
            assert_eq!(second, 20120116183504);
        }
        other => panic!("expected DuplicateName, got {other:?}"),
    }
}

#[test]
fn test_status_all_up() {
    let manager = Manager::new(vec![
        migration(20120111235330, "TestMigration"),
        migration(20120116183504, "TestMigration2"),
    ])
    .unwrap();
    let output = Rc::new(BufferedOutput::new());
    let adapter = recording().with_records(vec![
        logged(20120111235330, "", "2012-01-11 23:53:36", "2012-01-11 23:53:37"),
        logged(20120116183504, "", "2012-01-16 18:35:40", "2012-01-16 18:35:41"),
    ]);
    let mut env = env_with(adapter, output.clone());

    let report = manager.print_status(&mut env).unwrap();
    assert!(report.statuses.iter().all(|s| s.state == MigrationState::Up));
    assert_eq!(report.overall, OverallStatus::UpToDate);
    assert_eq!(report.overall.exit_code(), 0);

    let text = output.contents();
    assert!(text.contains(
        "up  20120111235330  2012-01-11 23:53:36  2012-01-11 23:53:37  TestMigration\n"
    ));
    assert!(text.contains(
        "up  20120116183504  2012-01-16 18:35:40  2012-01-16 18:35:41  TestMigration2\n"
    ));
}

#[test]
fn test_status_missing_entries_precede_down_entries() {
    let manager = Manager::new(vec![
        migration(20120111235330, "TestMigration"),
        migration(20120116183504, "TestMigration2"),
    ])
    .unwrap();
    let output = Rc::new(BufferedOutput::new());
    let adapter = recording().with_records(vec![
        logged(20120103083300, "", "2012-01-11 23:53:36", "2012-01-11 23:53:37"),
        logged(20120815145812, "Example", "2012-01-16 18:35:40", "2012-01-16 18:35:41"),
    ]);
    let mut env = env_with(adapter, output.clone());

    let report = manager.print_status(&mut env).unwrap();
    let states: Vec<(i64, MigrationState)> =
        report.statuses.iter().map(|s| (s.version, s.state)).collect();
    assert_eq!(
        states,
        vec![
            (20120103083300, MigrationState::Missing),
            (20120815145812, MigrationState::Missing),
            (20120111235330, MigrationState::Down),
            (20120116183504, MigrationState::Down),
        ]
    );

    // missing outranks down
    assert_eq!(report.overall, OverallStatus::Missing);
    assert_eq!(report.overall.exit_code(), EXIT_STATUS_MISSING);

    // header and rule, then one line per entry
    let lines: Vec<String> = output.contents().lines().map(str::to_string).collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[2].ends_with("  ** MISSING **"));
    assert!(lines[3].contains("Example"));
    assert!(lines[3].ends_with("  ** MISSING **"));
    assert_eq!(
        lines[4].trim_end(),
        format!("  down  20120111235330  {:19}  {:19}  TestMigration", "", "")
    );
}

#[test]
fn test_status_with_nothing_known_or_logged() {
    let manager = Manager::new(Vec::new()).unwrap();
    let output = Rc::new(BufferedOutput::new());
    let mut env = env_with(recording(), output.clone());
    assert_eq!(manager.print_status(&mut env).unwrap(), StatusReport::default());
    assert_eq!(
        output.contents(),
        "There are no available migrations. Try creating one using the create command.\n"
    );
}

#[test]
fn test_status_header_follows_version_order() {
    let cases = [
        (
            VersionOrder::CreationTime,
            " Status  [Migration ID]  Started              Finished             Migration Name ",
        ),
        (
            VersionOrder::ExecutionTime,
            " Status  Migration ID    [Started          ]  Finished             Migration Name ",
        ),
    ];
    for (order, header) in cases {
        let manager = Manager::new(vec![migration(20120111235330, "TestMigration")]).unwrap();
        let output = Rc::new(BufferedOutput::new());
        let options = AdapterOptions::new("recording").with_version_order(order);
        let adapter = RecordingAdapter::new(options.clone(), NullOutput::shared());
        let mut env = Environment::new("mockenv", options, output.clone());
        env.set_adapter(Box::new(adapter));

        let report = manager.print_status(&mut env).unwrap();
        assert_eq!(report.overall, OverallStatus::Down);
        assert_eq!(report.overall.exit_code(), EXIT_STATUS_DOWN);

        let text = output.contents();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(header));
        assert_eq!(lines.next(), Some("-".repeat(header.len()).as_str()));
    }
}

#[test]
fn test_migrate_applies_pending_in_order() {
    let manager = Manager::new(vec![
        migration(3, "Third"),
        migration(1, "First"),
        migration(2, "Second"),
    ])
    .unwrap();
    let output = Rc::new(BufferedOutput::new());
    let adapter = recording().with_records(vec![logged(
        1,
        "First",
        "2012-01-11 23:53:36",
        "2012-01-11 23:53:37",
    )]);
    let calls = adapter.calls();
    let mut env = env_with(adapter, output.clone());

    assert_eq!(manager.migrate(&mut env, None).unwrap(), vec![2, 3]);
    assert_eq!(env.get_current_version().unwrap(), 3);

    let migrated: Vec<i64> = calls
        .borrow()
        .iter()
        .filter_map(|c| match c {
            Call::Migrated { version, .. } => Some(*version),
            _ => None,
        })
        .collect();
    assert_eq!(migrated, vec![2, 3]);

    let text = output.contents();
    assert!(text.contains(" == 2 Second: migrating\n"));
    assert!(text.contains(" == 3 Third: migrated "));
    assert!(!text.contains("First"));
}

#[test]
fn test_migrate_respects_target() {
    let manager = Manager::new(vec![
        migration(1, "First"),
        migration(2, "Second"),
        migration(3, "Third"),
    ])
    .unwrap();
    let mut env = env_with(recording(), Rc::new(BufferedOutput::new()));
    assert_eq!(manager.migrate(&mut env, Some(2)).unwrap(), vec![1, 2]);
    assert_eq!(manager.migrate(&mut env, Some(2)).unwrap(), Vec::<i64>::new());
    assert_eq!(manager.migrate(&mut env, None).unwrap(), vec![3]);
}

#[test]
fn test_migrate_stops_at_first_failure() {
    let manager = Manager::new(vec![
        migration(1, "First"),
        failing(2, "Second"),
        migration(3, "Third"),
    ])
    .unwrap();
    let adapter = recording();
    let records = adapter.records();
    let mut env = env_with(adapter, Rc::new(BufferedOutput::new()));

    match manager.migrate(&mut env, None) {
        Err(MigrateError::Failed(message)) => assert_eq!(message, "Second refused"),
        other => panic!("expected the migration's own error, got {other:?}"),
    }
    let versions: Vec<i64> = records.borrow().iter().map(|r| r.version).collect();
    assert_eq!(versions, vec![1]);
}
