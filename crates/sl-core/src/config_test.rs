use super::*;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("environments: {}").unwrap();
    assert_eq!(config.default_migration_table, "phinxlog");
    assert_eq!(config.version_order, VersionOrder::CreationTime);
    assert!(config.default_environment.is_none());
    config.validate().unwrap();
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
default_migration_table: schema_log
default_environment: development
version_order: execution_time
environments:
  development:
    adapter: duckdb
    path: "./dev.duckdb"
    table_prefix: dev_
  testing:
    adapter: sqlite
    path: ":memory:"
    migration_table: test_log
    version_order: creation_time
    dry_run: true
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    config.validate().unwrap();
    assert_eq!(config.environment_names(), vec!["development", "testing"]);

    let dev = config.default_environment().unwrap();
    assert_eq!(dev.adapter, "duckdb");
    assert_eq!(dev.path.as_deref(), Some("./dev.duckdb"));
    assert_eq!(dev.schema_table, "schema_log");
    assert_eq!(dev.version_order, VersionOrder::ExecutionTime);
    assert_eq!(dev.table_prefix.as_deref(), Some("dev_"));
    assert!(dev.uses_table_affixes());
    assert!(!dev.dry_run);

    let testing = config.environment("testing").unwrap();
    assert_eq!(testing.schema_table, "test_log");
    assert_eq!(testing.version_order, VersionOrder::CreationTime);
    assert!(testing.dry_run);
    assert!(!testing.uses_table_affixes());
}

#[test]
fn test_invalid_version_order_rejected() {
    let yaml = r#"
version_order: alphabetical
"#;
    let err = serde_yaml::from_str::<Config>(yaml).unwrap_err();
    assert!(
        err.to_string()
            .contains("Invalid version_order configuration option"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_version_order_from_str() {
    assert_eq!(
        "creation_time".parse::<VersionOrder>().unwrap(),
        VersionOrder::CreationTime
    );
    assert_eq!(
        "execution_time".parse::<VersionOrder>().unwrap(),
        VersionOrder::ExecutionTime
    );
    let err = "whenever".parse::<VersionOrder>().unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_version_order_order_by() {
    assert_eq!(VersionOrder::CreationTime.order_by(), "version ASC");
    assert_eq!(
        VersionOrder::ExecutionTime.order_by(),
        "start_time ASC, version ASC"
    );
    assert_eq!(VersionOrder::ExecutionTime.to_string(), "execution_time");
}

#[test]
fn test_unknown_environment() {
    let config = Config::default();
    let err = config.environment("invalidenv").unwrap_err();
    assert_eq!(
        err.to_string(),
        "[C002] The environment \"invalidenv\" does not exist"
    );
}

#[test]
fn test_environment_without_adapter() {
    let yaml = r#"
environments:
  production:
    path: prod.duckdb
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let err = config.environment("production").unwrap_err();
    assert!(matches!(err, CoreError::MissingAdapter { ref name } if name == "production"));
}

#[test]
fn test_unknown_default_environment_fails_validation() {
    let yaml = r#"
default_environment: staging
environments:
  production:
    adapter: duckdb
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("staging"));
}

#[test]
fn test_unknown_fields_rejected() {
    let yaml = r#"
environments:
  production:
    adapter: duckdb
    wrapper: proxy
"#;
    assert!(serde_yaml::from_str::<Config>(yaml).is_err());
}

#[test]
fn test_empty_affixes_are_not_in_use() {
    let options = AdapterOptions::new("duckdb")
        .with_table_affixes(Some(String::new()), None);
    assert!(!options.uses_table_affixes());
}
