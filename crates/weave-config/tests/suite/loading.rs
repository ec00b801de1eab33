use std::path::PathBuf;

use weave_config::{ConfigError, PathPolicy, WeaveConfig};

#[test]
fn empty_config_uses_defaults() {
    let config = WeaveConfig::load_from_str("").expect("empty config should parse");
    assert_eq!(config, WeaveConfig::default());
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.stderr);
    assert!(!config.agent.debuglog);
    assert_eq!(config.agent.path_policy, PathPolicy::Absolute);
}

#[test]
fn project_relative_policy_parses() {
    let text = r#"
[logging]
level = "debug"
json = true

[agent]
debuglog = true
path_policy = { kind = "project_relative", root = "/work/app" }
"#;

    let config = WeaveConfig::load_from_str(text).expect("config should parse");
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert!(config.agent.debuglog);
    assert_eq!(
        config.agent.path_policy,
        PathPolicy::ProjectRelative {
            root: PathBuf::from("/work/app")
        }
    );
}

#[test]
fn unknown_keys_are_rejected() {
    let err = WeaveConfig::load_from_str("[agent]\nverbose = true\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "unexpected error: {err:?}");
}

#[test]
fn load_from_path_reads_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("weave.toml");
    std::fs::write(&path, "[logging]\nstderr = false\n").unwrap();

    let config = WeaveConfig::load_from_path(&path).unwrap();
    assert!(!config.logging.stderr);
}

#[test]
fn missing_file_reports_path() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("missing.toml");
    match WeaveConfig::load_from_path(&path) {
        Err(ConfigError::Io { path: reported, .. }) => {
            assert!(reported.ends_with("missing.toml"))
        }
        other => panic!("expected io error, got {other:?}"),
    }
}
