//! Integration tests for Configuration System

use crate::integration::test_utils::with_isolated_env;
use gatehouse::config::{ConfigLoader, GatehouseConfig, QueueConfig};
use gatehouse::session::OperatorSession;
use gatehouse::clock::ManualClock;
use gatehouse::types::Requester;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn write_workspace_file(root: &std::path::Path, name: &str, body: &str) {
    let dir = root.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), body).unwrap();
}

#[test]
fn test_empty_workspace_loads_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    std::fs::create_dir_all(&workspace).unwrap();

    let config = with_isolated_env(&temp_dir, &[], || ConfigLoader::load(&workspace).unwrap());
    assert_eq!(config, GatehouseConfig::default());
}

#[test]
fn test_workspace_and_env_files_layer() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    write_workspace_file(
        &workspace,
        "config.toml",
        r#"
[queue]
auto_approve_seconds = 90
retry_attempts = 4

[logging]
level = "debug"
"#,
    );
    write_workspace_file(
        &workspace,
        "night.toml",
        r#"
[queue]
auto_approve_enabled = false
"#,
    );

    let config = with_isolated_env(&temp_dir, &[("GATEHOUSE_ENV", "night")], || {
        ConfigLoader::load(&workspace).unwrap()
    });
    assert_eq!(config.queue.auto_approve_seconds, 90);
    assert_eq!(config.queue.retry_attempts, 4);
    assert!(!config.queue.auto_approve_enabled);
    assert_eq!(config.queue.batch_check_interval_secs, 10);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_environment_variables_override_files() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    write_workspace_file(
        &workspace,
        "config.toml",
        r#"
[queue]
auto_approve_seconds = 90
"#,
    );

    let config = with_isolated_env(
        &temp_dir,
        &[("GATEHOUSE__QUEUE__AUTO_APPROVE_SECONDS", "30")],
        || ConfigLoader::load(&workspace).unwrap(),
    );
    assert_eq!(config.queue.auto_approve_after(), Duration::from_secs(30));
}

#[test]
fn test_global_file_sits_below_workspace() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    write_workspace_file(
        &workspace,
        "config.toml",
        r#"
[queue]
retry_attempts = 2
"#,
    );

    let config = with_isolated_env(&temp_dir, &[], || {
        let global = ConfigLoader::global_config_path().unwrap();
        std::fs::create_dir_all(global.parent().unwrap()).unwrap();
        std::fs::write(
            &global,
            r#"
[queue]
retry_attempts = 7
terminal_retention_secs = 600
"#,
        )
        .unwrap();
        ConfigLoader::load(&workspace).unwrap()
    });
    assert_eq!(config.queue.retry_attempts, 2);
    assert_eq!(config.queue.terminal_retention_secs, 600);
}

#[test]
fn test_load_from_file_requires_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.toml");
    assert!(ConfigLoader::load_from_file(&missing).is_err());

    let file = temp_dir.path().join("gatehouse.toml");
    std::fs::write(
        &file,
        r#"
[queue]
retry_backoff_ms = 250
"#,
    )
    .unwrap();
    let config = ConfigLoader::load_from_file(&file).unwrap();
    assert_eq!(config.queue.retry_policy().backoff, Duration::from_millis(250));
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_values_fail_validation() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("gatehouse.toml");
    std::fs::write(
        &file,
        r#"
[queue]
retry_attempts = 0

[logging]
format = "yaml"
"#,
    )
    .unwrap();
    let config = ConfigLoader::load_from_file(&file).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_session_uses_configured_retry_policy() {
    let config = QueueConfig {
        retry_attempts: 1,
        ..QueueConfig::default()
    };
    let session = OperatorSession::new(
        Requester::new("Ana", "ana@example.org"),
        config,
        Arc::new(ManualClock::at_opening()),
    );
    assert_eq!(session.store().retry_policy().attempts, 1);
}
