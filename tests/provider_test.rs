/*!
 * Provider and Configuration Tests
 */

mod common;

use common::{AREA, NAME};
use policy_watch::watcher::config::{ENV_AREA, ENV_INTERVAL_MS, ENV_NAME, ENV_USER};
use policy_watch::{
    ConfigError, FilePolicyProvider, GraphingModeState, LookupFailure, PolicyPath,
    PolicyProvider, PolicyWatcher, UserIdentity, WatcherConfig,
};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_document(path: &Path, contents: &str) {
    std::fs::write(path, contents).unwrap();
}

fn policy_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_file_provider_reads_boolean_and_integer() {
    let file = policy_file(
        r#"{"users": {
            "student": {"Education": {"AllowGraphingCalculator": true}},
            "instructor": {"Education": {"AllowGraphingCalculator": 0}}
        }}"#,
    );
    let provider = FilePolicyProvider::new(file.path());

    assert_eq!(
        provider.get_policy_boolean(&UserIdentity::new("student"), AREA, NAME),
        Ok(true)
    );
    assert_eq!(
        provider.get_policy_boolean(&UserIdentity::new("instructor"), AREA, NAME),
        Ok(false)
    );
}

#[test]
fn test_file_provider_failures() {
    let file = policy_file(r#"{"users": {"student": {"Education": {"AllowGraphingCalculator": "on"}}}}"#);
    let provider = FilePolicyProvider::new(file.path());
    let student = UserIdentity::new("student");

    let err = provider.get_policy_boolean(&student, AREA, NAME).unwrap_err();
    assert!(matches!(err.reason(), LookupFailure::NotBoolean(_)));

    let err = provider.get_policy_boolean(&student, AREA, "Other").unwrap_err();
    assert_eq!(err.reason(), &LookupFailure::NotFound);

    let err = provider
        .get_policy_boolean(&UserIdentity::new(" "), AREA, NAME)
        .unwrap_err();
    assert_eq!(err.reason(), &LookupFailure::InvalidIdentity);

    write_document(file.path(), "{ not json");
    let err = provider.get_policy_boolean(&student, AREA, NAME).unwrap_err();
    assert!(matches!(err.reason(), LookupFailure::Inaccessible(_)));
}

#[test]
fn test_file_provider_sees_edits() {
    let file = policy_file(r#"{"users": {"student": {"Education": {"AllowGraphingCalculator": true}}}}"#);
    let provider = FilePolicyProvider::new(file.path());
    let student = UserIdentity::new("student");
    let path = PolicyPath::new(AREA, NAME);

    assert_eq!(provider.get_policy(&student, &path), Ok(true));
    write_document(
        file.path(),
        r#"{"users": {"student": {"Education": {"AllowGraphingCalculator": false}}}}"#,
    );
    assert_eq!(provider.get_policy(&student, &path), Ok(false));
}

#[tokio::test(start_paused = true)]
async fn test_watcher_over_file_store() {
    let file = policy_file(r#"{"users": {"student": {"Education": {"AllowGraphingCalculator": 1}}}}"#);
    let mut watcher = PolicyWatcher::new(Arc::new(FilePolicyProvider::new(file.path())));
    let mut rx = watcher.receiver();

    watcher
        .start(UserIdentity::new("student"), AREA, NAME, Duration::from_millis(500))
        .unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().state, GraphingModeState::Enabled);

    write_document(
        file.path(),
        r#"{"users": {"student": {"Education": {"AllowGraphingCalculator": false}}}}"#,
    );
    rx.changed().await.unwrap();
    let snap = *rx.borrow_and_update();
    assert_eq!(snap.state, GraphingModeState::Disabled);
    assert_eq!(snap.refreshed_count, 2);

    watcher.shutdown().await.unwrap();
}

fn clear_env() {
    for key in [ENV_USER, ENV_AREA, ENV_NAME, ENV_INTERVAL_MS] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_config_from_env_overrides() {
    clear_env();
    std::env::set_var(ENV_USER, "student");
    std::env::set_var(ENV_AREA, "Lab");
    std::env::set_var(ENV_NAME, "AllowCamera");
    std::env::set_var(ENV_INTERVAL_MS, "250");

    let config = WatcherConfig::from_env().unwrap();
    clear_env();

    assert_eq!(
        config,
        WatcherConfig::new("student", PolicyPath::new("Lab", "AllowCamera"), Duration::from_millis(250))
    );
}

#[test]
#[serial]
fn test_config_from_env_defaults() {
    clear_env();
    std::env::set_var(ENV_USER, "student");

    let config = WatcherConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.policy, PolicyPath::new("Education", "AllowGraphingCalculator"));
    assert_eq!(config.interval, Duration::from_millis(500));
}

#[test]
#[serial]
fn test_config_from_env_rejects_bad_interval() {
    clear_env();
    std::env::set_var(ENV_USER, "student");
    std::env::set_var(ENV_INTERVAL_MS, "0");

    let result = WatcherConfig::from_env();
    clear_env();

    assert!(matches!(result, Err(ConfigError::InvalidInterval(_))));
}
