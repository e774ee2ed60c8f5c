use std::env;
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

// Environment variables are process-wide; serialize the tests that touch them.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const ENV_VARS: [&str; 4] = [
    "ZK_SETTINGS_LOCATOR",
    "ZK_SETTINGS_CONNECT_TIMEOUT_MS",
    "ZK_SETTINGS_OPERATION_TIMEOUT_MS",
    "ZK_SETTINGS_PRETTY",
];

/// Test loading configuration from YAML file
#[test]
fn test_load_yaml_config() {
    let yaml = r#"
connect_timeout_ms: 900
operation_timeout_ms: 3000
default_locator: "zk://10.20.30.10:2181,10.20.30.11:2181/testdemo"
pretty: true
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();

    let config = zk_settings::config::load_from_yaml(&config_path).unwrap();

    assert_eq!(config.connect_timeout_ms, 900);
    assert_eq!(config.operation_timeout_ms, 3000);
    assert_eq!(
        config.default_locator,
        Some("zk://10.20.30.10:2181,10.20.30.11:2181/testdemo".to_string())
    );
    assert!(config.pretty);
}

/// Test that an invalid YAML value is rejected with context
#[test]
fn test_load_yaml_rejects_zero_timeout() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, "connect_timeout_ms: 0\n").unwrap();

    assert!(zk_settings::config::load_from_yaml(&config_path).is_err());
}

/// Test missing file
#[test]
fn test_load_yaml_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = zk_settings::config::load_from_yaml(temp_dir.path().join("nope.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

/// Test loading configuration from environment variables
#[test]
fn test_load_env_config() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let saved = save_env();

    env::set_var("ZK_SETTINGS_LOCATOR", "zk://a:2181,b:2181/apps/demo");
    env::set_var("ZK_SETTINGS_CONNECT_TIMEOUT_MS", "250");
    env::set_var("ZK_SETTINGS_OPERATION_TIMEOUT_MS", "1000");
    env::set_var("ZK_SETTINGS_PRETTY", "1");

    let config = zk_settings::config::load_from_env().unwrap();

    assert_eq!(config.default_locator, Some("zk://a:2181,b:2181/apps/demo".to_string()));
    assert_eq!(config.connect_timeout_ms, 250);
    assert_eq!(config.operation_timeout_ms, 1000);
    assert!(config.pretty);

    restore_env(saved);
}

/// Test defaults when nothing is set
#[test]
fn test_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let saved = save_env();
    for key in ENV_VARS {
        env::remove_var(key);
    }

    let config = zk_settings::config::load_from_env().unwrap();

    assert_eq!(config.connect_timeout_ms, 1500);
    assert_eq!(config.operation_timeout_ms, 5000);
    assert_eq!(config.default_locator, None);
    assert!(!config.pretty);

    restore_env(saved);
}

/// Test that a non-numeric timeout is an error, not silently ignored
#[test]
fn test_env_invalid_timeout() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let saved = save_env();
    env::set_var("ZK_SETTINGS_CONNECT_TIMEOUT_MS", "soon");

    let err = zk_settings::config::load_from_env().unwrap_err();
    assert!(err.to_string().contains("ZK_SETTINGS_CONNECT_TIMEOUT_MS"));

    restore_env(saved);
}

/// Test that load_config prefers the file
#[test]
fn test_load_config_prefers_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, "operation_timeout_ms: 1234\n").unwrap();

    let config = zk_settings::config::load_config(config_path.to_str()).unwrap();
    assert_eq!(config.operation_timeout_ms, 1234);
    assert_eq!(config.connect_timeout_ms, 1500);
}

fn save_env() -> Vec<(&'static str, Option<String>)> {
    ENV_VARS.iter().map(|key| (*key, env::var(key).ok())).collect()
}

/// Helper function to restore environment variables
fn restore_env(saved: Vec<(&'static str, Option<String>)>) {
    for (key, orig_val) in saved {
        match orig_val {
            Some(val) => env::set_var(key, val),
            None => env::remove_var(key),
        }
    }
}
