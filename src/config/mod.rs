use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Deadline for one endpoint to report "connected", in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Deadline for one read or write round trip, in milliseconds
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,

    /// Locator used when a command does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_locator: Option<String>,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

fn default_connect_timeout_ms() -> u64 {
    1500
}

fn default_operation_timeout_ms() -> u64 {
    5000
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            operation_timeout_ms: default_operation_timeout_ms(),
            default_locator: None,
            pretty: false,
        }
    }
}

impl SettingsConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Reject values that would make every attempt fail
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_ms == 0 {
            anyhow::bail!("connect_timeout_ms must be greater than zero");
        }
        if self.operation_timeout_ms == 0 {
            anyhow::bail!("operation_timeout_ms must be greater than zero");
        }
        Ok(())
    }

    /// Locator from the argument, or the configured default
    pub fn resolve_locator(&self, locator: Option<&str>) -> Result<String> {
        locator
            .map(str::to_string)
            .or_else(|| self.default_locator.clone())
            .ok_or_else(|| anyhow::anyhow!("No locator given and no default_locator configured"))
    }
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<SettingsConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config: SettingsConfig = serde_yaml::from_str(&content)
        .context("Failed to parse YAML configuration")?;

    config.validate()?;
    Ok(config)
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .context(format!("{} must be a number of milliseconds", name)),
        Err(_) => Ok(None),
    }
}

/// Load configuration from environment variables
///
/// - ZK_SETTINGS_LOCATOR (optional default locator)
/// - ZK_SETTINGS_CONNECT_TIMEOUT_MS (optional, defaults to 1500)
/// - ZK_SETTINGS_OPERATION_TIMEOUT_MS (optional, defaults to 5000)
/// - ZK_SETTINGS_PRETTY (optional, "true" or "1")
pub fn load_from_env() -> Result<SettingsConfig> {
    // Try to load .env file if it exists (don't fail if it doesn't)
    let _ = dotenvy::dotenv();

    let mut config = SettingsConfig::default();

    if let Ok(locator) = std::env::var("ZK_SETTINGS_LOCATOR") {
        if !locator.trim().is_empty() {
            config.default_locator = Some(locator.trim().to_string());
        }
    }

    if let Some(ms) = env_u64("ZK_SETTINGS_CONNECT_TIMEOUT_MS")? {
        config.connect_timeout_ms = ms;
    }

    if let Some(ms) = env_u64("ZK_SETTINGS_OPERATION_TIMEOUT_MS")? {
        config.operation_timeout_ms = ms;
    }

    if let Ok(pretty) = std::env::var("ZK_SETTINGS_PRETTY") {
        config.pretty = pretty == "true" || pretty == "1";
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a YAML file if given, otherwise from the environment
pub fn load_config(config_path: Option<&str>) -> Result<SettingsConfig> {
    match config_path {
        Some(path) => load_from_yaml(path),
        None => load_from_env(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
connect_timeout_ms: 750
operation_timeout_ms: 2000
default_locator: "zk://10.20.30.10:2181,10.20.30.11:2181/testdemo"
pretty: true
"#;

        let config: SettingsConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.connect_timeout(), Duration::from_millis(750));
        assert_eq!(config.operation_timeout(), Duration::from_secs(2));
        assert_eq!(
            config.default_locator.as_deref(),
            Some("zk://10.20.30.10:2181,10.20.30.11:2181/testdemo")
        );
        assert!(config.pretty);
    }

    #[test]
    fn test_default_values() {
        let config: SettingsConfig = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config, SettingsConfig::default());
        assert_eq!(config.connect_timeout_ms, 1500);
        assert_eq!(config.operation_timeout_ms, 5000);
        assert!(!config.pretty);
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let config = SettingsConfig {
            connect_timeout_ms: 0,
            ..SettingsConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SettingsConfig {
            operation_timeout_ms: 0,
            ..SettingsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_locator() {
        let config = SettingsConfig {
            default_locator: Some("zk://a:1/x".to_string()),
            ..SettingsConfig::default()
        };

        assert_eq!(config.resolve_locator(Some("zk://b:2/y")).unwrap(), "zk://b:2/y");
        assert_eq!(config.resolve_locator(None).unwrap(), "zk://a:1/x");
        assert!(SettingsConfig::default().resolve_locator(None).is_err());
    }
}
