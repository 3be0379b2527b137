//! Configuration management.
//!
//! Optional TOML config file with environment-variable overrides
//! (`BIBENRICH_*`). Command-line flags take precedence over both.
//!
//! ```toml
//! mailto = "you@example.org"
//! timeout_secs = 30
//! rows = 3
//!
//! [retry]
//! max_attempts = 3
//! initial_delay_ms = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::RetryConfig;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Contact address for the CrossRef polite pool
    #[serde(default)]
    pub mailto: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Candidate rows requested per lookup
    #[serde(default = "default_rows")]
    pub rows: usize,

    /// Retry settings for transient lookup failures
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mailto: None,
            timeout_secs: default_timeout_secs(),
            rows: default_rows(),
            retry: RetrySettings::default(),
        }
    }
}

/// Retry settings as they appear in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            ..RetryConfig::default()
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_rows() -> usize {
    3
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

/// Load configuration from a file, with `BIBENRICH_*` env overrides
pub fn load_config(path: &PathBuf) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_path()))
        .add_source(config::Environment::with_prefix("BIBENRICH"))
        .build()?;

    settings.try_deserialize()
}

/// Probe the default config file locations: `./bibenrich.toml`, then the
/// user config directory.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("bibenrich.toml");
    if local.is_file() {
        return Some(local);
    }

    let user = dirs::config_dir()?.join("bibenrich").join("config.toml");
    if user.is_file() {
        return Some(user);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.rows, 3);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.mailto.is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("mailto = \"me@example.org\"").unwrap();
        assert_eq!(config.mailto.as_deref(), Some("me@example.org"));
        assert_eq!(config.rows, 3);
        assert_eq!(config.retry.initial_delay_ms, 1000);
    }

    #[test]
    fn test_retry_settings_conversion() {
        let settings = RetrySettings {
            max_attempts: 0,
            initial_delay_ms: 250,
        };
        let retry = settings.to_retry_config();
        assert_eq!(retry.max_attempts, 1);
        assert_eq!(retry.initial_delay, Duration::from_millis(250));
    }
}
