//! # Reader Configuration
//!
//! Layered like the rest of the workspace's configuration: built-in
//! defaults, then an optional JSON file, then environment variables.
//!
//! ```json
//! { "maxOpenAttempts": 5, "openRetryWaitMs": 10000, "pollIntervalMs": 1000 }
//! ```
//!
//! Missing keys keep their defaults.

use std::path::Path;
use std::time::Duration;
use std::{env, fmt, fs};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::opener::{RetryPolicy, DUMP_OPEN_MAX_RETRIES, DUMP_OPEN_MIN_RETRY_WAIT};

pub const ENV_MAX_OPEN_ATTEMPTS: &str = "READER_MAX_OPEN_ATTEMPTS";
pub const ENV_OPEN_RETRY_WAIT_MS: &str = "READER_OPEN_RETRY_WAIT_MS";
pub const ENV_POLL_INTERVAL_MS: &str = "READER_POLL_INTERVAL_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error occurred: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderConfig {
    /// Total attempts made to open a dump.
    pub max_open_attempts: u32,
    /// Wait after the first failed open, in milliseconds. Doubles per failure.
    pub open_retry_wait_ms: u64,
    /// How long a consumer should sleep after an `Again` pull, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_open_attempts: DUMP_OPEN_MAX_RETRIES,
            open_retry_wait_ms: DUMP_OPEN_MIN_RETRY_WAIT.as_millis() as u64,
            poll_interval_ms: 1000,
        }
    }
}

impl fmt::Display for ReaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ReaderConfig
    Max open attempts: {},
    Open retry wait: {} ms,
    Poll interval: {} ms
",
            self.max_open_attempts, self.open_retry_wait_ms, self.poll_interval_ms
        )
    }
}

impl ReaderConfig {
    /// Reads a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: ReaderConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_open_attempts == 0 {
            return Err(ConfigError::Invalid(
                "maxOpenAttempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Overrides fields from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|key| env::var(key).ok())
    }

    /// Overrides fields from `lookup`, which maps variable names to values.
    pub fn apply_env_from<L>(mut self, lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_OPEN_ATTEMPTS) {
            self.max_open_attempts = parse_env(ENV_MAX_OPEN_ATTEMPTS, &value)?;
        }
        if let Some(value) = lookup(ENV_OPEN_RETRY_WAIT_MS) {
            self.open_retry_wait_ms = parse_env(ENV_OPEN_RETRY_WAIT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = parse_env(ENV_POLL_INTERVAL_MS, &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_open_attempts,
            Duration::from_millis(self.open_retry_wait_ms),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Defaults, then `path` if it names an existing file, then the environment.
pub fn load_reader_config(path: Option<&Path>) -> Result<ReaderConfig, ConfigError> {
    let config = match path {
        Some(path) if path.is_file() => ReaderConfig::from_json_file(path)?,
        Some(path) => {
            log::info!(
                "Config file not found at {}. Using defaults and environment variables.",
                path.display()
            );
            ReaderConfig::default()
        }
        None => ReaderConfig::default(),
    };
    config.apply_env()
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} has invalid value '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_match_retry_constants() {
        let config = ReaderConfig::default();
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "openRetryWaitMs": 250 }}"#).expect("write config");

        let config = ReaderConfig::from_json_file(file.path()).expect("valid config");
        assert_eq!(config.open_retry_wait_ms, 250);
        assert_eq!(config.max_open_attempts, DUMP_OPEN_MAX_RETRIES);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "maxOpenAttempts": 0 }}"#).expect("write config");
        assert!(matches!(
            ReaderConfig::from_json_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [(ENV_MAX_OPEN_ATTEMPTS, "2"), (ENV_POLL_INTERVAL_MS, "50")]
            .into_iter()
            .collect();
        let config = ReaderConfig::default()
            .apply_env_from(|key| vars.get(key).map(|v| v.to_string()))
            .expect("valid overrides");
        assert_eq!(config.max_open_attempts, 2);
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.open_retry_wait_ms, 10_000);

        let bad = ReaderConfig::default().apply_env_from(|key| {
            (key == ENV_OPEN_RETRY_WAIT_MS).then(|| "soon".to_string())
        });
        assert!(matches!(bad, Err(ConfigError::Invalid(_))));
    }
}
