//! Configuration
//!
//! Loaded from a TOML file or from `CHANLIST_<SECTION>_<KEY>` environment
//! variables. Every section may be omitted; missing keys take defaults.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogLevel};

mod error;

pub use error::ConfigError;

const ENV_PREFIX: &str = "CHANLIST";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Root store tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Panic on malformed mutation payloads. Unset means strict in debug
    /// builds and lenient in release builds.
    pub strict_mutations: Option<bool>,

    /// Events buffered per subscriber before the oldest are dropped
    pub event_buffer: usize,

    /// Memoized getter results kept per module; 0 disables memoization
    pub getter_cache_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            strict_mutations: None,
            event_buffer: 256,
            getter_cache_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Http,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "http" => Ok(BackendKind::Http),
            other => Err(ConfigError::InvalidValue(format!(
                "Invalid backend kind: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,

    /// JSON fixture seeding the memory backend
    pub fixture: Option<PathBuf>,

    /// Artificial delay added to every memory backend call
    #[serde(with = "humantime_serde")]
    pub latency: Duration,

    /// HTTP backend root, e.g. `https://studio.example.org`
    pub base_url: Option<String>,

    /// Sent as `Authorization: Token <token>`
    pub token: Option<String>,

    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            fixture: None,
            latency: Duration::ZERO,
            base_url: None,
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub json_format: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json_format: false,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig::new(self.level)
            .with_target(self.with_target)
            .json_format(self.json_format)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Register metric descriptions with the global recorder
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn env_var(section: &str, key: &str) -> Option<String> {
    env::var(format!("{}_{}_{}", ENV_PREFIX, section, key)).ok()
}

fn parse_env<T>(section: &str, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(section, key) {
        Some(raw) => raw.parse().map(Some).map_err(|e| {
            ConfigError::InvalidValue(format!(
                "{}_{}_{}={}: {}",
                ENV_PREFIX, section, key, raw, e
            ))
        }),
        None => Ok(None),
    }
}

fn parse_duration_env(section: &str, key: &str) -> Result<Option<Duration>, ConfigError> {
    match env_var(section, key) {
        Some(raw) => humantime_serde::re::humantime::parse_duration(&raw)
            .map(Some)
            .map_err(|e| {
                ConfigError::InvalidValue(format!(
                    "{}_{}_{}={}: {}",
                    ENV_PREFIX, section, key, raw, e
                ))
            }),
        None => Ok(None),
    }
}

impl Config {
    /// Defaults overridden by environment variables.
    ///
    /// Example: `CHANLIST_BACKEND_BASE_URL=https://studio.example.org`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Override fields from `CHANLIST_*` variables that are set
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(strict) = parse_env("STORE", "STRICT_MUTATIONS")? {
            self.store.strict_mutations = Some(strict);
        }
        if let Some(buffer) = parse_env("STORE", "EVENT_BUFFER")? {
            self.store.event_buffer = buffer;
        }
        if let Some(capacity) = parse_env("STORE", "GETTER_CACHE_CAPACITY")? {
            self.store.getter_cache_capacity = capacity;
        }

        if let Some(kind) = parse_env("BACKEND", "KIND")? {
            self.backend.kind = kind;
        }
        if let Some(fixture) = env_var("BACKEND", "FIXTURE") {
            self.backend.fixture = Some(PathBuf::from(fixture));
        }
        if let Some(latency) = parse_duration_env("BACKEND", "LATENCY")? {
            self.backend.latency = latency;
        }
        if let Some(base_url) = env_var("BACKEND", "BASE_URL") {
            self.backend.base_url = Some(base_url);
        }
        if let Some(token) = env_var("BACKEND", "TOKEN") {
            self.backend.token = Some(token);
        }
        if let Some(timeout) = parse_duration_env("BACKEND", "TIMEOUT")? {
            self.backend.timeout = timeout;
        }

        if let Some(level) = parse_env("LOGGING", "LEVEL")? {
            self.logging.level = level;
        }
        if let Some(json) = parse_env("LOGGING", "JSON_FORMAT")? {
            self.logging.json_format = json;
        }

        if let Some(enabled) = parse_env("METRICS", "ENABLED")? {
            self.metrics.enabled = enabled;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.event_buffer == 0 {
            return Err(ConfigError::ValidationFailed(
                "store.event_buffer must be greater than 0".to_string(),
            ));
        }

        if self.backend.kind == BackendKind::Http {
            match self.backend.base_url.as_deref() {
                None | Some("") => {
                    return Err(ConfigError::ValidationFailed(
                        "backend.base_url is required for the http backend".to_string(),
                    ))
                }
                Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                    return Err(ConfigError::ValidationFailed(format!(
                        "backend.base_url must be an http(s) URL: {}",
                        url
                    )))
                }
                Some(_) => {}
            }
            if self.backend.timeout.is_zero() {
                return Err(ConfigError::ValidationFailed(
                    "backend.timeout must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.kind, BackendKind::Memory);
        assert_eq!(config.store.strict_mutations, None);
    }

    #[test]
    fn test_http_backend_requires_base_url() {
        let mut config = Config::default();
        config.backend.kind = BackendKind::Http;
        assert!(config.validate().is_err());

        config.backend.base_url = Some("ftp://nope".to_string());
        assert!(config.validate().is_err());

        config.backend.base_url = Some("https://studio.example.org".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_event_buffer_rejected() {
        let mut config = Config::default();
        config.store.event_buffer = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_sparse_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[store]
strict_mutations = false

[backend]
kind = "memory"
latency = "25ms"

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.store.strict_mutations, Some(false));
        assert_eq!(config.store.event_buffer, 256);
        assert_eq!(config.backend.latency, Duration::from_millis(25));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_bad_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nevent_buffer = \"lots\"").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chanlist.toml");

        let mut config = Config::default();
        config.backend.kind = BackendKind::Http;
        config.backend.base_url = Some("http://localhost:8080".to_string());
        config.backend.token = Some("secret".to_string());
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("HTTP".parse::<BackendKind>().unwrap(), BackendKind::Http);
        assert!("grpc".parse::<BackendKind>().is_err());
    }
}
