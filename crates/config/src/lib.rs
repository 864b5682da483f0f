#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for beacon
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/beacon/config.toml)
//! - Environment variables (`BEACON_*`)
//! - CLI flags (applied by the binary)

pub mod constants;
pub mod core;

pub use self::core::{
    ClientConfig, DedupConfig, DedupPolicyKind, LimitsConfig, RateLimitConfig, RateLimitScope,
    SamplingConfig, ScrubConfig, SinkConfig,
};

use beacon_errors::{ConfigError, Error};
use beacon_types::Level;
use constants::{
    ENV_BATCH_SIZE, ENV_FLUSH_INTERVAL_MS, ENV_MIN_LEVEL, ENV_RATE_LIMIT_PER_MINUTE,
    ENV_RATE_LIMIT_SCOPE, ENV_SAMPLE_SEED, ENV_SINK_API_KEY, ENV_SINK_ENDPOINT,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    #[serde(default)]
    pub scrub: ScrubConfig,

    #[serde(default)]
    pub sink: SinkConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("beacon").join("config.toml"))
    }

    /// Parse configuration from a TOML string and validate it
    ///
    /// # Errors
    ///
    /// Returns an error if the contents are not valid TOML or fail validation.
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML
    /// syntax, or holds values rejected by [`Config::validate`].
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.display().to_string(),
                }
                .into()
            } else {
                Error::io_with_path(&e, path)
            }
        })?;

        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), "loaded telemetry config");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Render the configuration as TOML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::SerializeError {
                error: e.to_string(),
            }
            .into()
        })
    }

    /// Write the configuration to `path`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem operation fails.
    pub async fn save_to_file(&self, path: &Path) -> Result<(), Error> {
        let contents = self.to_toml_string()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError {
                    path: parent.display().to_string(),
                    error: e.to_string(),
                })?;
        }
        fs::write(path, contents)
            .await
            .map_err(|e| ConfigError::WriteError {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
        Ok(())
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Some(size) = parse_env::<usize>(ENV_BATCH_SIZE)? {
            self.client.batch_size = size;
        }

        if let Some(interval) = parse_env::<u64>(ENV_FLUSH_INTERVAL_MS)? {
            self.client.flush_interval_ms = interval;
        }

        if let Some(level) = parse_env::<Level>(ENV_MIN_LEVEL)? {
            self.client.min_level = level;
        }

        if let Some(per_minute) = parse_env::<u32>(ENV_RATE_LIMIT_PER_MINUTE)? {
            self.rate_limit.per_minute = per_minute;
        }

        if let Some(scope) = parse_env::<RateLimitScope>(ENV_RATE_LIMIT_SCOPE)? {
            self.rate_limit.scope = scope;
        }

        if let Some(seed) = parse_env::<u64>(ENV_SAMPLE_SEED)? {
            self.sampling.seed = Some(seed);
        }

        if let Ok(endpoint) = std::env::var(ENV_SINK_ENDPOINT) {
            self.sink.endpoint = Some(endpoint);
        }

        if let Ok(api_key) = std::env::var(ENV_SINK_API_KEY) {
            self.sink.api_key = Some(api_key);
        }

        self.validate()
    }

    /// Reject values the pipeline cannot operate with
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |field: &str, value: String| -> Error {
            ConfigError::InvalidValue {
                field: field.to_string(),
                value,
            }
            .into()
        };

        if self.client.batch_size == 0 {
            return Err(invalid("client.batch_size", "0".into()));
        }
        if self.rate_limit.per_minute == 0 {
            return Err(invalid("rate_limit.per_minute", "0".into()));
        }
        if self.limits.max_message_chars == 0 {
            return Err(invalid("limits.max_message_chars", "0".into()));
        }
        if self.limits.max_identifier_chars == 0 {
            return Err(invalid("limits.max_identifier_chars", "0".into()));
        }
        if self.scrub.max_depth == 0 {
            return Err(invalid("scrub.max_depth", "0".into()));
        }
        for (category, rate) in &self.sampling.rates {
            if !(0.0..=1.0).contains(rate) {
                return Err(invalid(
                    &format!("sampling.rates.{category}"),
                    rate.to_string(),
                ));
            }
        }
        if let Some(endpoint) = &self.sink.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(invalid("sink.endpoint", endpoint.clone()));
            }
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(var: &str) -> Result<Option<T>, Error> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            ConfigError::InvalidValue {
                field: var.to_string(),
                value: raw,
            }
            .into()
        }),
        Err(_) => Ok(None),
    }
}
