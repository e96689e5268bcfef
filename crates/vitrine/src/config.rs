//! Process configuration.
//!
//! Sources in order of precedence (later sources override earlier):
//! 1. Built-in defaults
//! 2. User config in the home config directory (`~/.config/vitrine/vitrine.toml`)
//! 3. `./vitrine.toml`, or the file passed explicitly
//! 4. Environment variables prefixed `VITRINE_`, with `__` separating
//!    nested keys (`VITRINE_STORAGE__ROOT`)

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};
use vitrine_database::PoolOptions;
use vitrine_error::{ConfigError, VitrineResult};
use vitrine_security::SecretKey;
use vitrine_storage::ArtifactConfig;

/// Largest accepted connection pool.
pub const MAX_POOL_SIZE: u32 = 64;

/// Where blobs live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory; images land under `{root}/image/`
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let root = dirs::data_local_dir()
            .map(|dir| dir.join("vitrine"))
            .unwrap_or_else(|| PathBuf::from("data"));
        Self { root }
    }
}

/// Top-level configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitrineConfig {
    /// Path of the SQLite database file
    pub database_url: String,
    /// Maximum pooled connections
    pub pool_size: u32,
    /// Seconds a caller waits for a pooled connection
    pub pool_timeout_secs: u64,
    /// Blob storage
    pub storage: StorageConfig,
    /// Thumbnail and compression parameters
    pub artifacts: ArtifactConfig,
    /// 64 hex characters keying capability tokens
    pub token_key: String,
    /// Prefix for generated URLs
    pub url_prefix: String,
}

impl std::fmt::Debug for VitrineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VitrineConfig")
            .field("database_url", &self.database_url)
            .field("pool_size", &self.pool_size)
            .field("pool_timeout_secs", &self.pool_timeout_secs)
            .field("storage", &self.storage)
            .field("artifacts", &self.artifacts)
            .field("token_key", &"<redacted>")
            .field("url_prefix", &self.url_prefix)
            .finish()
    }
}

impl Default for VitrineConfig {
    fn default() -> Self {
        Self {
            database_url: "vitrine.db".to_string(),
            pool_size: 10,
            pool_timeout_secs: 30,
            storage: StorageConfig::default(),
            artifacts: ArtifactConfig::default(),
            token_key: String::new(),
            url_prefix: "/api/v1/images".to_string(),
        }
    }
}

fn config_error(context: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::new(format!("{}: {}", context, err))
}

impl VitrineConfig {
    /// Load configuration from defaults, config files and the environment.
    ///
    /// `path` replaces the `./vitrine.toml` lookup and must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or parsed, or the result
    /// fails [`validate`](Self::validate).
    #[instrument]
    pub fn load(path: Option<&Path>) -> VitrineResult<Self> {
        debug!("Loading configuration");

        let defaults = Config::try_from(&Self::default())
            .map_err(|e| config_error("Failed to serialize defaults", e))?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("vitrine/vitrine.toml");
            builder = builder.add_source(File::from(user_config).required(false));
        }

        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("vitrine").required(false)),
        };

        let config: Self = builder
            .add_source(
                Environment::with_prefix("VITRINE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| config_error("Failed to build configuration", e))?
            .try_deserialize()
            .map_err(|e| config_error("Failed to parse configuration", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a single TOML file, layered over defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the result
    /// fails [`validate`](Self::validate).
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> VitrineResult<Self> {
        let defaults = Config::try_from(&Self::default())
            .map_err(|e| config_error("Failed to serialize defaults", e))?;

        let config: Self = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                config_error(
                    &format!("Failed to read configuration from {}", path.as_ref().display()),
                    e,
                )
            })?
            .try_deserialize()
            .map_err(|e| config_error("Failed to parse configuration", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Check ranges and parse the token key.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing or malformed key, a pool size outside
    /// `1..=64`, a zero pool timeout or invalid artifact parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_key.trim().is_empty() {
            return Err(ConfigError::new(
                "token_key is required; generate one with `vitrine keygen`",
            ));
        }
        self.secret_key()?;

        if self.pool_size == 0 || self.pool_size > MAX_POOL_SIZE {
            return Err(ConfigError::new(format!(
                "pool_size must be between 1 and {}, got {}",
                MAX_POOL_SIZE, self.pool_size
            )));
        }
        if self.pool_timeout_secs == 0 {
            return Err(ConfigError::new("pool_timeout_secs must be positive"));
        }
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::new("database_url must not be empty"));
        }

        self.artifacts
            .validate()
            .map_err(|e| ConfigError::new(format!("artifacts: {}", e)))
    }

    /// The parsed token key.
    ///
    /// # Errors
    ///
    /// Returns an error if `token_key` is not 64 hex characters.
    pub fn secret_key(&self) -> Result<SecretKey, ConfigError> {
        SecretKey::from_hex(&self.token_key)
    }

    /// Connection pool settings.
    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions::new(self.pool_size, Duration::from_secs(self.pool_timeout_secs))
    }

    /// URL prefix without a trailing slash.
    pub fn url_prefix(&self) -> &str {
        self.url_prefix.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> VitrineConfig {
        VitrineConfig {
            token_key: "11".repeat(32),
            ..VitrineConfig::default()
        }
    }

    #[test]
    fn defaults_need_only_a_key() {
        assert!(VitrineConfig::default().validate().is_err());
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_bad_ranges() {
        let mut config = valid();
        config.pool_size = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.pool_size = MAX_POOL_SIZE + 1;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.token_key = "abc".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.artifacts = ArtifactConfig::new(128, 500, 101, 5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn url_prefix_drops_trailing_slash() {
        let mut config = valid();
        config.url_prefix = "/images/".to_string();
        assert_eq!(config.url_prefix(), "/images");
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains(&"11".repeat(32)));
        assert!(rendered.contains("<redacted>"));
    }
}
