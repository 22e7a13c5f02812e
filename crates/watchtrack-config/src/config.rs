use crate::credentials::CredentialStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// ISO 3166-1 code used for streaming availability and release dates
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub tvmaze: TvMazeConfig,
    #[serde(default)]
    pub availability: Option<AvailabilityConfig>,
    #[serde(default)]
    pub store: Option<StoreConfig>,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TmdbConfig {
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_tmdb_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TvMazeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tvmaze_base_url")]
    pub base_url: String,
}

/// Fallback streaming-availability service, consulted when the catalog has no
/// provider data for the region
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AvailabilityConfig {
    pub enabled: bool,
    pub base_url: String,
}

/// PostgREST endpoint holding the watchlist table
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    pub url: String,
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshConfig {
    /// Rows handled by one cron invocation
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Per-item wall-clock budget for a cron batch
    #[serde(default = "default_time_budget_secs")]
    pub time_budget_secs: u64,
    #[serde(default = "default_sweep_chunk_size")]
    pub sweep_chunk_size: usize,
    /// Pause between sweep chunks, to stay under the catalog's rate limit
    #[serde(default = "default_sweep_delay_secs")]
    pub sweep_delay_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json_logging")]
    pub json: bool,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{setting} is not configured (set it in {location} or the {env} environment variable)")]
    Missing {
        setting: &'static str,
        location: &'static str,
        env: &'static str,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn default_true() -> bool {
    true
}

fn default_region() -> String {
    "US".to_string()
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_tmdb_timeout_secs() -> u64 {
    60
}

fn default_tvmaze_base_url() -> String {
    "https://api.tvmaze.com".to_string()
}

fn default_table() -> String {
    "watchlist".to_string()
}

fn default_batch_size() -> usize {
    5
}

fn default_time_budget_secs() -> u64 {
    55 // Serverless-style limit is 60s
}

fn default_sweep_chunk_size() -> usize {
    10
}

fn default_sweep_delay_secs() -> u64 {
    60
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logging() -> bool {
    use std::io::IsTerminal;
    !std::io::stdout().is_terminal()
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: default_tmdb_base_url(),
            language: default_language(),
            timeout_secs: default_tmdb_timeout_secs(),
        }
    }
}

impl Default for TvMazeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_tvmaze_base_url(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            time_budget_secs: default_time_budget_secs(),
            sweep_chunk_size: default_sweep_chunk_size(),
            sweep_delay_secs: default_sweep_delay_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json_logging(),
            file: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: default_region(),
            tmdb: TmdbConfig::default(),
            tvmaze: TvMazeConfig::default(),
            availability: None,
            store: None,
            refresh: RefreshConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults. Environment
    /// overrides are applied either way.
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(region) = std::env::var("WATCHTRACK_REGION") {
            if !region.trim().is_empty() {
                self.region = region.trim().to_uppercase();
            }
        }
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            if !url.trim().is_empty() {
                match self.store.as_mut() {
                    Some(store) => store.url = url,
                    None => {
                        self.store = Some(StoreConfig {
                            url,
                            table: default_table(),
                        })
                    }
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.len() != 2 || !self.region.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Invalid(format!(
                "region must be a two-letter uppercase country code, got '{}'",
                self.region
            )));
        }
        if self.refresh.batch_size == 0 {
            return Err(ConfigError::Invalid("refresh.batch_size must be at least 1".to_string()));
        }
        if self.refresh.sweep_chunk_size == 0 {
            return Err(ConfigError::Invalid("refresh.sweep_chunk_size must be at least 1".to_string()));
        }
        if self.tmdb.timeout_secs == 0 {
            return Err(ConfigError::Invalid("tmdb.timeout_secs must be at least 1".to_string()));
        }
        if let Some(store) = &self.store {
            if store.url.trim().is_empty() {
                return Err(ConfigError::Invalid("store.url cannot be empty".to_string()));
            }
        }
        if let Some(availability) = &self.availability {
            if availability.enabled && availability.base_url.trim().is_empty() {
                return Err(ConfigError::Invalid("availability.base_url cannot be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Everything a refresh run needs: a catalog key and a reachable row store
    pub fn ensure_refresh_ready(&self, credentials: &CredentialStore) -> Result<(), ConfigError> {
        self.validate()?;
        if credentials.tmdb_api_key().is_none() {
            return Err(ConfigError::Missing {
                setting: "tmdb_api_key",
                location: "credentials.toml",
                env: "TMDB_API_KEY",
            });
        }
        if self.store.is_none() {
            return Err(ConfigError::Missing {
                setting: "store.url",
                location: "config.toml",
                env: "SUPABASE_URL",
            });
        }
        if credentials.store_service_key().is_none() {
            return Err(ConfigError::Missing {
                setting: "store_service_key",
                location: "credentials.toml",
                env: "SUPABASE_SERVICE_KEY",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let config = Config {
            region: "IN".to_string(),
            store: Some(StoreConfig {
                url: "https://example.supabase.co".to_string(),
                table: "watchlist".to_string(),
            }),
            refresh: RefreshConfig {
                batch_size: 3,
                ..RefreshConfig::default()
            },
            ..Config::default()
        };

        let path = file.path().to_path_buf();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.region, "IN");
        assert_eq!(loaded.refresh.batch_size, 3);
        assert_eq!(loaded.refresh.sweep_chunk_size, 10);
        assert_eq!(loaded.store.unwrap().url, "https://example.supabase.co");
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config: Config = toml::from_str("region = \"GB\"\n").unwrap();
        assert_eq!(config.region, "GB");
        assert_eq!(config.tmdb.timeout_secs, 60);
        assert_eq!(config.refresh.batch_size, 5);
        assert_eq!(config.refresh.sweep_delay_secs, 60);
        assert!(config.tvmaze.enabled);
        assert!(config.store.is_none());
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.region = "usa".to_string();
        assert!(config.validate().is_err());

        config.region = "US".to_string();
        config.refresh.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_refresh_ready_requires_credentials() {
        let file = NamedTempFile::new().unwrap();
        let mut credentials = CredentialStore::new(file.path().to_path_buf());
        let mut config = Config::default();

        let err = config.ensure_refresh_ready(&credentials).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { setting: "tmdb_api_key", .. }));

        credentials.set_tmdb_api_key("key".to_string());
        config.store = Some(StoreConfig {
            url: "https://example.supabase.co".to_string(),
            table: default_table(),
        });
        let err = config.ensure_refresh_ready(&credentials).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { setting: "store_service_key", .. }));

        credentials.set_store_service_key("service".to_string());
        assert!(config.ensure_refresh_ready(&credentials).is_ok());
    }
}
