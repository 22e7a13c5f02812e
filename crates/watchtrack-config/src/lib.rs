pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{
    AvailabilityConfig, Config, ConfigError, LoggingConfig, RefreshConfig, ServerConfig, StoreConfig, TmdbConfig,
    TvMazeConfig,
};
pub use credentials::CredentialStore;
pub use paths::{container_base_path, PathManager};
