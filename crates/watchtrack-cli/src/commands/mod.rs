pub mod browse;
pub mod config;
pub mod item;
pub mod refresh;
pub mod serve;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::PathBuf;
use watchtrack_config::{Config, CredentialStore, PathManager};
use watchtrack_core::{Enricher, Refresher, WatchlistService};
use watchtrack_sources::{SourceFactory, Sources};

/// Everything a subcommand needs: resolved paths, the loaded config and the
/// user whose rows it works on
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
    pub user: String,
}

impl AppContext {
    /// `--config-dir` wins, then `WATCHTRACK_BASE_PATH` (containers), then the
    /// platform config directory
    pub fn load(config_dir: Option<PathBuf>, user: String) -> Result<Self> {
        let paths = match config_dir {
            Some(dir) => PathManager::rooted_at(dir),
            None if std::env::var_os("WATCHTRACK_BASE_PATH").is_some() => PathManager::from_docker_env(),
            None => PathManager::new().map_err(|e| eyre!("Failed to resolve config directory: {}", e))?,
        };

        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;

        Ok(Self { paths, config, user })
    }

    pub fn credentials(&self) -> Result<CredentialStore> {
        let credentials_file = self.paths.credentials_file();
        let mut credentials = CredentialStore::new(credentials_file.clone());
        credentials
            .load()
            .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
        credentials.apply_env_overrides();
        Ok(credentials)
    }

    pub fn sources(&self) -> Result<Sources> {
        self.config
            .validate()
            .map_err(|e| eyre!("Configuration validation failed: {}", e))?;
        let credentials = self.credentials()?;
        SourceFactory::build(&self.config, &credentials).map_err(|e| eyre!("Failed to create sources: {}", e))
    }

    /// Background refreshes need a persistent store, not the in-memory fallback
    pub fn sources_for_refresh(&self) -> Result<Sources> {
        let credentials = self.credentials()?;
        self.config
            .ensure_refresh_ready(&credentials)
            .map_err(|e| eyre!("Not ready to refresh: {}", e))?;
        SourceFactory::build(&self.config, &credentials).map_err(|e| eyre!("Failed to create sources: {}", e))
    }

    pub fn service(&self) -> Result<WatchlistService> {
        let sources = self.sources()?;
        Ok(WatchlistService::new(
            sources.store.clone(),
            Enricher::from_sources(&sources),
            self.config.region.clone(),
        ))
    }

    pub fn refresher(&self) -> Result<Refresher> {
        let sources = self.sources_for_refresh()?;
        Ok(Refresher::new(
            sources.store.clone(),
            Enricher::from_sources(&sources),
            self.config.region.clone(),
        ))
    }
}
