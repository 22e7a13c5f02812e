//! Builds the configured collaborators from `config.toml` and the credential store.
//!
//! Optional collaborators (availability fallback, runtime lookup) come back as
//! `None` when disabled; the catalog provider is required.

use crate::availability::AvailabilityClient;
use crate::error::{SourceError, SourceResult};
use crate::memory::MemoryStore;
use crate::supabase::SupabaseStore;
use crate::tmdb::TmdbClient;
use crate::traits::{AvailabilityProvider, CatalogProvider, RuntimeProvider, WatchlistStore};
use crate::tvmaze::TvMazeClient;
use std::sync::Arc;
use tracing::{debug, info};
use watchtrack_config::{Config, CredentialStore};

/// Everything enrichment and the drivers talk to
#[derive(Clone)]
pub struct Sources {
    pub catalog: Arc<dyn CatalogProvider>,
    pub availability: Option<Arc<dyn AvailabilityProvider>>,
    pub runtime: Option<Arc<dyn RuntimeProvider>>,
    pub store: Arc<dyn WatchlistStore>,
}

pub struct SourceFactory;

impl SourceFactory {
    pub fn catalog(config: &Config, credentials: &CredentialStore) -> SourceResult<Arc<dyn CatalogProvider>> {
        let api_key = credentials
            .tmdb_api_key()
            .ok_or(SourceError::NotConfigured("tmdb_api_key"))?;
        Ok(Arc::new(TmdbClient::new(&config.tmdb, api_key.to_string())?))
    }

    pub fn availability(
        config: &Config,
        credentials: &CredentialStore,
    ) -> SourceResult<Option<Arc<dyn AvailabilityProvider>>> {
        match &config.availability {
            Some(availability) if availability.enabled => {
                let key = credentials.availability_api_key().map(str::to_string);
                let client = AvailabilityClient::new(availability, key)?;
                Ok(Some(Arc::new(client)))
            }
            _ => {
                debug!("Availability fallback disabled");
                Ok(None)
            }
        }
    }

    pub fn runtime(config: &Config) -> SourceResult<Option<Arc<dyn RuntimeProvider>>> {
        if !config.tvmaze.enabled {
            debug!("Runtime lookup disabled");
            return Ok(None);
        }
        Ok(Some(Arc::new(TvMazeClient::new(&config.tvmaze)?)))
    }

    /// Supabase when `[store]` is configured, otherwise an empty in-memory store
    pub fn store(config: &Config, credentials: &CredentialStore) -> SourceResult<Arc<dyn WatchlistStore>> {
        match &config.store {
            Some(store) => {
                let key = credentials
                    .store_service_key()
                    .ok_or(SourceError::NotConfigured("store_service_key"))?;
                Ok(Arc::new(SupabaseStore::new(store, key.to_string())?))
            }
            None => {
                info!("No [store] configured, using an in-memory watchlist");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }

    pub fn build(config: &Config, credentials: &CredentialStore) -> SourceResult<Sources> {
        Ok(Sources {
            catalog: Self::catalog(config, credentials)?,
            availability: Self::availability(config, credentials)?,
            runtime: Self::runtime(config)?,
            store: Self::store(config, credentials)?,
        })
    }
}
