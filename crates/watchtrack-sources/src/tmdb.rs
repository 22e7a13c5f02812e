//! TMDB client for title details, release dates, search and trending.
//!
//! The API key travels as the `api_key` query parameter. Details requests
//! append `watch/providers`, `videos` and `external_ids` so one call carries
//! everything enrichment needs.

use crate::error::{SourceError, SourceResult};
use crate::http;
use crate::traits::CatalogProvider;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use watchtrack_config::TmdbConfig;
use watchtrack_models::{CatalogDetails, MediaKind, ReleaseDates, SearchPage, TrendingWindow};

const SERVICE: &str = "tmdb";
const DETAIL_APPENDS: &str = "watch/providers,videos,external_ids";

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig, api_key: String) -> SourceResult<Self> {
        if api_key.trim().is_empty() {
            return Err(SourceError::NotConfigured("tmdb_api_key"));
        }
        Ok(Self {
            client: http::build_client(SERVICE, Duration::from_secs(config.timeout_secs))?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            language: config.language.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .query(&[("api_key", self.api_key.as_str()), ("language", self.language.as_str())])
    }
}

#[async_trait]
impl CatalogProvider for TmdbClient {
    fn provider_name(&self) -> &str {
        SERVICE
    }

    async fn details(&self, tmdb_id: u32, kind: MediaKind, region: &str) -> SourceResult<CatalogDetails> {
        debug!(tmdb_id, kind = %kind, region, "Fetching catalog details");
        let path = format!("{}/{}", kind.catalog_path(), tmdb_id);
        let request = self.get(&path).query(&[("append_to_response", DETAIL_APPENDS)]);
        http::send_json(SERVICE, request, &format!("{} {}", kind, tmdb_id)).await
    }

    async fn release_dates(&self, movie_id: u32) -> SourceResult<ReleaseDates> {
        debug!(tmdb_id = movie_id, "Fetching release dates");
        let request = self.get(&format!("movie/{}/release_dates", movie_id));
        http::send_json(SERVICE, request, &format!("release dates for movie {}", movie_id)).await
    }

    async fn search(&self, query: &str, kind: MediaKind, region: &str, page: u32) -> SourceResult<SearchPage> {
        let path = format!("search/{}", kind.catalog_path());
        let page = page.max(1).to_string();
        let request = self.get(&path).query(&[
            ("query", query),
            ("region", region),
            ("page", page.as_str()),
            ("include_adult", "false"),
        ]);
        http::send_json(SERVICE, request, &format!("search '{}'", query)).await
    }

    async fn trending(&self, kind: MediaKind, window: TrendingWindow, region: &str) -> SourceResult<SearchPage> {
        let path = format!("trending/{}/{}", kind.catalog_path(), window.as_str());
        let request = self.get(&path).query(&[("region", region)]);
        http::send_json(SERVICE, request, &format!("trending {}", kind)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_not_configured() {
        let result = TmdbClient::new(&TmdbConfig::default(), "  ".to_string());
        assert!(matches!(result, Err(SourceError::NotConfigured("tmdb_api_key"))));
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let config = TmdbConfig {
            base_url: "https://api.themoviedb.org/3/".to_string(),
            ..TmdbConfig::default()
        };
        let client = TmdbClient::new(&config, "key".to_string()).unwrap();
        assert_eq!(client.url("/tv/1399"), "https://api.themoviedb.org/3/tv/1399");
    }
}
