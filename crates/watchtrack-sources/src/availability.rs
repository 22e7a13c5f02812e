//! Regional streaming-availability fallback.
//!
//! `GET {base_url}/{movie|tv}/{id}?country={region}` answers
//! `{flatrate, rent, buy, free}` lists of providers, or 404 when the service
//! has nothing for the title.

use crate::error::SourceResult;
use crate::http;
use crate::traits::AvailabilityProvider;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use watchtrack_config::AvailabilityConfig;
use watchtrack_models::{MediaKind, RegionProviders};

const SERVICE: &str = "availability";

pub struct AvailabilityClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AvailabilityClient {
    pub fn new(config: &AvailabilityConfig, api_key: Option<String>) -> SourceResult<Self> {
        Ok(Self {
            client: http::build_client(SERVICE, Duration::from_secs(20))?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl AvailabilityProvider for AvailabilityClient {
    fn provider_name(&self) -> &str {
        SERVICE
    }

    async fn availability(
        &self,
        tmdb_id: u32,
        kind: MediaKind,
        region: &str,
    ) -> SourceResult<Option<RegionProviders>> {
        debug!(tmdb_id, kind = %kind, region, "Querying availability fallback");
        let mut request = self
            .client
            .get(format!("{}/{}/{}", self.base_url, kind.catalog_path(), tmdb_id))
            .query(&[("country", region)]);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let providers: Option<RegionProviders> =
            http::send_json_optional(SERVICE, request, &format!("{} {}", kind, tmdb_id)).await?;
        // An all-empty answer carries no information
        Ok(providers.filter(|p| {
            !(p.flatrate.is_empty() && p.ads.is_empty() && p.free.is_empty() && p.rent.is_empty() && p.buy.is_empty())
        }))
    }
}
