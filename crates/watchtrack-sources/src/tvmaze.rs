//! TVMaze lookup for average episode runtime. No authentication.

use crate::error::SourceResult;
use crate::http;
use crate::traits::RuntimeProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use watchtrack_config::TvMazeConfig;

const SERVICE: &str = "tvmaze";

#[derive(Debug, Deserialize)]
struct TvMazeShow {
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(rename = "averageRuntime", default)]
    average_runtime: Option<u32>,
}

impl TvMazeShow {
    fn effective_runtime(&self) -> Option<u32> {
        self.average_runtime.or(self.runtime).filter(|minutes| *minutes > 0)
    }
}

pub struct TvMazeClient {
    client: Client,
    base_url: String,
}

impl TvMazeClient {
    pub fn new(config: &TvMazeConfig) -> SourceResult<Self> {
        Ok(Self {
            client: http::build_client(SERVICE, Duration::from_secs(15))?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RuntimeProvider for TvMazeClient {
    fn provider_name(&self) -> &str {
        SERVICE
    }

    async fn lookup_by_imdb(&self, imdb_id: &str) -> SourceResult<Option<u32>> {
        debug!(imdb_id, "Looking up episode runtime");
        let request = self
            .client
            .get(format!("{}/lookup/shows", self.base_url))
            .query(&[("imdb", imdb_id)]);

        let show: Option<TvMazeShow> = http::send_json_optional(SERVICE, request, imdb_id).await?;
        Ok(show.and_then(|s| s.effective_runtime()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_runtime_preferred() {
        let show: TvMazeShow = serde_json::from_str(r#"{"runtime": null, "averageRuntime": 52}"#).unwrap();
        assert_eq!(show.effective_runtime(), Some(52));

        let show: TvMazeShow = serde_json::from_str(r#"{"runtime": 30}"#).unwrap();
        assert_eq!(show.effective_runtime(), Some(30));

        let show: TvMazeShow = serde_json::from_str(r#"{"averageRuntime": 0}"#).unwrap();
        assert_eq!(show.effective_runtime(), None);
    }
}
