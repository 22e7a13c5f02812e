//! Watchlist rows in a Supabase (PostgREST) table.
//!
//! Requests authenticate with the service key, sent both as the bearer token
//! and as the `apikey` header.

use crate::error::{SourceError, SourceResult};
use crate::http;
use crate::traits::WatchlistStore;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;
use watchtrack_config::StoreConfig;
use watchtrack_models::{ItemStatus, MediaKind, WatchlistItem};

const SERVICE: &str = "supabase";

#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    table: String,
    service_key: String,
}

impl SupabaseStore {
    pub fn new(config: &StoreConfig, service_key: String) -> SourceResult<Self> {
        if service_key.trim().is_empty() {
            return Err(SourceError::NotConfigured("store_service_key"));
        }
        Ok(Self {
            client: http::build_client(SERVICE, Duration::from_secs(30))?,
            base_url: config.url.trim_end_matches('/').to_string(),
            table: config.table.clone(),
            service_key,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("apikey", &self.service_key)
    }

    fn select(&self, filters: &[(String, String)]) -> RequestBuilder {
        self.authorized(self.client.get(self.table_url()))
            .query(&[("select", "*")])
            .query(filters)
    }

    async fn write_one(&self, request: RequestBuilder, what: &str) -> SourceResult<WatchlistItem> {
        let request = self.authorized(request).header("Prefer", "return=representation");
        let rows: Vec<WatchlistItem> = http::send_json(SERVICE, request, what).await?;
        rows.into_iter().next().ok_or_else(|| SourceError::NotFound {
            service: SERVICE,
            what: what.to_string(),
        })
    }
}

fn eq(column: &str, value: impl ToString) -> (String, String) {
    (column.to_string(), format!("eq.{}", value.to_string()))
}

/// `status=in.(a,b,c)` over the refresh-eligible statuses
fn eligible_filter() -> (String, String) {
    let statuses: Vec<&str> = ItemStatus::refresh_eligible().iter().map(|s| s.as_str()).collect();
    ("status".to_string(), format!("in.({})", statuses.join(",")))
}

fn stale_order() -> (String, String) {
    ("order".to_string(), "metadata->>last_updated_at.asc.nullsfirst".to_string())
}

#[async_trait]
impl WatchlistStore for SupabaseStore {
    fn store_name(&self) -> &str {
        SERVICE
    }

    async fn list(&self, user_id: &str) -> SourceResult<Vec<WatchlistItem>> {
        let request = self.select(&[eq("user_id", user_id), ("order".into(), "created_at.desc".into())]);
        http::send_json(SERVICE, request, "watchlist").await
    }

    async fn get(&self, id: Uuid) -> SourceResult<Option<WatchlistItem>> {
        let request = self.select(&[eq("id", id), ("limit".into(), "1".into())]);
        let rows: Vec<WatchlistItem> = http::send_json(SERVICE, request, &format!("row {}", id)).await?;
        Ok(rows.into_iter().next())
    }

    async fn find(&self, user_id: &str, tmdb_id: u32, kind: MediaKind) -> SourceResult<Option<WatchlistItem>> {
        let request = self.select(&[
            eq("user_id", user_id),
            eq("tmdb_id", tmdb_id),
            eq("type", kind.as_str()),
            ("limit".into(), "1".into()),
        ]);
        let rows: Vec<WatchlistItem> =
            http::send_json(SERVICE, request, &format!("{} {}", kind, tmdb_id)).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, item: &WatchlistItem) -> SourceResult<WatchlistItem> {
        debug!(tmdb_id = item.tmdb_id, kind = %item.kind, "Inserting row");
        let request = self.client.post(self.table_url()).json(item);
        self.write_one(request, &format!("insert {} {}", item.kind, item.tmdb_id)).await
    }

    async fn update(&self, item: &WatchlistItem) -> SourceResult<WatchlistItem> {
        debug!(tmdb_id = item.tmdb_id, kind = %item.kind, "Updating row");
        let request = self
            .client
            .patch(self.table_url())
            .query(&[eq("id", item.id), eq("user_id", &item.user_id)])
            .json(item);
        self.write_one(request, &format!("row {}", item.id)).await
    }

    async fn delete(&self, user_id: &str, id: Uuid) -> SourceResult<()> {
        let request = self
            .authorized(self.client.delete(self.table_url()))
            .query(&[eq("id", id), eq("user_id", user_id)]);
        http::send(SERVICE, request, &format!("row {}", id)).await?;
        Ok(())
    }

    async fn stale(&self, limit: usize) -> SourceResult<Vec<WatchlistItem>> {
        let request = self.select(&[eligible_filter(), stale_order(), ("limit".into(), limit.to_string())]);
        http::send_json(SERVICE, request, "stale rows").await
    }

    async fn eligible(&self) -> SourceResult<Vec<WatchlistItem>> {
        let request = self.select(&[eligible_filter(), stale_order()]);
        http::send_json(SERVICE, request, "eligible rows").await
    }
}
