use crate::error::SourceResult;
use async_trait::async_trait;
use uuid::Uuid;
use watchtrack_models::{
    CatalogDetails, MediaKind, RegionProviders, ReleaseDates, SearchPage, TrendingWindow, WatchlistItem,
};

/// Catalog-metadata provider (title details, release dates, discovery)
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    /// Full details with streaming providers, videos and external ids inlined
    async fn details(&self, tmdb_id: u32, kind: MediaKind, region: &str) -> SourceResult<CatalogDetails>;

    /// Per-country release dates. Movies only.
    async fn release_dates(&self, movie_id: u32) -> SourceResult<ReleaseDates>;

    async fn search(&self, query: &str, kind: MediaKind, region: &str, page: u32) -> SourceResult<SearchPage>;

    async fn trending(&self, kind: MediaKind, window: TrendingWindow, region: &str) -> SourceResult<SearchPage>;
}

/// Fallback for regional streaming availability, used only when the catalog
/// has no provider block for the region
#[async_trait]
pub trait AvailabilityProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn availability(
        &self,
        tmdb_id: u32,
        kind: MediaKind,
        region: &str,
    ) -> SourceResult<Option<RegionProviders>>;
}

/// Secondary episode-runtime lookup, keyed by IMDb id
#[async_trait]
pub trait RuntimeProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    /// Average episode runtime in minutes, `None` when the show is unknown
    async fn lookup_by_imdb(&self, imdb_id: &str) -> SourceResult<Option<u32>>;
}

/// Persistent row store for watchlist items.
///
/// Every write returns the row as stored so callers can replace any local copy.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    fn store_name(&self) -> &str;

    /// All rows for one user, newest first
    async fn list(&self, user_id: &str) -> SourceResult<Vec<WatchlistItem>>;

    async fn get(&self, id: Uuid) -> SourceResult<Option<WatchlistItem>>;

    /// Row for `(user_id, tmdb_id, kind)`, the natural key
    async fn find(&self, user_id: &str, tmdb_id: u32, kind: MediaKind) -> SourceResult<Option<WatchlistItem>>;

    async fn insert(&self, item: &WatchlistItem) -> SourceResult<WatchlistItem>;

    async fn update(&self, item: &WatchlistItem) -> SourceResult<WatchlistItem>;

    /// Deletes the row only when it belongs to `user_id`
    async fn delete(&self, user_id: &str, id: Uuid) -> SourceResult<()>;

    /// Up to `limit` refresh-eligible rows across all users, least recently
    /// enriched first (never-enriched rows lead)
    async fn stale(&self, limit: usize) -> SourceResult<Vec<WatchlistItem>>;

    /// Every refresh-eligible row across all users
    async fn eligible(&self) -> SourceResult<Vec<WatchlistItem>>;
}
