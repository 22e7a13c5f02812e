use crate::error::{SourceError, SourceResult};
use crate::traits::WatchlistStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use watchtrack_models::{MediaKind, WatchlistItem};

const SERVICE: &str = "memory";

/// In-process row store for tests and local runs without a database
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<Uuid, WatchlistItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = WatchlistItem>) -> Self {
        Self {
            rows: RwLock::new(items.into_iter().map(|item| (item.id, item)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn sorted_eligible(&self) -> Vec<WatchlistItem> {
        let rows = self.rows.read().await;
        let mut eligible: Vec<WatchlistItem> =
            rows.values().filter(|item| item.status().is_refresh_eligible()).cloned().collect();
        // None sorts before Some, so never-enriched rows lead
        eligible.sort_by(|a, b| {
            a.metadata
                .overlay
                .last_updated_at
                .cmp(&b.metadata.overlay.last_updated_at)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        eligible
    }
}

#[async_trait]
impl WatchlistStore for MemoryStore {
    fn store_name(&self) -> &str {
        SERVICE
    }

    async fn list(&self, user_id: &str) -> SourceResult<Vec<WatchlistItem>> {
        let rows = self.rows.read().await;
        let mut items: Vec<WatchlistItem> = rows.values().filter(|item| item.user_id == user_id).cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn get(&self, id: Uuid) -> SourceResult<Option<WatchlistItem>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find(&self, user_id: &str, tmdb_id: u32, kind: MediaKind) -> SourceResult<Option<WatchlistItem>> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .find(|item| item.user_id == user_id && item.tmdb_id == tmdb_id && item.kind == kind)
            .cloned())
    }

    async fn insert(&self, item: &WatchlistItem) -> SourceResult<WatchlistItem> {
        let mut rows = self.rows.write().await;
        let duplicate = rows
            .values()
            .any(|row| row.user_id == item.user_id && row.tmdb_id == item.tmdb_id && row.kind == item.kind);
        if duplicate || rows.contains_key(&item.id) {
            return Err(SourceError::Status {
                service: SERVICE,
                status: 409,
                body: format!("duplicate key for {} {}", item.kind, item.tmdb_id),
            });
        }
        rows.insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn update(&self, item: &WatchlistItem) -> SourceResult<WatchlistItem> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&item.id) {
            Some(row) if row.user_id == item.user_id => {
                *row = item.clone();
                Ok(item.clone())
            }
            _ => Err(SourceError::NotFound {
                service: SERVICE,
                what: format!("row {}", item.id),
            }),
        }
    }

    async fn delete(&self, user_id: &str, id: Uuid) -> SourceResult<()> {
        let mut rows = self.rows.write().await;
        if rows.get(&id).is_some_and(|row| row.user_id == user_id) {
            rows.remove(&id);
        }
        Ok(())
    }

    async fn stale(&self, limit: usize) -> SourceResult<Vec<WatchlistItem>> {
        let mut eligible = self.sorted_eligible().await;
        eligible.truncate(limit);
        Ok(eligible)
    }

    async fn eligible(&self) -> SourceResult<Vec<WatchlistItem>> {
        Ok(self.sorted_eligible().await)
    }
}
