use crate::dates::null_as_default;
use crate::media::MediaKind;
use crate::metadata::Metadata;
use crate::status::{ItemStatus, StatusMismatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One tracked title for one user. `(user_id, tmdb_id, kind)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistItem {
    pub id: Uuid,
    pub user_id: String,
    pub tmdb_id: u32,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    status: ItemStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
    /// Shows only. 0 means not started.
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_watched_season: u32,
    /// Episodes watched in the first unfinished season
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress: u32,
    pub created_at: DateTime<Utc>,
}

impl WatchlistItem {
    pub fn new(
        user_id: impl Into<String>,
        tmdb_id: u32,
        kind: MediaKind,
        status: ItemStatus,
        metadata: Metadata,
    ) -> Result<Self, StatusMismatch> {
        let status = status.ensure_kind(kind)?;
        let mut item = Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            tmdb_id,
            kind,
            title: String::new(),
            poster_path: None,
            vote_average: None,
            status,
            metadata,
            last_watched_season: 0,
            progress: 0,
            created_at: Utc::now(),
        };
        item.refresh_display_cache();
        Ok(item)
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Write a new status, refusing values from the other kind's subset
    pub fn set_status(&mut self, status: ItemStatus) -> Result<(), StatusMismatch> {
        self.status = status.ensure_kind(self.kind)?;
        Ok(())
    }

    /// Copy title, poster and rating from the metadata into the denormalized columns
    pub fn refresh_display_cache(&mut self) {
        if let Some(title) = self.metadata.display_title() {
            self.title = title.to_string();
        }
        if self.metadata.catalog.poster_path.is_some() {
            self.poster_path = self.metadata.catalog.poster_path.clone();
        }
        if self.metadata.catalog.vote_average.is_some() {
            self.vote_average = self.metadata.catalog.vote_average;
        }
    }

    pub fn has_started(&self) -> bool {
        self.last_watched_season > 0 || self.progress > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::CatalogFields;

    #[test]
    fn test_new_item_copies_display_fields() {
        let metadata = Metadata {
            catalog: CatalogFields {
                name: Some("Severance".to_string()),
                poster_path: Some("/sev.jpg".to_string()),
                vote_average: Some(8.4),
                ..Default::default()
            },
            ..Default::default()
        };

        let item = WatchlistItem::new("user-1", 95396, MediaKind::Show, ItemStatus::ShowNew, metadata).unwrap();
        assert_eq!(item.title, "Severance");
        assert_eq!(item.poster_path.as_deref(), Some("/sev.jpg"));
        assert_eq!(item.vote_average, Some(8.4));
        assert!(!item.has_started());
    }

    #[test]
    fn test_cross_type_status_is_rejected() {
        let result = WatchlistItem::new("user-1", 1, MediaKind::Movie, ItemStatus::ShowNew, Metadata::default());
        assert!(result.is_err());

        let mut item =
            WatchlistItem::new("user-1", 1, MediaKind::Movie, ItemStatus::MovieComingSoon, Metadata::default())
                .unwrap();
        assert!(item.set_status(ItemStatus::ShowWatched).is_err());
        assert_eq!(item.status(), ItemStatus::MovieComingSoon);
    }

    #[test]
    fn test_row_deserializes_with_type_column() {
        let raw = serde_json::json!({
            "id": "6f1c1f4e-1c1a-4d55-9b0e-0f0c6b8f2a11",
            "user_id": "user-1",
            "tmdb_id": 550,
            "type": "movie",
            "title": "Fight Club",
            "status": "movie_watched",
            "metadata": null,
            "last_watched_season": null,
            "created_at": "2024-01-01T00:00:00Z"
        });

        let item: WatchlistItem = serde_json::from_value(raw).unwrap();
        assert_eq!(item.kind, MediaKind::Movie);
        assert_eq!(item.status(), ItemStatus::MovieWatched);
        assert_eq!(item.last_watched_season, 0);
        assert_eq!(item.metadata, Metadata::default());
    }
}
