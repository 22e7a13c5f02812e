//! User-facing mutations on watchlist rows.
//!
//! Every write goes through the store and returns the row as stored. On an
//! error nothing is written and the caller should re-read the row.

use crate::classify::{classify_show, clamp_watched_season, decide_movie_status, released_season_count, MovieSignals};
use crate::enrich::{Clock, EnrichRequest, Enricher};
use crate::error::{TrackerError, TrackerResult};
use crate::refresh::Refresher;
use crate::upcoming::project_all;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use watchtrack_models::{ItemStatus, MediaKind, UpcomingItem, WatchlistItem};
use watchtrack_sources::WatchlistStore;

#[derive(Clone)]
pub struct WatchlistService {
    store: Arc<dyn WatchlistStore>,
    enricher: Enricher,
    region: String,
    clock: Clock,
}

impl WatchlistService {
    pub fn new(store: Arc<dyn WatchlistStore>, enricher: Enricher, region: impl Into<String>) -> Self {
        Self {
            store,
            enricher,
            region: region.into(),
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn store(&self) -> &Arc<dyn WatchlistStore> {
        &self.store
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    /// A refresher sharing this service's store, enricher, region and clock
    pub fn refresher(&self) -> Refresher {
        Refresher::new(self.store.clone(), self.enricher.clone(), self.region.clone()).with_clock(self.clock)
    }

    fn today(&self) -> NaiveDate {
        (self.clock)().date_naive()
    }

    /// Rows owned by another user read as missing
    async fn load(&self, user_id: &str, id: Uuid) -> TrackerResult<WatchlistItem> {
        self.store
            .get(id)
            .await?
            .filter(|item| item.user_id == user_id)
            .ok_or(TrackerError::NotFound(id))
    }

    pub async fn get_item(&self, user_id: &str, id: Uuid) -> TrackerResult<WatchlistItem> {
        self.load(user_id, id).await
    }

    async fn save(&self, item: &WatchlistItem) -> TrackerResult<WatchlistItem> {
        Ok(self.store.update(item).await?)
    }

    fn require_show(item: &WatchlistItem, operation: &str) -> TrackerResult<()> {
        if item.kind == MediaKind::Show {
            Ok(())
        } else {
            Err(TrackerError::InvalidInput(format!("{} applies to shows only", operation)))
        }
    }

    fn require_movie(item: &WatchlistItem, operation: &str) -> TrackerResult<()> {
        if item.kind == MediaKind::Movie {
            Ok(())
        } else {
            Err(TrackerError::InvalidInput(format!("{} applies to movies only", operation)))
        }
    }

    /// Track a new title. Enrichment runs once to pick the initial status.
    #[instrument(skip(self), fields(operation = "add_item"))]
    pub async fn add_item(&self, user_id: &str, tmdb_id: u32, kind: MediaKind) -> TrackerResult<WatchlistItem> {
        if self.store.find(user_id, tmdb_id, kind).await?.is_some() {
            return Err(TrackerError::AlreadyTracked { tmdb_id, kind });
        }

        let enrichment = self
            .enricher
            .enrich_at(
                EnrichRequest {
                    tmdb_id,
                    kind,
                    region: &self.region,
                    existing_metadata: None,
                    current_status: None,
                },
                (self.clock)(),
            )
            .await?;

        let item = WatchlistItem::new(
            user_id,
            tmdb_id,
            kind,
            enrichment.initial_status,
            enrichment.final_metadata,
        )?;
        let stored = self.store.insert(&item).await?;
        info!(title = %stored.title, status = %stored.status(), "Added to watchlist");
        Ok(stored)
    }

    #[instrument(skip(self), fields(operation = "remove_item"))]
    pub async fn remove_item(&self, user_id: &str, id: Uuid) -> TrackerResult<()> {
        let item = self.load(user_id, id).await?;
        self.store.delete(user_id, id).await?;
        info!(title = %item.title, "Removed from watchlist");
        Ok(())
    }

    /// Movies become watched. Shows jump to the last released season.
    #[instrument(skip(self), fields(operation = "mark_watched"))]
    pub async fn mark_watched(&self, user_id: &str, id: Uuid) -> TrackerResult<WatchlistItem> {
        let mut item = self.load(user_id, id).await?;
        match item.kind {
            MediaKind::Movie => item.set_status(ItemStatus::MovieWatched)?,
            MediaKind::Show => {
                let today = self.today();
                item.last_watched_season = released_season_count(&item.metadata, today);
                item.progress = 0;
                let status = classify_show(&item.metadata, item.last_watched_season, 0, today);
                item.set_status(status)?;
            }
        }
        item.metadata.overlay.moved_to_library = true;
        self.save(&item).await
    }

    #[instrument(skip(self), fields(operation = "mark_unwatched"))]
    pub async fn mark_unwatched(&self, user_id: &str, id: Uuid) -> TrackerResult<WatchlistItem> {
        let mut item = self.load(user_id, id).await?;
        match item.kind {
            MediaKind::Movie => item.set_status(ItemStatus::MovieUnwatched)?,
            MediaKind::Show => {
                item.last_watched_season = 0;
                item.progress = 0;
                let status = classify_show(&item.metadata, 0, 0, self.today());
                item.set_status(status)?;
            }
        }
        self.save(&item).await
    }

    #[instrument(skip(self), fields(operation = "mark_dropped"))]
    pub async fn mark_dropped(&self, user_id: &str, id: Uuid) -> TrackerResult<WatchlistItem> {
        let mut item = self.load(user_id, id).await?;
        let dropped = match item.kind {
            MediaKind::Movie => ItemStatus::MovieDropped,
            MediaKind::Show => ItemStatus::ShowDropped,
        };
        item.set_status(dropped)?;
        item.metadata.overlay.moved_to_library = true;
        self.save(&item).await
    }

    /// Record the last fully watched season. The value is clamped to the
    /// released seasons and episode progress restarts.
    #[instrument(skip(self), fields(operation = "set_season"))]
    pub async fn set_season(&self, user_id: &str, id: Uuid, season: u32) -> TrackerResult<WatchlistItem> {
        let mut item = self.load(user_id, id).await?;
        Self::require_show(&item, "set_season")?;

        let today = self.today();
        item.last_watched_season = clamp_watched_season(&item.metadata, season, today);
        item.progress = 0;
        let status = classify_show(&item.metadata, item.last_watched_season, 0, today);
        item.set_status(status)?;
        self.save(&item).await
    }

    #[instrument(skip(self), fields(operation = "set_progress"))]
    pub async fn set_progress(&self, user_id: &str, id: Uuid, progress: u32) -> TrackerResult<WatchlistItem> {
        let mut item = self.load(user_id, id).await?;
        Self::require_show(&item, "set_progress")?;

        item.progress = progress;
        let status = classify_show(&item.metadata, item.last_watched_season, progress, self.today());
        item.set_status(status)?;
        self.save(&item).await
    }

    /// Pin a digital release date (and optionally the platform) by hand.
    /// The pin holds until enrichment finds a real digital date.
    #[instrument(skip(self), fields(operation = "set_manual_date"))]
    pub async fn set_manual_date(
        &self,
        user_id: &str,
        id: Uuid,
        date: NaiveDate,
        ott_name: Option<String>,
    ) -> TrackerResult<WatchlistItem> {
        let mut item = self.load(user_id, id).await?;
        Self::require_movie(&item, "set_manual_date")?;

        let overlay = &mut item.metadata.overlay;
        overlay.manual_date_override = true;
        overlay.manual_release_date = Some(date);
        if let Some(name) = ott_name.filter(|n| !n.trim().is_empty()) {
            overlay.manual_ott_name = Some(name);
        }
        self.redecide_movie(&mut item)?;
        self.save(&item).await
    }

    #[instrument(skip(self), fields(operation = "reset_manual_date"))]
    pub async fn reset_manual_date(&self, user_id: &str, id: Uuid) -> TrackerResult<WatchlistItem> {
        let mut item = self.load(user_id, id).await?;
        Self::require_movie(&item, "reset_manual_date")?;

        let overlay = &mut item.metadata.overlay;
        overlay.manual_date_override = false;
        overlay.manual_release_date = None;
        overlay.manual_ott_name = None;
        self.redecide_movie(&mut item)?;
        self.save(&item).await
    }

    fn redecide_movie(&self, item: &mut WatchlistItem) -> TrackerResult<()> {
        let mut signals = MovieSignals::from_metadata(&item.metadata, &self.region);
        let overlay = &item.metadata.overlay;
        signals.manual_override = overlay.manual_date_override && overlay.manual_release_date.is_some();

        let decision = decide_movie_status(&signals, Some(item.status()), self.today());
        item.set_status(decision.status)?;
        item.metadata.overlay.moved_to_library = decision.moved_to_library;
        Ok(())
    }

    #[instrument(skip(self), fields(operation = "dismiss_from_upcoming"))]
    pub async fn dismiss_from_upcoming(&self, user_id: &str, id: Uuid) -> TrackerResult<WatchlistItem> {
        let mut item = self.load(user_id, id).await?;
        item.metadata.overlay.dismissed_from_upcoming = true;
        self.save(&item).await
    }

    #[instrument(skip(self), fields(operation = "restore_to_upcoming"))]
    pub async fn restore_to_upcoming(&self, user_id: &str, id: Uuid) -> TrackerResult<WatchlistItem> {
        let mut item = self.load(user_id, id).await?;
        item.metadata.overlay.dismissed_from_upcoming = false;
        self.save(&item).await
    }

    /// Interactive re-enrichment of one row. A provider failure leaves the
    /// stored row as it was.
    #[instrument(skip(self), fields(operation = "refresh_item"))]
    pub async fn refresh_item(&self, user_id: &str, id: Uuid) -> TrackerResult<WatchlistItem> {
        let item = self.load(user_id, id).await?;
        self.refresher().refresh_stored(item).await
    }

    pub async fn list_items(&self, user_id: &str) -> TrackerResult<Vec<WatchlistItem>> {
        Ok(self.store.list(user_id).await?)
    }

    /// The user's Upcoming view, sorted by date then title
    pub async fn upcoming(&self, user_id: &str) -> TrackerResult<Vec<UpcomingItem>> {
        let items = self.store.list(user_id).await?;
        Ok(project_all(&items, self.today(), &self.region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::RefreshPolicy;
    use crate::testing::{days, movie_details, now, show_details, FakeCatalog};
    use watchtrack_models::UpcomingLabel;
    use watchtrack_sources::MemoryStore;

    const USER: &str = "user-1";

    fn service(catalog: Arc<FakeCatalog>) -> (WatchlistService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = WatchlistService::new(store.clone(), Enricher::new(catalog), "US").with_clock(now);
        (service, store)
    }

    #[tokio::test]
    async fn test_add_item_enriches_and_inserts() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(603, "The Matrix", Some(days(-9000))));
        let (service, store) = service(catalog);

        let item = service.add_item(USER, 603, MediaKind::Movie).await.unwrap();
        assert_eq!(item.title, "The Matrix");
        assert_eq!(item.status(), ItemStatus::MovieUnwatched);
        assert!(item.metadata.overlay.moved_to_library);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_add_duplicate_is_rejected() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(1, "Once", Some(days(-10))));
        let (service, store) = service(catalog);

        service.add_item(USER, 1, MediaKind::Movie).await.unwrap();
        let err = service.add_item(USER, 1, MediaKind::Movie).await.unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyTracked { tmdb_id: 1, kind: MediaKind::Movie }));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_add_failure_writes_nothing() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.fail(7);
        let (service, store) = service(catalog);

        assert!(service.add_item(USER, 7, MediaKind::Movie).await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_item() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(2, "Gone Soon", Some(days(-10))));
        let (service, store) = service(catalog);

        let item = service.add_item(USER, 2, MediaKind::Movie).await.unwrap();
        service.remove_item(USER, item.id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(service.remove_item(USER, item.id).await, Err(TrackerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_show_progress_flow() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Show, show_details(10, "Three Seasons", &[-900, -500, -100]));
        let (service, _) = service(catalog);
        let item = service.add_item(USER, 10, MediaKind::Show).await.unwrap();
        assert_eq!(item.status(), ItemStatus::ShowOngoing);

        let item = service.set_progress(USER, item.id, 4).await.unwrap();
        assert_eq!(item.status(), ItemStatus::ShowWatching);

        // Clamped to the three released seasons
        let item = service.set_season(USER, item.id, 9).await.unwrap();
        assert_eq!(item.last_watched_season, 3);
        assert_eq!(item.progress, 0);
        assert_eq!(item.status(), ItemStatus::ShowWatched);

        let item = service.set_season(USER, item.id, 1).await.unwrap();
        assert_eq!(item.status(), ItemStatus::ShowWatching);

        let item = service.mark_watched(USER, item.id).await.unwrap();
        assert_eq!(item.last_watched_season, 3);
        assert_eq!(item.status(), ItemStatus::ShowWatched);

        let item = service.mark_unwatched(USER, item.id).await.unwrap();
        assert_eq!(item.last_watched_season, 0);
        assert_eq!(item.status(), ItemStatus::ShowOngoing);
    }

    #[tokio::test]
    async fn test_season_ops_reject_movies() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(3, "Flat", Some(days(-10))));
        let (service, _) = service(catalog);
        let item = service.add_item(USER, 3, MediaKind::Movie).await.unwrap();

        assert!(matches!(service.set_season(USER, item.id, 1).await, Err(TrackerError::InvalidInput(_))));
        assert!(matches!(service.set_progress(USER, item.id, 1).await, Err(TrackerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_mark_dropped_and_watched_movie() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(4, "Meh", Some(days(-10))));
        let (service, _) = service(catalog);
        let item = service.add_item(USER, 4, MediaKind::Movie).await.unwrap();

        let item = service.mark_dropped(USER, item.id).await.unwrap();
        assert_eq!(item.status(), ItemStatus::MovieDropped);

        let item = service.mark_watched(USER, item.id).await.unwrap();
        assert_eq!(item.status(), ItemStatus::MovieWatched);
        assert!(item.metadata.overlay.moved_to_library);
    }

    #[tokio::test]
    async fn test_manual_date_moves_to_ott_and_reset_clears() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(5, "Festival Cut", Some(days(60))));
        let (service, _) = service(catalog);
        let item = service.add_item(USER, 5, MediaKind::Movie).await.unwrap();
        assert_eq!(item.status(), ItemStatus::MovieComingSoon);

        let item = service
            .set_manual_date(USER, item.id, days(20), Some("Mubi".to_string()))
            .await
            .unwrap();
        assert_eq!(item.status(), ItemStatus::MovieOnOtt);
        assert!(item.metadata.overlay.manual_date_override);
        assert_eq!(item.metadata.overlay.manual_ott_name.as_deref(), Some("Mubi"));

        let upcoming = service.upcoming(USER).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].date, days(20));
        assert_eq!(upcoming[0].label, UpcomingLabel::ComingToOtt);
        assert_eq!(upcoming[0].provider_name.as_deref(), Some("Mubi"));

        let item = service.reset_manual_date(USER, item.id).await.unwrap();
        assert!(!item.metadata.overlay.manual_date_override);
        assert_eq!(item.metadata.overlay.manual_release_date, None);
        assert_eq!(item.metadata.overlay.manual_ott_name, None);
    }

    #[tokio::test]
    async fn test_dismiss_and_restore() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(6, "Later", Some(days(30))));
        let (service, _) = service(catalog);
        let item = service.add_item(USER, 6, MediaKind::Movie).await.unwrap();
        assert_eq!(service.upcoming(USER).await.unwrap().len(), 1);

        service.dismiss_from_upcoming(USER, item.id).await.unwrap();
        assert!(service.upcoming(USER).await.unwrap().is_empty());

        service.restore_to_upcoming(USER, item.id).await.unwrap();
        assert_eq!(service.upcoming(USER).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_item_updates_display_cache() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(8, "Working Title", Some(days(30))));
        let (service, store) = service(catalog.clone());
        let item = service.add_item(USER, 8, MediaKind::Movie).await.unwrap();

        catalog.put(MediaKind::Movie, movie_details(8, "Final Title", Some(days(30))));
        let refreshed = service.refresh_item(USER, item.id).await.unwrap();
        assert_eq!(refreshed.title, "Final Title");
        assert_eq!(store.get(item.id).await.unwrap().unwrap().title, "Final Title");
    }

    #[tokio::test]
    async fn test_interactive_policy_shares_service_state() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(13, "Draft", Some(days(30))));
        let (service, store) = service(catalog.clone());
        let item = service.add_item(USER, 13, MediaKind::Movie).await.unwrap();

        catalog.put(MediaKind::Movie, movie_details(13, "Release", Some(days(30))));
        let report = service.refresher().run(RefreshPolicy::Interactive(item.id)).await.unwrap();
        assert_eq!(report.policy, "interactive");
        assert_eq!(report.processed_titles(), vec!["Release".to_string()]);

        let stored = store.get(item.id).await.unwrap().unwrap();
        assert_eq!(stored.metadata.overlay.last_updated_at, Some(now()));
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_row_untouched() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(9, "Stable", Some(days(30))));
        let (service, store) = service(catalog.clone());
        let item = service.add_item(USER, 9, MediaKind::Movie).await.unwrap();

        catalog.fail(9);
        assert!(service.refresh_item(USER, item.id).await.is_err());
        assert_eq!(store.get(item.id).await.unwrap().unwrap(), item);
    }

    #[tokio::test]
    async fn test_other_users_row_reads_as_missing() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(12, "Private", Some(days(-10))));
        let (service, store) = service(catalog);
        let item = service.add_item(USER, 12, MediaKind::Movie).await.unwrap();

        let intruder = "user-2";
        assert!(matches!(service.get_item(intruder, item.id).await, Err(TrackerError::NotFound(_))));
        assert!(matches!(service.mark_watched(intruder, item.id).await, Err(TrackerError::NotFound(_))));
        assert!(matches!(service.dismiss_from_upcoming(intruder, item.id).await, Err(TrackerError::NotFound(_))));
        assert!(matches!(service.refresh_item(intruder, item.id).await, Err(TrackerError::NotFound(_))));
        assert!(matches!(service.remove_item(intruder, item.id).await, Err(TrackerError::NotFound(_))));

        assert_eq!(store.get(item.id).await.unwrap().unwrap(), item);
        assert_eq!(service.list_items(USER).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_items_is_per_user() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(11, "Shared", Some(days(-10))));
        let (service, _) = service(catalog);

        service.add_item(USER, 11, MediaKind::Movie).await.unwrap();
        service.add_item("user-2", 11, MediaKind::Movie).await.unwrap();
        assert_eq!(service.list_items(USER).await.unwrap().len(), 1);
        assert_eq!(service.list_items("nobody").await.unwrap().len(), 0);
    }
}
