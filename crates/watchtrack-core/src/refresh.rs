//! Re-enrichment drivers.
//!
//! One item interactively, a bounded cron batch, or a paced sweep over every
//! eligible row. Items within a batch or chunk run concurrently and fail
//! independently: a failed item is logged and left as stored.

use crate::enrich::{Clock, EnrichRequest, Enricher};
use crate::error::{TrackerError, TrackerResult};
use crate::progress::ProgressTracker;
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;
use watchtrack_config::RefreshConfig;
use watchtrack_models::{ItemStatus, MediaKind, WatchlistItem};
use watchtrack_sources::WatchlistStore;

/// How a refresh run selects and paces its work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// One item, awaited directly
    Interactive(Uuid),
    /// The `limit` stalest eligible rows in parallel, each bounded by `budget`
    Bounded { limit: usize, budget: Duration },
    /// Every eligible row in chunks, sleeping `delay` between chunks
    Sweep { chunk_size: usize, delay: Duration },
}

impl RefreshPolicy {
    pub fn bounded(config: &RefreshConfig) -> Self {
        RefreshPolicy::Bounded {
            limit: config.batch_size,
            budget: Duration::from_secs(config.time_budget_secs),
        }
    }

    pub fn sweep(config: &RefreshConfig) -> Self {
        RefreshPolicy::Sweep {
            chunk_size: config.sweep_chunk_size.max(1),
            delay: Duration::from_secs(config.sweep_delay_secs),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RefreshPolicy::Interactive(_) => "interactive",
            RefreshPolicy::Bounded { .. } => "bounded",
            RefreshPolicy::Sweep { .. } => "sweep",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Refreshed { status: ItemStatus },
    Failed { category: &'static str, error: String },
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    pub id: Uuid,
    pub tmdb_id: u32,
    pub kind: MediaKind,
    pub title: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ItemOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self.outcome, Outcome::Refreshed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshReport {
    pub policy: &'static str,
    pub outcomes: Vec<ItemOutcome>,
}

impl RefreshReport {
    /// Rows that were selected, whatever their outcome
    pub fn count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn refreshed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_refreshed()).count()
    }

    pub fn failures(&self) -> usize {
        self.count() - self.refreshed()
    }

    /// Titles of the rows that were refreshed, as stored after the refresh
    pub fn processed_titles(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.is_refreshed())
            .map(|o| o.title.clone())
            .collect()
    }
}

fn error_category(error: &TrackerError) -> &'static str {
    match error {
        TrackerError::Source(e) if e.is_auth_error() => "auth",
        TrackerError::Source(e) if e.is_not_found() => "not_found",
        TrackerError::Source(_) => "provider",
        TrackerError::InvalidStatus(_) => "invalid_status",
        _ => "other",
    }
}

#[derive(Clone)]
pub struct Refresher {
    store: Arc<dyn WatchlistStore>,
    enricher: Enricher,
    region: String,
    clock: Clock,
}

impl Refresher {
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

    pub async fn run(&self, policy: RefreshPolicy) -> TrackerResult<RefreshReport> {
        let outcomes = match policy {
            RefreshPolicy::Interactive(id) => {
                let item = self.store.get(id).await?.ok_or(TrackerError::NotFound(id))?;
                vec![self.refresh_row(item, None).await]
            }
            RefreshPolicy::Bounded { limit, budget } => {
                let items = self.store.stale(limit).await?;
                info!(count = items.len(), limit, "Refreshing stalest rows");
                join_all(items.into_iter().map(|item| self.refresh_row(item, Some(budget)))).await
            }
            RefreshPolicy::Sweep { chunk_size, delay } => self.sweep(chunk_size, delay).await?,
        };

        Ok(RefreshReport {
            policy: policy.name(),
            outcomes,
        })
    }

    async fn sweep(&self, chunk_size: usize, delay: Duration) -> TrackerResult<Vec<ItemOutcome>> {
        let items = self.store.eligible().await?;
        let mut tracker = ProgressTracker::new(items.len(), chunk_size.max(1) * 5);
        let mut outcomes = Vec::with_capacity(items.len());

        let chunks: Vec<Vec<WatchlistItem>> = items.chunks(chunk_size.max(1)).map(<[_]>::to_vec).collect();
        let chunk_count = chunks.len();
        for (idx, chunk) in chunks.into_iter().enumerate() {
            let results = join_all(chunk.into_iter().map(|item| self.refresh_row(item, None))).await;
            for result in &results {
                match &result.outcome {
                    Outcome::Refreshed { .. } => tracker.record_refreshed(),
                    Outcome::TimedOut => tracker.record_timed_out(),
                    Outcome::Failed { category, .. } => tracker.record_failed(category),
                }
            }
            outcomes.extend(results);
            tracker.log_progress();

            if idx + 1 < chunk_count && !delay.is_zero() {
                debug!(delay_secs = delay.as_secs(), "Pausing between chunks");
                tokio::time::sleep(delay).await;
            }
        }

        tracker.log_summary("Sweep");
        Ok(outcomes)
    }

    async fn refresh_row(&self, item: WatchlistItem, budget: Option<Duration>) -> ItemOutcome {
        let id = item.id;
        let tmdb_id = item.tmdb_id;
        let kind = item.kind;
        let mut title = item.title.clone();

        let work = self.refresh_stored(item);
        let result = match budget {
            Some(budget) => tokio::time::timeout(budget, work).await.ok(),
            None => Some(work.await),
        };

        let outcome = match result {
            Some(Ok(stored)) => {
                debug!(tmdb_id, %kind, title = %stored.title, status = %stored.status(), "Refreshed");
                title = stored.title.clone();
                Outcome::Refreshed { status: stored.status() }
            }
            Some(Err(e)) => {
                warn!(tmdb_id, %kind, title = %title, category = error_category(&e), error = %e, "Refresh failed");
                Outcome::Failed {
                    category: error_category(&e),
                    error: e.to_string(),
                }
            }
            None => {
                warn!(tmdb_id, %kind, title = %title, "Refresh exceeded its time budget");
                Outcome::TimedOut
            }
        };

        ItemOutcome {
            id,
            tmdb_id,
            kind,
            title,
            outcome,
        }
    }

    /// Re-enrich one loaded row and write it back. A provider failure leaves
    /// the stored row as it was.
    pub async fn refresh_stored(&self, mut item: WatchlistItem) -> TrackerResult<WatchlistItem> {
        let enrichment = self
            .enricher
            .enrich_at(EnrichRequest::for_item(&item, &self.region), (self.clock)())
            .await?;
        enrichment.apply_to(&mut item)?;
        Ok(self.store.update(&item).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{days, movie_details, now, FakeCatalog};
    use chrono::Duration as ChronoDuration;
    use watchtrack_models::Metadata;
    use watchtrack_sources::MemoryStore;

    fn row(tmdb_id: u32, title: &str, status: ItemStatus, stale_days: Option<i64>) -> WatchlistItem {
        let mut item = WatchlistItem::new("user-1", tmdb_id, status.kind(), status, Metadata::default()).unwrap();
        item.title = title.to_string();
        item.metadata.overlay.last_updated_at = stale_days.map(|d| now() - ChronoDuration::days(d));
        item
    }

    fn refresher(catalog: Arc<FakeCatalog>, rows: Vec<WatchlistItem>) -> (Refresher, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_items(rows));
        let refresher = Refresher::new(store.clone(), Enricher::new(catalog), "US").with_clock(now);
        (refresher, store)
    }

    #[tokio::test]
    async fn test_bounded_takes_stalest_and_isolates_failures() {
        let catalog = Arc::new(FakeCatalog::new());
        for id in 1..=4 {
            catalog.put(MediaKind::Movie, movie_details(id, &format!("Movie {}", id), Some(days(30))));
        }
        catalog.fail(2);

        let rows = vec![
            row(1, "Movie 1", ItemStatus::MovieComingSoon, None),
            row(2, "Movie 2", ItemStatus::MovieComingSoon, Some(30)),
            row(3, "Movie 3", ItemStatus::MovieComingSoon, Some(20)),
            row(4, "Movie 4", ItemStatus::MovieComingSoon, Some(1)),
            row(5, "Done", ItemStatus::MovieWatched, None),
        ];
        let failing_id = rows[1].id;
        let failing_before = rows[1].clone();
        let (refresher, store) = refresher(catalog, rows);

        let report = refresher
            .run(RefreshPolicy::Bounded {
                limit: 3,
                budget: Duration::from_secs(5),
            })
            .await
            .unwrap();

        assert_eq!(report.count(), 3);
        assert_eq!(report.refreshed(), 2);
        assert_eq!(report.failures(), 1);
        let mut titles = report.processed_titles();
        titles.sort();
        assert_eq!(titles, vec!["Movie 1", "Movie 3"]);

        assert_eq!(store.get(failing_id).await.unwrap().unwrap(), failing_before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_budget_times_out_slow_items() {
        let catalog = Arc::new(FakeCatalog::with_delay(Duration::from_secs(120)));
        catalog.put(MediaKind::Movie, movie_details(1, "Slow", Some(days(30))));
        let (refresher, _) = refresher(catalog, vec![row(1, "Slow", ItemStatus::MovieComingSoon, None)]);

        let report = refresher
            .run(RefreshPolicy::Bounded {
                limit: 5,
                budget: Duration::from_secs(55),
            })
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].outcome, Outcome::TimedOut);
        assert!(report.processed_titles().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_paces_chunks() {
        let catalog = Arc::new(FakeCatalog::new());
        let mut rows = Vec::new();
        for id in 1..=5 {
            catalog.put(MediaKind::Movie, movie_details(id, &format!("Movie {}", id), Some(days(30))));
            rows.push(row(id, &format!("Movie {}", id), ItemStatus::MovieOnOtt, Some(id as i64)));
        }
        let (refresher, _) = refresher(catalog.clone(), rows);

        let started = tokio::time::Instant::now();
        let report = refresher
            .run(RefreshPolicy::Sweep {
                chunk_size: 2,
                delay: Duration::from_secs(60),
            })
            .await
            .unwrap();

        // Three chunks, two pauses
        assert_eq!(started.elapsed(), Duration::from_secs(120));
        assert_eq!(report.refreshed(), 5);
        assert_eq!(catalog.calls(), 5);
    }

    #[tokio::test]
    async fn test_interactive_refreshes_one_row() {
        let catalog = Arc::new(FakeCatalog::new());
        catalog.put(MediaKind::Movie, movie_details(1, "Renamed", Some(days(-3))));
        let item = row(1, "Old Name", ItemStatus::MovieComingSoon, Some(3));
        let id = item.id;
        let (refresher, store) = refresher(catalog, vec![item]);

        let report = refresher.run(RefreshPolicy::Interactive(id)).await.unwrap();
        assert_eq!(report.policy, "interactive");
        assert_eq!(report.processed_titles(), vec!["Renamed"]);

        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.metadata.overlay.last_updated_at, Some(now()));
    }

    #[tokio::test]
    async fn test_interactive_missing_row() {
        let (refresher, _) = refresher(Arc::new(FakeCatalog::new()), Vec::new());
        let result = refresher.run(RefreshPolicy::Interactive(Uuid::new_v4())).await;
        assert!(matches!(result, Err(TrackerError::NotFound(_))));
    }

    #[test]
    fn test_policies_from_config() {
        let config = RefreshConfig::default();
        assert_eq!(
            RefreshPolicy::bounded(&config),
            RefreshPolicy::Bounded {
                limit: 5,
                budget: Duration::from_secs(55)
            }
        );
        assert_eq!(
            RefreshPolicy::sweep(&config),
            RefreshPolicy::Sweep {
                chunk_size: 10,
                delay: Duration::from_secs(60)
            }
        );
    }
}
