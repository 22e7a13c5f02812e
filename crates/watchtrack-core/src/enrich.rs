//! Enrichment: fetch fresh catalog data for one title, merge it with what the
//! row already holds, and decide the status.
//!
//! The result is computed into a new value. Nothing is written here, so a
//! failed provider call leaves the stored row untouched.

use crate::classify::{decide_movie_status, MovieSignals, StatusDecision};
use crate::error::TrackerResult;
use crate::prune::prune_metadata;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use watchtrack_models::{
    CatalogDetails, ItemStatus, MediaKind, Metadata, ReleaseDates, ReleaseInfo, ReleaseType, WatchlistItem,
};
use watchtrack_sources::{AvailabilityProvider, CatalogProvider, RuntimeProvider, Sources};

#[derive(Debug, Clone)]
pub struct EnrichRequest<'a> {
    pub tmdb_id: u32,
    pub kind: MediaKind,
    pub region: &'a str,
    pub existing_metadata: Option<&'a Metadata>,
    pub current_status: Option<ItemStatus>,
}

impl<'a> EnrichRequest<'a> {
    /// Re-enrichment of a stored row
    pub fn for_item(item: &'a WatchlistItem, region: &'a str) -> Self {
        Self {
            tmdb_id: item.tmdb_id,
            kind: item.kind,
            region,
            existing_metadata: Some(&item.metadata),
            current_status: Some(item.status()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub initial_status: ItemStatus,
    /// Pruned, ready to persist
    pub final_metadata: Metadata,
    pub moved_to_library: bool,
}

impl Enrichment {
    /// Write the result onto a row and refresh its display columns
    pub fn apply_to(self, item: &mut WatchlistItem) -> TrackerResult<()> {
        item.set_status(self.initial_status)?;
        item.metadata = self.final_metadata;
        item.refresh_display_cache();
        Ok(())
    }
}

/// Source of "now" for drivers and the mutation service; tests pin it
pub type Clock = fn() -> DateTime<Utc>;

/// Regional release dates pulled out of a release-dates payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseDateSummary {
    pub theatrical: Option<NaiveDate>,
    pub digital: Option<NaiveDate>,
    pub digital_note: Option<String>,
    /// Earliest theatrical or digital date in any country, only when the
    /// region has no theatrical date
    pub global: Option<NaiveDate>,
}

/// Earliest dated entry of the first release type that has one
fn first_of_types(dates: &ReleaseDates, region: &str, types: &[ReleaseType]) -> Option<(NaiveDate, Option<String>)> {
    let country = dates.results.iter().find(|c| c.iso_3166_1 == region)?;
    types.iter().find_map(|wanted| {
        country
            .release_dates
            .iter()
            .filter(|entry| entry.kind() == Some(*wanted))
            .filter_map(|entry| entry.release_date.map(|date| (date, entry.note.clone())))
            .min_by_key(|(date, _)| *date)
    })
}

pub fn extract_release_dates(dates: &ReleaseDates, region: &str) -> ReleaseDateSummary {
    let theatrical = first_of_types(dates, region, &[ReleaseType::Theatrical, ReleaseType::TheatricalLimited])
        .map(|(date, _)| date);
    let digital = first_of_types(dates, region, &[ReleaseType::Digital, ReleaseType::Physical]);

    let global = if theatrical.is_none() {
        dates
            .results
            .iter()
            .flat_map(|country| country.release_dates.iter())
            .filter(|entry| {
                matches!(
                    entry.kind(),
                    Some(ReleaseType::TheatricalLimited | ReleaseType::Theatrical | ReleaseType::Digital)
                )
            })
            .filter_map(|entry| entry.release_date)
            .min()
    } else {
        None
    };

    ReleaseDateSummary {
        theatrical,
        digital: digital.as_ref().map(|(date, _)| *date),
        digital_note: digital.and_then(|(_, note)| note).filter(|note| !note.trim().is_empty()),
        global,
    }
}

#[derive(Clone)]
pub struct Enricher {
    catalog: Arc<dyn CatalogProvider>,
    availability: Option<Arc<dyn AvailabilityProvider>>,
    runtime: Option<Arc<dyn RuntimeProvider>>,
}

impl Enricher {
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self {
            catalog,
            availability: None,
            runtime: None,
        }
    }

    pub fn from_sources(sources: &Sources) -> Self {
        Self {
            catalog: sources.catalog.clone(),
            availability: sources.availability.clone(),
            runtime: sources.runtime.clone(),
        }
    }

    pub fn with_availability(mut self, availability: Arc<dyn AvailabilityProvider>) -> Self {
        self.availability = Some(availability);
        self
    }

    pub fn with_runtime(mut self, runtime: Arc<dyn RuntimeProvider>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogProvider> {
        &self.catalog
    }

    pub async fn enrich(&self, request: EnrichRequest<'_>) -> TrackerResult<Enrichment> {
        self.enrich_at(request, Utc::now()).await
    }

    /// Same as [`Enricher::enrich`] with an explicit clock. "Today" is the UTC date of `now`.
    #[instrument(skip(self, request), fields(tmdb_id = request.tmdb_id, kind = %request.kind))]
    pub async fn enrich_at(&self, request: EnrichRequest<'_>, now: DateTime<Utc>) -> TrackerResult<Enrichment> {
        let today = now.date_naive();
        let region = request.region;
        let existing = request.existing_metadata.cloned().unwrap_or_default();

        let mut details = self.catalog.details(request.tmdb_id, request.kind, region).await?;
        self.fill_missing_availability(&mut details, request.tmdb_id, request.kind, region).await;

        let manual_active = existing.overlay.manual_date_override;
        let mut release = existing.release.clone();
        let mut found_digital = false;

        match request.kind {
            MediaKind::Movie => {
                let dates = self.catalog.release_dates(request.tmdb_id).await?;
                let summary = extract_release_dates(&dates, region);
                found_digital = summary.digital.is_some();
                release = merge_release_dates(&existing.release, summary, manual_active);
            }
            MediaKind::Show => {
                release.secondary_runtime = self.lookup_runtime(&details).await;
            }
        }

        let mut merged = Metadata {
            catalog: details.fields.merged_over(&existing.catalog),
            watch_providers: details.watch_providers.or_else(|| existing.watch_providers.clone()),
            videos: details.videos.or_else(|| existing.videos.clone()),
            release,
            overlay: existing.overlay.clone(),
        };

        let decision = match request.kind {
            MediaKind::Movie => {
                let mut signals = MovieSignals::from_metadata(&merged, region);
                signals.manual_override = manual_active && existing.overlay.manual_release_date.is_some();
                decide_movie_status(&signals, request.current_status, today)
            }
            MediaKind::Show => decide_show_status(&merged, request.current_status, existing.overlay.moved_to_library),
        };

        if found_digital {
            merged.overlay.manual_date_override = false;
        }
        merged.overlay.moved_to_library = decision.moved_to_library;

        if existing.overlay.dismissed_from_upcoming {
            if let (Some(fresh), Some(stored)) =
                (merged.catalog.number_of_seasons, existing.catalog.number_of_seasons)
            {
                if fresh > stored {
                    debug!(fresh, stored, "New season detected, restoring to upcoming");
                    merged.overlay.dismissed_from_upcoming = false;
                }
            }
        }

        merged.overlay.last_updated_at = Some(now);

        Ok(Enrichment {
            initial_status: decision.status,
            final_metadata: prune_metadata(merged, region),
            moved_to_library: decision.moved_to_library,
        })
    }

    async fn fill_missing_availability(&self, details: &mut CatalogDetails, tmdb_id: u32, kind: MediaKind, region: &str) {
        let Some(availability) = &self.availability else {
            return;
        };
        let has_region = details
            .watch_providers
            .as_ref()
            .is_some_and(|p| p.results.contains_key(region));
        if has_region {
            return;
        }

        match availability.availability(tmdb_id, kind, region).await {
            Ok(Some(block)) => {
                debug!(region, "Availability fallback supplied providers");
                details
                    .watch_providers
                    .get_or_insert_with(Default::default)
                    .results
                    .insert(region.to_string(), block);
            }
            Ok(None) => debug!(region, "Availability fallback has no data"),
            Err(e) => warn!(region, error = %e, "Availability fallback failed, continuing without it"),
        }
    }

    async fn lookup_runtime(&self, details: &CatalogDetails) -> Option<u32> {
        let runtime = self.runtime.as_ref()?;
        let imdb_id = details.fields.imdb_id()?;
        match runtime.lookup_by_imdb(imdb_id).await {
            Ok(minutes) => minutes,
            Err(e) => {
                debug!(imdb_id, error = %e, "Runtime lookup failed, treating as no data");
                None
            }
        }
    }
}

/// Fresh dates win. Stored dates are kept only while a manual override is active.
fn merge_release_dates(stored: &ReleaseInfo, fresh: ReleaseDateSummary, manual_active: bool) -> ReleaseInfo {
    let keep = |fresh: Option<NaiveDate>, stored: Option<NaiveDate>| {
        fresh.or(if manual_active { stored } else { None })
    };

    let digital_note = if fresh.digital.is_some() {
        fresh.digital_note
    } else if manual_active {
        stored.digital_release_note.clone()
    } else {
        None
    };

    ReleaseInfo {
        secondary_runtime: stored.secondary_runtime,
        digital_release_date: keep(fresh.digital, stored.digital_release_date),
        digital_release_note: digital_note,
        theatrical_release_date: keep(fresh.theatrical, stored.theatrical_release_date),
        global_release_date: fresh.global,
    }
}

/// Enrichment only sets a show's status when it has none yet (or the show has
/// never aired). Progress-driven changes go through `classify_show`.
fn decide_show_status(merged: &Metadata, current: Option<ItemStatus>, moved: bool) -> StatusDecision {
    let never_aired = merged.catalog.last_episode_to_air.is_none();

    match current {
        Some(ItemStatus::ShowDropped) => StatusDecision {
            status: ItemStatus::ShowDropped,
            moved_to_library: moved,
        },
        _ if never_aired => StatusDecision {
            status: ItemStatus::ShowNew,
            moved_to_library: false,
        },
        Some(status) => StatusDecision {
            status,
            moved_to_library: moved,
        },
        None => match merged.catalog.lifecycle() {
            lifecycle if lifecycle.is_prelaunch() => StatusDecision {
                status: ItemStatus::ShowNew,
                moved_to_library: false,
            },
            lifecycle if lifecycle.is_concluded() => StatusDecision {
                status: ItemStatus::ShowFinished,
                moved_to_library: true,
            },
            _ => StatusDecision {
                status: ItemStatus::ShowOngoing,
                moved_to_library: true,
            },
        },
    }
}
