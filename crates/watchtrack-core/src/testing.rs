//! Fake collaborators shared by the core tests

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use watchtrack_models::{
    CatalogDetails, CatalogFields, CatalogSummary, CountryReleaseDates, Episode, MediaKind, Provider,
    RegionProviders, ReleaseDateEntry, ReleaseDates, SearchPage, Season, TrendingWindow, Video, VideoList,
    WatchProviders,
};
use watchtrack_sources::{
    AvailabilityProvider, CatalogProvider, RuntimeProvider, SourceError, SourceResult,
};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

pub fn today() -> NaiveDate {
    now().date_naive()
}

pub fn days(offset: i64) -> NaiveDate {
    today() + Duration::days(offset)
}

pub fn provider(name: &str) -> Provider {
    Provider {
        provider_id: name.len() as u32,
        provider_name: name.to_string(),
        ..Default::default()
    }
}

pub fn streaming_in(region: &str, name: &str) -> WatchProviders {
    let mut providers = WatchProviders::default();
    providers.results.insert(
        region.to_string(),
        RegionProviders {
            flatrate: vec![provider(name)],
            ..Default::default()
        },
    );
    providers
}

pub fn movie_details(id: u32, title: &str, release: Option<NaiveDate>) -> CatalogDetails {
    CatalogDetails {
        id,
        fields: CatalogFields {
            title: Some(title.to_string()),
            poster_path: Some(format!("/{}.jpg", id)),
            vote_average: Some(7.5),
            release_date: release,
            status: Some("Released".to_string()),
            ..Default::default()
        },
        watch_providers: Some(WatchProviders::default()),
        videos: Some(VideoList {
            results: vec![Video {
                key: "trailer".to_string(),
                site: "YouTube".to_string(),
                video_type: "Trailer".to_string(),
                ..Default::default()
            }],
        }),
    }
}

pub fn show_details(id: u32, name: &str, season_air_offsets: &[i64]) -> CatalogDetails {
    let seasons: Vec<Season> = season_air_offsets
        .iter()
        .enumerate()
        .map(|(idx, offset)| Season {
            season_number: idx as u32 + 1,
            air_date: Some(days(*offset)),
            episode_count: Some(8),
            ..Default::default()
        })
        .collect();
    let aired = season_air_offsets.iter().any(|offset| *offset <= 0);

    CatalogDetails {
        id,
        fields: CatalogFields {
            name: Some(name.to_string()),
            first_air_date: season_air_offsets.first().map(|offset| days(*offset)),
            status: Some("Returning Series".to_string()),
            number_of_seasons: Some(seasons.len() as u32),
            last_episode_to_air: aired.then(|| Episode {
                air_date: Some(days(-7)),
                season_number: seasons.len() as u32,
                episode_number: 1,
                ..Default::default()
            }),
            seasons,
            imdb_id: Some(format!("tt{:07}", id)),
            ..Default::default()
        },
        watch_providers: Some(WatchProviders::default()),
        videos: None,
    }
}

pub fn release_entry(release_type: u8, date: NaiveDate, note: Option<&str>) -> ReleaseDateEntry {
    ReleaseDateEntry {
        release_type,
        release_date: Some(date),
        note: note.map(str::to_string),
        certification: None,
    }
}

pub fn release_dates(id: u32, countries: Vec<(&str, Vec<ReleaseDateEntry>)>) -> ReleaseDates {
    ReleaseDates {
        id,
        results: countries
            .into_iter()
            .map(|(code, entries)| CountryReleaseDates {
                iso_3166_1: code.to_string(),
                release_dates: entries,
            })
            .collect(),
    }
}

#[derive(Default)]
pub struct FakeCatalog {
    details: Mutex<HashMap<(u32, MediaKind), CatalogDetails>>,
    release_dates: Mutex<HashMap<u32, ReleaseDates>>,
    failing: Mutex<HashSet<u32>>,
    /// Artificial latency for every details call
    pub delay: Option<std::time::Duration>,
    pub detail_calls: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: std::time::Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn put(&self, kind: MediaKind, details: CatalogDetails) {
        self.details.lock().unwrap().insert((details.id, kind), details);
    }

    pub fn put_release_dates(&self, dates: ReleaseDates) {
        self.release_dates.lock().unwrap().insert(dates.id, dates);
    }

    pub fn fail(&self, tmdb_id: u32) {
        self.failing.lock().unwrap().insert(tmdb_id);
    }

    pub fn calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogProvider for FakeCatalog {
    fn provider_name(&self) -> &str {
        "fake-catalog"
    }

    async fn details(&self, tmdb_id: u32, kind: MediaKind, _region: &str) -> SourceResult<CatalogDetails> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&tmdb_id) {
            return Err(SourceError::Status {
                service: "fake-catalog",
                status: 500,
                body: "boom".to_string(),
            });
        }
        self.details
            .lock()
            .unwrap()
            .get(&(tmdb_id, kind))
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                service: "fake-catalog",
                what: format!("{} {}", kind, tmdb_id),
            })
    }

    async fn release_dates(&self, movie_id: u32) -> SourceResult<ReleaseDates> {
        Ok(self
            .release_dates
            .lock()
            .unwrap()
            .get(&movie_id)
            .cloned()
            .unwrap_or_else(|| ReleaseDates {
                id: movie_id,
                results: Vec::new(),
            }))
    }

    async fn search(&self, query: &str, kind: MediaKind, _region: &str, page: u32) -> SourceResult<SearchPage> {
        let results: Vec<CatalogSummary> = self
            .details
            .lock()
            .unwrap()
            .iter()
            .filter(|((_, k), d)| {
                *k == kind
                    && d.fields
                        .display_title()
                        .is_some_and(|t| t.to_lowercase().contains(&query.to_lowercase()))
            })
            .map(|(_, d)| CatalogSummary {
                id: d.id,
                title: d.fields.title.clone(),
                name: d.fields.name.clone(),
                ..Default::default()
            })
            .collect();
        Ok(SearchPage {
            page,
            total_pages: 1,
            total_results: results.len() as u32,
            results,
        })
    }

    async fn trending(&self, kind: MediaKind, _window: TrendingWindow, region: &str) -> SourceResult<SearchPage> {
        self.search("", kind, region, 1).await
    }
}

pub struct FakeRuntime {
    pub result: Result<Option<u32>, ()>,
}

#[async_trait]
impl RuntimeProvider for FakeRuntime {
    fn provider_name(&self) -> &str {
        "fake-runtime"
    }

    async fn lookup_by_imdb(&self, _imdb_id: &str) -> SourceResult<Option<u32>> {
        self.result.map_err(|_| SourceError::Timeout { service: "fake-runtime" })
    }
}

pub struct FakeAvailability {
    pub result: Result<Option<RegionProviders>, ()>,
    pub calls: AtomicUsize,
}

impl FakeAvailability {
    pub fn new(result: Result<Option<RegionProviders>, ()>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AvailabilityProvider for FakeAvailability {
    fn provider_name(&self) -> &str {
        "fake-availability"
    }

    async fn availability(
        &self,
        _tmdb_id: u32,
        _kind: MediaKind,
        _region: &str,
    ) -> SourceResult<Option<RegionProviders>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(|_| SourceError::Request {
            service: "fake-availability",
            message: "connection refused".to_string(),
        })
    }
}
