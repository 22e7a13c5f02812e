use crate::dates::{lenient_date, null_as_default};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata persisted in a watchlist row's `metadata` column.
///
/// Only the whitelisted catalog fields are modelled; anything else in a payload
/// or a legacy row is dropped on deserialization. The app-owned fields live in
/// [`Overlay`] and the enrichment-derived release dates in [`ReleaseInfo`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    #[serde(flatten)]
    pub catalog: CatalogFields,
    #[serde(rename = "watch/providers", default, skip_serializing_if = "Option::is_none")]
    pub watch_providers: Option<WatchProviders>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<VideoList>,
    #[serde(flatten)]
    pub release: ReleaseInfo,
    #[serde(flatten)]
    pub overlay: Overlay,
}

impl Metadata {
    pub fn display_title(&self) -> Option<&str> {
        self.catalog.display_title()
    }

    /// Provider block for one region, if the catalog had one
    pub fn region_providers(&self, region: &str) -> Option<&RegionProviders> {
        self.watch_providers.as_ref().and_then(|p| p.results.get(region))
    }

    pub fn streams_in(&self, region: &str) -> bool {
        self.region_providers(region).map(RegionProviders::has_streaming).unwrap_or(false)
    }
}

/// Catalog-owned fields, refreshed from the catalog on every enrichment
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    /// Raw lifecycle string from the catalog ("Released", "Returning Series", "Ended", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_episode_to_air: Option<Episode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_episode_to_air: Option<Episode>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub seasons: Vec<Season>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ids: Option<ExternalIds>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<Genre>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_episodes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_seasons: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub episode_run_time: Vec<u32>,
}

impl CatalogFields {
    pub fn display_title(&self) -> Option<&str> {
        self.title.as_deref().or(self.name.as_deref())
    }

    /// Movie release date, or first air date for shows
    pub fn primary_date(&self) -> Option<NaiveDate> {
        self.release_date.or(self.first_air_date)
    }

    pub fn imdb_id(&self) -> Option<&str> {
        self.external_ids
            .as_ref()
            .and_then(|ids| ids.imdb_id.as_deref())
            .or(self.imdb_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Lay a fresh payload over the stored fields. A field the payload leaves
    /// empty keeps its stored value, except `next_episode_to_air`: the catalog
    /// sends it as null once nothing is scheduled.
    pub fn merged_over(self, stored: &CatalogFields) -> CatalogFields {
        fn or_vec<T: Clone>(fresh: Vec<T>, stored: &[T]) -> Vec<T> {
            if fresh.is_empty() {
                stored.to_vec()
            } else {
                fresh
            }
        }

        CatalogFields {
            title: self.title.or_else(|| stored.title.clone()),
            name: self.name.or_else(|| stored.name.clone()),
            poster_path: self.poster_path.or_else(|| stored.poster_path.clone()),
            backdrop_path: self.backdrop_path.or_else(|| stored.backdrop_path.clone()),
            overview: self.overview.or_else(|| stored.overview.clone()),
            vote_average: self.vote_average.or(stored.vote_average),
            release_date: self.release_date.or(stored.release_date),
            first_air_date: self.first_air_date.or(stored.first_air_date),
            runtime: self.runtime.or(stored.runtime),
            status: self.status.or_else(|| stored.status.clone()),
            next_episode_to_air: self.next_episode_to_air,
            last_episode_to_air: self.last_episode_to_air.or_else(|| stored.last_episode_to_air.clone()),
            seasons: or_vec(self.seasons, &stored.seasons),
            imdb_id: self.imdb_id.or_else(|| stored.imdb_id.clone()),
            external_ids: self.external_ids.or_else(|| stored.external_ids.clone()),
            genres: or_vec(self.genres, &stored.genres),
            number_of_episodes: self.number_of_episodes.or(stored.number_of_episodes),
            number_of_seasons: self.number_of_seasons.or(stored.number_of_seasons),
            episode_run_time: or_vec(self.episode_run_time, &stored.episode_run_time),
        }
    }

    pub fn lifecycle(&self) -> ShowLifecycle {
        self.status
            .as_deref()
            .map(ShowLifecycle::from_raw)
            .unwrap_or(ShowLifecycle::Unknown)
    }
}

/// Catalog lifecycle of a show, parsed from the raw status string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowLifecycle {
    Rumored,
    Planned,
    InProduction,
    Pilot,
    Returning,
    Ended,
    Canceled,
    Miniseries,
    Unknown,
}

impl ShowLifecycle {
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "rumored" => ShowLifecycle::Rumored,
            "planned" => ShowLifecycle::Planned,
            "in production" => ShowLifecycle::InProduction,
            "pilot" => ShowLifecycle::Pilot,
            "returning series" => ShowLifecycle::Returning,
            "ended" => ShowLifecycle::Ended,
            "canceled" | "cancelled" => ShowLifecycle::Canceled,
            "miniseries" => ShowLifecycle::Miniseries,
            _ => ShowLifecycle::Unknown,
        }
    }

    /// No further seasons are expected
    pub fn is_concluded(&self) -> bool {
        matches!(self, ShowLifecycle::Ended | ShowLifecycle::Canceled | ShowLifecycle::Miniseries)
    }

    /// Announced but not yet on air
    pub fn is_prelaunch(&self) -> bool {
        matches!(
            self,
            ShowLifecycle::Planned | ShowLifecycle::InProduction | ShowLifecycle::Pilot | ShowLifecycle::Rumored
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub air_date: Option<NaiveDate>,
    #[serde(default)]
    pub season_number: u32,
    #[serde(default)]
    pub episode_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Season {
    #[serde(default)]
    pub season_number: u32,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub air_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExternalIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvdb_id: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// `watch/providers` sub-resource, keyed by ISO 3166-1 region code
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WatchProviders {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: BTreeMap<String, RegionProviders>,
}

impl WatchProviders {
    /// Streaming (subscription, ads or free) offered in at least one region
    pub fn streams_anywhere(&self) -> bool {
        self.results.values().any(RegionProviders::has_streaming)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegionProviders {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub flatrate: Vec<Provider>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub ads: Vec<Provider>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub free: Vec<Provider>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub rent: Vec<Provider>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub buy: Vec<Provider>,
}

impl RegionProviders {
    /// Rent/buy do not count: the title has to be watchable without a purchase
    pub fn has_streaming(&self) -> bool {
        !self.flatrate.is_empty() || !self.ads.is_empty() || !self.free.is_empty()
    }

    /// Name of the first streaming provider, preferring subscription services
    pub fn primary_streaming_name(&self) -> Option<&str> {
        self.flatrate
            .iter()
            .chain(self.free.iter())
            .chain(self.ads.iter())
            .map(|p| p.provider_name.as_str())
            .next()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Provider {
    #[serde(default)]
    pub provider_id: u32,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_priority: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VideoList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Video>,
}

impl VideoList {
    /// First YouTube video typed as a trailer (teasers and clips do not count)
    pub fn first_trailer(&self) -> Option<&Video> {
        self.results
            .iter()
            .find(|v| v.site.eq_ignore_ascii_case("youtube") && v.video_type == "Trailer")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Video {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub video_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official: Option<bool>,
}

/// Values computed by enrichment from secondary lookups
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReleaseInfo {
    /// Average episode runtime from the secondary runtime provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_runtime: Option<u32>,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub digital_release_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digital_release_note: Option<String>,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub theatrical_release_date: Option<NaiveDate>,
    /// Earliest theatrical or digital date in any country. Display only.
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub global_release_date: Option<NaiveDate>,
}

/// App-owned fields that survive every refresh
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Overlay {
    #[serde(default, deserialize_with = "null_as_default")]
    pub manual_date_override: bool,
    #[serde(default, with = "lenient_date", skip_serializing_if = "Option::is_none")]
    pub manual_release_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_ott_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dismissed_from_upcoming: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub moved_to_library: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
}
