use crate::dates::{lenient_date, null_as_default};
use crate::metadata::{CatalogFields, VideoList, WatchProviders};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Detail payload from the catalog with `watch/providers`, `videos` and
/// `external_ids` appended.
///
/// Bulk sub-resources (credits, images, reviews) are not modelled and are
/// dropped while deserializing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogDetails {
    #[serde(default)]
    pub id: u32,
    #[serde(flatten)]
    pub fields: CatalogFields,
    #[serde(rename = "watch/providers", default)]
    pub watch_providers: Option<WatchProviders>,
    #[serde(default)]
    pub videos: Option<VideoList>,
}

/// Release-date kinds as numbered by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseType {
    Premiere,
    TheatricalLimited,
    Theatrical,
    Digital,
    Physical,
    Tv,
}

impl ReleaseType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ReleaseType::Premiere),
            2 => Some(ReleaseType::TheatricalLimited),
            3 => Some(ReleaseType::Theatrical),
            4 => Some(ReleaseType::Digital),
            5 => Some(ReleaseType::Physical),
            6 => Some(ReleaseType::Tv),
            _ => None,
        }
    }
}

/// `/movie/{id}/release_dates` response
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReleaseDates {
    #[serde(default)]
    pub id: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<CountryReleaseDates>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CountryReleaseDates {
    pub iso_3166_1: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_dates: Vec<ReleaseDateEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReleaseDateEntry {
    #[serde(rename = "type", default)]
    pub release_type: u8,
    #[serde(default, with = "lenient_date")]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub certification: Option<String>,
}

impl ReleaseDateEntry {
    pub fn kind(&self) -> Option<ReleaseType> {
        ReleaseType::from_code(self.release_type)
    }
}

/// One page of search results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<CatalogSummary>,
}

/// Search/trending entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub id: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default, with = "lenient_date")]
    pub release_date: Option<NaiveDate>,
    #[serde(default, with = "lenient_date")]
    pub first_air_date: Option<NaiveDate>,
    /// Only present on multi-type endpoints
    #[serde(default)]
    pub media_type: Option<String>,
}

impl CatalogSummary {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().or(self.name.as_deref()).unwrap_or("Unknown")
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.release_date.or(self.first_air_date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingWindow {
    Day,
    Week,
}

impl TrendingWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingWindow::Day => "day",
            TrendingWindow::Week => "week",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_details_drop_bulk_resources() {
        let raw = json!({
            "id": 1399,
            "name": "Game of Thrones",
            "first_air_date": "2011-04-17",
            "status": "Ended",
            "number_of_seasons": 8,
            "credits": { "cast": [] },
            "reviews": { "results": [] },
            "external_ids": { "imdb_id": "tt0944947", "tvdb_id": 121361 },
            "videos": { "results": [{ "key": "abc", "site": "YouTube", "type": "Trailer", "name": "Trailer" }] }
        });

        let details: CatalogDetails = serde_json::from_value(raw).unwrap();
        assert_eq!(details.id, 1399);
        assert_eq!(details.fields.imdb_id(), Some("tt0944947"));
        assert_eq!(details.fields.number_of_seasons, Some(8));
        assert!(details.videos.unwrap().first_trailer().is_some());
    }

    #[test]
    fn test_release_dates_parse_timestamps() {
        let raw = json!({
            "id": 693134,
            "results": [{
                "iso_3166_1": "US",
                "release_dates": [
                    { "type": 3, "release_date": "2024-03-01T00:00:00.000Z", "note": "", "certification": "PG-13" },
                    { "type": 4, "release_date": "2024-04-16T00:00:00.000Z", "note": "Max" }
                ]
            }]
        });

        let dates: ReleaseDates = serde_json::from_value(raw).unwrap();
        let us = &dates.results[0];
        assert_eq!(us.release_dates[0].kind(), Some(ReleaseType::Theatrical));
        assert_eq!(us.release_dates[1].release_date, NaiveDate::from_ymd_opt(2024, 4, 16));
    }
}
