use crate::media::MediaKind;
use crate::status::ItemStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Display-only projection of a watchlist row for the Upcoming/calendar views
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UpcomingItem {
    pub id: Uuid,
    pub tmdb_id: u32,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    pub poster_path: Option<String>,
    pub status: ItemStatus,
    pub date: NaiveDate,
    pub category: UpcomingCategory,
    pub label: UpcomingLabel,
    /// Streaming service to show next to the date, when one is known
    pub provider_name: Option<String>,
    /// Season/episode of the episode the date refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpcomingCategory {
    Ott,
    Theatrical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpcomingLabel {
    StreamingNow,
    ComingToOtt,
    ReleasingInTheatres,
    Released,
    AirsToday,
    NewEpisode,
    LatestEpisode,
    Premiere,
}

impl UpcomingLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpcomingLabel::StreamingNow => "Streaming Now",
            UpcomingLabel::ComingToOtt => "Coming to OTT",
            UpcomingLabel::ReleasingInTheatres => "Releasing in Theatres",
            UpcomingLabel::Released => "Released",
            UpcomingLabel::AirsToday => "Airs Today",
            UpcomingLabel::NewEpisode => "New Episode",
            UpcomingLabel::LatestEpisode => "Latest Episode",
            UpcomingLabel::Premiere => "Premiere",
        }
    }
}

impl fmt::Display for UpcomingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for UpcomingLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
