use crate::media::MediaKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a tracked item. Decides which UI bucket the item lands in.
///
/// Movie and show statuses share one column; [`ItemStatus::kind`] tells which
/// subset a value belongs to and rows never mix them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    MovieUnwatched,
    MovieWatched,
    MovieDropped,
    MovieOnOtt,
    MovieComingSoon,
    ShowNew,
    ShowOngoing,
    ShowReturning,
    ShowWatching,
    ShowWatched,
    ShowFinished,
    ShowDropped,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 12] = [
        ItemStatus::MovieUnwatched,
        ItemStatus::MovieWatched,
        ItemStatus::MovieDropped,
        ItemStatus::MovieOnOtt,
        ItemStatus::MovieComingSoon,
        ItemStatus::ShowNew,
        ItemStatus::ShowOngoing,
        ItemStatus::ShowReturning,
        ItemStatus::ShowWatching,
        ItemStatus::ShowWatched,
        ItemStatus::ShowFinished,
        ItemStatus::ShowDropped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::MovieUnwatched => "movie_unwatched",
            ItemStatus::MovieWatched => "movie_watched",
            ItemStatus::MovieDropped => "movie_dropped",
            ItemStatus::MovieOnOtt => "movie_on_ott",
            ItemStatus::MovieComingSoon => "movie_coming_soon",
            ItemStatus::ShowNew => "show_new",
            ItemStatus::ShowOngoing => "show_ongoing",
            ItemStatus::ShowReturning => "show_returning",
            ItemStatus::ShowWatching => "show_watching",
            ItemStatus::ShowWatched => "show_watched",
            ItemStatus::ShowFinished => "show_finished",
            ItemStatus::ShowDropped => "show_dropped",
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            ItemStatus::MovieUnwatched
            | ItemStatus::MovieWatched
            | ItemStatus::MovieDropped
            | ItemStatus::MovieOnOtt
            | ItemStatus::MovieComingSoon => MediaKind::Movie,
            _ => MediaKind::Show,
        }
    }

    /// Check that this status may be written to a row of the given kind
    pub fn ensure_kind(self, kind: MediaKind) -> Result<Self, StatusMismatch> {
        if self.kind() == kind {
            Ok(self)
        } else {
            Err(StatusMismatch { status: self, kind })
        }
    }

    /// Settled statuses never show up in the Upcoming projection
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            ItemStatus::MovieWatched
                | ItemStatus::MovieDropped
                | ItemStatus::MovieUnwatched
                | ItemStatus::ShowDropped
                | ItemStatus::ShowFinished
        )
    }

    /// Statuses whose metadata can still move and are worth a background refresh
    pub fn is_refresh_eligible(&self) -> bool {
        matches!(
            self,
            ItemStatus::MovieComingSoon
                | ItemStatus::MovieOnOtt
                | ItemStatus::ShowNew
                | ItemStatus::ShowOngoing
                | ItemStatus::ShowReturning
                | ItemStatus::ShowWatching
                | ItemStatus::ShowWatched
        )
    }

    pub fn refresh_eligible() -> Vec<ItemStatus> {
        Self::ALL.into_iter().filter(|s| s.is_refresh_eligible()).collect()
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown status: {}", s))
    }
}

/// A status from one kind's subset was about to be written to a row of the other kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMismatch {
    pub status: ItemStatus,
    pub kind: MediaKind,
}

impl fmt::Display for StatusMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status '{}' is not valid for a {}", self.status, self.kind)
    }
}

impl std::error::Error for StatusMismatch {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in ItemStatus::ALL {
            assert_eq!(status.as_str().parse::<ItemStatus>().unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_ensure_kind_rejects_cross_type() {
        assert!(ItemStatus::ShowWatching.ensure_kind(MediaKind::Movie).is_err());
        assert!(ItemStatus::MovieOnOtt.ensure_kind(MediaKind::Show).is_err());
        assert_eq!(
            ItemStatus::MovieOnOtt.ensure_kind(MediaKind::Movie),
            Ok(ItemStatus::MovieOnOtt)
        );
    }

    #[test]
    fn test_refresh_eligible_excludes_settled() {
        for status in ItemStatus::refresh_eligible() {
            assert!(!status.is_settled(), "{} should not be settled", status);
        }
        assert!(!ItemStatus::ShowFinished.is_refresh_eligible());
        assert!(!ItemStatus::MovieWatched.is_refresh_eligible());
    }
}
