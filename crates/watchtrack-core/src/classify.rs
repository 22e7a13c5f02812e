//! Status decisions shared by every mutation path and refresh driver.
//!
//! Show status is progress driven ([`classify_show`]); movie status is driven
//! by release and availability signals ([`decide_movie_status`]). Both are pure.

use chrono::{Months, NaiveDate};
use watchtrack_models::{ItemStatus, Metadata};

/// Seasons that count as released: real seasons (specials excluded) whose
/// air date is today or earlier
pub fn released_season_count(metadata: &Metadata, today: NaiveDate) -> u32 {
    metadata
        .catalog
        .seasons
        .iter()
        .filter(|s| s.season_number > 0 && s.air_date.is_some_and(|d| d <= today))
        .count() as u32
}

/// Bound a requested last-watched season by the number of released seasons
pub fn clamp_watched_season(metadata: &Metadata, season: u32, today: NaiveDate) -> u32 {
    season.min(released_season_count(metadata, today))
}

pub fn classify_show(metadata: &Metadata, last_watched_season: u32, progress: u32, today: NaiveDate) -> ItemStatus {
    if last_watched_season == 0 && progress > 0 {
        return ItemStatus::ShowWatching;
    }

    let total = released_season_count(metadata, today);
    if total == 0 {
        return if metadata.catalog.last_episode_to_air.is_some() {
            ItemStatus::ShowOngoing
        } else {
            ItemStatus::ShowNew
        };
    }

    if last_watched_season == 0 {
        return if metadata.catalog.lifecycle().is_concluded() {
            ItemStatus::ShowFinished
        } else {
            ItemStatus::ShowOngoing
        };
    }

    if last_watched_season.min(total) < total {
        return ItemStatus::ShowWatching;
    }

    match &metadata.catalog.next_episode_to_air {
        Some(next) if next.air_date.is_some_and(|d| d > today) => {
            if next.season_number == last_watched_season {
                ItemStatus::ShowWatching
            } else {
                ItemStatus::ShowReturning
            }
        }
        _ => ItemStatus::ShowWatched,
    }
}

/// Inputs to the movie decision, extracted from merged metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieSignals {
    /// Flatrate, ads or free providers in the user's region
    pub has_regional_providers: bool,
    /// Same test in any region
    pub available_anywhere: bool,
    /// Regional theatrical date when it precedes the catalog date, else the catalog date
    pub effective_release_date: Option<NaiveDate>,
    pub regional_digital_date: Option<NaiveDate>,
    pub manual_override: bool,
}

impl MovieSignals {
    pub fn from_metadata(metadata: &Metadata, region: &str) -> Self {
        let catalog_date = metadata.catalog.release_date;
        let effective_release_date = match (metadata.release.theatrical_release_date, catalog_date) {
            (Some(theatrical), Some(catalog)) if theatrical < catalog => Some(theatrical),
            (theatrical, None) => theatrical,
            (_, catalog) => catalog,
        };

        Self {
            has_regional_providers: metadata.streams_in(region),
            available_anywhere: metadata
                .watch_providers
                .as_ref()
                .map(|p| p.streams_anywhere())
                .unwrap_or(false),
            effective_release_date,
            regional_digital_date: metadata.release.digital_release_date,
            manual_override: metadata.overlay.manual_date_override && metadata.overlay.manual_release_date.is_some(),
        }
    }

    fn released(&self, today: NaiveDate) -> bool {
        self.effective_release_date.is_some_and(|d| d <= today)
    }

    fn released_before(&self, cutoff: Option<NaiveDate>) -> bool {
        match (self.effective_release_date, cutoff) {
            (Some(date), Some(cutoff)) => date <= cutoff,
            _ => false,
        }
    }

    fn released_strictly_before(&self, cutoff: Option<NaiveDate>) -> bool {
        match (self.effective_release_date, cutoff) {
            (Some(date), Some(cutoff)) => date < cutoff,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDecision {
    pub status: ItemStatus,
    pub moved_to_library: bool,
}

impl StatusDecision {
    fn new(status: ItemStatus, moved_to_library: bool) -> Self {
        Self {
            status,
            moved_to_library,
        }
    }
}

/// Where a movie lands once it is practically watchable
fn library_outcome(current: Option<ItemStatus>) -> StatusDecision {
    match current {
        None => StatusDecision::new(ItemStatus::MovieUnwatched, true),
        Some(ItemStatus::MovieComingSoon) => StatusDecision::new(ItemStatus::MovieOnOtt, false),
        Some(ItemStatus::MovieWatched) => StatusDecision::new(ItemStatus::MovieWatched, true),
        Some(_) => StatusDecision::new(ItemStatus::MovieUnwatched, true),
    }
}

pub fn decide_movie_status(signals: &MovieSignals, current: Option<ItemStatus>, today: NaiveDate) -> StatusDecision {
    let released = signals.released(today);
    let six_months_ago = today.checked_sub_months(Months::new(6));
    let one_year_ago = today.checked_sub_months(Months::new(12));

    let computed = if signals.has_regional_providers && released {
        library_outcome(current)
    } else if signals.has_regional_providers
        || signals.regional_digital_date.is_some_and(|d| d > today)
        || (current == Some(ItemStatus::MovieComingSoon) && released && signals.regional_digital_date.is_some())
        || signals.manual_override
    {
        StatusDecision::new(ItemStatus::MovieOnOtt, false)
    } else if signals.available_anywhere && signals.released_before(six_months_ago) {
        library_outcome(current)
    } else if signals.released_strictly_before(one_year_ago) {
        library_outcome(current)
    } else {
        StatusDecision::new(ItemStatus::MovieComingSoon, false)
    };

    match current {
        Some(ItemStatus::MovieWatched) => StatusDecision::new(ItemStatus::MovieWatched, true),
        Some(ItemStatus::MovieDropped) => StatusDecision::new(ItemStatus::MovieDropped, true),
        Some(ItemStatus::MovieOnOtt) if computed.status == ItemStatus::MovieUnwatched => {
            StatusDecision::new(ItemStatus::MovieOnOtt, false)
        }
        _ => computed,
    }
}
