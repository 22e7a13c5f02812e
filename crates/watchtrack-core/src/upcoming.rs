use chrono::NaiveDate;
use std::cmp::Ordering;
use watchtrack_models::{
    Episode, ItemStatus, MediaKind, Metadata, UpcomingCategory, UpcomingItem, UpcomingLabel, WatchlistItem,
};

/// Statuses that imply the user follows new episodes as they air
fn is_actively_tracked(status: ItemStatus) -> bool {
    matches!(
        status,
        ItemStatus::ShowOngoing | ItemStatus::ShowReturning | ItemStatus::ShowWatching | ItemStatus::ShowWatched
    )
}

fn provider_name(metadata: &Metadata, region: &str) -> Option<String> {
    metadata
        .overlay
        .manual_ott_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .or_else(|| {
            metadata
                .region_providers(region)
                .and_then(|p| p.primary_streaming_name())
                .map(str::to_string)
        })
}

/// Map a row to its next relevant date, or `None` when it does not belong in
/// the Upcoming view
pub fn project(item: &WatchlistItem, today: NaiveDate, region: &str) -> Option<UpcomingItem> {
    let status = item.status();
    let metadata = &item.metadata;

    if status.is_settled() || metadata.overlay.dismissed_from_upcoming {
        return None;
    }

    let (date, category, label, episode) = match item.kind {
        MediaKind::Movie => project_movie(metadata, status, today)?,
        MediaKind::Show => project_show(item, status, today)?,
    };

    Some(UpcomingItem {
        id: item.id,
        tmdb_id: item.tmdb_id,
        kind: item.kind,
        title: item.title.clone(),
        poster_path: item.poster_path.clone(),
        status,
        date,
        category,
        label,
        provider_name: provider_name(metadata, region),
        episode,
    })
}

type Projection = (NaiveDate, UpcomingCategory, UpcomingLabel, Option<(u32, u32)>);

fn project_movie(metadata: &Metadata, status: ItemStatus, today: NaiveDate) -> Option<Projection> {
    let manual = metadata
        .overlay
        .manual_release_date
        .filter(|_| metadata.overlay.manual_date_override);
    let date = manual
        .or(metadata.release.digital_release_date)
        .or(metadata.release.theatrical_release_date)
        .or(metadata.release.global_release_date)
        .or(metadata.catalog.release_date)?;

    let projection = match status {
        ItemStatus::MovieOnOtt => {
            let label = if date <= today {
                UpcomingLabel::StreamingNow
            } else {
                UpcomingLabel::ComingToOtt
            };
            (date, UpcomingCategory::Ott, label, None)
        }
        ItemStatus::MovieComingSoon => {
            let label = if date > today {
                UpcomingLabel::ReleasingInTheatres
            } else {
                UpcomingLabel::Released
            };
            (date, UpcomingCategory::Theatrical, label, None)
        }
        _ => return None,
    };
    Some(projection)
}

fn dated(episode: &Option<Episode>) -> Option<(&Episode, NaiveDate)> {
    episode.as_ref().and_then(|e| e.air_date.map(|date| (e, date)))
}

fn project_show(item: &WatchlistItem, status: ItemStatus, today: NaiveDate) -> Option<Projection> {
    let catalog = &item.metadata.catalog;
    let next = dated(&catalog.next_episode_to_air);

    if matches!(status, ItemStatus::ShowWatched | ItemStatus::ShowWatching)
        && !next.is_some_and(|(_, date)| date > today)
    {
        return None;
    }
    if !item.has_started() {
        if let Some(next) = &catalog.next_episode_to_air {
            if next.episode_number != 1 {
                return None;
            }
        }
    }
    if is_actively_tracked(status) && catalog.next_episode_to_air.is_none() {
        return None;
    }

    if let Some((episode, date)) = next {
        let label = match date.cmp(&today) {
            Ordering::Less => UpcomingLabel::StreamingNow,
            Ordering::Equal => UpcomingLabel::AirsToday,
            Ordering::Greater => UpcomingLabel::NewEpisode,
        };
        return Some((
            date,
            UpcomingCategory::Ott,
            label,
            Some((episode.season_number, episode.episode_number)),
        ));
    }

    if let Some((episode, date)) = dated(&catalog.last_episode_to_air) {
        return Some((
            date,
            UpcomingCategory::Ott,
            UpcomingLabel::LatestEpisode,
            Some((episode.season_number, episode.episode_number)),
        ));
    }

    if let Some(date) = catalog.first_air_date.or(catalog.release_date) {
        let label = if status == ItemStatus::ShowNew {
            UpcomingLabel::Premiere
        } else {
            UpcomingLabel::Released
        };
        return Some((date, UpcomingCategory::Ott, label, None));
    }

    Some((today, UpcomingCategory::Ott, UpcomingLabel::StreamingNow, None))
}

/// Project every row and sort by date, then title
pub fn project_all<'a>(
    items: impl IntoIterator<Item = &'a WatchlistItem>,
    today: NaiveDate,
    region: &str,
) -> Vec<UpcomingItem> {
    let mut upcoming: Vec<UpcomingItem> = items
        .into_iter()
        .filter_map(|item| project(item, today, region))
        .collect();
    upcoming.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.title.cmp(&b.title)));
    upcoming
}
