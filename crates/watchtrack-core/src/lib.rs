pub mod classify;
pub mod enrich;
pub mod error;
pub mod progress;
pub mod prune;
pub mod refresh;
pub mod service;
pub mod upcoming;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{classify_show, clamp_watched_season, decide_movie_status, MovieSignals, StatusDecision};
pub use enrich::{extract_release_dates, Clock, EnrichRequest, Enricher, Enrichment, ReleaseDateSummary};
pub use error::{TrackerError, TrackerResult};
pub use progress::ProgressTracker;
pub use prune::{prune, prune_metadata};
pub use refresh::{ItemOutcome, Outcome, RefreshPolicy, RefreshReport, Refresher};
pub use service::WatchlistService;
pub use upcoming::{project, project_all};
