pub mod catalog;
pub mod dates;
pub mod media;
pub mod metadata;
pub mod status;
pub mod upcoming;
pub mod watchlist;

pub use catalog::{
    CatalogDetails, CatalogSummary, CountryReleaseDates, ReleaseDateEntry, ReleaseDates, ReleaseType,
    SearchPage, TrendingWindow,
};
pub use media::MediaKind;
pub use metadata::{
    CatalogFields, Episode, ExternalIds, Genre, Metadata, Overlay, Provider, RegionProviders, ReleaseInfo,
    Season, ShowLifecycle, Video, VideoList, WatchProviders,
};
pub use status::{ItemStatus, StatusMismatch};
pub use upcoming::{UpcomingCategory, UpcomingItem, UpcomingLabel};
pub use watchlist::WatchlistItem;
