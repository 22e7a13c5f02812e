use std::collections::BTreeMap;
use watchtrack_models::{Metadata, VideoList, WatchProviders};

/// Reduce metadata to what a row is allowed to persist.
///
/// Keeps at most one video (the first YouTube trailer) and exactly one
/// provider block, the caller's region. A missing region becomes an empty
/// block; other regions are never used as a fallback.
pub fn prune(metadata: Option<Metadata>, region: &str) -> Option<Metadata> {
    metadata.map(|m| prune_metadata(m, region))
}

pub fn prune_metadata(mut metadata: Metadata, region: &str) -> Metadata {
    let trailer = metadata
        .videos
        .as_ref()
        .and_then(VideoList::first_trailer)
        .cloned();
    metadata.videos = Some(VideoList {
        results: trailer.into_iter().collect(),
    });

    let block = metadata
        .watch_providers
        .take()
        .and_then(|mut providers| providers.results.remove(region))
        .unwrap_or_default();
    metadata.watch_providers = Some(WatchProviders {
        results: BTreeMap::from([(region.to_string(), block)]),
    });

    metadata
}
