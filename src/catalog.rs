//! Catalog expansion: channels to playlist IDs, playlist IDs to ingest units.
//!
//! Both phases read a single page per parent (at most `page_size` items, the
//! API caps it at 50). Channels with more playlists, and playlists with more
//! videos, are truncated without notice. This is a known limitation, not a
//! completeness guarantee.
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

use crate::error::ApiError;
use crate::model::IngestUnit;
use crate::youtube::CatalogApi;

/// Phase one: the public playlists of each channel, in channel order.
/// At most `concurrency` listings are in flight; results keep input order.
#[instrument(skip_all, fields(channels = channel_ids.len()))]
pub async fn discover_playlists(
    api: &dyn CatalogApi,
    channel_ids: &[String],
    page_size: u32,
    concurrency: usize,
) -> Result<Vec<String>, ApiError> {
    let per_channel: Vec<Vec<String>> = stream::iter(channel_ids)
        .map(|channel_id| async move {
            let ids = api.list_channel_playlists(channel_id, page_size).await?;
            debug!(%channel_id, playlists = ids.len(), "listed channel playlists");
            Ok::<_, ApiError>(ids)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;
    Ok(per_channel.into_iter().flatten().collect())
}

/// Explicit IDs first, then discovered ones; each ID kept once, at its first
/// position. Blank IDs are dropped.
pub fn merge_playlist_ids(explicit: &[String], discovered: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    explicit
        .iter()
        .map(|id| id.trim().to_string())
        .chain(discovered)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Phase two for one playlist: detail plus first page of members.
/// Returns `None` when the catalog has no playlist under `playlist_id`; its
/// items are then not requested, so no video can reference a missing row.
#[instrument(skip(api, page_size))]
pub async fn expand_playlist(
    api: &dyn CatalogApi,
    playlist_id: &str,
    page_size: u32,
) -> Result<Option<IngestUnit>, ApiError> {
    let Some(playlist) = api.get_playlist(playlist_id).await? else {
        warn!(%playlist_id, "playlist not found; skipping");
        return Ok(None);
    };
    let items = api.list_playlist_items(&playlist.id, page_size).await?;
    let videos = items
        .into_iter()
        .map(|item| item.into_video(&playlist.id))
        .collect();
    Ok(Some(IngestUnit { playlist, videos }))
}

/// Phase two over the whole working list, as an ordered stream. Fetches run
/// up to `concurrency` ahead; the consumer sees units in list order and
/// decides when to stop.
pub fn expand_playlists<'a>(
    api: &'a dyn CatalogApi,
    playlist_ids: &'a [String],
    page_size: u32,
    concurrency: usize,
) -> impl Stream<Item = (&'a str, Result<Option<IngestUnit>, ApiError>)> + 'a {
    stream::iter(playlist_ids)
        .map(move |id| async move { (id.as_str(), expand_playlist(api, id, page_size).await) })
        .buffered(concurrency.max(1))
}
