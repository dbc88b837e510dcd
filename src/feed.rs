//! Feed materialization: store rows to the protocol-facing JSON document.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::db::PlaylistWithVideos;

/// Schema variant tag carried by every entry.
pub const PLAYLIST_FEED_TYPE: &str = "youtube_playlist";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedDocument {
    pub feeds: Vec<FeedEntry>,
}

/// Field order here is the key order in the written document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub id: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub videos: Vec<FeedVideo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedVideo {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// One entry per playlist, videos in the order the store returned them.
pub fn materialize(rows: &[PlaylistWithVideos]) -> FeedDocument {
    let feeds = rows
        .iter()
        .map(|row| FeedEntry {
            title: row.playlist.title.clone(),
            id: row.playlist.id.clone(),
            description: row.playlist.description.clone().unwrap_or_default(),
            kind: PLAYLIST_FEED_TYPE.to_string(),
            videos: row
                .videos
                .iter()
                .map(|v| FeedVideo {
                    title: v.title.clone(),
                    url: v.url.clone(),
                    description: v.description.clone().unwrap_or_default(),
                })
                .collect(),
        })
        .collect();
    FeedDocument { feeds }
}

/// Serialize with four-space indentation.
pub fn to_json(doc: &FeedDocument) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    doc.serialize(&mut ser).context("failed to serialize feed")?;
    String::from_utf8(buf).context("feed is not valid UTF-8")
}

/// Replace `path` with the serialized document.
pub async fn write_feed(path: &Path, doc: &FeedDocument) -> Result<()> {
    let json = to_json(doc)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write feed: {}", path.display()))
}
