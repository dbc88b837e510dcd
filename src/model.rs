use serde::{Deserialize, Serialize};

/// Fixed watch-URL template; a video's canonical URL is this plus its ID.
pub const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL_PREFIX, video_id)
}

/// A channel reference as written in the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// Human-readable `@handle`, needs a lookup.
    Handle(String),
    /// Already a canonical channel ID.
    Id(String),
}

impl ChannelRef {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with('@') {
            ChannelRef::Handle(raw.to_string())
        } else {
            ChannelRef::Id(raw.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub playlist_id: String,
    pub title: String,
    pub url: String,
    pub description: String,
}

/// One member of a playlist as reported by the catalog, before it is bound
/// to its owning playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItem {
    pub video_id: String,
    pub title: String,
    pub description: String,
}

impl PlaylistItem {
    pub fn into_video(self, playlist_id: &str) -> Video {
        Video {
            url: watch_url(&self.video_id),
            id: self.video_id,
            playlist_id: playlist_id.to_string(),
            title: self.title,
            description: self.description,
        }
    }
}

/// A playlist and the videos fetched with it; written to the store as one
/// transaction, playlist first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestUnit {
    pub playlist: Playlist,
    pub videos: Vec<Video>,
}
