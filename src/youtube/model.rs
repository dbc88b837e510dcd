//! Wire shapes of the YouTube Data API v3 list responses we consume.
use serde::Deserialize;

use crate::model::{Playlist, PlaylistItem};

#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    pub channel_id: String,
}

/// Channel listing entry; only the ID is used.
#[derive(Debug, Deserialize)]
pub struct PlaylistRef {
    pub id: String,
}

/// Playlist detail. A missing snippet or title is a decode error, since a
/// stored playlist always has a title.
#[derive(Debug, Deserialize)]
pub struct PlaylistResource {
    pub id: String,
    pub snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItemResource {
    pub snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resource_id: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    #[serde(default)]
    pub video_id: Option<String>,
}

impl From<PlaylistResource> for Playlist {
    fn from(res: PlaylistResource) -> Self {
        Playlist {
            id: res.id,
            title: res.snippet.title,
            description: res.snippet.description,
        }
    }
}

impl PlaylistItemResource {
    /// Items that do not point at a video (e.g. removed entries) yield `None`.
    pub fn into_item(self) -> Option<PlaylistItem> {
        let video_id = self.snippet.resource_id?.video_id?;
        Some(PlaylistItem {
            video_id,
            title: self.snippet.title,
            description: self.snippet.description,
        })
    }
}
