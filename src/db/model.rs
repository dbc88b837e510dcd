//! Row models returned by store reads.
//!
//! `description` columns are nullable in the schema; readers decide how to
//! render a missing value.

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredPlaylist {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredVideo {
    pub id: String,
    pub playlist_id: String,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

/// A playlist joined with the videos currently associated with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistWithVideos {
    pub playlist: StoredPlaylist,
    pub videos: Vec<StoredVideo>,
}
