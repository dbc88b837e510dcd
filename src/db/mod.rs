//! Reconciliation store: playlists and videos in SQLite.
//!
//! This module is split into two submodules:
//! - `model`: row shapes returned by read queries.
//! - `repo`: pool setup, migrations, upserts and the materialization read.
//!
//! Callers import from `yt_playlist_feed::db`; the repository API and the
//! row models are re-exported here.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::{PlaylistWithVideos, StoredPlaylist, StoredVideo};
