//! Ingest YouTube channels and playlists into SQLite and materialize a
//! playlist feed document from the store.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod input;
pub mod model;
pub mod pipeline;
pub mod resolver;
pub mod retry;
pub mod youtube;
