use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::model::{Playlist, PlaylistItem};
use crate::retry::{retry_transient, RetryPolicy};
use crate::youtube::model::{
    ListResponse, PlaylistItemResource, PlaylistRef, PlaylistResource, SearchResult,
};

pub mod model;

const USER_AGENT: &str = "yt-playlist-feed/0.1";

/// Read-only view of the remote video catalog.
///
/// List operations return at most one page (`max_results` items); anything
/// past the first page is not fetched.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Look up a channel by `@handle`; `None` when nothing matches.
    async fn search_channel(&self, handle: &str) -> Result<Option<String>, ApiError>;

    /// IDs of a channel's public playlists.
    async fn list_channel_playlists(
        &self,
        channel_id: &str,
        max_results: u32,
    ) -> Result<Vec<String>, ApiError>;

    /// Playlist detail; `None` when the ID is unknown or not visible.
    async fn get_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>, ApiError>;

    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
    ) -> Result<Vec<PlaylistItem>, ApiError>;
}

#[derive(Clone)]
pub struct YouTubeClient {
    http: Client,
    base_url: Url,
    api_key: String,
    retry: RetryPolicy,
}

impl fmt::Debug for YouTubeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YouTubeClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl YouTubeClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        timeout: std::time::Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
            retry,
        })
    }

    /// Build a client from validated configuration. The API key must already
    /// be resolved.
    pub fn from_config(cfg: &Config) -> Result<Self, ApiError> {
        Self::new(
            cfg.youtube.api_key.clone(),
            &cfg.youtube.base_url,
            cfg.youtube.request_timeout(),
            RetryPolicy::new(cfg.youtube.max_retries, cfg.youtube.retry_base_delay()),
        )
    }

    /// GET `{base_url}{endpoint}` with `params` plus the API key.
    pub fn build_request(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<reqwest::Request, ApiError> {
        let mut url = self.base_url.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), endpoint);
        url.set_path(&path);
        let request = self
            .http
            .get(url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .header("Accept", "application/json")
            .build()?;
        Ok(request)
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let request = self.build_request(endpoint, params)?;
        // the URL carries the key; log the parameters only
        debug!(endpoint, ?params, "youtube api request");

        let res = self.http.execute(request).await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(endpoint, %status, "youtube api error");
            return Err(ApiError::Http {
                endpoint,
                status,
                body,
            });
        }

        let body = res.text().await?;
        debug!(endpoint, bytes = body.len(), "youtube api response");
        decode(endpoint, &body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        retry_transient(&self.retry, endpoint, |_| self.get_once(endpoint, params)).await
    }
}

pub(crate) fn decode<T: DeserializeOwned>(endpoint: &'static str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode { endpoint, source })
}

pub fn search_params(handle: &str) -> Vec<(&'static str, String)> {
    vec![
        ("part", "snippet".into()),
        ("q", handle.to_string()),
        ("type", "channel".into()),
        ("maxResults", "1".into()),
    ]
}

pub fn channel_playlists_params(channel_id: &str, max_results: u32) -> Vec<(&'static str, String)> {
    vec![
        ("part", "snippet,contentDetails".into()),
        ("channelId", channel_id.to_string()),
        ("maxResults", max_results.to_string()),
    ]
}

pub fn playlist_detail_params(playlist_id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("part", "snippet,contentDetails".into()),
        ("id", playlist_id.to_string()),
    ]
}

pub fn playlist_items_params(playlist_id: &str, max_results: u32) -> Vec<(&'static str, String)> {
    vec![
        ("part", "snippet".into()),
        ("playlistId", playlist_id.to_string()),
        ("maxResults", max_results.to_string()),
    ]
}

#[async_trait]
impl CatalogApi for YouTubeClient {
    #[instrument(skip(self))]
    async fn search_channel(&self, handle: &str) -> Result<Option<String>, ApiError> {
        let resp: ListResponse<SearchResult> =
            self.get_json("search", &search_params(handle)).await?;
        Ok(resp.items.into_iter().next().map(|r| r.snippet.channel_id))
    }

    #[instrument(skip(self))]
    async fn list_channel_playlists(
        &self,
        channel_id: &str,
        max_results: u32,
    ) -> Result<Vec<String>, ApiError> {
        let resp: ListResponse<PlaylistRef> = self
            .get_json(
                "playlists",
                &channel_playlists_params(channel_id, max_results),
            )
            .await?;
        Ok(resp.items.into_iter().map(|p| p.id).collect())
    }

    #[instrument(skip(self))]
    async fn get_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>, ApiError> {
        let resp: ListResponse<PlaylistResource> = self
            .get_json("playlists", &playlist_detail_params(playlist_id))
            .await?;
        Ok(resp.items.into_iter().next().map(Playlist::from))
    }

    #[instrument(skip(self))]
    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
    ) -> Result<Vec<PlaylistItem>, ApiError> {
        let resp: ListResponse<PlaylistItemResource> = self
            .get_json(
                "playlistItems",
                &playlist_items_params(playlist_id, max_results),
            )
            .await?;
        Ok(resp
            .items
            .into_iter()
            .filter_map(PlaylistItemResource::into_item)
            .collect())
    }
}
