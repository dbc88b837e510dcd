//! Pipeline driver: one linear pass from input file to feed document.
use futures::StreamExt;
use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::catalog;
use crate::config::Config;
use crate::db::{self, Pool};
use crate::error::PipelineError;
use crate::feed;
use crate::input;
use crate::resolver;
use crate::youtube::CatalogApi;

/// Driver states, in the only order they are visited. `Failed` is reachable
/// from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ResolveChannels,
    ExpandChannelsToPlaylists,
    ExpandPlaylistsToDetailsAndVideos,
    CommitStore,
    ReadStore,
    Materialize,
    WriteOutput,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::ResolveChannels => "resolve_channels",
            Stage::ExpandChannelsToPlaylists => "expand_channels_to_playlists",
            Stage::ExpandPlaylistsToDetailsAndVideos => "expand_playlists_to_details_and_videos",
            Stage::CommitStore => "commit_store",
            Stage::ReadStore => "read_store",
            Stage::Materialize => "materialize",
            Stage::WriteOutput => "write_output",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub channels_resolved: usize,
    pub unresolved_handles: Vec<String>,
    pub playlists_ingested: usize,
    /// Playlist IDs the catalog did not return.
    pub playlists_skipped: Vec<String>,
    pub videos_ingested: usize,
    pub feed_entries: usize,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    api: &'a dyn CatalogApi,
    pool: &'a Pool,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, api: &'a dyn CatalogApi, pool: &'a Pool) -> Self {
        Self { config, api, pool }
    }

    /// Execute every stage once. Nothing is retried here; the first fault
    /// ends the run and whatever was committed before it stays committed.
    #[instrument(skip_all)]
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        let mut stage = Stage::Init;
        match self.run_stages(&mut stage).await {
            Ok(summary) => {
                advance(&mut stage, Stage::Done);
                Ok(summary)
            }
            Err(err) => {
                debug!(stage = %stage, error = %err, "pipeline failed");
                advance(&mut stage, Stage::Failed);
                Err(err)
            }
        }
    }

    async fn run_stages(&self, stage: &mut Stage) -> Result<RunSummary, PipelineError> {
        let yt = &self.config.youtube;
        let mut summary = RunSummary::default();

        let spec = input::load(&self.config.input_path()).await?;
        if spec.is_empty() {
            warn!(input = %self.config.paths.input, "no playlists or channels to ingest");
        }

        advance(stage, Stage::ResolveChannels);
        let resolution = resolver::resolve_channels(self.api, &spec.channel_ids).await?;
        summary.channels_resolved = resolution.channel_ids.len();
        summary.unresolved_handles = resolution.unresolved;

        advance(stage, Stage::ExpandChannelsToPlaylists);
        let discovered = catalog::discover_playlists(
            self.api,
            &resolution.channel_ids,
            yt.page_size,
            yt.concurrency,
        )
        .await?;
        let playlist_ids = catalog::merge_playlist_ids(&spec.playlist_ids, discovered);
        info!(playlists = playlist_ids.len(), "playlists to ingest");

        advance(stage, Stage::ExpandPlaylistsToDetailsAndVideos);
        let units =
            catalog::expand_playlists(self.api, &playlist_ids, yt.page_size, yt.concurrency);
        futures::pin_mut!(units);
        while let Some((playlist_id, fetched)) = units.next().await {
            match fetched? {
                Some(unit) => {
                    db::ingest_unit(self.pool, &unit).await?;
                    summary.playlists_ingested += 1;
                    summary.videos_ingested += unit.videos.len();
                    info!(%playlist_id, videos = unit.videos.len(), "playlist stored");
                }
                None => summary.playlists_skipped.push(playlist_id.to_string()),
            }
        }

        advance(stage, Stage::CommitStore);
        db::checkpoint(self.pool).await?;
        info!(
            database = %self.config.paths.database,
            playlists = summary.playlists_ingested,
            videos = summary.videos_ingested,
            "Playlists and videos stored successfully"
        );

        advance(stage, Stage::ReadStore);
        let rows = db::read_all(self.pool).await?;

        advance(stage, Stage::Materialize);
        let doc = feed::materialize(&rows);
        summary.feed_entries = doc.feeds.len();

        advance(stage, Stage::WriteOutput);
        let output = self.config.output_path();
        feed::write_feed(&output, &doc).await?;
        info!(output = %output.display(), entries = summary.feed_entries, "Feed created successfully");

        Ok(summary)
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!(from = %stage, to = %next, "pipeline stage");
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_are_stable() {
        assert_eq!(Stage::Init.to_string(), "init");
        assert_eq!(
            Stage::ExpandPlaylistsToDetailsAndVideos.to_string(),
            "expand_playlists_to_details_and_videos"
        );
        assert_eq!(Stage::Failed.as_str(), "failed");
    }

    #[test]
    fn advance_moves_forward() {
        let mut stage = Stage::Init;
        advance(&mut stage, Stage::ResolveChannels);
        assert_eq!(stage, Stage::ResolveChannels);
    }
}
