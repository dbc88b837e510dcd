use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;

use yt_playlist_feed::catalog;
use yt_playlist_feed::config;
use yt_playlist_feed::resolver;
use yt_playlist_feed::youtube::{CatalogApi, YouTubeClient};

#[derive(Debug, Parser)]
#[command(about = "Resolve one channel reference and print its first page of playlists")]
struct Args {
    /// Path to YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Channel handle (`@name`) or channel ID
    channel: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut cfg = config::load(args.config.as_deref())?;
    cfg.apply_api_key_fallback(std::env::var("YOUTUBE_API_KEY").ok());
    cfg.require_api_key()?;

    let client = YouTubeClient::from_config(&cfg)?;
    let resolution = resolver::resolve_channels(&client, std::slice::from_ref(&args.channel))
        .await
        .context("channel lookup failed")?;

    let mut channels = Vec::new();
    for channel_id in &resolution.channel_ids {
        let playlist_ids = catalog::discover_playlists(
            &client,
            std::slice::from_ref(channel_id),
            cfg.youtube.page_size,
            1,
        )
        .await?;
        let mut playlists = Vec::new();
        for id in &playlist_ids {
            if let Some(p) = client.get_playlist(id).await? {
                playlists.push(json!({ "id": p.id, "title": p.title }));
            }
        }
        channels.push(json!({ "channel_id": channel_id, "playlists": playlists }));
    }

    let out = json!({
        "input": args.channel,
        "channels": channels,
        "unresolved": resolution.unresolved,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
