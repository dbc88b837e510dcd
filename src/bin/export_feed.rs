use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use yt_playlist_feed::config;
use yt_playlist_feed::db;
use yt_playlist_feed::feed;

#[derive(Debug, Parser)]
#[command(about = "Regenerate the feed document from the local store without calling the API")]
struct Args {
    /// Path to YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the output path from the config
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(args.config.as_deref())?;
    let output = args.output.unwrap_or_else(|| cfg.output_path());

    let database_url = cfg.resolve_database_url(None, std::env::var("DATABASE_URL").ok());
    let pool = db::init_pool(&database_url)
        .await
        .with_context(|| format!("failed to open {}", database_url))?;
    db::run_migrations(&pool).await?;

    let rows = db::read_all(&pool).await?;
    let doc = feed::materialize(&rows);
    feed::write_feed(&output, &doc).await?;
    info!(output = %output.display(), entries = doc.feeds.len(), "feed exported");
    println!("Feed created successfully in {}", output.display());

    pool.close().await;
    Ok(())
}
