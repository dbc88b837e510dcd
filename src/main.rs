use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use yt_playlist_feed::config::{self, Config};
use yt_playlist_feed::db;
use yt_playlist_feed::error::PipelineError;
use yt_playlist_feed::pipeline::Pipeline;
use yt_playlist_feed::youtube::YouTubeClient;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Store YouTube playlists in SQLite and generate a playlist feed"
)]
struct Args {
    /// Path to YAML config file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Input JSON with `playlist_ids` and `channel_ids`
    #[arg(long)]
    input: Option<String>,

    /// Where to write the feed document
    #[arg(long)]
    output: Option<String>,

    /// SQLite database file; takes precedence over DATABASE_URL, which in
    /// turn takes precedence over `paths.database`
    #[arg(long)]
    database: Option<String>,

    /// Print an example config and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if args.print_config {
        print!("{}", config::example());
        return ExitCode::SUCCESS;
    }

    let result = match prepare(&args) {
        Ok(cfg) => {
            let database_url = cfg.resolve_database_url(
                args.database.as_deref(),
                std::env::var("DATABASE_URL").ok(),
            );
            run(&cfg, &database_url).await
        }
        Err(err) => Err(PipelineError::Other(err)),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.diagnostic());
            ExitCode::from(err.exit_code())
        }
    }
}

fn prepare(args: &Args) -> Result<Config> {
    let mut cfg = config::load(args.config.as_deref())?;
    if let Some(input) = &args.input {
        cfg.paths.input = input.clone();
    }
    if let Some(output) = &args.output {
        cfg.paths.output = output.clone();
    }
    if let Some(database) = &args.database {
        cfg.paths.database = database.clone();
    }
    config::validate(&cfg)?;
    cfg.apply_api_key_fallback(std::env::var("YOUTUBE_API_KEY").ok());
    cfg.require_api_key()?;
    cfg.ensure_dirs().context("failed to create output directory")?;
    Ok(cfg)
}

async fn run(cfg: &Config, database_url: &str) -> Result<(), PipelineError> {
    let pool = db::init_pool(database_url).await?;
    db::run_migrations(&pool).await?;

    let client = YouTubeClient::from_config(cfg)?;
    let summary = Pipeline::new(cfg, &client, &pool).run().await?;
    info!(
        channels = summary.channels_resolved,
        unresolved = summary.unresolved_handles.len(),
        playlists = summary.playlists_ingested,
        skipped = summary.playlists_skipped.len(),
        videos = summary.videos_ingested,
        feeds = summary.feed_entries,
        "run complete"
    );
    pool.close().await;
    Ok(())
}
