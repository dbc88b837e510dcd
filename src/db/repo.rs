use super::model::{PlaylistWithVideos, StoredPlaylist, StoredVideo};
use crate::error::StoreError;
use crate::model::{IngestUnit, Playlist, Video};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Executor, Sqlite, SqlitePool, Transaction};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, instrument};

pub type Pool = SqlitePool;

/// Open (creating if needed) the store. Writes go through a single
/// connection, so they are serialized in issue order.
pub async fn init_pool(database_url: &str) -> Result<Pool, StoreError> {
    let normalized = prepare_sqlite_url(database_url);
    let options = SqliteConnectOptions::from_str(&normalized)?
        .create_if_missing(true)
        // WAL plus FULL sync: a commit is on disk before it returns.
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// For file-backed `sqlite:` URLs, expand a leading `~/` and make sure the
/// parent directory exists. Other URLs (including in-memory) pass through.
fn prepare_sqlite_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return url.to_string();
    };
    if rest.starts_with(":memory") {
        return url.to_string();
    }
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path.is_empty() {
        return url.to_string();
    }

    let path = match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(tail), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), tail),
        _ => path.to_string(),
    };
    if let Some(parent) = Path::new(&path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match query {
        Some(q) => format!("sqlite://{path}?{q}"),
        None => format!("sqlite://{path}"),
    }
}

pub async fn run_migrations(pool: &Pool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn exec_upsert_playlist<'e, E>(executor: E, playlist: &Playlist) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO playlists (id, title, description) VALUES (?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET title = excluded.title, description = excluded.description",
    )
    .bind(&playlist.id)
    .bind(&playlist.title)
    .bind(&playlist.description)
    .execute(executor)
    .await?;
    Ok(())
}

async fn exec_upsert_video<'e, E>(executor: E, video: &Video) -> Result<(), StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO videos (id, playlist_id, title, url, description) VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
             playlist_id = excluded.playlist_id,
             title = excluded.title,
             url = excluded.url,
             description = excluded.description",
    )
    .bind(&video.id)
    .bind(&video.playlist_id)
    .bind(&video.title)
    .bind(&video.url)
    .bind(&video.description)
    .execute(executor)
    .await?;
    Ok(())
}

/// Insert or overwrite a playlist by ID.
#[instrument(skip_all)]
pub async fn upsert_playlist(pool: &Pool, playlist: &Playlist) -> Result<(), StoreError> {
    exec_upsert_playlist(pool, playlist).await
}

pub async fn upsert_playlist_tx(
    tx: &mut Transaction<'_, Sqlite>,
    playlist: &Playlist,
) -> Result<(), StoreError> {
    exec_upsert_playlist(&mut **tx, playlist).await
}

/// Insert or overwrite a video by ID. The video moves to `video.playlist_id`
/// if it was previously stored under another playlist.
///
/// Precondition: the playlist row `video.playlist_id` must already exist.
/// The store does not create missing parents; with foreign keys on, a
/// violation fails the statement.
#[instrument(skip_all)]
pub async fn upsert_video(pool: &Pool, video: &Video) -> Result<(), StoreError> {
    exec_upsert_video(pool, video).await
}

pub async fn upsert_video_tx(
    tx: &mut Transaction<'_, Sqlite>,
    video: &Video,
) -> Result<(), StoreError> {
    exec_upsert_video(&mut **tx, video).await
}

/// Write one playlist and its videos as a single transaction, playlist first.
/// The commit is the durability boundary; nothing of the unit is visible if
/// any statement fails.
#[instrument(skip_all, fields(playlist_id = %unit.playlist.id))]
pub async fn ingest_unit(pool: &Pool, unit: &IngestUnit) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;
    upsert_playlist_tx(&mut tx, &unit.playlist).await?;
    for video in &unit.videos {
        upsert_video_tx(&mut tx, video).await?;
    }
    tx.commit().await?;
    debug!(videos = unit.videos.len(), "committed ingest unit");
    Ok(())
}

/// Flush the WAL into the main database file. Run once after the last
/// ingest unit of a run.
#[instrument(skip_all)]
pub async fn checkpoint(pool: &Pool) -> Result<(), StoreError> {
    sqlx::query("PRAGMA wal_checkpoint(FULL)")
        .execute(pool)
        .await?;
    Ok(())
}

/// All playlists in first-insertion order.
#[instrument(skip_all)]
pub async fn list_playlists(pool: &Pool) -> Result<Vec<StoredPlaylist>, StoreError> {
    let rows = sqlx::query_as::<_, StoredPlaylist>(
        "SELECT id, title, description FROM playlists ORDER BY rowid",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[instrument(skip_all)]
pub async fn videos_for_playlist(
    pool: &Pool,
    playlist_id: &str,
) -> Result<Vec<StoredVideo>, StoreError> {
    let rows = sqlx::query_as::<_, StoredVideo>(
        "SELECT id, playlist_id, title, url, description FROM videos WHERE playlist_id = ? ORDER BY rowid",
    )
    .bind(playlist_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Every playlist joined with its videos, for feed materialization.
#[instrument(skip_all)]
pub async fn read_all(pool: &Pool) -> Result<Vec<PlaylistWithVideos>, StoreError> {
    let playlists = list_playlists(pool).await?;
    let mut out = Vec::with_capacity(playlists.len());
    for playlist in playlists {
        let videos = videos_for_playlist(pool, &playlist.id).await?;
        out.push(PlaylistWithVideos { playlist, videos });
    }
    Ok(out)
}

pub async fn count_playlists(pool: &Pool) -> Result<i64, StoreError> {
    let cnt: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM playlists")
        .fetch_one(pool)
        .await?;
    Ok(cnt)
}

pub async fn count_videos(pool: &Pool) -> Result<i64, StoreError> {
    let cnt: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
        .fetch_one(pool)
        .await?;
    Ok(cnt)
}
