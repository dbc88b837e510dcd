use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;
use yt_playlist_feed::config::Config;
use yt_playlist_feed::db;
use yt_playlist_feed::error::{ApiError, PipelineError};
use yt_playlist_feed::model::{Playlist, PlaylistItem};
use yt_playlist_feed::pipeline::{Pipeline, RunSummary};
use yt_playlist_feed::youtube::CatalogApi;

async fn setup_pool() -> db::Pool {
    let pool = db::init_pool("sqlite::memory:").await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

fn config_in(dir: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.paths.input = dir.join("playlists.json").to_string_lossy().to_string();
    cfg.paths.output = dir.join("feed.json").to_string_lossy().to_string();
    cfg.paths.database = dir.join("store.db").to_string_lossy().to_string();
    cfg
}

fn write_input(cfg: &Config, body: Value) {
    std::fs::write(&cfg.paths.input, body.to_string()).unwrap();
}

fn read_output(cfg: &Config) -> Value {
    let text = std::fs::read_to_string(&cfg.paths.output).unwrap();
    serde_json::from_str(&text).unwrap()
}

fn feed_ids(doc: &Value) -> Vec<String> {
    doc["feeds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap().to_string())
        .collect()
}

fn unavailable(endpoint: &'static str) -> ApiError {
    ApiError::Http {
        endpoint,
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: "backendError".into(),
    }
}

/// Scripted catalog that records every call in order.
#[derive(Clone, Default)]
struct RecordingCatalog {
    handles: HashMap<String, String>,
    channel_playlists: HashMap<String, Vec<String>>,
    playlists: HashMap<String, Playlist>,
    items: HashMap<String, Vec<PlaylistItem>>,
    failing_details: Vec<String>,
    failing_searches: Vec<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingCatalog {
    fn handle(mut self, handle: &str, channel_id: &str) -> Self {
        self.handles.insert(handle.into(), channel_id.into());
        self
    }

    fn channel(mut self, channel_id: &str, playlist_ids: &[&str]) -> Self {
        self.channel_playlists.insert(
            channel_id.into(),
            playlist_ids.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    fn playlist(mut self, id: &str, title: &str, videos: &[(&str, &str)]) -> Self {
        self.playlists.insert(
            id.into(),
            Playlist {
                id: id.into(),
                title: title.into(),
                description: String::new(),
            },
        );
        self.items.insert(
            id.into(),
            videos
                .iter()
                .map(|(vid, title)| PlaylistItem {
                    video_id: vid.to_string(),
                    title: title.to_string(),
                    description: String::new(),
                })
                .collect(),
        );
        self
    }

    fn fail_detail(mut self, playlist_id: &str) -> Self {
        self.failing_details.push(playlist_id.into());
        self
    }

    fn fail_search(mut self, handle: &str) -> Self {
        self.failing_searches.push(handle.into());
        self
    }

    async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: String) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait::async_trait]
impl CatalogApi for RecordingCatalog {
    async fn search_channel(&self, handle: &str) -> Result<Option<String>, ApiError> {
        self.record(format!("search:{handle}")).await;
        if self.failing_searches.iter().any(|h| h == handle) {
            return Err(unavailable("search"));
        }
        Ok(self.handles.get(handle).cloned())
    }

    async fn list_channel_playlists(
        &self,
        channel_id: &str,
        max_results: u32,
    ) -> Result<Vec<String>, ApiError> {
        self.record(format!("channel:{channel_id}")).await;
        let mut ids = self
            .channel_playlists
            .get(channel_id)
            .cloned()
            .unwrap_or_default();
        ids.truncate(max_results as usize);
        Ok(ids)
    }

    async fn get_playlist(&self, playlist_id: &str) -> Result<Option<Playlist>, ApiError> {
        self.record(format!("detail:{playlist_id}")).await;
        if self.failing_details.iter().any(|p| p == playlist_id) {
            return Err(unavailable("playlists"));
        }
        Ok(self.playlists.get(playlist_id).cloned())
    }

    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        max_results: u32,
    ) -> Result<Vec<PlaylistItem>, ApiError> {
        self.record(format!("items:{playlist_id}")).await;
        let mut items = self.items.get(playlist_id).cloned().unwrap_or_default();
        items.truncate(max_results as usize);
        Ok(items)
    }
}

async fn run(cfg: &Config, api: &RecordingCatalog, pool: &db::Pool) -> Result<RunSummary, PipelineError> {
    Pipeline::new(cfg, api, pool).run().await
}

fn tempdir() -> TempDir {
    tempfile::tempdir().unwrap()
}

#[tokio::test]
async fn creator_handle_scenario_produces_expected_feed() {
    let td = tempdir();
    let cfg = config_in(td.path());
    write_input(&cfg, json!({"playlist_ids": [], "channel_ids": ["@creator"]}));
    let api = RecordingCatalog::default()
        .handle("@creator", "C9")
        .channel("C9", &["PL1"])
        .playlist("PL1", "Talks", &[("v1", "Intro")]);
    let pool = setup_pool().await;

    let summary = run(&cfg, &api, &pool).await.unwrap();
    assert_eq!(summary.channels_resolved, 1);
    assert_eq!(summary.playlists_ingested, 1);
    assert_eq!(summary.videos_ingested, 1);

    assert_eq!(
        read_output(&cfg),
        json!({"feeds": [{
            "title": "Talks",
            "id": "PL1",
            "description": "",
            "type": "youtube_playlist",
            "videos": [{
                "title": "Intro",
                "url": "https://www.youtube.com/watch?v=v1",
                "description": ""
            }]
        }]})
    );
    assert_eq!(
        api.calls().await,
        vec!["search:@creator", "channel:C9", "detail:PL1", "items:PL1"]
    );
}

#[tokio::test]
async fn unresolved_handle_is_skipped_and_run_succeeds() {
    let td = tempdir();
    let cfg = config_in(td.path());
    write_input(
        &cfg,
        json!({"playlist_ids": ["P0"], "channel_ids": ["@ghost", "C1"]}),
    );
    let api = RecordingCatalog::default()
        .channel("C1", &["P1"])
        .playlist("P0", "Explicit", &[])
        .playlist("P1", "From channel", &[("a", "A")]);
    let pool = setup_pool().await;

    let summary = run(&cfg, &api, &pool).await.unwrap();
    assert_eq!(summary.unresolved_handles, vec!["@ghost"]);
    assert_eq!(summary.channels_resolved, 1);
    assert_eq!(feed_ids(&read_output(&cfg)), vec!["P0", "P1"]);
    // raw channel IDs are not looked up
    assert!(!api.calls().await.contains(&"search:C1".to_string()));
}

#[tokio::test]
async fn explicit_and_discovered_playlists_appear_once_each() {
    let td = tempdir();
    let cfg = config_in(td.path());
    write_input(&cfg, json!({"playlist_ids": ["P1"], "channel_ids": ["C1"]}));
    let api = RecordingCatalog::default()
        .channel("C1", &["P2", "P1"])
        .playlist("P1", "One", &[("v1", "first")])
        .playlist("P2", "Two", &[("v2", "second")]);
    let pool = setup_pool().await;

    run(&cfg, &api, &pool).await.unwrap();

    let ids = feed_ids(&read_output(&cfg));
    assert_eq!(ids, vec!["P1", "P2"]);
    let details = api
        .calls()
        .await
        .into_iter()
        .filter(|c| c == "detail:P1")
        .count();
    assert_eq!(details, 1);
}

#[tokio::test]
async fn second_identical_run_changes_nothing() {
    let td = tempdir();
    let cfg = config_in(td.path());
    write_input(&cfg, json!({"playlist_ids": ["P1"], "channel_ids": ["C1"]}));
    let api = RecordingCatalog::default()
        .channel("C1", &["P2"])
        .playlist("P1", "One", &[("v1", "first"), ("v2", "second")])
        .playlist("P2", "Two", &[("v3", "third")]);
    let pool = setup_pool().await;

    run(&cfg, &api, &pool).await.unwrap();
    let first = std::fs::read(&cfg.paths.output).unwrap();
    let counts = (
        db::count_playlists(&pool).await.unwrap(),
        db::count_videos(&pool).await.unwrap(),
    );

    run(&cfg, &api, &pool).await.unwrap();
    let second = std::fs::read(&cfg.paths.output).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        counts,
        (
            db::count_playlists(&pool).await.unwrap(),
            db::count_videos(&pool).await.unwrap()
        )
    );
    assert_eq!(counts, (2, 3));
}

#[tokio::test]
async fn fault_during_detail_fetch_keeps_earlier_commits() {
    let td = tempdir();
    let cfg = config_in(td.path());
    write_input(&cfg, json!({"playlist_ids": ["P1", "P2", "P3"]}));
    let api = RecordingCatalog::default()
        .playlist("P1", "One", &[("v1", "first")])
        .playlist("P2", "Two", &[("v2", "second")])
        .playlist("P3", "Three", &[])
        .fail_detail("P2");
    let pool = setup_pool().await;

    let err = run(&cfg, &api, &pool).await.unwrap_err();
    assert!(matches!(err, PipelineError::Api(_)));
    assert_eq!(err.exit_code(), 1);
    assert!(err.diagnostic().starts_with("An HTTP error occurred"));

    let stored = db::read_all(&pool).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].playlist.id, "P1");
    assert_eq!(stored[0].videos[0].id, "v1");
    // nothing after the fault is attempted, and no output is written
    assert!(!api.calls().await.contains(&"detail:P3".to_string()));
    assert!(!Path::new(&cfg.paths.output).exists());
}

#[tokio::test]
async fn fault_during_handle_lookup_aborts_before_any_write() {
    let td = tempdir();
    let cfg = config_in(td.path());
    write_input(&cfg, json!({"playlist_ids": ["P1"], "channel_ids": ["@flaky"]}));
    let api = RecordingCatalog::default()
        .playlist("P1", "One", &[])
        .fail_search("@flaky");
    let pool = setup_pool().await;

    let err = run(&cfg, &api, &pool).await.unwrap_err();
    assert!(matches!(err, PipelineError::Api(_)));
    assert_eq!(db::count_playlists(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn playlist_detail_is_fetched_before_its_items() {
    let td = tempdir();
    let cfg = config_in(td.path());
    write_input(&cfg, json!({"playlist_ids": ["P1", "P2"]}));
    let api = RecordingCatalog::default()
        .playlist("P1", "One", &[("v1", "first")])
        .playlist("P2", "Two", &[("v2", "second")]);
    let pool = setup_pool().await;

    run(&cfg, &api, &pool).await.unwrap();
    assert_eq!(
        api.calls().await,
        vec!["detail:P1", "items:P1", "detail:P2", "items:P2"]
    );
}

#[tokio::test]
async fn video_in_two_playlists_belongs_to_the_last_one() {
    let td = tempdir();
    let cfg = config_in(td.path());
    write_input(&cfg, json!({"playlist_ids": ["P1", "P2"]}));
    let api = RecordingCatalog::default()
        .playlist("P1", "One", &[("shared", "Shared"), ("v1", "only one")])
        .playlist("P2", "Two", &[("shared", "Shared")]);
    let pool = setup_pool().await;

    run(&cfg, &api, &pool).await.unwrap();
    let doc = read_output(&cfg);
    assert_eq!(doc["feeds"][0]["videos"].as_array().unwrap().len(), 1);
    assert_eq!(doc["feeds"][1]["videos"][0]["title"], "Shared");
    assert_eq!(db::count_videos(&pool).await.unwrap(), 2);
}

#[tokio::test]
async fn unknown_playlist_is_skipped_without_fetching_items() {
    let td = tempdir();
    let cfg = config_in(td.path());
    write_input(&cfg, json!({"playlist_ids": ["gone", "P1"]}));
    let api = RecordingCatalog::default().playlist("P1", "One", &[]);
    let pool = setup_pool().await;

    let summary = run(&cfg, &api, &pool).await.unwrap();
    assert_eq!(summary.playlists_skipped, vec!["gone"]);
    assert_eq!(summary.playlists_ingested, 1);
    assert!(!api.calls().await.contains(&"items:gone".to_string()));
    assert_eq!(feed_ids(&read_output(&cfg)), vec!["P1"]);
}

#[tokio::test]
async fn missing_input_file_yields_empty_feed() {
    let td = tempdir();
    let cfg = config_in(td.path());
    let api = RecordingCatalog::default();
    let pool = setup_pool().await;

    let summary = run(&cfg, &api, &pool).await.unwrap();
    assert_eq!(summary, RunSummary::default());
    assert_eq!(read_output(&cfg), json!({"feeds": []}));
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn playlists_from_earlier_runs_stay_in_the_feed() {
    let td = tempdir();
    let cfg = config_in(td.path());
    let api = RecordingCatalog::default()
        .playlist("P1", "One", &[])
        .playlist("P2", "Two", &[]);
    let pool = setup_pool().await;

    write_input(&cfg, json!({"playlist_ids": ["P1"]}));
    run(&cfg, &api, &pool).await.unwrap();
    write_input(&cfg, json!({"playlist_ids": ["P2"]}));
    run(&cfg, &api, &pool).await.unwrap();

    assert_eq!(feed_ids(&read_output(&cfg)), vec!["P1", "P2"]);
}

#[tokio::test]
async fn page_size_bounds_every_listing() {
    let td = tempdir();
    let mut cfg = config_in(td.path());
    cfg.youtube.page_size = 1;
    write_input(&cfg, json!({"channel_ids": ["C1"]}));
    let api = RecordingCatalog::default()
        .channel("C1", &["P1", "P2"])
        .playlist("P1", "One", &[("v1", "a"), ("v2", "b")])
        .playlist("P2", "Two", &[]);
    let pool = setup_pool().await;

    let summary = run(&cfg, &api, &pool).await.unwrap();
    assert_eq!(summary.playlists_ingested, 1);
    assert_eq!(summary.videos_ingested, 1);
}

#[tokio::test]
async fn concurrent_fetching_gives_the_same_feed() {
    let api = RecordingCatalog::default()
        .handle("@creator", "C9")
        .channel("C9", &["P3", "P4"])
        .channel("C8", &["P5"])
        .playlist("P1", "One", &[("v1", "a")])
        .playlist("P3", "Three", &[("v3", "c")])
        .playlist("P4", "Four", &[("v4", "d"), ("v1", "a")])
        .playlist("P5", "Five", &[]);
    let input = json!({"playlist_ids": ["P1"], "channel_ids": ["@creator", "C8"]});

    let mut outputs = Vec::new();
    for concurrency in [1, 4] {
        let td = tempdir();
        let mut cfg = config_in(td.path());
        cfg.youtube.concurrency = concurrency;
        write_input(&cfg, input.clone());
        let pool = setup_pool().await;
        run(&cfg, &api, &pool).await.unwrap();
        outputs.push(std::fs::read_to_string(&cfg.paths.output).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}
