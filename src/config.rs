//! Configuration loader and validator for the playlist feed pipeline.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3/";
/// Largest page the Data API hands out; also the only page we fetch.
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema. Every field has a
/// default so a partial file (or none at all) is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub youtube: YouTube,
}

/// Files read and written by a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Paths {
    pub input: String,
    pub output: String,
    pub database: String,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            input: "playlists.json".into(),
            output: "feed.json".into(),
            database: "youtube_playlists.db".into(),
        }
    }
}

/// YouTube Data API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct YouTube {
    /// Static API key. Left empty, the binary falls back to `YOUTUBE_API_KEY`.
    pub api_key: String,
    pub base_url: String,
    /// Items requested per parent. Only the first page is ever fetched.
    pub page_size: u32,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    /// Number of independent fetches kept in flight.
    pub concurrency: usize,
}

impl Default for YouTube {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_API_BASE.into(),
            page_size: MAX_PAGE_SIZE,
            request_timeout_secs: 30,
            max_retries: 2,
            retry_base_delay_ms: 500,
            concurrency: 1,
        }
    }
}

impl YouTube {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Config {
    /// Fill an empty `youtube.api_key` from the environment value, if any.
    pub fn apply_api_key_fallback(&mut self, env_value: Option<String>) {
        if self.youtube.api_key.trim().is_empty() {
            if let Some(key) = env_value.filter(|k| !k.trim().is_empty()) {
                self.youtube.api_key = key;
            }
        }
    }

    /// The credential, required only by operations that reach the API.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        let key = self.youtube.api_key.trim();
        if key.is_empty() {
            return Err(ConfigError::Invalid(
                "youtube.api_key must be set (or YOUTUBE_API_KEY exported)",
            ));
        }
        Ok(key)
    }

    /// SQLite URL for the configured database file.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.paths.database)
    }

    /// Store URL by precedence: an explicit database path, then a non-empty
    /// `DATABASE_URL` value, then `paths.database`.
    pub fn resolve_database_url(&self, explicit: Option<&str>, env_url: Option<String>) -> String {
        if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
            return format!("sqlite://{path}");
        }
        env_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| self.database_url())
    }

    pub fn input_path(&self) -> PathBuf {
        PathBuf::from(&self.paths.input)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.paths.output)
    }

    /// Ensure parent directories of the output file exist.
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if let Some(parent) = Path::new(&self.paths.output).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, the built-in defaults are used.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let cfg = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Config::default(),
    };
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance. The API key is checked separately by
/// [`Config::require_api_key`] so store-only tools run without one.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.paths.input.trim().is_empty() {
        return Err(ConfigError::Invalid("paths.input must be non-empty"));
    }
    if cfg.paths.output.trim().is_empty() {
        return Err(ConfigError::Invalid("paths.output must be non-empty"));
    }
    if cfg.paths.database.trim().is_empty() {
        return Err(ConfigError::Invalid("paths.database must be non-empty"));
    }

    if cfg.youtube.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("youtube.base_url must be non-empty"));
    }
    if cfg.youtube.page_size == 0 || cfg.youtube.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Invalid("youtube.page_size must be in 1..=50"));
    }
    if cfg.youtube.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid("youtube.request_timeout_secs must be > 0"));
    }
    if cfg.youtube.concurrency == 0 {
        return Err(ConfigError::Invalid("youtube.concurrency must be > 0"));
    }
    // max_retries may be 0: a single attempt per request

    Ok(())
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"paths:
  input: "playlists.json"
  output: "feed.json"
  database: "youtube_playlists.db"

youtube:
  # Leave empty to read YOUTUBE_API_KEY from the environment.
  api_key: ""
  base_url: "https://www.googleapis.com/youtube/v3/"
  # Only the first page is fetched per channel/playlist (max 50).
  page_size: 50
  request_timeout_secs: 30
  max_retries: 2
  retry_base_delay_ms: 500
  concurrency: 1
"#
}
