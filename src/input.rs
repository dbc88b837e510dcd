//! Input specification: which playlists and channels to ingest.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InputSpec {
    #[serde(default)]
    pub playlist_ids: Vec<String>,
    /// Channel handles (`@name`) or raw channel IDs.
    #[serde(default)]
    pub channel_ids: Vec<String>,
}

impl InputSpec {
    pub fn is_empty(&self) -> bool {
        self.playlist_ids.is_empty() && self.channel_ids.is_empty()
    }
}

/// Read the input file. A missing file is an empty specification.
pub async fn load(path: &Path) -> Result<InputSpec> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Ok(InputSpec::default());
    }
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read input file: {}", path.display()))?;
    parse(&content).with_context(|| format!("invalid input file: {}", path.display()))
}

pub fn parse(content: &str) -> Result<InputSpec> {
    Ok(serde_json::from_str(content)?)
}
