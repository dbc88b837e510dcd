//! Channel reference resolution: handles and raw IDs to canonical channel IDs.
use tracing::{debug, info, instrument, warn};

use crate::error::ApiError;
use crate::model::ChannelRef;
use crate::youtube::CatalogApi;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical channel IDs, in input order.
    pub channel_ids: Vec<String>,
    /// Handles that matched no channel; skipped.
    pub unresolved: Vec<String>,
}

/// Resolve every reference in order. A handle with no match is recorded and
/// skipped; an API fault aborts resolution.
#[instrument(skip_all, fields(refs = refs.len()))]
pub async fn resolve_channels(
    api: &dyn CatalogApi,
    refs: &[String],
) -> Result<Resolution, ApiError> {
    let mut out = Resolution::default();
    for raw in refs {
        let raw = raw.trim();
        if raw.is_empty() {
            warn!("skipping blank channel reference");
            continue;
        }
        match ChannelRef::parse(raw) {
            ChannelRef::Id(id) => out.channel_ids.push(id),
            ChannelRef::Handle(handle) => match api.search_channel(&handle).await? {
                Some(id) => {
                    debug!(%handle, channel_id = %id, "resolved handle");
                    out.channel_ids.push(id);
                }
                None => {
                    warn!(%handle, "Could not resolve handle");
                    out.unresolved.push(handle);
                }
            },
        }
    }
    info!(
        resolved = out.channel_ids.len(),
        unresolved = out.unresolved.len(),
        "channel references resolved"
    );
    Ok(out)
}
