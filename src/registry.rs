//! Channel registry: reconciles the configured channel list with the catalog.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::fetch::{channel_url, FetchEngine};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Reconciles configured channel identifiers with catalog rows.
pub struct ChannelRegistry {
    fetch: Arc<dyn FetchEngine>,
    catalog: Arc<dyn Catalog>,
}

impl ChannelRegistry {
    pub fn new(fetch: Arc<dyn FetchEngine>, catalog: Arc<dyn Catalog>) -> Self {
        Self { fetch, catalog }
    }

    /// Upsert a catalog row for each configured channel, marking it active.
    ///
    /// A channel whose metadata cannot be resolved is logged and skipped;
    /// the remaining channels are still synced. Channels absent from the
    /// configured list are left untouched.
    #[instrument(skip_all, fields(channels = channel_ids.len()))]
    pub async fn sync(&self, channel_ids: &[String]) -> Result<()> {
        for channel_id in channel_ids {
            let channel_id = channel_id.trim();
            if channel_id.is_empty() {
                continue;
            }

            let url = channel_url(channel_id);

            match self.fetch.resolve_channel(&url).await {
                Ok(info) => {
                    self.catalog
                        .upsert_channel(channel_id, &info.name, &url, true)
                        .await?;
                    info!("Synced channel: {} ({})", info.name, channel_id);
                }
                Err(e) => {
                    error!("Error syncing channel {}: {}", channel_id, e);
                }
            }
        }

        Ok(())
    }
}
