//! Invalidation callbacks from a catalog replica to the front's cache.

use crate::common::metrics::METRICS;
use async_trait::async_trait;

/// Drops the front's cached read for an item before the item changes.
///
/// Delivery is best-effort: implementations log and count failures but never
/// fail the write that triggered them.
#[async_trait]
pub trait Invalidator: Send + Sync {
    async fn invalidate(&self, id: u64);
}

/// Posts to `{front}/invalidate/:id`.
#[derive(Debug, Clone)]
pub struct HttpInvalidator {
    client: reqwest::Client,
    front_url: String,
}

impl HttpInvalidator {
    pub fn new(client: reqwest::Client, front_url: impl Into<String>) -> Self {
        Self {
            client,
            front_url: front_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Invalidator for HttpInvalidator {
    async fn invalidate(&self, id: u64) {
        let url = format!("{}/invalidate/{}", self.front_url, id);
        match self.client.post(&url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(item_id = id, "Front cache invalidated");
            }
            Ok(response) => {
                METRICS.invalidation_failed.inc();
                tracing::warn!(
                    item_id = id,
                    status = %response.status().as_u16(),
                    "Front rejected invalidation"
                );
            }
            Err(e) => {
                METRICS.invalidation_failed.inc();
                tracing::warn!(item_id = id, error = %e, "Failed to invalidate front cache");
            }
        }
    }
}

/// For replicas running without a front.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInvalidator;

#[async_trait]
impl Invalidator for NoopInvalidator {
    async fn invalidate(&self, _id: u64) {}
}
