//! Request dispatch for the front tier.
//!
//! Reads go through the [`ResponseCache`] and fall back to the catalog replica
//! set; writes always bypass the cache. Catalog replicas call
//! [`Dispatcher::invalidate`] before they change an item.

use crate::common::metrics::METRICS;
use crate::common::{
    encode_segment, FrontConfig, ReplicaSet, Result, UpstreamClient, UpstreamResponse,
};
use crate::front::cache::ResponseCache;
use reqwest::Method;
use serde_json::Value;

/// Cacheable read operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadKind {
    /// Books by topic
    Search,
    /// One item by id
    Info,
}

impl ReadKind {
    /// Cache key, namespaced by kind so unrelated reads never collide.
    /// Topics are matched case-insensitively by the catalog, so the key is too.
    pub fn cache_key(self, operand: &str) -> String {
        match self {
            ReadKind::Search => format!("search:{}", operand.trim().to_lowercase()),
            ReadKind::Info => format!("info:{}", operand.trim()),
        }
    }

    fn path(self, operand: &str) -> String {
        match self {
            ReadKind::Search => format!("/search/{}", encode_segment(operand)),
            ReadKind::Info => format!("/info/{}", encode_segment(operand)),
        }
    }
}

/// Operations that are never served from or stored in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Update,
    Decrement,
    Purchase,
}

impl WriteKind {
    fn method(self) -> Method {
        match self {
            WriteKind::Update => Method::PUT,
            WriteKind::Decrement | WriteKind::Purchase => Method::POST,
        }
    }

    fn path(self, operand: &str) -> String {
        let operand = encode_segment(operand);
        match self {
            WriteKind::Update => format!("/update/{}", operand),
            WriteKind::Decrement => format!("/decrement/{}", operand),
            WriteKind::Purchase => format!("/purchase/{}", operand),
        }
    }
}

pub struct Dispatcher {
    catalog: ReplicaSet,
    orders: ReplicaSet,
    cache: ResponseCache,
    upstream: UpstreamClient,
}

impl Dispatcher {
    pub fn new(
        catalog: ReplicaSet,
        orders: ReplicaSet,
        cache: ResponseCache,
        upstream: UpstreamClient,
    ) -> Self {
        Self {
            catalog,
            orders,
            cache,
            upstream,
        }
    }

    pub fn from_config(config: &FrontConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            ReplicaSet::new("catalog", config.catalog_replicas.clone())?,
            ReplicaSet::new("order", config.order_replicas.clone())?,
            ResponseCache::new(config.cache_ttl()),
            UpstreamClient::new(config.upstream_timeout())?,
        ))
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn catalog_replicas(&self) -> &ReplicaSet {
        &self.catalog
    }

    pub fn order_replicas(&self) -> &ReplicaSet {
        &self.orders
    }

    /// Serve a read from cache, or from the catalog replicas on a miss.
    /// Only 2xx answers are cached; 4xx answers are returned uncached.
    pub async fn read(&self, kind: ReadKind, operand: &str) -> Result<UpstreamResponse> {
        let key = kind.cache_key(operand);

        if let Some(body) = self.cache.get(&key) {
            METRICS.cache_hits.inc();
            tracing::info!(key = %key, "Cache hit");
            return Ok(UpstreamResponse::ok(body));
        }
        METRICS.cache_misses.inc();

        let response = self
            .upstream
            .forward(&self.catalog, Method::GET, &kind.path(operand), None)
            .await?;

        if response.is_success() {
            self.cache.put(key.clone(), response.body.clone());
            tracing::info!(key = %key, "Cached response");
        }
        Ok(response)
    }

    /// Forward a write to the replica set that owns it and return the
    /// chosen replica's answer verbatim.
    pub async fn write(
        &self,
        kind: WriteKind,
        operand: &str,
        payload: Option<&Value>,
    ) -> Result<UpstreamResponse> {
        let replicas = match kind {
            WriteKind::Update | WriteKind::Decrement => &self.catalog,
            WriteKind::Purchase => &self.orders,
        };
        self.upstream
            .forward(replicas, kind.method(), &kind.path(operand), payload)
            .await
    }

    /// Drop the cached read for `(kind, operand)`. Makes no downstream calls.
    pub fn invalidate(&self, kind: ReadKind, operand: &str) -> bool {
        let key = kind.cache_key(operand);
        METRICS.cache_invalidations.inc();
        let removed = self.cache.invalidate(&key);
        tracing::info!(key = %key, removed, "Cache invalidated");
        removed
    }

    /// Order ledger of whichever order replica answers first. Never cached.
    pub async fn list_orders(&self) -> Result<UpstreamResponse> {
        self.upstream
            .forward(&self.orders, Method::GET, "/orders", None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys_are_namespaced() {
        assert_eq!(ReadKind::Info.cache_key("7"), "info:7");
        assert_eq!(
            ReadKind::Search.cache_key("Distributed Systems"),
            "search:distributed systems"
        );
        assert_ne!(ReadKind::Search.cache_key("7"), ReadKind::Info.cache_key("7"));
    }

    #[test]
    fn test_paths() {
        assert_eq!(
            ReadKind::Search.path("distributed systems"),
            "/search/distributed%20systems"
        );
        assert_eq!(ReadKind::Info.path("42"), "/info/42");
        assert_eq!(WriteKind::Update.path("42"), "/update/42");
        assert_eq!(WriteKind::Purchase.method(), Method::POST);
        assert_eq!(WriteKind::Update.method(), Method::PUT);
    }

    #[test]
    fn test_invalidate_without_entry() {
        let dispatcher = Dispatcher::from_config(&FrontConfig::default()).unwrap();
        assert!(!dispatcher.invalidate(ReadKind::Info, "7"));

        dispatcher
            .cache()
            .put(ReadKind::Info.cache_key("7"), serde_json::json!({"quantity": 3}));
        assert!(dispatcher.invalidate(ReadKind::Info, "7"));
        assert!(dispatcher.cache().is_empty());
    }
}
