//! Replica sets: round-robin selection with sequential failover.
//!
//! A [`ReplicaSet`] is the fixed, ordered list of interchangeable endpoints
//! serving one logical role. Every external request calls [`ReplicaSet::select`]
//! exactly once, which yields a full rotation of the set starting at the cursor
//! and advances the cursor by one. [`ReplicaSet::dispatch`] then walks that
//! rotation until one candidate answers.

use crate::common::error::ReplicaFailure;
use crate::common::metrics::METRICS;
use crate::common::{Error, Result};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct ReplicaSet {
    name: String,
    endpoints: Vec<String>,
    cursor: AtomicUsize,
}

impl ReplicaSet {
    /// Build a replica set. An empty endpoint list is a configuration error.
    pub fn new(name: impl Into<String>, endpoints: Vec<String>) -> Result<Self> {
        let name = name.into();
        if endpoints.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "replica set '{}' has no endpoints",
                name
            )));
        }
        Ok(Self {
            name,
            endpoints,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Current rotation cursor
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Return every endpoint, starting at the cursor, and advance the cursor.
    pub fn select(&self) -> Vec<String> {
        let len = self.endpoints.len();
        let start = self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);

        (0..len)
            .map(|i| self.endpoints[(start + i) % len].clone())
            .collect()
    }

    /// Try `operation` on each candidate in order, stopping at the first success.
    ///
    /// Only retryable errors (transport failure, timeout, 5xx) move on to the
    /// next candidate; any other error is returned as-is. When every candidate
    /// fails, the per-candidate reasons are aggregated into
    /// [`Error::AllReplicasFailed`].
    pub async fn dispatch<T, F, Fut>(&self, candidates: &[String], mut operation: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut failures = Vec::with_capacity(candidates.len());

        for (attempt, endpoint) in candidates.iter().enumerate() {
            if attempt > 0 {
                METRICS.failovers.inc();
            }
            match operation(endpoint.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(
                        replica_set = %self.name,
                        endpoint = %endpoint,
                        error = %e,
                        "Replica failed, trying next replica"
                    );
                    failures.push(ReplicaFailure {
                        endpoint: endpoint.clone(),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        METRICS.upstream_unavailable.inc();
        tracing::error!(replica_set = %self.name, attempts = failures.len(), "All replicas failed");
        Err(Error::AllReplicasFailed(failures))
    }

    /// Select once and dispatch over the resulting rotation.
    pub async fn call<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let candidates = self.select();
        self.dispatch(&candidates, operation).await
    }
}
