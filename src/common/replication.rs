//! Fire-and-forget replication to a paired replica.
//!
//! Writers enqueue messages on an unbounded channel and return immediately. A
//! background worker delivers them one at a time to the peer's
//! replication-only endpoint. Failed deliveries are logged and counted, never
//! retried. Messages carry absolute values so a duplicate delivery converges
//! to the same state.

use crate::common::metrics::METRICS;
use reqwest::Method;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A message the peer applies without invalidating or re-replicating.
pub trait ReplicationMessage: Serialize + Send + Sync + 'static {
    fn method(&self) -> Method;

    /// Path of the peer's replication-only endpoint for this message
    fn path(&self) -> String;
}

/// Sending half of a replication stream. Cloning shares the same worker.
#[derive(Debug)]
pub struct Replicator<M> {
    tx: Option<mpsc::UnboundedSender<M>>,
}

impl<M> Clone for Replicator<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M: ReplicationMessage> Replicator<M> {
    /// No peer configured: messages are dropped.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Start a delivery worker pushing to `peer_url`.
    pub fn spawn(peer_url: String, client: reqwest::Client) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(deliver(peer_url, client, rx));
        (Self { tx: Some(tx) }, handle)
    }

    /// Replicator whose messages land on the returned receiver.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<M>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn replicate(&self, message: M) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(message).is_err() {
            METRICS.replication_failed.inc();
            tracing::warn!("Replication worker stopped, dropping message");
        }
    }
}

async fn deliver<M: ReplicationMessage>(
    peer_url: String,
    client: reqwest::Client,
    mut rx: mpsc::UnboundedReceiver<M>,
) {
    let base = peer_url.trim_end_matches('/').to_string();
    tracing::info!(peer = %base, "Replication worker started");

    while let Some(message) = rx.recv().await {
        let path = message.path();
        let url = format!("{}{}", base, path);
        match client
            .request(message.method(), &url)
            .json(&message)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                METRICS.replication_sent.inc();
                tracing::debug!(peer = %base, path = %path, "Replicated to peer");
            }
            Ok(response) => {
                METRICS.replication_failed.inc();
                tracing::warn!(
                    peer = %base,
                    path = %path,
                    status = %response.status().as_u16(),
                    "Peer rejected replication message"
                );
            }
            Err(e) => {
                METRICS.replication_failed.inc();
                tracing::warn!(peer = %base, path = %path, error = %e, "Failed to replicate to peer");
            }
        }
    }

    tracing::info!(peer = %base, "Replication worker stopped");
}
