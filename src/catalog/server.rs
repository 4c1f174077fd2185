//! Catalog replica server

use crate::catalog::http::{create_router, CatalogState};
use crate::catalog::inventory::Inventory;
use crate::catalog::invalidator::{HttpInvalidator, Invalidator, NoopInvalidator};
use crate::common::upstream::http_client;
use crate::common::{CatalogConfig, Replicator, Result};
use std::sync::Arc;

pub struct CatalogServer {
    config: CatalogConfig,
}

impl CatalogServer {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting catalog replica");
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Data path: {}", self.config.data_path.display());
        tracing::info!("  Front: {}", self.config.front_url.as_deref().unwrap_or("<none>"));
        tracing::info!("  Peer: {}", self.config.peer_url.as_deref().unwrap_or("<none>"));

        let client = http_client(self.config.timeout())?;

        let invalidator: Arc<dyn Invalidator> = match &self.config.front_url {
            Some(front) => Arc::new(HttpInvalidator::new(client.clone(), front.clone())),
            None => Arc::new(NoopInvalidator),
        };

        let replicator = match &self.config.peer_url {
            Some(peer) => Replicator::spawn(peer.clone(), client.clone()).0,
            None => Replicator::disabled(),
        };

        let inventory = Inventory::open(&self.config.data_path, invalidator, replicator).await?;
        let router = create_router(CatalogState {
            inventory: Arc::new(inventory),
        });

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("✓ Catalog replica ready");

        axum::serve(listener, router)
            .with_graceful_shutdown(crate::shutdown_signal())
            .await?;

        tracing::info!("Catalog replica stopped");
        Ok(())
    }
}
