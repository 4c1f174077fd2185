//! Order replica server

use crate::common::upstream::http_client;
use crate::common::{OrderConfig, Replicator, Result, UpstreamClient};
use crate::order::http::{create_router, OrderState};
use crate::order::ledger::Ledger;
use crate::order::saga::PurchaseSaga;
use std::sync::Arc;

pub struct OrderServer {
    config: OrderConfig,
}

impl OrderServer {
    pub fn new(config: OrderConfig) -> Self {
        Self { config }
    }

    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting order replica");
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Ledger path: {}", self.config.ledger_path.display());
        tracing::info!("  Catalog replicas: {}", self.config.catalog_replicas.join(", "));
        tracing::info!("  Peer: {}", self.config.peer_url.as_deref().unwrap_or("<none>"));

        let client = http_client(self.config.timeout())?;

        let replicator = match &self.config.peer_url {
            Some(peer) => Replicator::spawn(peer.clone(), client.clone()).0,
            None => Replicator::disabled(),
        };

        let ledger = Arc::new(Ledger::open(&self.config.ledger_path).await?);
        let saga = PurchaseSaga::from_config(
            &self.config,
            UpstreamClient::from_client(client),
            ledger,
            replicator,
        )?;
        let router = create_router(OrderState {
            saga: Arc::new(saga),
        });

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("✓ Order replica ready");

        axum::serve(listener, router)
            .with_graceful_shutdown(crate::shutdown_signal())
            .await?;

        tracing::info!("Order replica stopped");
        Ok(())
    }
}
